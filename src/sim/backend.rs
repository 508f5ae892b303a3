//! Rigid-body engine seam
//!
//! The rules core never integrates or detects collisions itself. It creates
//! bodies, receives contact-start pairs once per step, and force-sets state
//! through [`PhysicsBackend`]. [`HeadlessWorld`] is a small reference engine
//! for the headless binary and tests: fixed-step integration, overlap-based
//! contact starts, restitution reflection off solid statics.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arena::Arena;

/// Identifier the engine hands out for each body. The generation tells a
/// removed body apart from a later one created in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle {
    pub index: u32,
    pub generation: u32,
}

impl BodyHandle {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { width: f32, height: f32 },
}

/// Everything needed to create a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    pub shape: Shape,
    pub pos: Vec2,
    pub angle: f32,
    pub is_static: bool,
    pub is_sensor: bool,
    pub restitution: f32,
    pub friction: f32,
    pub air_friction: f32,
}

impl BodyDesc {
    pub fn fixed(shape: Shape, pos: Vec2) -> Self {
        Self {
            shape,
            pos,
            angle: 0.0,
            is_static: true,
            is_sensor: false,
            restitution: 0.0,
            friction: 0.1,
            air_friction: 0.0,
        }
    }

    pub fn sensor(shape: Shape, pos: Vec2) -> Self {
        Self {
            is_sensor: true,
            ..Self::fixed(shape, pos)
        }
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }
}

/// A contact-start event between two bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContactPair {
    pub a: BodyHandle,
    pub b: BodyHandle,
}

impl ContactPair {
    pub fn new(a: BodyHandle, b: BodyHandle) -> Self {
        Self { a, b }
    }

    /// The body touching `handle`, if this pair involves it
    pub fn other(&self, handle: BodyHandle) -> Option<BodyHandle> {
        if self.a == handle {
            Some(self.b)
        } else if self.b == handle {
            Some(self.a)
        } else {
            None
        }
    }

    /// Order-independent key for de-duplication
    pub fn key(&self) -> (BodyHandle, BodyHandle) {
        if self.a <= self.b {
            (self.a, self.b)
        } else {
            (self.b, self.a)
        }
    }
}

/// What the rules core needs from a rigid-body engine
pub trait PhysicsBackend {
    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle;
    fn remove_body(&mut self, handle: BodyHandle);

    /// Advance one fixed step and report bodies that started touching
    fn step(&mut self) -> Vec<ContactPair>;

    fn position(&self, handle: BodyHandle) -> Option<Vec2>;
    fn velocity(&self, handle: BodyHandle) -> Option<Vec2>;
    fn angle(&self, handle: BodyHandle) -> Option<f32>;
    fn angular_velocity(&self, handle: BodyHandle) -> Option<f32>;

    fn set_position(&mut self, handle: BodyHandle, pos: Vec2);
    fn set_velocity(&mut self, handle: BodyHandle, vel: Vec2);
    fn set_static(&mut self, handle: BodyHandle, is_static: bool);
    fn set_angle(&mut self, handle: BodyHandle, angle: f32);
    fn set_angular_velocity(&mut self, handle: BodyHandle, angular_velocity: f32);
}

#[derive(Debug, Clone)]
struct WorldBody {
    desc: BodyDesc,
    vel: Vec2,
    angular_vel: f32,
}

/// Penetration info for one overlapping pair
#[derive(Debug, Clone, Copy)]
struct Overlap {
    /// Unit normal pointing from the other body toward the dynamic one
    normal: Vec2,
    depth: f32,
}

/// Minimal step-based engine used headless
#[derive(Debug, Clone)]
pub struct HeadlessWorld {
    bodies: Arena<WorldBody>,
    /// Per-step acceleration applied to dynamic bodies
    pub gravity: Vec2,
    touching: HashSet<(BodyHandle, BodyHandle)>,
}

impl Default for HeadlessWorld {
    fn default() -> Self {
        Self::new(Vec2::new(0.0, 0.3))
    }
}

impl HeadlessWorld {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            bodies: Arena::new(),
            gravity,
            touching: HashSet::new(),
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Body slots allocated, never more than the peak live count
    pub fn slot_count(&self) -> usize {
        self.bodies.slot_count()
    }

    fn get(&self, handle: BodyHandle) -> Option<&WorldBody> {
        self.bodies.get(handle.index, handle.generation)
    }

    fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut WorldBody> {
        self.bodies.get_mut(handle.index, handle.generation)
    }

    fn handles(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        self.bodies.iter().map(|(index, generation, _)| BodyHandle::new(index, generation))
    }

    fn overlap(dynamic: &BodyDesc, other: &BodyDesc) -> Option<Overlap> {
        let Shape::Circle { radius } = dynamic.shape else {
            // Only circular dynamic bodies are supported headless
            return None;
        };
        match other.shape {
            Shape::Circle { radius: other_r } => {
                let delta = dynamic.pos - other.pos;
                let dist = delta.length();
                let depth = radius + other_r - dist;
                (depth > 0.0).then(|| Overlap {
                    normal: delta.try_normalize().unwrap_or(Vec2::NEG_Y),
                    depth,
                })
            }
            Shape::Rect { width, height } => {
                circle_rect_overlap(dynamic.pos, radius, other.pos, width, height, other.angle)
            }
        }
    }
}

/// Circle vs (possibly rotated) rectangle
fn circle_rect_overlap(
    center: Vec2,
    radius: f32,
    rect_pos: Vec2,
    width: f32,
    height: f32,
    angle: f32,
) -> Option<Overlap> {
    let rot = Vec2::from_angle(angle);
    // Circle center in the rectangle's local frame
    let local = Vec2::from_angle(-angle).rotate(center - rect_pos);
    let half = Vec2::new(width / 2.0, height / 2.0);
    let closest = local.clamp(-half, half);
    let delta = local - closest;
    let dist = delta.length();

    if dist > 0.0 {
        let depth = radius - dist;
        return (depth > 0.0).then(|| Overlap {
            normal: rot.rotate(delta / dist),
            depth,
        });
    }

    // Center inside the rectangle: push out along the shallowest axis
    let dx = half.x - local.x.abs();
    let dy = half.y - local.y.abs();
    let (normal, depth) = if dx < dy {
        (Vec2::new(local.x.signum(), 0.0), dx + radius)
    } else {
        (Vec2::new(0.0, local.y.signum()), dy + radius)
    };
    Some(Overlap {
        normal: rot.rotate(normal),
        depth,
    })
}

impl PhysicsBackend for HeadlessWorld {
    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let (index, generation) = self.bodies.insert_with(|_, _| WorldBody {
            desc,
            vel: Vec2::ZERO,
            angular_vel: 0.0,
        });
        BodyHandle::new(index, generation)
    }

    fn remove_body(&mut self, handle: BodyHandle) {
        if self.bodies.remove(handle.index, handle.generation).is_some() {
            self.touching.retain(|&(a, b)| a != handle && b != handle);
        }
    }

    fn step(&mut self) -> Vec<ContactPair> {
        let gravity = self.gravity;
        for (_, _, body) in self.bodies.iter_mut() {
            body.desc.angle += body.angular_vel;
            if body.desc.is_static {
                continue;
            }
            body.vel += gravity;
            body.vel *= 1.0 - body.desc.air_friction;
            body.desc.pos += body.vel;
        }

        let dynamic: Vec<BodyHandle> = self
            .handles()
            .filter(|&h| self.get(h).is_some_and(|b| !b.desc.is_static))
            .collect();
        let all: Vec<BodyHandle> = self.handles().collect();

        let mut now_touching = HashSet::new();
        let mut started = Vec::new();
        for &dyn_handle in &dynamic {
            for &other_handle in &all {
                if other_handle == dyn_handle {
                    continue;
                }
                let (Some(dyn_body), Some(other)) = (self.get(dyn_handle), self.get(other_handle))
                else {
                    continue;
                };
                let Some(overlap) = Self::overlap(&dyn_body.desc, &other.desc) else {
                    continue;
                };
                let solid = !dyn_body.desc.is_sensor && !other.desc.is_sensor && other.desc.is_static;
                let restitution = dyn_body.desc.restitution.max(other.desc.restitution);

                let pair = ContactPair::new(dyn_handle, other_handle);
                if now_touching.insert(pair.key()) && !self.touching.contains(&pair.key()) {
                    started.push(pair);
                }

                if !solid {
                    continue;
                }
                if let Some(body) = self.get_mut(dyn_handle) {
                    body.desc.pos += overlap.normal * overlap.depth;
                    let approach = body.vel.dot(overlap.normal);
                    if approach < 0.0 {
                        body.vel -= overlap.normal * approach * (1.0 + restitution);
                    }
                }
            }
        }
        self.touching = now_touching;
        started
    }

    fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.get(handle).map(|b| b.desc.pos)
    }

    fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.get(handle).map(|b| b.vel)
    }

    fn angle(&self, handle: BodyHandle) -> Option<f32> {
        self.get(handle).map(|b| b.desc.angle)
    }

    fn angular_velocity(&self, handle: BodyHandle) -> Option<f32> {
        self.get(handle).map(|b| b.angular_vel)
    }

    fn set_position(&mut self, handle: BodyHandle, pos: Vec2) {
        if let Some(body) = self.get_mut(handle) {
            body.desc.pos = pos;
        }
    }

    fn set_velocity(&mut self, handle: BodyHandle, vel: Vec2) {
        if let Some(body) = self.get_mut(handle) {
            body.vel = vel;
        }
    }

    fn set_static(&mut self, handle: BodyHandle, is_static: bool) {
        if let Some(body) = self.get_mut(handle) {
            body.desc.is_static = is_static;
        }
    }

    fn set_angle(&mut self, handle: BodyHandle, angle: f32) {
        if let Some(body) = self.get_mut(handle) {
            body.desc.angle = angle;
        }
    }

    fn set_angular_velocity(&mut self, handle: BodyHandle, angular_velocity: f32) {
        if let Some(body) = self.get_mut(handle) {
            body.angular_vel = angular_velocity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(world: &mut HeadlessWorld, pos: Vec2) -> BodyHandle {
        world.create_body(BodyDesc {
            is_static: false,
            restitution: 0.6,
            ..BodyDesc::fixed(Shape::Circle { radius: 10.0 }, pos)
        })
    }

    #[test]
    fn test_contact_start_reported_once() {
        let mut world = HeadlessWorld::new(Vec2::ZERO);
        let b = ball(&mut world, Vec2::new(0.0, 0.0));
        let sensor = world.create_body(BodyDesc::sensor(
            Shape::Rect {
                width: 100.0,
                height: 20.0,
            },
            Vec2::new(0.0, 30.0),
        ));
        world.set_velocity(b, Vec2::new(0.0, 5.0));

        let mut starts = Vec::new();
        for _ in 0..6 {
            starts.extend(world.step());
        }
        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].other(b), Some(sensor));
    }

    #[test]
    fn test_sensor_does_not_block() {
        let mut world = HeadlessWorld::new(Vec2::ZERO);
        let b = ball(&mut world, Vec2::ZERO);
        world.create_body(BodyDesc::sensor(Shape::Circle { radius: 20.0 }, Vec2::new(0.0, 25.0)));
        world.set_velocity(b, Vec2::new(0.0, 5.0));
        for _ in 0..4 {
            world.step();
        }
        assert_eq!(world.velocity(b), Some(Vec2::new(0.0, 5.0)));
    }

    #[test]
    fn test_solid_reflects_with_restitution() {
        let mut world = HeadlessWorld::new(Vec2::ZERO);
        let b = ball(&mut world, Vec2::new(0.0, 0.0));
        world.create_body(BodyDesc::fixed(
            Shape::Rect {
                width: 200.0,
                height: 20.0,
            },
            Vec2::new(0.0, 22.0),
        ));
        world.set_velocity(b, Vec2::new(0.0, 4.0));
        world.step();
        let vel = world.velocity(b).unwrap();
        assert!((vel.y + 2.4).abs() < 1e-4, "vel = {vel:?}");
    }

    #[test]
    fn test_static_body_is_not_integrated() {
        let mut world = HeadlessWorld::default();
        let b = ball(&mut world, Vec2::new(5.0, 5.0));
        world.set_static(b, true);
        world.step();
        assert_eq!(world.position(b), Some(Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn test_removed_body_is_gone() {
        let mut world = HeadlessWorld::default();
        let b = ball(&mut world, Vec2::ZERO);
        world.remove_body(b);
        assert_eq!(world.position(b), None);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_recreated_body_gets_fresh_handle() {
        let mut world = HeadlessWorld::default();
        let old = ball(&mut world, Vec2::ZERO);
        world.remove_body(old);
        let new = ball(&mut world, Vec2::new(50.0, 0.0));

        assert_eq!(new.index, old.index);
        assert_ne!(new, old);
        assert_eq!(world.position(old), None);
        world.set_velocity(old, Vec2::new(9.0, 9.0));
        assert_eq!(world.velocity(new), Some(Vec2::ZERO));
        assert_eq!(world.slot_count(), 1);
    }

    #[test]
    fn test_rotated_rect_overlap() {
        // 45 degree rect; a circle on its diagonal axis but outside the AABB corner
        let hit = circle_rect_overlap(
            Vec2::new(0.0, 14.0),
            5.0,
            Vec2::ZERO,
            40.0,
            10.0,
            std::f32::consts::FRAC_PI_4,
        );
        assert!(hit.is_some());
        let miss = circle_rect_overlap(Vec2::new(0.0, 40.0), 5.0, Vec2::ZERO, 40.0, 10.0, 0.0);
        assert!(miss.is_none());
    }
}
