//! Obstacles the launch body can touch, and the handle registry that maps
//! backend bodies to them.
//!
//! Obstacles live in a generational arena keyed by [`ObstacleId`]. Removing
//! one frees its slot for reuse and drops its handle mapping, so a contact
//! reported for a body destroyed earlier in the same step resolves to nothing
//! and a stale id never reaches the slot's next occupant.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::backend::{BodyDesc, BodyHandle, PhysicsBackend, Shape};
use super::flipper::Flipper;

/// Slot index plus the generation of its occupant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId {
    pub index: u32,
    pub generation: u32,
}

/// Scoring bumper with a short hit cooldown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bumper {
    pub radius: f32,
    /// Ticks left before this bumper can score again
    pub cooldown_ticks: u32,
}

impl Bumper {
    pub const RADIUS: f32 = 32.0;
    pub const RESTITUTION: f32 = 1.2;

    pub fn new() -> Self {
        Self {
            radius: Self::RADIUS,
            cooldown_ticks: 0,
        }
    }

    #[inline]
    pub fn hit_cooldown_active(&self) -> bool {
        self.cooldown_ticks > 0
    }

    /// Register a hit. Returns the base score, or `None` while cooling down.
    pub fn on_hit(&mut self, score: u32, cooldown_ticks: u32) -> Option<u32> {
        if self.hit_cooldown_active() {
            return None;
        }
        self.cooldown_ticks = cooldown_ticks;
        Some(score)
    }

    pub fn tick(&mut self) {
        self.cooldown_ticks = self.cooldown_ticks.saturating_sub(1);
    }
}

impl Default for Bumper {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-use enemy marker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hazard {
    pub radius: f32,
    pub destroyed: bool,
}

impl Hazard {
    pub const RADIUS: f32 = 20.0;
}

/// Sensor platform that only catches the body from above
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneWayPlatform {
    pub width: f32,
    pub height: f32,
}

impl OneWayPlatform {
    pub const WIDTH: f32 = 120.0;
    pub const HEIGHT: f32 = 24.0;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrainSensor {
    pub width: f32,
    pub height: f32,
}

/// Variant-specific state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ObstacleKind {
    Bumper(Bumper),
    Flipper(Flipper),
    Drain(DrainSensor),
    Hazard(Hazard),
    Platform(OneWayPlatform),
    /// Climb-mode floor: touching it ends the flight
    Ground,
    /// Plain solid boundary; only the engine's restitution applies
    Wall,
}

impl ObstacleKind {
    pub fn label(&self) -> &'static str {
        match self {
            ObstacleKind::Bumper(_) => "bumper",
            ObstacleKind::Flipper(_) => "flipper",
            ObstacleKind::Drain(_) => "drain",
            ObstacleKind::Hazard(_) => "enemy",
            ObstacleKind::Platform(_) => "platform",
            ObstacleKind::Ground => "ground",
            ObstacleKind::Wall => "wall",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub handle: BodyHandle,
    /// Spawn position (engine-owned bodies here are all static)
    pub pos: Vec2,
    pub kind: ObstacleKind,
}

impl Obstacle {
    /// Top surface y of a one-way platform
    pub fn platform_top(&self) -> Option<f32> {
        match &self.kind {
            ObstacleKind::Platform(p) => Some(self.pos.y - p.height / 2.0),
            _ => None,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(&self.kind, ObstacleKind::Hazard(h) if h.destroyed)
    }
}

/// Arena of live obstacles plus backend handle lookup
#[derive(Debug, Clone, Default)]
pub struct ObstacleRegistry {
    slots: Arena<Obstacle>,
    by_handle: HashMap<BodyHandle, ObstacleId>,
}

impl ObstacleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the physics body and register the obstacle
    pub fn spawn<B: PhysicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        desc: BodyDesc,
        kind: ObstacleKind,
    ) -> ObstacleId {
        let handle = backend.create_body(desc);
        let (index, generation) = self.slots.insert_with(|index, generation| Obstacle {
            id: ObstacleId { index, generation },
            handle,
            pos: desc.pos,
            kind,
        });
        let id = ObstacleId { index, generation };
        self.by_handle.insert(handle, id);
        id
    }

    pub fn spawn_bumper<B: PhysicsBackend + ?Sized>(&mut self, backend: &mut B, pos: Vec2) -> ObstacleId {
        let desc = BodyDesc::fixed(Shape::Circle { radius: Bumper::RADIUS }, pos)
            .with_restitution(Bumper::RESTITUTION);
        self.spawn(backend, desc, ObstacleKind::Bumper(Bumper::new()))
    }

    pub fn spawn_hazard<B: PhysicsBackend + ?Sized>(&mut self, backend: &mut B, pos: Vec2) -> ObstacleId {
        let desc = BodyDesc::sensor(Shape::Circle { radius: Hazard::RADIUS }, pos);
        let hazard = Hazard {
            radius: Hazard::RADIUS,
            destroyed: false,
        };
        self.spawn(backend, desc, ObstacleKind::Hazard(hazard))
    }

    pub fn spawn_platform<B: PhysicsBackend + ?Sized>(&mut self, backend: &mut B, pos: Vec2) -> ObstacleId {
        let platform = OneWayPlatform {
            width: OneWayPlatform::WIDTH,
            height: OneWayPlatform::HEIGHT,
        };
        let shape = Shape::Rect {
            width: platform.width,
            height: platform.height,
        };
        self.spawn(backend, BodyDesc::sensor(shape, pos), ObstacleKind::Platform(platform))
    }

    pub fn spawn_drain<B: PhysicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        pos: Vec2,
        width: f32,
        height: f32,
    ) -> ObstacleId {
        let desc = BodyDesc::sensor(Shape::Rect { width, height }, pos);
        self.spawn(backend, desc, ObstacleKind::Drain(DrainSensor { width, height }))
    }

    pub fn spawn_flipper<B: PhysicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        pos: Vec2,
        flipper: Flipper,
    ) -> ObstacleId {
        let desc = BodyDesc::fixed(
            Shape::Rect {
                width: 120.0,
                height: 24.0,
            },
            pos,
        )
        .with_restitution(0.9)
        .with_angle(flipper.angle);
        self.spawn(backend, desc, ObstacleKind::Flipper(flipper))
    }

    pub fn spawn_wall<B: PhysicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        pos: Vec2,
        size: Vec2,
        angle: f32,
        restitution: f32,
    ) -> ObstacleId {
        let desc = BodyDesc::fixed(
            Shape::Rect {
                width: size.x,
                height: size.y,
            },
            pos,
        )
        .with_restitution(restitution)
        .with_angle(angle);
        self.spawn(backend, desc, ObstacleKind::Wall)
    }

    pub fn spawn_ground<B: PhysicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        pos: Vec2,
        size: Vec2,
    ) -> ObstacleId {
        let desc = BodyDesc::fixed(
            Shape::Rect {
                width: size.x,
                height: size.y,
            },
            pos,
        );
        self.spawn(backend, desc, ObstacleKind::Ground)
    }

    /// Remove from the arena and the backend
    pub fn remove<B: PhysicsBackend + ?Sized>(&mut self, backend: &mut B, id: ObstacleId) {
        if let Some(obstacle) = self.slots.remove(id.index, id.generation) {
            self.by_handle.remove(&obstacle.handle);
            backend.remove_body(obstacle.handle);
        }
    }

    /// Remove every obstacle (scene teardown)
    pub fn clear<B: PhysicsBackend + ?Sized>(&mut self, backend: &mut B) {
        for obstacle in self.slots.drain() {
            backend.remove_body(obstacle.handle);
        }
        self.by_handle.clear();
    }

    pub fn lookup(&self, handle: BodyHandle) -> Option<ObstacleId> {
        self.by_handle.get(&handle).copied()
    }

    pub fn get(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.slots.get(id.index, id.generation)
    }

    pub fn get_mut(&mut self, id: ObstacleId) -> Option<&mut Obstacle> {
        self.slots.get_mut(id.index, id.generation)
    }

    /// Live obstacles in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.slots.iter().map(|(_, _, o)| o)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Obstacle> {
        self.slots.iter_mut().map(|(_, _, o)| o)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Arena slots allocated, never more than the peak live count
    pub fn slot_count(&self) -> usize {
        self.slots.slot_count()
    }

    pub fn count_where(&self, pred: impl Fn(&ObstacleKind) -> bool) -> usize {
        self.iter().filter(|o| pred(&o.kind)).count()
    }

    /// Decay bumper cooldowns by one tick
    pub fn tick_cooldowns(&mut self) {
        for obstacle in self.iter_mut() {
            if let ObstacleKind::Bumper(bumper) = &mut obstacle.kind {
                bumper.tick();
            }
        }
    }

    /// Drop hazards consumed this step
    pub fn sweep_destroyed<B: PhysicsBackend + ?Sized>(&mut self, backend: &mut B) -> usize {
        let dead: Vec<ObstacleId> = self.iter().filter(|o| o.is_destroyed()).map(|o| o.id).collect();
        for &id in &dead {
            self.remove(backend, id);
        }
        dead.len()
    }
}
