//! Upgrade catalog
//!
//! Static definitions plus the offer sampler used between rounds.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
}

impl Rarity {
    /// Card border color (0xRRGGBB)
    pub fn color(&self) -> u32 {
        match self {
            Rarity::Common => 0x888888,
            Rarity::Rare => 0x4488ff,
            Rarity::Epic => 0xaa44ff,
        }
    }
}

/// Sparse effect record: only fields that are `Some` are applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpgradeEffects {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_hearts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_power_multiplier: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flipper_speed_multiplier: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bumper_score_multiplier: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drain_save_chance: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combo_bonus: Option<u32>,
}

impl UpgradeEffects {
    pub const NONE: Self = Self {
        max_hearts: None,
        launch_power_multiplier: None,
        flipper_speed_multiplier: None,
        bumper_score_multiplier: None,
        drain_save_chance: None,
        combo_bonus: None,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Upgrade {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub rarity: Rarity,
    pub icon: &'static str,
    pub effects: UpgradeEffects,
}

pub static UPGRADES: [Upgrade; 6] = [
    // Survivability
    Upgrade {
        id: "extra_heart",
        name: "Extra Heart",
        description: "+1 max heart\nHeal to full",
        rarity: Rarity::Common,
        icon: "❤️",
        effects: UpgradeEffects {
            max_hearts: Some(1),
            ..UpgradeEffects::NONE
        },
    },
    Upgrade {
        id: "thick_skin",
        name: "Thick Skin",
        description: "20% chance to\nsurvive drain",
        rarity: Rarity::Rare,
        icon: "🛡️",
        effects: UpgradeEffects {
            drain_save_chance: Some(0.2),
            ..UpgradeEffects::NONE
        },
    },
    // Power
    Upgrade {
        id: "super_launch",
        name: "Super Launch",
        description: "+30% launch\nvelocity",
        rarity: Rarity::Common,
        icon: "🚀",
        effects: UpgradeEffects {
            launch_power_multiplier: Some(1.3),
            ..UpgradeEffects::NONE
        },
    },
    Upgrade {
        id: "mega_flippers",
        name: "Mega Flippers",
        description: "+40% flipper\nspeed",
        rarity: Rarity::Rare,
        icon: "⚡",
        effects: UpgradeEffects {
            flipper_speed_multiplier: Some(1.4),
            ..UpgradeEffects::NONE
        },
    },
    // Scoring
    Upgrade {
        id: "lucky_bumpers",
        name: "Lucky Bumpers",
        description: "2x bumper\npoints",
        rarity: Rarity::Common,
        icon: "🍀",
        effects: UpgradeEffects {
            bumper_score_multiplier: Some(2.0),
            ..UpgradeEffects::NONE
        },
    },
    Upgrade {
        id: "combo_master",
        name: "Combo Master",
        description: "+50 bonus per\nconsecutive hit",
        rarity: Rarity::Epic,
        icon: "🔥",
        effects: UpgradeEffects {
            combo_bonus: Some(50),
            ..UpgradeEffects::NONE
        },
    },
];

/// A registry of upgrade definitions
#[derive(Debug, Clone, Copy)]
pub struct UpgradeCatalog {
    entries: &'static [Upgrade],
}

impl Default for UpgradeCatalog {
    fn default() -> Self {
        Self::new(&UPGRADES)
    }
}

impl UpgradeCatalog {
    pub fn new(entries: &'static [Upgrade]) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &'static [Upgrade] {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&'static Upgrade> {
        self.entries.iter().find(|u| u.id == id)
    }

    /// Up to `count` distinct upgrades not in `exclude_ids`, uniformly shuffled.
    /// Returns fewer when the catalog runs dry; never pads.
    pub fn random<R, S>(&self, count: usize, exclude_ids: &[S], rng: &mut R) -> Vec<&'static Upgrade>
    where
        R: Rng + ?Sized,
        S: AsRef<str>,
    {
        let mut available: Vec<&'static Upgrade> = self
            .entries
            .iter()
            .filter(|u| !exclude_ids.iter().any(|id| id.as_ref() == u.id))
            .collect();
        available.shuffle(rng);
        available.truncate(count);
        available
    }
}

/// Look up an upgrade in the standard catalog
pub fn upgrade_by_id(id: &str) -> Option<&'static Upgrade> {
    UpgradeCatalog::default().get(id)
}

/// Sample offers from the standard catalog
pub fn random_upgrades<R, S>(count: usize, exclude_ids: &[S], rng: &mut R) -> Vec<&'static Upgrade>
where
    R: Rng + ?Sized,
    S: AsRef<str>,
{
    UpgradeCatalog::default().random(count, exclude_ids, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::collections::HashSet;

    #[test]
    fn test_three_distinct_from_six() {
        let mut rng = Pcg32::seed_from_u64(7);
        let offers = random_upgrades::<_, &str>(3, &[], &mut rng);
        assert_eq!(offers.len(), 3);
        let ids: HashSet<&str> = offers.iter().map(|u| u.id).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.iter().all(|id| upgrade_by_id(id).is_some()));
    }

    #[test]
    fn test_excluded_never_offered() {
        let mut rng = Pcg32::seed_from_u64(11);
        let owned = ["extra_heart", "lucky_bumpers"];
        for _ in 0..50 {
            let offers = random_upgrades(3, &owned, &mut rng);
            assert!(offers.iter().all(|u| !owned.contains(&u.id)));
        }
    }

    #[test]
    fn test_short_when_exhausted() {
        let mut rng = Pcg32::seed_from_u64(3);
        let owned: Vec<String> = UPGRADES.iter().skip(1).map(|u| u.id.to_string()).collect();
        let offers = random_upgrades(3, &owned, &mut rng);
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].id, "extra_heart");

        let all: Vec<&str> = UPGRADES.iter().map(|u| u.id).collect();
        assert!(random_upgrades(3, &all, &mut rng).is_empty());
    }

    #[test]
    fn test_shuffle_reaches_every_entry() {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut seen_first = HashSet::new();
        for _ in 0..200 {
            let offers = random_upgrades::<_, &str>(1, &[], &mut rng);
            seen_first.insert(offers[0].id);
        }
        assert_eq!(seen_first.len(), UPGRADES.len());
    }

    #[test]
    fn test_unknown_id() {
        assert!(upgrade_by_id("nine_lives").is_none());
        assert_eq!(upgrade_by_id("thick_skin").unwrap().rarity, Rarity::Rare);
    }

    #[test]
    fn test_effects_serialize_sparse() {
        let json = serde_json::to_string(&UPGRADES[2].effects).unwrap();
        assert_eq!(json, r#"{"launchPowerMultiplier":1.3}"#);
    }
}
