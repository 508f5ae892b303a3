//! Game settings and tuning
//!
//! Every numeric contract of the physics-rule layer is data here, so a
//! different renderer or engine can be matched without recompiling.
//! Persisted as JSON; missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{StoreError, read_json, write_json};
use crate::sim::{BodyTuning, ClimbTuning, ContactTuning, FlipperTuning, InputTuning, PullTuning, TrajectoryPlanner};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Logical screen size
    pub width: f32,
    pub height: f32,

    /// Seed for every random draw in a run (drain saves, offers, tower layout)
    pub seed: u64,
    /// Resolve each body pair at most once per step
    pub dedupe_contacts: bool,

    // === Tuning ===
    pub body: BodyTuning,
    pub pull: PullTuning,
    pub contact: ContactTuning,
    pub flipper: FlipperTuning,
    pub input: InputTuning,
    pub climb: ClimbTuning,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: GAME_WIDTH,
            height: GAME_HEIGHT,
            seed: 0x5eed,
            dedupe_contacts: false,
            body: BodyTuning::default(),
            pull: PullTuning::default(),
            contact: ContactTuning::default(),
            flipper: FlipperTuning::default(),
            input: InputTuning::default(),
            climb: ClimbTuning::default(),
        }
    }
}

impl Settings {
    /// Same defaults with a different seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Slingshot planner for this screen height
    pub fn planner(&self) -> TrajectoryPlanner {
        TrajectoryPlanner::new(self.pull, self.height)
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let settings: Self = read_json(path)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load, falling back to defaults when the file is missing or unreadable
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) if e.is_not_found() => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        write_json(path, self)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_constants() {
        let settings = Settings::default();
        assert_eq!(settings.planner().max_pull(), 640.0);
        assert_eq!(settings.body.min_boost, 15.0);
        assert_eq!(settings.contact.platform_tolerance, 20.0);
        assert_eq!(settings.input.grab_distance, 150.0);
        assert!(!settings.dedupe_contacts);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = Settings::with_seed(99);
        settings.dedupe_contacts = true;
        settings.contact.bumper_score = 75;
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "seed": 7, "pull": { "min_pull": 50.0 } }"#).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.seed, 7);
        assert_eq!(loaded.pull.min_pull, 50.0);
        assert_eq!(loaded.pull.speed_y, 45.0);
        assert_eq!(loaded.width, 720.0);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let err = Settings::load(&path).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(Settings::load_or_default(&path), Settings::default());
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Settings::load(&path), Err(StoreError::Json { .. })));
        assert_eq!(Settings::load_or_default(&path), Settings::default());
    }
}
