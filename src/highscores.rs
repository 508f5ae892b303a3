//! High score leaderboard system
//!
//! Persisted as a JSON file, tracks the top 10 finished runs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, read_json, write_json};
use crate::sim::GameMode;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub score: u64,
    /// Pinball rounds completed (0 for climb)
    pub rounds_cleared: u32,
    pub mode: GameMode,
    /// Character id
    pub character: String,
    /// Unix timestamp (seconds) when achieved
    pub timestamp: u64,
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<RunRecord>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Must beat the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a run to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_record(&mut self, record: RunRecord) -> Option<usize> {
        if !self.qualifies(record.score) {
            return None;
        }

        // Sorted descending by score; ties keep the earlier run first
        let pos = self.entries.iter().position(|e| record.score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, record);
                i + 1
            }
            None => {
                self.entries.push(record);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Best run in one mode
    pub fn best_in(&self, mode: GameMode) -> Option<&RunRecord> {
        self.entries.iter().find(|e| e.mode == mode)
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let scores: Self = read_json(path)?;
        log::info!("Loaded {} high scores", scores.entries.len());
        Ok(scores)
    }

    /// Load, starting fresh when the file is missing or unreadable
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(scores) => scores,
            Err(e) if e.is_not_found() => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
            Err(e) => {
                log::warn!("{e}; starting a fresh leaderboard");
                Self::new()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        write_json(path, self)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(score: u64) -> RunRecord {
        RunRecord {
            score,
            rounds_cleared: 1,
            mode: GameMode::Pinball,
            character: "fluffy".into(),
            timestamp: 0,
        }
    }

    #[test]
    fn test_zero_never_qualifies() {
        let scores = HighScores::new();
        assert!(!scores.qualifies(0));
        assert_eq!(scores.potential_rank(0), None);
    }

    #[test]
    fn test_sorted_descending() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_record(record(300)), Some(1));
        assert_eq!(scores.add_record(record(500)), Some(1));
        assert_eq!(scores.add_record(record(400)), Some(2));
        let order: Vec<u64> = scores.entries.iter().map(|e| e.score).collect();
        assert_eq!(order, [500, 400, 300]);
        assert_eq!(scores.top_score(), Some(500));
    }

    #[test]
    fn test_keeps_top_ten() {
        let mut scores = HighScores::new();
        for s in 1..=10 {
            scores.add_record(record(s * 100));
        }
        assert!(!scores.qualifies(100));
        assert_eq!(scores.add_record(record(50)), None);
        assert_eq!(scores.potential_rank(150), Some(10));
        assert_eq!(scores.add_record(record(150)), Some(10));
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.entries.last().unwrap().score, 150);
    }

    #[test]
    fn test_best_in_mode() {
        let mut scores = HighScores::new();
        scores.add_record(record(900));
        scores.add_record(RunRecord {
            mode: GameMode::Climb,
            ..record(400)
        });
        assert_eq!(scores.best_in(GameMode::Climb).unwrap().score, 400);
        assert_eq!(scores.best_in(GameMode::Pinball).unwrap().score, 900);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scores.json");
        let mut scores = HighScores::new();
        scores.add_record(record(1200));
        scores.save(&path).unwrap();

        let loaded = HighScores::load(&path).unwrap();
        assert_eq!(loaded.entries, scores.entries);
        assert!(HighScores::load_or_default(&dir.path().join("missing.json")).is_empty());
    }
}
