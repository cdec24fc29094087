//! Best score per difficulty
//!
//! Scores only ever go up. Persisted as a flat JSON object keyed by
//! difficulty name; missing keys read as zero.

use serde::{Deserialize, Serialize};

use crate::config::DifficultyKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BestScores {
    #[serde(default)]
    pub easy: u32,
    #[serde(default)]
    pub normal: u32,
    #[serde(default)]
    pub hard: u32,
    #[serde(default)]
    pub souls: u32,
}

impl BestScores {
    pub fn get(&self, key: DifficultyKey) -> u32 {
        match key {
            DifficultyKey::Easy => self.easy,
            DifficultyKey::Normal => self.normal,
            DifficultyKey::Hard => self.hard,
            DifficultyKey::Souls => self.souls,
        }
    }

    fn slot_mut(&mut self, key: DifficultyKey) -> &mut u32 {
        match key {
            DifficultyKey::Easy => &mut self.easy,
            DifficultyKey::Normal => &mut self.normal,
            DifficultyKey::Hard => &mut self.hard,
            DifficultyKey::Souls => &mut self.souls,
        }
    }

    /// Keep `score` if it beats the stored best. Returns true when it did.
    pub fn record(&mut self, key: DifficultyKey, score: u32) -> bool {
        let slot = self.slot_mut(key);
        if score > *slot {
            *slot = score;
            log::info!("New best for {}: {}", key.as_str(), score);
            return true;
        }
        false
    }
}
