//! Best scores and difficulty preference
//!
//! Loaders never fail: missing or corrupt data yields defaults (with a
//! warning for corruption). Savers log storage failures and move on.

use serde_json::Value;

use crate::config::DifficultyKey;
use crate::platform::KeyValueStore;
use crate::scores::BestScores;

pub const BEST_KEY: &str = "sn-flappy-best-v2";
pub const LEGACY_BEST_KEY: &str = "sn-flappy-best";
pub const DIFFICULTY_KEY: &str = "sn-flappy-diff";
pub const SETTINGS_KEY: &str = "sn-flappy-settings";

/// Read a stored value, treating an unavailable store as empty
pub(crate) fn read<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Could not read {key}: {e}");
            None
        }
    }
}

pub(crate) fn write<S: KeyValueStore + ?Sized>(store: &mut S, key: &str, value: &str) {
    if let Err(e) = store.set(key, value) {
        log::warn!("Could not save {key}: {e}");
    }
}

/// Accept only positive finite numbers; fractions round down
fn positive_score(value: Option<&Value>) -> u32 {
    match value.and_then(Value::as_f64) {
        Some(v) if v.is_finite() && v > 0.0 => v.min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

/// Leading decimal integer of `raw`, ignoring whatever follows ("12abc" -> 12)
fn leading_int(raw: &str) -> Option<u32> {
    let s = raw.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().ok()
}

fn parse_best_scores(json: &str) -> Option<BestScores> {
    let value: Value = serde_json::from_str(json).ok()?;
    let obj = value.as_object()?;
    Some(BestScores {
        easy: positive_score(obj.get(DifficultyKey::Easy.as_str())),
        normal: positive_score(obj.get(DifficultyKey::Normal.as_str())),
        hard: positive_score(obj.get(DifficultyKey::Hard.as_str())),
        souls: positive_score(obj.get(DifficultyKey::Souls.as_str())),
    })
}

/// Load best scores, migrating the single legacy score on first run
pub fn load_best_scores<S: KeyValueStore + ?Sized>(store: &mut S) -> BestScores {
    if let Some(json) = read(store, BEST_KEY) {
        return match parse_best_scores(&json) {
            Some(scores) => scores,
            None => {
                log::warn!("Discarding corrupt best scores");
                BestScores::default()
            }
        };
    }

    let legacy = read(store, LEGACY_BEST_KEY)
        .and_then(|s| leading_int(&s))
        .filter(|&v| v > 0);
    let Some(legacy) = legacy else {
        return BestScores::default();
    };

    let scores = BestScores {
        normal: legacy,
        ..BestScores::default()
    };
    save_best_scores(store, &scores);
    if let Err(e) = store.remove(LEGACY_BEST_KEY) {
        log::warn!("Could not remove {LEGACY_BEST_KEY}: {e}");
    }
    log::info!("Migrated legacy best score {legacy}");
    scores
}

pub fn save_best_scores<S: KeyValueStore + ?Sized>(store: &mut S, scores: &BestScores) {
    match serde_json::to_string(scores) {
        Ok(json) => write(store, BEST_KEY, &json),
        Err(e) => log::warn!("Could not encode best scores: {e}"),
    }
}

/// Stored difficulty, `Normal` when missing or unknown
pub fn load_difficulty<S: KeyValueStore + ?Sized>(store: &S) -> DifficultyKey {
    read(store, DIFFICULTY_KEY)
        .and_then(|s| DifficultyKey::parse(&s))
        .unwrap_or_default()
}

pub fn save_difficulty<S: KeyValueStore + ?Sized>(store: &mut S, key: DifficultyKey) {
    write(store, DIFFICULTY_KEY, key.as_str());
}
