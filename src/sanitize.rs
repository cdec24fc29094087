//! Embedder options and their sanitisation
//!
//! Each input is checked on its own: a bad colour or font is dropped with a
//! warning and its default used, while everything else still applies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::DifficultyKey;

pub const DEFAULT_FONT: &str = "'Poppins', sans-serif";
pub const MAX_BANNER_LENGTH: usize = 50;
pub const MAX_BANNER_COUNT: usize = 20;

pub const DEFAULT_BANNERS: [&str; 6] = [
    "Second Nature",
    "Flap Responsibly",
    "Mind the Pipes",
    "Keep Calm and Flap On",
    "Touch Grass",
    "Almost Had It",
];

/// Seven-colour palette shared by every layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameColors {
    pub navy: String,
    pub violet: String,
    pub cyan: String,
    pub magenta: String,
    pub light: String,
    pub white: String,
    pub midviolet: String,
}

impl Default for GameColors {
    fn default() -> Self {
        Self {
            navy: "#090949".into(),
            violet: "#6500D9".into(),
            cyan: "#00D9FF".into(),
            magenta: "#D76EFF".into(),
            light: "#FBF6F6".into(),
            white: "#FFFFFF".into(),
            midviolet: "#4B00A0".into(),
        }
    }
}

impl GameColors {
    fn slot_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "navy" => Some(&mut self.navy),
            "violet" => Some(&mut self.violet),
            "cyan" => Some(&mut self.cyan),
            "magenta" => Some(&mut self.magenta),
            "light" => Some(&mut self.light),
            "white" => Some(&mut self.white),
            "midviolet" => Some(&mut self.midviolet),
            _ => None,
        }
    }
}

/// Canvas font strings built from one family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fonts {
    pub family: String,
    pub score: String,
    pub banner: String,
}

impl Fonts {
    pub fn new(family: &str) -> Self {
        Self {
            family: family.to_string(),
            score: format!("700 32px {family}"),
            banner: format!("600 11px {family}"),
        }
    }
}

/// Optional settings supplied by the embedding page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    pub colors: Option<BTreeMap<String, String>>,
    pub banner_texts: Option<Vec<String>>,
    pub font_family: Option<String>,
    pub difficulty: Option<DifficultyKey>,
    pub reduced_motion: Option<bool>,
    pub show_fps: Option<bool>,
    /// Fixed RNG seed; entropy when absent
    pub seed: Option<u64>,
}

/// Options with defaults applied and inputs sanitised
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub colors: GameColors,
    pub fonts: Fonts,
    pub banner_texts: Vec<String>,
}

/// `[A-Za-z0-9]`, whitespace and `-'"(),` only
pub fn sanitize_font_family(input: &str) -> String {
    let valid = !input.is_empty()
        && input
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || "-'\"(),".contains(c));
    if valid {
        return input.to_string();
    }
    log::warn!("Invalid font family rejected, using default: {input:?}");
    DEFAULT_FONT.to_string()
}

/// Cap count and length, strip control characters, drop empties
pub fn sanitize_banner_texts(texts: &[String]) -> Vec<String> {
    texts
        .iter()
        .take(MAX_BANNER_COUNT)
        .map(|t| {
            t.chars()
                .filter(|c| !c.is_ascii_control())
                .take(MAX_BANNER_LENGTH)
                .collect::<String>()
        })
        .filter(|t| !t.is_empty())
        .collect()
}

/// `#` plus 3..=8 hex digits, or a purely alphabetic colour name
pub fn is_valid_color(value: &str) -> bool {
    if let Some(hex) = value.strip_prefix('#') {
        return (3..=8).contains(&hex.len()) && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic())
}

/// Overlay valid overrides onto the default palette
pub fn sanitize_colors(overrides: &BTreeMap<String, String>) -> GameColors {
    let mut colors = GameColors::default();
    for (key, value) in overrides {
        if !is_valid_color(value) {
            log::warn!("Invalid color rejected: {key}={value:?}");
            continue;
        }
        match colors.slot_mut(key) {
            Some(slot) => *slot = value.clone(),
            None => log::warn!("Unknown color key ignored: {key}"),
        }
    }
    colors
}

pub fn default_banners() -> Vec<String> {
    DEFAULT_BANNERS.iter().map(|s| s.to_string()).collect()
}

pub fn resolve_options(options: &EngineOptions) -> ResolvedOptions {
    let colors = options
        .colors
        .as_ref()
        .map(sanitize_colors)
        .unwrap_or_default();
    let family = options
        .font_family
        .as_deref()
        .map(sanitize_font_family)
        .unwrap_or_else(|| DEFAULT_FONT.to_string());
    let banner_texts = match options.banner_texts.as_deref().map(sanitize_banner_texts) {
        Some(texts) if !texts.is_empty() => texts,
        _ => default_banners(),
    };
    ResolvedOptions {
        colors,
        fonts: Fonts::new(&family),
        banner_texts,
    }
}
