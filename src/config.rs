//! Editor configuration, loaded from JSON.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::export::ExportOptions;
use crate::operation::DEFAULT_OPERATIONS_ORDER;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("operation `{0}` appears more than once in operations_order")]
    DuplicateOperation(String),

    #[error("max_megapixels must be positive")]
    InvalidMegapixels,
}

/// Which megapixel cap applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    Mobile,
    #[default]
    Desktop,
}

impl Platform {
    /// Screens narrower than this are treated as mobile when `responsive` is on
    pub const MOBILE_BREAKPOINT: f32 = 600.0;

    pub fn from_screen_width(width: f32) -> Self {
        if width < Self::MOBILE_BREAKPOINT {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaxMegaPixels {
    Single(f32),
    PerPlatform { mobile: f32, desktop: f32 },
}

impl Default for MaxMegaPixels {
    fn default() -> Self {
        Self::PerPlatform {
            mobile: 5.0,
            desktop: 10.0,
        }
    }
}

impl MaxMegaPixels {
    pub fn resolve(&self, platform: Platform) -> f32 {
        match (*self, platform) {
            (Self::Single(value), _) => value,
            (Self::PerPlatform { mobile, .. }, Platform::Mobile) => mobile,
            (Self::PerPlatform { desktop, .. }, Platform::Desktop) => desktop,
        }
    }

    /// Pixel cap for `platform`
    pub fn max_pixels(&self, platform: Platform) -> u64 {
        (f64::from(self.resolve(platform)) * 1_000_000.0).floor() as u64
    }
}

/// An entry of `controls_order`: a single control or a group rendered between separators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlsOrderEntry {
    Control(String),
    Group(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsOptions {
    pub base_url: PathBuf,
    /// Optional per-asset overrides, consulted before `base_url`
    pub overrides: HashMap<String, PathBuf>,
}

impl Default for AssetsOptions {
    fn default() -> Self {
        Self {
            base_url: PathBuf::from("assets"),
            overrides: HashMap::new(),
        }
    }
}

impl AssetsOptions {
    pub fn resolve(&self, path: &str) -> PathBuf {
        match self.overrides.get(path) {
            Some(resolved) => resolved.clone(),
            None => self.base_url.join(path),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)] // missing fields fall back to the defaults below
pub struct EditorOptions {
    /// Enabled control identifiers
    pub tools: Vec<String>,
    pub controls_order: Vec<ControlsOrderEntry>,
    /// Fixed application order of operations; every identifier ever created must be listed
    pub operations_order: Vec<String>,
    /// Per-control overrides, keyed by control identifier
    pub controls_options: HashMap<String, serde_json::Value>,
    pub max_megapixels: MaxMegaPixels,
    pub assets: AssetsOptions,
    pub export: ExportOptions,
    pub webcam: bool,
    pub responsive: bool,
    /// Reserved. Accepted and logged at startup; the UI ships English strings only.
    pub language: String,
}

impl Default for EditorOptions {
    fn default() -> Self {
        let tools: Vec<String> = [
            "crop",
            "orientation",
            "filters",
            "adjustments",
            "focus",
            "frame",
            "stickers",
            "text",
            "brush",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            controls_order: vec![
                ControlsOrderEntry::Group(vec!["crop".into(), "orientation".into()]),
                ControlsOrderEntry::Group(vec![
                    "filters".into(),
                    "adjustments".into(),
                    "focus".into(),
                ]),
                ControlsOrderEntry::Group(vec![
                    "stickers".into(),
                    "text".into(),
                    "brush".into(),
                    "frame".into(),
                ]),
            ],
            tools,
            operations_order: DEFAULT_OPERATIONS_ORDER.iter().map(|id| id.to_string()).collect(),
            controls_options: HashMap::new(),
            max_megapixels: MaxMegaPixels::default(),
            assets: AssetsOptions::default(),
            export: ExportOptions::default(),
            webcam: true,
            responsive: true,
            language: "en".to_owned(),
        }
    }
}

impl EditorOptions {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let options = Self::from_json(&contents)?;
        log::info!("loaded editor options from {}", path.display());
        Ok(options)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for identifier in &self.operations_order {
            if !seen.insert(identifier.as_str()) {
                return Err(ConfigError::DuplicateOperation(identifier.clone()));
            }
        }

        let valid = match self.max_megapixels {
            MaxMegaPixels::Single(value) => value > 0.0,
            MaxMegaPixels::PerPlatform { mobile, desktop } => mobile > 0.0 && desktop > 0.0,
        };
        if !valid {
            return Err(ConfigError::InvalidMegapixels);
        }

        for identifier in self.ordered_controls().into_iter().flatten() {
            if !self.tools.iter().any(|tool| tool == identifier) {
                log::warn!("controls_order lists `{}` which is not an enabled tool", identifier);
            }
        }
        Ok(())
    }

    pub fn control_options(&self, identifier: &str) -> Option<&serde_json::Value> {
        self.controls_options.get(identifier)
    }

    /// Enabled tools grouped as `controls_order` describes.
    ///
    /// Tools missing from `controls_order` are appended as a trailing group.
    pub fn ordered_controls(&self) -> Vec<Vec<&str>> {
        let mut groups: Vec<Vec<&str>> = self
            .controls_order
            .iter()
            .map(|entry| match entry {
                ControlsOrderEntry::Control(id) => vec![id.as_str()],
                ControlsOrderEntry::Group(ids) => ids.iter().map(String::as_str).collect(),
            })
            .map(|group| {
                group
                    .into_iter()
                    .filter(|id| self.tools.iter().any(|tool| tool == id))
                    .collect::<Vec<_>>()
            })
            .filter(|group| !group.is_empty())
            .collect();

        let listed: HashSet<&str> = groups.iter().flatten().copied().collect();
        let rest: Vec<&str> = self
            .tools
            .iter()
            .map(String::as_str)
            .filter(|id| !listed.contains(id))
            .collect();
        if !rest.is_empty() {
            groups.push(rest);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn megapixels_accept_single_and_per_platform() {
        let options = EditorOptions::from_json(r#"{ "max_megapixels": 2 }"#).unwrap();
        assert_eq!(options.max_megapixels.max_pixels(Platform::Mobile), 2_000_000);

        let options =
            EditorOptions::from_json(r#"{ "max_megapixels": { "mobile": 4, "desktop": 10 } }"#)
                .unwrap();
        assert_eq!(options.max_megapixels.max_pixels(Platform::Desktop), 10_000_000);
        assert_eq!(options.max_megapixels.max_pixels(Platform::Mobile), 4_000_000);
    }

    #[test]
    fn language_is_carried_through_unchanged() {
        assert_eq!(EditorOptions::default().language, "en");
        let options = EditorOptions::from_json(r#"{ "language": "de" }"#).unwrap();
        assert_eq!(options.language, "de");
    }

    #[test]
    fn duplicate_operations_are_rejected() {
        let err = EditorOptions::from_json(r#"{ "operations_order": ["crop", "filter", "crop"] }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateOperation(id) if id == "crop"));
    }

    #[test]
    fn ordered_controls_keep_groups_and_append_unlisted_tools() {
        let options = EditorOptions::from_json(
            r#"{
                "tools": ["crop", "filters", "brush"],
                "controls_order": [["crop", "text"], "filters"]
            }"#,
        )
        .unwrap();

        assert_eq!(
            options.ordered_controls(),
            vec![vec!["crop"], vec!["filters"], vec!["brush"]]
        );
    }

    #[test]
    fn assets_resolve_overrides_first() {
        let mut assets = AssetsOptions::default();
        assets
            .overrides
            .insert("stickers/stickers.json".into(), PathBuf::from("/tmp/custom.json"));
        assert_eq!(assets.resolve("stickers/stickers.json"), PathBuf::from("/tmp/custom.json"));
        assert_eq!(assets.resolve("fonts/a.ttf"), PathBuf::from("assets").join("fonts/a.ttf"));
    }
}
