//! Operations are the named, stateful image transformations the external SDK applies.
//!
//! The editor only tracks their options, enabled and dirty flags; what an operation
//! actually does to pixels is the SDK's business.

mod stack;

pub use stack::OperationStack;

use egui::{Vec2, vec2};
use serde_json::{Map, Value, json};

/// Serializable option map of an operation
pub type OperationOptions = Map<String, Value>;

pub const CROP: &str = "crop";
pub const ORIENTATION: &str = "orientation";
pub const FILTER: &str = "filter";
pub const ADJUSTMENTS: &str = "adjustments";
pub const TILT_SHIFT: &str = "tilt-shift";
pub const RADIAL_BLUR: &str = "radial-blur";
pub const BRUSH: &str = "brush";
pub const SPRITE: &str = "sprite";
pub const BORDER: &str = "border";
pub const WATERMARK: &str = "watermark";

/// Fixed application order used when no `operations_order` is configured
pub const DEFAULT_OPERATIONS_ORDER: &[&str] = &[
    ORIENTATION,
    CROP,
    FILTER,
    ADJUSTMENTS,
    TILT_SHIFT,
    RADIAL_BLUR,
    BRUSH,
    SPRITE,
    BORDER,
    WATERMARK,
];

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    identifier: String,
    options: OperationOptions,
    enabled: bool,
    dirty: bool,
    version: u64,
}

impl Operation {
    pub fn new(identifier: impl Into<String>, options: OperationOptions) -> Self {
        Self {
            identifier: identifier.into(),
            options,
            enabled: true,
            dirty: true,
            version: 0,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Shallow-merges `options` into the current ones and marks the operation dirty.
    pub fn set(&mut self, options: OperationOptions) {
        for (key, value) in options {
            self.options.insert(key, value);
        }
        self.touch();
    }

    pub fn set_option(&mut self, key: &str, value: Value) {
        self.options.insert(key.to_owned(), value);
        self.touch();
    }

    /// Replaces the whole option map, used when restoring a history snapshot.
    pub fn replace_options(&mut self, options: OperationOptions) {
        self.options = options;
        self.touch();
    }

    pub fn serialize_options(&self) -> OperationOptions {
        self.options.clone()
    }

    pub fn options(&self) -> &OperationOptions {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn option_f32(&self, key: &str) -> Option<f32> {
        self.options.get(key).and_then(Value::as_f64).map(|v| v as f32)
    }

    pub fn option_bool(&self, key: &str) -> Option<bool> {
        self.options.get(key).and_then(Value::as_bool)
    }

    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }

    pub fn option_vec2(&self, key: &str) -> Option<Vec2> {
        self.options.get(key).and_then(value_to_vec2)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.touch();
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Bumped on every change; the SDK uses it to key cached output
    pub fn version(&self) -> u64 {
        self.version
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.version += 1;
    }
}

pub fn vec2_to_value(v: Vec2) -> Value {
    json!({ "x": v.x, "y": v.y })
}

pub fn value_to_vec2(value: &Value) -> Option<Vec2> {
    let x = value.get("x")?.as_f64()?;
    let y = value.get("y")?.as_f64()?;
    Some(vec2(x as f32, y as f32))
}

/// Builds an option map from `(key, value)` pairs.
pub fn options<I, K>(pairs: I) -> OperationOptions
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_merges_and_marks_dirty() {
        let mut op = Operation::new(FILTER, options([("filter", json!("identity"))]));
        op.set_dirty(false);

        op.set(options([("intensity", json!(0.5))]));

        assert!(op.is_dirty());
        assert_eq!(op.option_str("filter"), Some("identity"));
        assert_eq!(op.option_f32("intensity"), Some(0.5));
        assert_eq!(op.version(), 1);
    }

    #[test]
    fn vec2_options_round_trip() {
        let mut op = Operation::new(CROP, OperationOptions::new());
        op.set_option("start", vec2_to_value(vec2(0.25, 0.5)));
        assert_eq!(op.option_vec2("start"), Some(vec2(0.25, 0.5)));
        assert_eq!(op.option_vec2("end"), None);
    }

    #[test]
    fn set_enabled_only_touches_on_change() {
        let mut op = Operation::new(WATERMARK, OperationOptions::new());
        op.set_dirty(false);
        op.set_enabled(true);
        assert!(!op.is_dirty());
        op.set_enabled(false);
        assert!(op.is_dirty());
        assert!(!op.is_enabled());
    }
}
