//! Per-tool controls: each pairs a lower panel with an optional canvas overlay and edits
//! one operation (or a small group of them) through the editor facade.

pub mod adjustments;
pub mod brush;
pub mod crop;
pub mod filters;
pub mod focus;
pub mod frame;
pub mod orientation;
pub mod registry;
pub mod sprite;
pub mod stickers;
pub mod switcher;
pub mod text;

pub use registry::{ControlDescriptor, ControlsRegistry};
pub use switcher::ControlSwitcher;

use egui::{Pos2, Rect, Response, Vec2};
use serde_json::Value;

use crate::editor::{Editor, Feature, HistoryEntry};
use crate::geometry;
use crate::modal::ModalService;
use crate::operation::OperationOptions;
use crate::shared_state::{SharedState, SharedValues};

/// Everything a control may touch, passed explicitly on every call
pub struct ControlContext<'a> {
    pub editor: &'a mut Editor,
    pub shared: &'a SharedState,
    pub modals: &'a mut dyn ModalService,
}

/// Where to switch controls next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlTarget {
    /// Back to the control overview; clears the back stack
    Home,
    /// Return to the previous control
    Back,
    Control(String),
}

/// Screen placement of the canvas and of the rendered image inside it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasView {
    pub canvas: Rect,
    pub image: Rect,
}

impl CanvasView {
    pub fn to_normalized(&self, pos: Pos2) -> Vec2 {
        geometry::to_normalized(self.image, pos)
    }

    pub fn from_normalized(&self, v: Vec2) -> Pos2 {
        geometry::from_normalized(self.image, v)
    }

    /// Length of the shorter image side on screen
    pub fn reference_length(&self) -> f32 {
        self.image.width().min(self.image.height()).max(1.0)
    }
}

pub trait Control {
    fn identifier(&self) -> &'static str;

    fn label(&self) -> &'static str;

    fn icon(&self) -> &'static str {
        "•"
    }

    /// Whether the control can run against this editor (e.g. its operations are configured)
    fn is_available(&self, editor: &Editor) -> bool;

    /// Prepares the operation(s) this control edits and returns the activation's shared state
    fn initial_state(&mut self, editor: &mut Editor, extra: SharedValues) -> SharedValues;

    /// Runs when the user switches away: commit history, restore suspended features
    fn on_exit(&mut self, _ctx: &mut ControlContext<'_>) {}

    /// Lower panel. Returning a target asks the screen to switch controls.
    fn panel_ui(&mut self, ui: &mut egui::Ui, ctx: &mut ControlContext<'_>) -> Option<ControlTarget>;

    /// Overlay drawn above the rendered image
    fn canvas_ui(&mut self, _ui: &mut egui::Ui, _view: &CanvasView, _ctx: &mut ControlContext<'_>) {}
}

fn existed_key(identifier: &str) -> String {
    format!("{identifier}.existed_before")
}

fn initial_options_key(identifier: &str) -> String {
    format!("{identifier}.initial_options")
}

/// Snapshot of `identifiers` taken when a control is entered
pub fn operation_entry_state(editor: &Editor, identifiers: &[&str]) -> SharedValues {
    let mut values = SharedValues::new();
    for identifier in identifiers {
        let existing = editor.operation(identifier);
        values.insert(existed_key(identifier), Value::Bool(existing.is_some()));
        values.insert(
            initial_options_key(identifier),
            Value::Object(existing.map(|op| op.serialize_options()).unwrap_or_default()),
        );
    }
    values
}

/// History entry for `identifier` if it changed since the control was entered
pub fn pending_history(ctx: &ControlContext<'_>, identifier: &str) -> Option<HistoryEntry> {
    let existed_before = ctx.shared.get_bool(&existed_key(identifier)).unwrap_or(false);
    let initial = match ctx.shared.get(&initial_options_key(identifier)) {
        Some(Value::Object(options)) => options,
        _ => OperationOptions::new(),
    };

    let changed = match ctx.editor.operation(identifier) {
        Some(operation) => !existed_before || operation.options() != &initial,
        None => existed_before,
    };
    changed.then(|| HistoryEntry {
        operation: identifier.to_owned(),
        options: initial,
        existed_before,
    })
}

/// Records every changed operation of `identifiers` as a single undo step.
///
/// Returns whether a step was added.
pub fn commit_history(ctx: &mut ControlContext<'_>, identifiers: &[&str]) -> bool {
    let current: &ControlContext<'_> = ctx;
    let entries: Vec<HistoryEntry> = identifiers
        .iter()
        .filter_map(|identifier| pending_history(current, identifier))
        .collect();
    let changed = !entries.is_empty();
    ctx.editor.add_history_step(entries);
    changed
}

/// Suspends canvas zoom and pan for the duration of a control's own drag gesture
pub fn suspend_canvas_while_dragging(editor: &mut Editor, response: &Response) {
    if response.drag_started() {
        editor.disable_features(&[Feature::Zoom, Feature::Drag]);
    }
    if response.drag_stopped() {
        editor.enable_features(&[Feature::Zoom, Feature::Drag]);
    }
}

/// Per-control option from `controls_options`, e.g. `controls_options.filters.available`
pub fn control_option<'a>(options: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    options.and_then(|options| options.get(key))
}

pub fn color_to_value(color: egui::Color32) -> Value {
    Value::from(color.to_srgba_unmultiplied().to_vec())
}

pub fn value_to_color(value: &Value) -> Option<egui::Color32> {
    let channels = value.as_array()?;
    let channel = |i: usize| channels.get(i).and_then(Value::as_u64).map(|c| c.min(255) as u8);
    Some(egui::Color32::from_rgba_unmultiplied(
        channel(0)?,
        channel(1)?,
        channel(2)?,
        channel(3).unwrap_or(255),
    ))
}
