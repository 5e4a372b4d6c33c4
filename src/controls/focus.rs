//! Focus control: radial and linear (tilt-shift) blur with knobs on the canvas.
//!
//! Radii are stored relative to the shorter image side so they survive crops and zoom.

use egui::{Color32, Stroke, Vec2, vec2};
use serde_json::json;

use super::{
    CanvasView, Control, ControlContext, ControlTarget, commit_history, operation_entry_state,
    suspend_canvas_while_dragging,
};
use crate::editor::Editor;
use crate::operation::{OperationOptions, RADIAL_BLUR, TILT_SHIFT, options, vec2_to_value};
use crate::shared_state::SharedValues;
use crate::widgets::knob::Knob;

const MODE_KEY: &str = "mode";
const MIN_GRADIENT_RADIUS: f32 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMode {
    None,
    Radial,
    Linear,
}

impl FocusMode {
    pub const ALL: [FocusMode; 3] = [FocusMode::None, FocusMode::Radial, FocusMode::Linear];

    pub fn as_str(self) -> &'static str {
        match self {
            FocusMode::None => "none",
            FocusMode::Radial => "radial",
            FocusMode::Linear => "linear",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == value)
    }

    pub fn label(self) -> &'static str {
        match self {
            FocusMode::None => "None",
            FocusMode::Radial => "Radial",
            FocusMode::Linear => "Linear",
        }
    }

    fn operation(self) -> Option<&'static str> {
        match self {
            FocusMode::None => None,
            FocusMode::Radial => Some(RADIAL_BLUR),
            FocusMode::Linear => Some(TILT_SHIFT),
        }
    }

    fn default_options(self) -> OperationOptions {
        match self {
            FocusMode::None => OperationOptions::new(),
            FocusMode::Radial => options([
                ("position", vec2_to_value(vec2(0.5, 0.5))),
                ("gradient_radius", json!(0.15)),
                ("blur_radius", json!(0.3)),
            ]),
            FocusMode::Linear => options([
                ("start", vec2_to_value(vec2(0.5, 0.3))),
                ("end", vec2_to_value(vec2(0.5, 0.7))),
                ("gradient_radius", json!(0.1)),
                ("blur_radius", json!(0.3)),
            ]),
        }
    }
}

/// Gradient radius for a knob dragged to `knob`, relative to `reference` pixels
pub fn gradient_radius_from_knob(center: Vec2, knob: Vec2, reference: f32) -> f32 {
    ((knob - center).length() / reference.max(1.0)).max(MIN_GRADIENT_RADIUS)
}

/// The two bands bounding a linear gradient: perpendicular to start→end, through each end
pub fn linear_band(start: Vec2, end: Vec2, half_length: f32) -> [(Vec2, Vec2); 2] {
    let direction = (end - start).normalized();
    let normal = if direction.is_finite() {
        vec2(-direction.y, direction.x)
    } else {
        vec2(1.0, 0.0)
    };
    [start, end].map(|point| (point - normal * half_length, point + normal * half_length))
}

#[derive(Debug, Default)]
pub struct FocusControl;

impl FocusControl {
    pub fn new() -> Self {
        Self
    }

    fn mode(editor: &Editor) -> FocusMode {
        if editor.operation(RADIAL_BLUR).is_some() {
            FocusMode::Radial
        } else if editor.operation(TILT_SHIFT).is_some() {
            FocusMode::Linear
        } else {
            FocusMode::None
        }
    }

    /// Switches mode: the other focus operation is removed
    pub fn select_mode(&self, ctx: &mut ControlContext<'_>, mode: FocusMode) {
        ctx.shared.set_value(MODE_KEY, json!(mode.as_str()));
        for other in [RADIAL_BLUR, TILT_SHIFT] {
            if mode.operation() != Some(other) {
                ctx.editor.remove_operation(other);
            }
        }
        if let Some(identifier) = mode.operation() {
            if let Err(err) = ctx.editor.get_or_create_operation(identifier, mode.default_options()) {
                log::error!("cannot enable focus `{}`: {}", mode.as_str(), err);
                return;
            }
            ctx.editor.render(None);
        }
    }

    fn set(ctx: &mut ControlContext<'_>, identifier: &str, key: &str, value: serde_json::Value) {
        ctx.editor
            .update_operation(identifier, |operation| operation.set_option(key, value));
    }

    fn radial_ui(&mut self, ui: &mut egui::Ui, view: &CanvasView, ctx: &mut ControlContext<'_>) {
        let Some(operation) = ctx.editor.operation(RADIAL_BLUR) else {
            return;
        };
        let position = operation.option_vec2("position").unwrap_or(vec2(0.5, 0.5));
        let radius = operation.option_f32("gradient_radius").unwrap_or(0.15);

        let center = view.from_normalized(position);
        let radius_px = radius * view.reference_length();
        ui.painter()
            .circle_stroke(center, radius_px, Stroke::new(1.5, Color32::WHITE));

        let response = Knob::new("focus_center", center).show(ui);
        suspend_canvas_while_dragging(ctx.editor, &response);
        if response.dragged() {
            if let Some(pointer) = response.interact_pointer_pos() {
                let position = view.to_normalized(pointer).clamp(Vec2::ZERO, Vec2::splat(1.0));
                Self::set(ctx, RADIAL_BLUR, "position", vec2_to_value(position));
            }
        }

        let knob = center + vec2(radius_px, 0.0);
        let response = Knob::new("focus_radius", knob).show(ui);
        suspend_canvas_while_dragging(ctx.editor, &response);
        if response.dragged() {
            if let Some(pointer) = response.interact_pointer_pos() {
                let radius = gradient_radius_from_knob(center.to_vec2(), pointer.to_vec2(), view.reference_length());
                Self::set(ctx, RADIAL_BLUR, "gradient_radius", json!(radius));
            }
        }
    }

    fn linear_ui(&mut self, ui: &mut egui::Ui, view: &CanvasView, ctx: &mut ControlContext<'_>) {
        let Some(operation) = ctx.editor.operation(TILT_SHIFT) else {
            return;
        };
        let start = operation.option_vec2("start").unwrap_or(vec2(0.5, 0.3));
        let end = operation.option_vec2("end").unwrap_or(vec2(0.5, 0.7));

        let start_px = view.from_normalized(start);
        let end_px = view.from_normalized(end);
        let half_length = view.canvas.width().max(view.canvas.height());
        let stroke = Stroke::new(1.0, Color32::from_white_alpha(180));
        for (a, b) in linear_band(start_px.to_vec2(), end_px.to_vec2(), half_length) {
            ui.painter().line_segment([a.to_pos2(), b.to_pos2()], stroke);
        }

        for (key, pos) in [("start", start_px), ("end", end_px)] {
            let response = Knob::new(("focus", key), pos).show(ui);
            suspend_canvas_while_dragging(ctx.editor, &response);
            if response.dragged() {
                if let Some(pointer) = response.interact_pointer_pos() {
                    let value = view.to_normalized(pointer).clamp(Vec2::ZERO, Vec2::splat(1.0));
                    Self::set(ctx, TILT_SHIFT, key, vec2_to_value(value));
                }
            }
        }
    }
}

impl Control for FocusControl {
    fn identifier(&self) -> &'static str {
        "focus"
    }

    fn label(&self) -> &'static str {
        "Focus"
    }

    fn icon(&self) -> &'static str {
        "◎"
    }

    fn is_available(&self, editor: &Editor) -> bool {
        editor.supports_operation(RADIAL_BLUR) || editor.supports_operation(TILT_SHIFT)
    }

    fn initial_state(&mut self, editor: &mut Editor, extra: SharedValues) -> SharedValues {
        let mut values = operation_entry_state(editor, &[RADIAL_BLUR, TILT_SHIFT]);
        values.insert(MODE_KEY.to_owned(), json!(Self::mode(editor).as_str()));
        values.extend(extra);
        values
    }

    fn on_exit(&mut self, ctx: &mut ControlContext<'_>) {
        let identifiers: Vec<&str> = [RADIAL_BLUR, TILT_SHIFT]
            .into_iter()
            .filter(|identifier| ctx.editor.supports_operation(identifier))
            .collect();
        commit_history(ctx, &identifiers);
    }

    fn panel_ui(&mut self, ui: &mut egui::Ui, ctx: &mut ControlContext<'_>) -> Option<ControlTarget> {
        let current = ctx
            .shared
            .get_string(MODE_KEY)
            .and_then(|mode| FocusMode::parse(&mode))
            .unwrap_or(FocusMode::None);

        let mut clicked = None;
        ui.horizontal(|ui| {
            for mode in FocusMode::ALL {
                let supported = mode
                    .operation()
                    .is_none_or(|identifier| ctx.editor.supports_operation(identifier));
                if ui
                    .add_enabled(supported, egui::SelectableLabel::new(mode == current, mode.label()))
                    .clicked()
                {
                    clicked = Some(mode);
                }
            }
        });
        if let Some(mode) = clicked.filter(|mode| *mode != current) {
            self.select_mode(ctx, mode);
        }

        if let Some(identifier) = Self::mode(ctx.editor).operation() {
            let blur = ctx
                .editor
                .operation(identifier)
                .and_then(|operation| operation.option_f32("blur_radius"));
            if let Some(mut blur) = blur {
                if ui
                    .add(egui::Slider::new(&mut blur, 0.0..=1.0).text("Blur"))
                    .changed()
                {
                    Self::set(ctx, identifier, "blur_radius", json!(blur));
                }
            }
        }

        ui.add_space(4.0);
        if ui.button("Done").clicked() {
            return Some(ControlTarget::Back);
        }
        None
    }

    fn canvas_ui(&mut self, ui: &mut egui::Ui, view: &CanvasView, ctx: &mut ControlContext<'_>) {
        match Self::mode(ctx.editor) {
            FocusMode::Radial => self.radial_ui(ui, view, ctx),
            FocusMode::Linear => self.linear_ui(ui, view, ctx),
            FocusMode::None => {}
        }
    }
}
