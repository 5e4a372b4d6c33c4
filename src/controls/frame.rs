use egui::Color32;
use serde_json::{Value, json};

use super::{
    Control, ControlContext, ControlTarget, color_to_value, commit_history, control_option,
    operation_entry_state, value_to_color,
};
use crate::config::EditorOptions;
use crate::editor::Editor;
use crate::operation::{BORDER, options};
use crate::shared_state::SharedValues;

const DEFAULT_THICKNESS: f32 = 0.05;
const MAX_THICKNESS: f32 = 0.5;

/// Colour presets offered below the picker
pub fn default_colors() -> Vec<Color32> {
    vec![
        Color32::WHITE,
        Color32::BLACK,
        Color32::from_rgb(230, 57, 70),
        Color32::from_rgb(241, 196, 15),
        Color32::from_rgb(46, 134, 222),
        Color32::from_rgb(39, 174, 96),
    ]
}

/// Border around the image; thickness is relative to the shorter side
pub struct FrameControl {
    colors: Vec<Color32>,
}

impl FrameControl {
    pub fn new(options: &EditorOptions) -> Self {
        let colors = control_option(options.control_options("frame"), "colors")
            .and_then(Value::as_array)
            .map(|colors| colors.iter().filter_map(value_to_color).collect::<Vec<_>>())
            .filter(|colors| !colors.is_empty())
            .unwrap_or_else(default_colors);
        Self { colors }
    }

    pub fn colors(&self) -> &[Color32] {
        &self.colors
    }

    fn apply(ctx: &mut ControlContext<'_>, color: Color32, thickness: f32) {
        let thickness = thickness.clamp(0.0, MAX_THICKNESS);
        let result = ctx.editor.set_operation_options(
            BORDER,
            options([("color", color_to_value(color)), ("thickness", json!(thickness))]),
        );
        if let Err(err) = result {
            log::error!("cannot set frame: {}", err);
        }
    }

    fn current(editor: &Editor) -> Option<(Color32, f32)> {
        let operation = editor.operation(BORDER)?;
        let color = operation
            .option("color")
            .and_then(value_to_color)
            .unwrap_or(Color32::WHITE);
        let thickness = operation.option_f32("thickness").unwrap_or(DEFAULT_THICKNESS);
        Some((color, thickness))
    }
}

impl Control for FrameControl {
    fn identifier(&self) -> &'static str {
        "frame"
    }

    fn label(&self) -> &'static str {
        "Frame"
    }

    fn icon(&self) -> &'static str {
        "▣"
    }

    fn is_available(&self, editor: &Editor) -> bool {
        editor.supports_operation(BORDER)
    }

    fn initial_state(&mut self, editor: &mut Editor, extra: SharedValues) -> SharedValues {
        let mut values = operation_entry_state(editor, &[BORDER]);
        values.extend(extra);
        values
    }

    fn on_exit(&mut self, ctx: &mut ControlContext<'_>) {
        commit_history(ctx, &[BORDER]);
    }

    fn panel_ui(&mut self, ui: &mut egui::Ui, ctx: &mut ControlContext<'_>) -> Option<ControlTarget> {
        let current = Self::current(ctx.editor);

        ui.horizontal(|ui| {
            if ui.selectable_label(current.is_none(), "None").clicked() {
                ctx.editor.remove_operation(BORDER);
            }
            for color in &self.colors {
                let selected = current.is_some_and(|(c, _)| c == *color);
                let (rect, response) = ui.allocate_exact_size(egui::vec2(24.0, 24.0), egui::Sense::click());
                ui.painter().rect_filled(rect, 4.0, *color);
                if selected {
                    ui.painter()
                        .rect_stroke(rect, 4.0, egui::Stroke::new(2.0, Color32::from_rgb(100, 181, 246)));
                }
                if response.clicked() {
                    let thickness = current.map_or(DEFAULT_THICKNESS, |(_, t)| t);
                    Self::apply(ctx, *color, thickness);
                }
            }
        });

        if let Some((mut color, mut thickness)) = current {
            ui.horizontal(|ui| {
                let mut changed = ui.color_edit_button_srgba(&mut color).changed();
                changed |= ui
                    .add(egui::Slider::new(&mut thickness, 0.0..=MAX_THICKNESS).text("Thickness"))
                    .changed();
                if changed {
                    Self::apply(ctx, color, thickness);
                }
            });
        }

        ui.add_space(4.0);
        if ui.button("Done").clicked() {
            return Some(ControlTarget::Back);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_colors_replace_defaults() {
        let mut options = EditorOptions::default();
        options
            .controls_options
            .insert("frame".into(), json!({ "colors": [[255, 0, 0], "oops"] }));
        let control = FrameControl::new(&options);
        assert_eq!(control.colors(), &[Color32::from_rgb(255, 0, 0)]);

        let control = FrameControl::new(&EditorOptions::default());
        assert_eq!(control.colors().len(), default_colors().len());
    }
}
