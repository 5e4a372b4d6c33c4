use serde_json::json;

use super::{Control, ControlContext, ControlTarget, commit_history, operation_entry_state};
use crate::editor::Editor;
use crate::operation::{ADJUSTMENTS, OperationOptions};
use crate::shared_state::SharedValues;

const SELECTED_KEY: &str = "selected";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    pub key: &'static str,
    pub label: &'static str,
    pub min: f32,
    pub max: f32,
}

pub const ADJUSTMENT_TOOLS: [Adjustment; 6] = [
    Adjustment { key: "brightness", label: "Brightness", min: -1.0, max: 1.0 },
    Adjustment { key: "saturation", label: "Saturation", min: -1.0, max: 1.0 },
    Adjustment { key: "contrast", label: "Contrast", min: -1.0, max: 1.0 },
    Adjustment { key: "exposure", label: "Exposure", min: -1.0, max: 1.0 },
    Adjustment { key: "shadows", label: "Shadows", min: -1.0, max: 1.0 },
    Adjustment { key: "highlights", label: "Highlights", min: -1.0, max: 1.0 },
];

pub fn adjustment(key: &str) -> Option<&'static Adjustment> {
    ADJUSTMENT_TOOLS.iter().find(|tool| tool.key == key)
}

/// True when every adjustment sits at its neutral value
pub fn is_neutral(options: &OperationOptions) -> bool {
    ADJUSTMENT_TOOLS.iter().all(|tool| {
        options
            .get(tool.key)
            .and_then(|value| value.as_f64())
            .is_none_or(|value| value.abs() < 1e-4)
    })
}

#[derive(Debug, Default)]
pub struct AdjustmentsControl;

impl AdjustmentsControl {
    pub fn new() -> Self {
        Self
    }

    pub fn set_value(&self, ctx: &mut ControlContext<'_>, key: &str, value: f32) {
        let Some(tool) = adjustment(key) else {
            log::warn!("unknown adjustment `{}`", key);
            return;
        };
        let value = value.clamp(tool.min, tool.max);
        let mut options = OperationOptions::new();
        options.insert(key.to_owned(), json!(value));
        if let Err(err) = ctx.editor.set_operation_options(ADJUSTMENTS, options) {
            log::error!("cannot adjust `{}`: {}", key, err);
        }
    }

    fn value(editor: &Editor, key: &str) -> f32 {
        editor
            .operation(ADJUSTMENTS)
            .and_then(|operation| operation.option_f32(key))
            .unwrap_or(0.0)
    }
}

impl Control for AdjustmentsControl {
    fn identifier(&self) -> &'static str {
        "adjustments"
    }

    fn label(&self) -> &'static str {
        "Adjust"
    }

    fn icon(&self) -> &'static str {
        "☀"
    }

    fn is_available(&self, editor: &Editor) -> bool {
        editor.supports_operation(ADJUSTMENTS)
    }

    fn initial_state(&mut self, editor: &mut Editor, extra: SharedValues) -> SharedValues {
        let mut values = operation_entry_state(editor, &[ADJUSTMENTS]);
        values.insert(SELECTED_KEY.to_owned(), json!(ADJUSTMENT_TOOLS[0].key));
        values.extend(extra);
        values
    }

    fn on_exit(&mut self, ctx: &mut ControlContext<'_>) {
        let existed_before = ctx.shared.get_bool("adjustments.existed_before").unwrap_or(false);
        let neutral = ctx
            .editor
            .operation(ADJUSTMENTS)
            .is_some_and(|operation| is_neutral(operation.options()));
        if neutral && !existed_before {
            ctx.editor.remove_operation(ADJUSTMENTS);
            return;
        }
        commit_history(ctx, &[ADJUSTMENTS]);
    }

    fn panel_ui(&mut self, ui: &mut egui::Ui, ctx: &mut ControlContext<'_>) -> Option<ControlTarget> {
        let selected = ctx
            .shared
            .get_string(SELECTED_KEY)
            .unwrap_or_else(|| ADJUSTMENT_TOOLS[0].key.to_owned());

        ui.horizontal(|ui| {
            for tool in &ADJUSTMENT_TOOLS {
                if ui.selectable_label(tool.key == selected, tool.label).clicked() {
                    ctx.shared.set_value(SELECTED_KEY, json!(tool.key));
                }
            }
        });

        if let Some(tool) = adjustment(&selected) {
            let mut value = Self::value(ctx.editor, tool.key);
            ui.horizontal(|ui| {
                let response = ui.add(egui::Slider::new(&mut value, tool.min..=tool.max).text(tool.label));
                if response.changed() {
                    self.set_value(ctx, tool.key, value);
                }
                if ui.button("Reset").clicked() {
                    self.set_value(ctx, tool.key, 0.0);
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
    use crate::operation::options;

    #[test]
    fn neutral_detection() {
        assert!(is_neutral(&OperationOptions::new()));
        assert!(is_neutral(&options([("brightness", json!(0.0))])));
        assert!(!is_neutral(&options([("contrast", json!(0.3))])));
    }

    #[test]
    fn lookup_by_key() {
        assert_eq!(adjustment("shadows").map(|a| a.label), Some("Shadows"));
        assert!(adjustment("gamma").is_none());
    }
}
