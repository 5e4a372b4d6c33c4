use serde_json::{Value, json};

use super::{Control, ControlContext, ControlTarget, commit_history, control_option, operation_entry_state};
use crate::config::EditorOptions;
use crate::editor::Editor;
use crate::operation::{FILTER, options};
use crate::shared_state::SharedValues;

pub const IDENTITY_FILTER: &str = "identity";

const DEFAULT_FILTERS: [(&str, &str); 10] = [
    (IDENTITY_FILTER, "Original"),
    ("bw", "B&W"),
    ("sepia", "Sepia"),
    ("lomo", "Lomo"),
    ("glam", "Glam"),
    ("celsius", "Celsius"),
    ("fridge", "Fridge"),
    ("food", "Food"),
    ("x400", "X400"),
    ("quozi", "Quozi"),
];

const DEFAULT_INTENSITY: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FilterPreset {
    pub identifier: String,
    pub label: String,
}

pub struct FiltersControl {
    filters: Vec<FilterPreset>,
}

impl FiltersControl {
    /// `controls_options.filters.available` restricts the list; identity is always offered
    pub fn new(options: &EditorOptions) -> Self {
        let available: Option<Vec<&str>> = control_option(options.control_options("filters"), "available")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_str).collect());

        let filters = DEFAULT_FILTERS
            .iter()
            .filter(|(identifier, _)| {
                *identifier == IDENTITY_FILTER
                    || available.as_ref().is_none_or(|ids| ids.contains(identifier))
            })
            .map(|(identifier, label)| FilterPreset {
                identifier: (*identifier).to_owned(),
                label: (*label).to_owned(),
            })
            .collect();
        Self { filters }
    }

    pub fn filters(&self) -> &[FilterPreset] {
        &self.filters
    }

    /// Applies `identifier`; choosing the identity filter removes the operation
    pub fn select(&self, ctx: &mut ControlContext<'_>, identifier: &str) {
        ctx.shared.set_value("filter", json!(identifier));
        if identifier == IDENTITY_FILTER {
            ctx.editor.remove_operation(FILTER);
            return;
        }

        let intensity = ctx
            .editor
            .operation(FILTER)
            .and_then(|operation| operation.option_f32("intensity"))
            .unwrap_or(DEFAULT_INTENSITY);
        let result = ctx.editor.set_operation_options(
            FILTER,
            options([("filter", json!(identifier)), ("intensity", json!(intensity))]),
        );
        if let Err(err) = result {
            log::error!("cannot apply filter `{}`: {}", identifier, err);
        }
    }

    pub fn set_intensity(&self, ctx: &mut ControlContext<'_>, intensity: f32) {
        let intensity = intensity.clamp(0.0, 1.0);
        ctx.editor
            .update_operation(FILTER, |operation| operation.set_option("intensity", json!(intensity)));
    }
}

impl Control for FiltersControl {
    fn identifier(&self) -> &'static str {
        "filters"
    }

    fn label(&self) -> &'static str {
        "Filters"
    }

    fn icon(&self) -> &'static str {
        "◐"
    }

    fn is_available(&self, editor: &Editor) -> bool {
        editor.supports_operation(FILTER)
    }

    fn initial_state(&mut self, editor: &mut Editor, extra: SharedValues) -> SharedValues {
        let mut values = operation_entry_state(editor, &[FILTER]);
        let current = editor
            .operation(FILTER)
            .and_then(|operation| operation.option_str("filter"))
            .unwrap_or(IDENTITY_FILTER)
            .to_owned();
        values.insert("filter".to_owned(), json!(current));
        values.extend(extra);
        values
    }

    fn on_exit(&mut self, ctx: &mut ControlContext<'_>) {
        commit_history(ctx, &[FILTER]);
    }

    fn panel_ui(&mut self, ui: &mut egui::Ui, ctx: &mut ControlContext<'_>) -> Option<ControlTarget> {
        let selected = ctx
            .shared
            .get_string("filter")
            .unwrap_or_else(|| IDENTITY_FILTER.to_owned());

        let mut clicked = None;
        egui::ScrollArea::horizontal().show(ui, |ui| {
            ui.horizontal(|ui| {
                for filter in &self.filters {
                    if ui
                        .selectable_label(filter.identifier == selected, &filter.label)
                        .clicked()
                    {
                        clicked = Some(filter.identifier.clone());
                    }
                }
            });
        });
        if let Some(identifier) = clicked {
            self.select(ctx, &identifier);
        }

        let intensity = ctx
            .editor
            .operation(FILTER)
            .and_then(|operation| operation.option_f32("intensity"));
        if let Some(mut intensity) = intensity {
            let response = ui.add(egui::Slider::new(&mut intensity, 0.0..=1.0).text("Intensity"));
            if response.changed() {
                self.set_intensity(ctx, intensity);
            }
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
    fn available_filters_are_restricted_but_keep_identity() {
        let mut options = EditorOptions::default();
        options
            .controls_options
            .insert("filters".into(), json!({ "available": ["sepia", "missing"] }));
        let control = FiltersControl::new(&options);
        let ids: Vec<&str> = control.filters().iter().map(|f| f.identifier.as_str()).collect();
        assert_eq!(ids, vec![IDENTITY_FILTER, "sepia"]);

        let all = FiltersControl::new(&EditorOptions::default());
        assert_eq!(all.filters().len(), DEFAULT_FILTERS.len());
    }
}
