use egui::{Color32, Pos2, Stroke, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{
    CanvasView, Control, ControlContext, ControlTarget, color_to_value, commit_history, control_option,
    operation_entry_state, value_to_color,
};
use crate::config::EditorOptions;
use crate::editor::{Editor, Feature};
use crate::operation::{BRUSH, options};
use crate::shared_state::SharedValues;

const PATHS_KEY: &str = "paths";
const COLOR_KEY: &str = "color";
const THICKNESS_KEY: &str = "thickness";

/// Thickness relative to the image width
const DEFAULT_THICKNESS: f32 = 0.01;
/// Points closer than this (normalized) to the previous one are skipped
const MIN_POINT_DISTANCE: f32 = 0.002;

/// One freehand stroke in normalized image coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushPath {
    pub points: Vec<[f32; 2]>,
    pub color: [u8; 4],
    pub thickness: f32,
}

impl BrushPath {
    pub fn new(color: Color32, thickness: f32) -> Self {
        Self {
            points: Vec::new(),
            color: color.to_srgba_unmultiplied(),
            thickness,
        }
    }

    /// Appends `point` unless it is too close to the last one. Returns whether it was added.
    pub fn push(&mut self, point: Vec2) -> bool {
        let point = point.clamp(Vec2::ZERO, Vec2::splat(1.0));
        if let Some(last) = self.points.last() {
            if (Vec2::from(*last) - point).length() < MIN_POINT_DISTANCE {
                return false;
            }
        }
        self.points.push([point.x, point.y]);
        true
    }

    pub fn color(&self) -> Color32 {
        Color32::from_rgba_unmultiplied(self.color[0], self.color[1], self.color[2], self.color[3])
    }
}

pub fn read_paths(editor: &Editor) -> Vec<BrushPath> {
    editor
        .operation(BRUSH)
        .and_then(|operation| operation.option(PATHS_KEY))
        .and_then(|value| serde_json::from_value(value.clone()).ok())
        .unwrap_or_default()
}

/// Paints `paths` over the image
pub fn paint_paths(painter: &egui::Painter, view: &CanvasView, paths: &[BrushPath]) {
    let width = view.image.width();
    for path in paths {
        let stroke = Stroke::new((path.thickness * width).max(1.0), path.color());
        let points: Vec<Pos2> = path
            .points
            .iter()
            .map(|point| view.from_normalized(Vec2::from(*point)))
            .collect();
        match points.as_slice() {
            [] => {}
            [single] => {
                painter.circle_filled(*single, stroke.width / 2.0, stroke.color);
            }
            _ => {
                painter.add(egui::Shape::line(points, stroke));
            }
        }
    }
}

pub struct BrushControl {
    colors: Vec<Color32>,
    current: Option<BrushPath>,
}

impl BrushControl {
    pub fn new(options: &EditorOptions) -> Self {
        let colors = control_option(options.control_options("brush"), "colors")
            .and_then(Value::as_array)
            .map(|colors| colors.iter().filter_map(value_to_color).collect::<Vec<_>>())
            .filter(|colors| !colors.is_empty())
            .unwrap_or_else(super::frame::default_colors);
        Self { colors, current: None }
    }

    fn brush(ctx: &ControlContext<'_>) -> (Color32, f32) {
        let color = ctx
            .shared
            .get(COLOR_KEY)
            .and_then(|value| value_to_color(&value))
            .unwrap_or(Color32::WHITE);
        let thickness = ctx.shared.get_f32(THICKNESS_KEY).unwrap_or(DEFAULT_THICKNESS);
        (color, thickness)
    }

    fn commit_path(ctx: &mut ControlContext<'_>, path: BrushPath) {
        let mut paths = read_paths(ctx.editor);
        paths.push(path);
        let value = serde_json::to_value(&paths).unwrap_or(Value::Array(Vec::new()));
        if let Err(err) = ctx.editor.set_operation_options(BRUSH, options([(PATHS_KEY, value)])) {
            log::error!("cannot store brush path: {}", err);
        }
    }

    pub fn clear(&self, ctx: &mut ControlContext<'_>) {
        ctx.editor
            .update_operation(BRUSH, |operation| operation.set_option(PATHS_KEY, json!([])));
    }
}

impl Control for BrushControl {
    fn identifier(&self) -> &'static str {
        "brush"
    }

    fn label(&self) -> &'static str {
        "Brush"
    }

    fn icon(&self) -> &'static str {
        "✎"
    }

    fn is_available(&self, editor: &Editor) -> bool {
        editor.supports_operation(BRUSH)
    }

    fn initial_state(&mut self, editor: &mut Editor, extra: SharedValues) -> SharedValues {
        self.current = None;
        let mut values = operation_entry_state(editor, &[BRUSH]);
        let color = self.colors.first().copied().unwrap_or(Color32::WHITE);
        values.insert(COLOR_KEY.to_owned(), color_to_value(color));
        values.insert(THICKNESS_KEY.to_owned(), json!(DEFAULT_THICKNESS));
        editor.disable_features(&[Feature::Drag, Feature::Zoom]);
        values.extend(extra);
        values
    }

    fn on_exit(&mut self, ctx: &mut ControlContext<'_>) {
        if let Some(path) = self.current.take().filter(|path| !path.points.is_empty()) {
            Self::commit_path(ctx, path);
        }

        let existed_before = ctx.shared.get_bool("brush.existed_before").unwrap_or(false);
        if !existed_before && read_paths(ctx.editor).is_empty() {
            ctx.editor.remove_operation(BRUSH);
        } else {
            commit_history(ctx, &[BRUSH]);
        }
        ctx.editor.enable_features(&[Feature::Drag, Feature::Zoom]);
    }

    fn panel_ui(&mut self, ui: &mut egui::Ui, ctx: &mut ControlContext<'_>) -> Option<ControlTarget> {
        let (current_color, mut thickness) = Self::brush(ctx);

        ui.horizontal(|ui| {
            for color in &self.colors {
                let (rect, response) = ui.allocate_exact_size(egui::vec2(24.0, 24.0), egui::Sense::click());
                ui.painter().circle_filled(rect.center(), 10.0, *color);
                if *color == current_color {
                    ui.painter()
                        .circle_stroke(rect.center(), 11.0, Stroke::new(2.0, Color32::from_rgb(100, 181, 246)));
                }
                if response.clicked() {
                    ctx.shared.set_value(COLOR_KEY, color_to_value(*color));
                }
            }
            if ui
                .add(egui::Slider::new(&mut thickness, 0.002..=0.05).text("Size"))
                .changed()
            {
                ctx.shared.set_value(THICKNESS_KEY, json!(thickness));
            }
        });

        ui.horizontal(|ui| {
            let has_paths = !read_paths(ctx.editor).is_empty();
            if ui.add_enabled(has_paths, egui::Button::new("Clear")).clicked() {
                self.clear(ctx);
            }
            if ui.button("Done").clicked() {
                return Some(ControlTarget::Back);
            }
            None
        })
        .inner
    }

    fn canvas_ui(&mut self, ui: &mut egui::Ui, view: &CanvasView, ctx: &mut ControlContext<'_>) {
        let response = ui.interact(view.image, ui.id().with("brush_canvas"), egui::Sense::drag());

        if response.drag_started() {
            let (color, thickness) = Self::brush(ctx);
            self.current = Some(BrushPath::new(color, thickness));
        }
        if let (Some(path), Some(pointer)) = (self.current.as_mut(), response.interact_pointer_pos()) {
            if response.dragged() || response.drag_started() {
                path.push(view.to_normalized(pointer));
            }
        }
        if let Some(path) = &self.current {
            paint_paths(ui.painter(), view, std::slice::from_ref(path));
        }
        if response.drag_stopped() {
            if let Some(path) = self.current.take().filter(|path| !path.points.is_empty()) {
                Self::commit_path(ctx, path);
            }
        }
    }
}
