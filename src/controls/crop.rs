//! Crop control: ratio presets plus a draggable crop box with corner knobs.
//!
//! While the control is active the crop operation is disabled so the whole image is
//! visible; the box is drawn on top and re-enabled on exit.

use egui::{Color32, Rect, Sense, Stroke, Vec2, vec2};
use serde_json::{Value, json};

use super::{CanvasView, Control, ControlContext, ControlTarget, commit_history, control_option, operation_entry_state};
use crate::config::EditorOptions;
use crate::editor::{Editor, Feature, Zoom};
use crate::operation::{CROP, Operation, OperationOptions, options, vec2_to_value};
use crate::shared_state::SharedValues;
use crate::widgets::knob::{Corner, Knob};

/// Smallest crop box, in displayed pixels
pub const MIN_CROP_SIZE: f32 = 50.0;

const RATIO_KEY: &str = "ratio";

#[derive(Debug, Clone, PartialEq)]
pub struct CropRatio {
    pub identifier: String,
    pub label: String,
    /// Width over height; `None` is a free crop
    pub ratio: Option<f32>,
}

impl CropRatio {
    fn new(identifier: &str, label: &str, ratio: Option<f32>) -> Self {
        Self {
            identifier: identifier.to_owned(),
            label: label.to_owned(),
            ratio,
        }
    }
}

pub fn default_ratios() -> Vec<CropRatio> {
    vec![
        CropRatio::new("custom", "Custom", None),
        CropRatio::new("square", "Square", Some(1.0)),
        CropRatio::new("4-3", "4:3", Some(4.0 / 3.0)),
        CropRatio::new("16-9", "16:9", Some(16.0 / 9.0)),
    ]
}

/// Crop area in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropBox {
    pub start: Vec2,
    pub end: Vec2,
}

impl CropBox {
    pub const FULL: CropBox = CropBox {
        start: Vec2::ZERO,
        end: Vec2::splat(1.0),
    };

    pub fn from_operation(operation: &Operation) -> Self {
        Self {
            start: operation.option_vec2("start").unwrap_or(Vec2::ZERO),
            end: operation.option_vec2("end").unwrap_or(Vec2::splat(1.0)),
        }
    }

    pub fn to_options(self) -> OperationOptions {
        options([("start", vec2_to_value(self.start)), ("end", vec2_to_value(self.end))])
    }

    pub fn to_pixels(self, area: Vec2) -> Rect {
        Rect::from_min_max(
            (self.start * area).to_pos2(),
            (self.end * area).to_pos2(),
        )
    }

    pub fn from_pixels(rect: Rect, area: Vec2) -> Self {
        Self {
            start: crate::geometry::divide(rect.min.to_vec2(), area),
            end: crate::geometry::divide(rect.max.to_vec2(), area),
        }
    }

    pub fn is_full(self) -> bool {
        (self.start - Vec2::ZERO).length() < 1e-4 && (self.end - Vec2::splat(1.0)).length() < 1e-4
    }
}

fn keep_inside(rect: Rect, area: Vec2) -> Rect {
    let rect = Rect::from_min_size(rect.min, rect.size().min(area));
    let mut offset = Vec2::ZERO;
    if rect.min.x < 0.0 {
        offset.x = -rect.min.x;
    } else if rect.max.x > area.x {
        offset.x = area.x - rect.max.x;
    }
    if rect.min.y < 0.0 {
        offset.y = -rect.min.y;
    } else if rect.max.y > area.y {
        offset.y = area.y - rect.max.y;
    }
    rect.translate(offset)
}

/// Resizes `initial` by dragging `corner` by `delta` pixels inside an `area`-sized image.
///
/// The opposite corner stays anchored. The box never leaves the area, keeps `ratio` when
/// one is given and never shrinks below [`MIN_CROP_SIZE`]. On images smaller than the
/// minimum the box covers the whole axis instead.
pub fn resize_from_corner(
    initial: CropBox,
    corner: Corner,
    delta: Vec2,
    area: Vec2,
    ratio: Option<f32>,
) -> CropBox {
    let rect = initial.to_pixels(area);
    let anchor = corner.opposite().of(rect);
    let moving = corner.of(rect) + delta;
    let dir = corner.direction();

    let room = vec2(
        if dir.x > 0.0 { area.x - anchor.x } else { anchor.x },
        if dir.y > 0.0 { area.y - anchor.y } else { anchor.y },
    );
    let mut size = vec2((moving.x - anchor.x) * dir.x, (moving.y - anchor.y) * dir.y).min(room);

    let ratio = ratio.filter(|r| *r > 0.0);
    if let Some(ratio) = ratio {
        let mut width = size.x.max(size.y * ratio);
        let mut height = width / ratio;
        if width > room.x {
            width = room.x;
            height = width / ratio;
        }
        if height > room.y {
            height = room.y;
            width = height * ratio;
        }
        size = vec2(width, height);
    }

    let minimum = Vec2::splat(MIN_CROP_SIZE).min(area);
    size = match ratio {
        Some(ratio) => {
            if size.x < minimum.x {
                size = vec2(minimum.x, minimum.x / ratio);
            }
            if size.y < minimum.y {
                size = vec2(minimum.y * ratio, minimum.y);
            }
            size
        }
        None => size.max(minimum),
    };

    let moved = anchor + vec2(size.x * dir.x, size.y * dir.y);
    let rect = keep_inside(Rect::from_two_pos(anchor, moved), area);
    CropBox::from_pixels(rect, area)
}

/// Moves the whole box by `delta` pixels, clamped to the image
pub fn move_by(initial: CropBox, delta: Vec2, area: Vec2) -> CropBox {
    let rect = keep_inside(initial.to_pixels(area).translate(delta), area);
    CropBox::from_pixels(rect, area)
}

/// Largest centered box of `ratio` inside `area`; a free ratio covers the whole image
pub fn fit_ratio(area: Vec2, ratio: Option<f32>) -> CropBox {
    let Some(ratio) = ratio.filter(|r| *r > 0.0) else {
        return CropBox::FULL;
    };
    let mut size = vec2(area.x, area.x / ratio);
    if size.y > area.y {
        size = vec2(area.y * ratio, area.y);
    }
    let min = (area - size) / 2.0;
    CropBox::from_pixels(Rect::from_min_size(min.to_pos2(), size), area)
}

#[derive(Debug, Clone, Copy)]
struct CropDrag {
    corner: Option<Corner>,
    initial: CropBox,
    accumulated: Vec2,
}

pub struct CropControl {
    ratios: Vec<CropRatio>,
    drag: Option<CropDrag>,
}

impl CropControl {
    pub fn new(options: &EditorOptions) -> Self {
        let configured = control_option(options.control_options("crop"), "ratios")
            .and_then(Value::as_array)
            .map(|ratios| {
                ratios
                    .iter()
                    .filter_map(|ratio| {
                        let identifier = ratio.get("identifier")?.as_str()?;
                        let label = ratio
                            .get("label")
                            .and_then(Value::as_str)
                            .unwrap_or(identifier);
                        let value = ratio.get("ratio").and_then(Value::as_f64).map(|r| r as f32);
                        Some(CropRatio::new(identifier, label, value))
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|ratios| !ratios.is_empty());

        Self {
            ratios: configured.unwrap_or_else(default_ratios),
            drag: None,
        }
    }

    pub fn ratios(&self) -> &[CropRatio] {
        &self.ratios
    }

    fn selected_ratio(&self, ctx: &ControlContext<'_>) -> Option<f32> {
        let identifier = ctx.shared.get_string(RATIO_KEY)?;
        self.ratios
            .iter()
            .find(|ratio| ratio.identifier == identifier)
            .and_then(|ratio| ratio.ratio)
    }

    fn current_box(editor: &Editor) -> CropBox {
        editor
            .operation(CROP)
            .map(CropBox::from_operation)
            .unwrap_or(CropBox::FULL)
    }

    fn write_box(editor: &mut Editor, crop: CropBox) {
        editor.update_operation(CROP, |operation| operation.set(crop.to_options()));
    }

    /// Applies a ratio preset: records it and resets the box to the largest fitting one
    pub fn select_ratio(&self, ctx: &mut ControlContext<'_>, identifier: &str) {
        let Some(ratio) = self.ratios.iter().find(|r| r.identifier == identifier) else {
            log::warn!("unknown crop ratio `{}`", identifier);
            return;
        };
        ctx.shared.set_value(RATIO_KEY, json!(identifier));

        let area = ctx.editor.final_dimensions();
        let crop = fit_ratio(area, ratio.ratio);
        ctx.editor.update_operation(CROP, |operation| {
            operation.set(crop.to_options());
            operation.set_option(RATIO_KEY, json!(identifier));
        });
    }
}

impl Control for CropControl {
    fn identifier(&self) -> &'static str {
        "crop"
    }

    fn label(&self) -> &'static str {
        "Crop"
    }

    fn icon(&self) -> &'static str {
        "⛶"
    }

    fn is_available(&self, editor: &Editor) -> bool {
        editor.supports_operation(CROP)
    }

    fn initial_state(&mut self, editor: &mut Editor, extra: SharedValues) -> SharedValues {
        let mut values = operation_entry_state(editor, &[CROP]);

        let default_ratio = self
            .ratios
            .first()
            .map(|ratio| ratio.identifier.clone())
            .unwrap_or_default();
        match editor.get_or_create_operation(CROP, CropBox::FULL.to_options()) {
            Ok(operation) => {
                let ratio = operation
                    .option_str(RATIO_KEY)
                    .map(str::to_owned)
                    .unwrap_or(default_ratio);
                values.insert(RATIO_KEY.to_owned(), json!(ratio));
                operation.set_enabled(false);
            }
            Err(err) => log::error!("crop control cannot start: {}", err),
        }

        editor.disable_features(&[Feature::Zoom, Feature::Drag]);
        editor.set_zoom(Zoom::Auto, None);
        values.extend(extra);
        values
    }

    fn on_exit(&mut self, ctx: &mut ControlContext<'_>) {
        self.drag = None;
        let existed_before = ctx.shared.get_bool("crop.existed_before").unwrap_or(false);
        let untouched = Self::current_box(ctx.editor).is_full();

        if !existed_before && untouched {
            ctx.editor.remove_operation(CROP);
        } else {
            ctx.editor.update_operation(CROP, |operation| operation.set_enabled(true));
            commit_history(ctx, &[CROP]);
        }

        ctx.editor.enable_features(&[Feature::Zoom, Feature::Drag]);
        ctx.editor.set_zoom(Zoom::Auto, None);
    }

    fn panel_ui(&mut self, ui: &mut egui::Ui, ctx: &mut ControlContext<'_>) -> Option<ControlTarget> {
        let selected = ctx.shared.get_string(RATIO_KEY).unwrap_or_default();
        let mut clicked = None;
        ui.horizontal(|ui| {
            for ratio in &self.ratios {
                if ui
                    .selectable_label(ratio.identifier == selected, &ratio.label)
                    .clicked()
                {
                    clicked = Some(ratio.identifier.clone());
                }
            }
        });
        if let Some(identifier) = clicked {
            self.select_ratio(ctx, &identifier);
        }

        ui.add_space(4.0);
        if ui.button("Done").clicked() {
            return Some(ControlTarget::Back);
        }
        None
    }

    fn canvas_ui(&mut self, ui: &mut egui::Ui, view: &CanvasView, ctx: &mut ControlContext<'_>) {
        let area = view.image.size();
        let crop = Self::current_box(ctx.editor);
        let crop_rect = crop.to_pixels(area).translate(view.image.min.to_vec2());

        let painter = ui.painter();
        let shade = Color32::from_black_alpha(140);
        for band in [
            Rect::from_min_max(view.image.min, egui::pos2(view.image.max.x, crop_rect.min.y)),
            Rect::from_min_max(egui::pos2(view.image.min.x, crop_rect.max.y), view.image.max),
            Rect::from_min_max(egui::pos2(view.image.min.x, crop_rect.min.y), egui::pos2(crop_rect.min.x, crop_rect.max.y)),
            Rect::from_min_max(egui::pos2(crop_rect.max.x, crop_rect.min.y), egui::pos2(view.image.max.x, crop_rect.max.y)),
        ] {
            painter.rect_filled(band, 0.0, shade);
        }
        painter.rect_stroke(crop_rect, 0.0, Stroke::new(1.5, Color32::WHITE));
        for third in [1.0 / 3.0, 2.0 / 3.0] {
            let x = crop_rect.min.x + crop_rect.width() * third;
            let y = crop_rect.min.y + crop_rect.height() * third;
            let guide = Stroke::new(0.5, Color32::from_white_alpha(120));
            painter.line_segment([egui::pos2(x, crop_rect.min.y), egui::pos2(x, crop_rect.max.y)], guide);
            painter.line_segment([egui::pos2(crop_rect.min.x, y), egui::pos2(crop_rect.max.x, y)], guide);
        }

        let ratio = self.selected_ratio(ctx);

        // Knobs are registered after the move area so they win overlapping hits.
        let area_response = ui.interact(crop_rect, ui.id().with("crop_area"), Sense::drag());
        self.handle_drag(&area_response, None, crop, area, ratio, ctx);

        for corner in Corner::ALL {
            let response = Knob::new(("crop", corner), corner.of(crop_rect))
                .with_cursor(corner.cursor_icon())
                .show(ui);
            self.handle_drag(&response, Some(corner), crop, area, ratio, ctx);
        }
    }
}

impl CropControl {
    fn handle_drag(
        &mut self,
        response: &egui::Response,
        corner: Option<Corner>,
        crop: CropBox,
        area: Vec2,
        ratio: Option<f32>,
        ctx: &mut ControlContext<'_>,
    ) {
        if response.drag_started() {
            self.drag = Some(CropDrag {
                corner,
                initial: crop,
                accumulated: Vec2::ZERO,
            });
        }

        let Some(drag) = self.drag.as_mut().filter(|drag| drag.corner == corner) else {
            return;
        };
        if response.dragged() {
            drag.accumulated += response.drag_delta();
            let next = match corner {
                Some(corner) => resize_from_corner(drag.initial, corner, drag.accumulated, area, ratio),
                None => move_by(drag.initial, drag.accumulated, area),
            };
            Self::write_box(ctx.editor, next);
        }
        if response.drag_stopped() {
            self.drag = None;
        }
    }
}
