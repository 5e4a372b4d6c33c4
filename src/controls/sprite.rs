//! Sprites (stickers and text) stored on the `sprite` operation, plus the transform math
//! shared by the stickers and text controls.

use egui::{Color32, Pos2, Rect, Vec2, vec2};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{CanvasView, ControlContext};
use crate::editor::Editor;
use crate::operation::{OperationOptions, SPRITE, options};
use crate::widgets::knob::Knob;

pub const SPRITES_KEY: &str = "sprites";
pub const SELECTED_KEY: &str = "selected";
pub const MIN_SCALE: f32 = 0.05;
pub const MIN_TEXT_WIDTH: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlignment {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SpriteKind {
    Sticker {
        sticker: String,
        path: String,
    },
    Text {
        text: String,
        font_size: f32,
        color: [u8; 4],
        /// Wrap width relative to the image width
        max_width: f32,
        #[serde(default)]
        alignment: TextAlignment,
    },
}

/// One placed sticker or text block. Position is the normalized center; dimensions are
/// normalized against the image width for both axes so sprites keep their aspect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: SpriteKind,
    pub position: [f32; 2],
    pub dimensions: [f32; 2],
    pub scale: f32,
    /// Radians, clockwise on screen
    pub rotation: f32,
}

impl Sprite {
    pub fn new(kind: SpriteKind, dimensions: Vec2) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            position: [0.5, 0.5],
            dimensions: [dimensions.x, dimensions.y],
            scale: 1.0,
            rotation: 0.0,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, SpriteKind::Text { .. })
    }

    pub fn position(&self) -> Vec2 {
        Vec2::from(self.position)
    }

    /// Unrotated on-screen half size
    pub fn half_size(&self, view: &CanvasView) -> Vec2 {
        Vec2::from(self.dimensions) * self.scale * view.image.width() / 2.0
    }

    pub fn screen_center(&self, view: &CanvasView) -> Pos2 {
        view.from_normalized(self.position())
    }

    /// Screen position of the rotation/scale knob at the bottom-right corner
    pub fn corner_knob(&self, view: &CanvasView) -> Pos2 {
        self.screen_center(view) + crate::geometry::rotate(self.half_size(view), self.rotation)
    }

    /// Whether `pos` falls inside the rotated sprite
    pub fn contains(&self, view: &CanvasView, pos: Pos2) -> bool {
        let local = crate::geometry::rotate(pos - self.screen_center(view), -self.rotation);
        let half = self.half_size(view);
        local.x.abs() <= half.x && local.y.abs() <= half.y
    }

    pub fn bounds(&self, view: &CanvasView) -> Rect {
        Rect::from_center_size(self.screen_center(view), self.half_size(view) * 2.0)
    }
}

/// Rotation that keeps the corner knob under the pointer: the knob angle minus the
/// sprite's own half-diagonal angle
pub fn rotation_from_knob(center: Vec2, knob: Vec2, half_size: Vec2) -> f32 {
    let to_knob = knob - center;
    to_knob.y.atan2(to_knob.x) - half_size.y.atan2(half_size.x)
}

/// Scale factor that places the corner knob at `knob`, relative to the unscaled half size
pub fn scale_from_knob(center: Vec2, knob: Vec2, unscaled_half_size: Vec2) -> f32 {
    let reference = unscaled_half_size.length();
    if reference <= f32::EPSILON {
        return MIN_SCALE;
    }
    ((knob - center).length() / reference).max(MIN_SCALE)
}

/// New wrap width for a text sprite whose side knob is dragged to `knob`
pub fn width_from_knob(center: Vec2, knob: Vec2, rotation: f32, image_width: f32) -> f32 {
    let local = crate::geometry::rotate(knob - center, -rotation);
    (local.x.abs() * 2.0 / image_width.max(1.0)).max(MIN_TEXT_WIDTH)
}

pub fn read_sprites(editor: &Editor) -> Vec<Sprite> {
    let Some(value) = editor.operation(SPRITE).and_then(|op| op.option(SPRITES_KEY)) else {
        return Vec::new();
    };
    match serde_json::from_value(value.clone()) {
        Ok(sprites) => sprites,
        Err(err) => {
            log::warn!("ignoring malformed sprites: {}", err);
            Vec::new()
        }
    }
}

pub fn sprites_options(sprites: &[Sprite]) -> OperationOptions {
    let value = serde_json::to_value(sprites).unwrap_or(Value::Array(Vec::new()));
    options([(SPRITES_KEY, value)])
}

pub fn write_sprites(ctx: &mut ControlContext<'_>, sprites: &[Sprite]) {
    if let Err(err) = ctx.editor.set_operation_options(SPRITE, sprites_options(sprites)) {
        log::error!("cannot update sprites: {}", err);
    }
}

pub fn selected_sprite(ctx: &ControlContext<'_>) -> Option<Uuid> {
    ctx.shared
        .get_string(SELECTED_KEY)
        .and_then(|id| Uuid::parse_str(&id).ok())
}

pub fn select_sprite(ctx: &ControlContext<'_>, id: Option<Uuid>) {
    let value = id.map_or(Value::Null, |id| Value::String(id.to_string()));
    ctx.shared.set_value(SELECTED_KEY, value);
}

/// Drops the sprite operation when no sprites remain and it did not exist before
pub fn remove_if_empty(ctx: &mut ControlContext<'_>) -> bool {
    let existed_before = ctx.shared.get_bool("sprite.existed_before").unwrap_or(false);
    if !existed_before && read_sprites(ctx.editor).is_empty() {
        ctx.editor.remove_operation(SPRITE);
        return true;
    }
    false
}

/// Text sprite laid out at its on-screen size
pub fn text_galley(ui: &egui::Ui, view: &CanvasView, sprite: &Sprite) -> Option<std::sync::Arc<egui::Galley>> {
    let SpriteKind::Text {
        text,
        font_size,
        color,
        max_width,
        alignment,
    } = &sprite.kind
    else {
        return None;
    };
    let width = view.image.width();
    let mut job = egui::text::LayoutJob::simple(
        text.clone(),
        egui::FontId::proportional((font_size * width * sprite.scale).max(1.0)),
        Color32::from_rgba_unmultiplied(color[0], color[1], color[2], color[3]),
        (max_width * width * sprite.scale).max(1.0),
    );
    job.halign = match alignment {
        TextAlignment::Left => egui::Align::LEFT,
        TextAlignment::Center => egui::Align::Center,
        TextAlignment::Right => egui::Align::RIGHT,
    };
    Some(ui.fonts(|fonts| fonts.layout_job(job)))
}

/// Paints a sprite. Stickers need their texture; without one a placeholder outline is drawn.
pub fn paint_sprite(ui: &egui::Ui, view: &CanvasView, sprite: &Sprite, texture: Option<&egui::TextureHandle>) {
    let center = sprite.screen_center(view);
    match &sprite.kind {
        SpriteKind::Sticker { .. } => match texture {
            Some(texture) => {
                let mut mesh = egui::Mesh::with_texture(texture.id());
                mesh.add_rect_with_uv(
                    sprite.bounds(view),
                    Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                    Color32::WHITE,
                );
                mesh.rotate(egui::emath::Rot2::from_angle(sprite.rotation), center);
                ui.painter().add(egui::Shape::mesh(mesh));
            }
            None => {
                let half = sprite.half_size(view);
                let corners = [vec2(-1.0, -1.0), vec2(1.0, -1.0), vec2(1.0, 1.0), vec2(-1.0, 1.0)]
                    .map(|sign| center + crate::geometry::rotate(half * sign, sprite.rotation));
                ui.painter().add(egui::Shape::closed_line(
                    corners.to_vec(),
                    egui::Stroke::new(1.0, Color32::from_white_alpha(160)),
                ));
            }
        },
        SpriteKind::Text { .. } => {
            let Some(galley) = text_galley(ui, view, sprite) else {
                return;
            };
            // Aligned galleys are not anchored at their top-left corner.
            let origin = center - crate::geometry::rotate(galley.rect.center().to_vec2(), sprite.rotation);
            let shape = egui::epaint::TextShape::new(origin, galley, Color32::WHITE).with_angle(sprite.rotation);
            ui.painter().add(shape);
        }
    }
}

/// Outcome of the shared move/rotate/scale handles for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteGesture {
    Idle,
    Selected,
    Changed,
}

/// Draws selection chrome and handles move plus corner rotate/scale for `sprite`.
/// Text sprites resize their wrap width through the side knob instead of scaling.
pub fn transform_handles(
    ui: &mut egui::Ui,
    view: &CanvasView,
    sprite: &mut Sprite,
    selected: bool,
    ctx: &mut ControlContext<'_>,
) -> SpriteGesture {
    let bounds = sprite.bounds(view);
    let response = ui.interact(bounds, ui.id().with(("sprite", sprite.id)), egui::Sense::click_and_drag());
    super::suspend_canvas_while_dragging(ctx.editor, &response);

    let mut gesture = SpriteGesture::Idle;
    if response.clicked() || response.drag_started() {
        gesture = SpriteGesture::Selected;
    }
    if response.dragged() {
        let delta = crate::geometry::divide(response.drag_delta(), view.image.size());
        let position = (sprite.position() + delta).clamp(Vec2::ZERO, Vec2::splat(1.0));
        sprite.position = [position.x, position.y];
        gesture = SpriteGesture::Changed;
    }
    if !selected {
        return gesture;
    }

    let center = sprite.screen_center(view);
    let half = sprite.half_size(view);
    let corners = [vec2(-1.0, -1.0), vec2(1.0, -1.0), vec2(1.0, 1.0), vec2(-1.0, 1.0)]
        .map(|sign| center + crate::geometry::rotate(half * sign, sprite.rotation));
    let outline = egui::Stroke::new(1.5, Color32::WHITE);
    for i in 0..corners.len() {
        ui.painter()
            .line_segment([corners[i], corners[(i + 1) % corners.len()]], outline);
    }

    let knob = Knob::new(("sprite_corner", sprite.id), sprite.corner_knob(view))
        .with_cursor(egui::CursorIcon::Alias)
        .show(ui);
    super::suspend_canvas_while_dragging(ctx.editor, &knob);
    if knob.dragged() {
        if let Some(pointer) = knob.interact_pointer_pos() {
            sprite.rotation = rotation_from_knob(center.to_vec2(), pointer.to_vec2(), half);
            if !sprite.is_text() {
                let unscaled = Vec2::from(sprite.dimensions) * view.image.width() / 2.0;
                sprite.scale = scale_from_knob(center.to_vec2(), pointer.to_vec2(), unscaled);
            }
            gesture = SpriteGesture::Changed;
        }
    }

    if let SpriteKind::Text { max_width, .. } = &mut sprite.kind {
        let side = center + crate::geometry::rotate(vec2(half.x, 0.0), sprite.rotation);
        let handle = Knob::new(("sprite_width", sprite.id), side)
            .with_cursor(egui::CursorIcon::ResizeHorizontal)
            .show(ui);
        super::suspend_canvas_while_dragging(ctx.editor, &handle);
        if handle.dragged() {
            if let Some(pointer) = handle.interact_pointer_pos() {
                let width = width_from_knob(center.to_vec2(), pointer.to_vec2(), sprite.rotation, view.image.width());
                *max_width = width;
                sprite.dimensions[0] = width;
                gesture = SpriteGesture::Changed;
            }
        }
    }

    gesture
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    #[test]
    fn knob_on_unrotated_corner_means_no_rotation() {
        let half = vec2(40.0, 40.0);
        let rotation = rotation_from_knob(Vec2::ZERO, half, half);
        assert!(rotation.abs() < 1e-6);

        let rotation = rotation_from_knob(Vec2::ZERO, vec2(-40.0, 40.0), half);
        assert!((rotation - FRAC_PI_2).abs() < 1e-5);

        let wide = vec2(80.0, 0.0);
        let rotation = rotation_from_knob(Vec2::ZERO, vec2(0.0, 10.0), wide);
        assert!((rotation - FRAC_PI_2).abs() < 1e-5);
        assert!((rotation_from_knob(Vec2::ZERO, vec2(1.0, 1.0), wide) - FRAC_PI_4).abs() < 1e-5);
    }

    #[test]
    fn scale_follows_knob_distance() {
        let half = vec2(30.0, 40.0);
        assert!((scale_from_knob(Vec2::ZERO, vec2(60.0, 80.0), half) - 2.0).abs() < 1e-5);
        assert_eq!(scale_from_knob(Vec2::ZERO, Vec2::ZERO, half), MIN_SCALE);
        assert_eq!(scale_from_knob(Vec2::ZERO, vec2(5.0, 5.0), Vec2::ZERO), MIN_SCALE);
    }

    #[test]
    fn text_width_ignores_rotation() {
        let width = width_from_knob(Vec2::ZERO, vec2(0.0, 50.0), FRAC_PI_2, 200.0);
        assert!((width - 0.5).abs() < 1e-5);
        assert_eq!(width_from_knob(Vec2::ZERO, Vec2::ZERO, 0.0, 200.0), MIN_TEXT_WIDTH);
    }

    #[test]
    fn sprites_serialize_with_type_tag() {
        let sprite = Sprite::new(
            SpriteKind::Sticker {
                sticker: "glasses".into(),
                path: "stickers/glasses.png".into(),
            },
            vec2(0.2, 0.1),
        );
        let value = serde_json::to_value(&sprite).unwrap();
        assert_eq!(value["type"], "sticker");
        assert_eq!(value["sticker"], "glasses");
        let back: Sprite = serde_json::from_value(value).unwrap();
        assert_eq!(back, sprite);
    }

    #[test]
    fn hit_test_honours_rotation() {
        let view = CanvasView {
            canvas: Rect::from_min_size(Pos2::ZERO, vec2(100.0, 100.0)),
            image: Rect::from_min_size(Pos2::ZERO, vec2(100.0, 100.0)),
        };
        let mut sprite = Sprite::new(
            SpriteKind::Sticker {
                sticker: "bar".into(),
                path: "bar.png".into(),
            },
            vec2(0.6, 0.1),
        );
        assert!(sprite.contains(&view, Pos2::new(75.0, 50.0)));
        assert!(!sprite.contains(&view, Pos2::new(50.0, 75.0)));
        sprite.rotation = FRAC_PI_2;
        assert!(!sprite.contains(&view, Pos2::new(75.0, 50.0)));
        assert!(sprite.contains(&view, Pos2::new(50.0, 75.0)));
    }
}
