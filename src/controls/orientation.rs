use egui::{Vec2, vec2};
use serde_json::json;

use super::crop::CropBox;
use super::{Control, ControlContext, ControlTarget, commit_history, operation_entry_state};
use crate::editor::{Editor, Zoom};
use crate::operation::{CROP, ORIENTATION, Operation, OperationOptions, options};
use crate::shared_state::SharedValues;

/// Rotation in degrees plus the two flip flags, applied in that order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Orientation {
    pub rotation: i32,
    pub flip_horizontally: bool,
    pub flip_vertically: bool,
}

impl Orientation {
    pub fn from_operation(operation: &Operation) -> Self {
        Self {
            rotation: operation.option_f32("rotation").unwrap_or(0.0).round() as i32,
            flip_horizontally: operation.option_bool("flip_horizontally").unwrap_or(false),
            flip_vertically: operation.option_bool("flip_vertically").unwrap_or(false),
        }
    }

    pub fn to_options(self) -> OperationOptions {
        options([
            ("rotation", json!(self.rotation)),
            ("flip_horizontally", json!(self.flip_horizontally)),
            ("flip_vertically", json!(self.flip_vertically)),
        ])
    }

    pub fn is_identity(self) -> bool {
        let flipped_both = self.flip_horizontally && self.flip_vertically;
        let rotation = self.rotation.rem_euclid(360);
        (rotation == 0 && !self.flip_horizontally && !self.flip_vertically)
            || (rotation == 180 && flipped_both)
    }

    /// Turns the displayed image by 90 degrees.
    ///
    /// With exactly one flip set, a clockwise turn of the result is a counter-clockwise
    /// turn of the source.
    pub fn rotated(self, clockwise: bool) -> Self {
        let mirrored = self.flip_horizontally != self.flip_vertically;
        let step = if clockwise != mirrored { 90 } else { -90 };
        Self {
            rotation: (self.rotation + step).rem_euclid(360),
            ..self
        }
    }

    pub fn flipped(self, horizontally: bool) -> Self {
        if horizontally {
            Self {
                flip_horizontally: !self.flip_horizontally,
                ..self
            }
        } else {
            Self {
                flip_vertically: !self.flip_vertically,
                ..self
            }
        }
    }
}

/// Maps a crop box so it covers the same pixels after the displayed image is turned
pub fn rotate_crop(crop: CropBox, clockwise: bool) -> CropBox {
    let map = |v: Vec2| {
        if clockwise {
            vec2(1.0 - v.y, v.x)
        } else {
            vec2(v.y, 1.0 - v.x)
        }
    };
    let (a, b) = (map(crop.start), map(crop.end));
    CropBox {
        start: a.min(b),
        end: a.max(b),
    }
}

pub fn flip_crop(crop: CropBox, horizontally: bool) -> CropBox {
    if horizontally {
        CropBox {
            start: vec2(1.0 - crop.end.x, crop.start.y),
            end: vec2(1.0 - crop.start.x, crop.end.y),
        }
    } else {
        CropBox {
            start: vec2(crop.start.x, 1.0 - crop.end.y),
            end: vec2(crop.end.x, 1.0 - crop.start.y),
        }
    }
}

#[derive(Debug, Default)]
pub struct OrientationControl;

impl OrientationControl {
    pub fn new() -> Self {
        Self
    }

    fn current(editor: &Editor) -> Orientation {
        editor
            .operation(ORIENTATION)
            .map(Orientation::from_operation)
            .unwrap_or_default()
    }

    fn apply(
        ctx: &mut ControlContext<'_>,
        orientation: Orientation,
        transform_crop: impl FnOnce(CropBox) -> CropBox,
    ) {
        if let Err(err) = ctx.editor.set_operation_options(ORIENTATION, orientation.to_options()) {
            log::error!("cannot orient image: {}", err);
            return;
        }
        ctx.editor.update_operation(CROP, |operation| {
            let crop = transform_crop(CropBox::from_operation(operation));
            operation.set(crop.to_options());
        });
        ctx.editor.set_zoom(Zoom::Auto, None);
    }

    pub fn rotate(&self, ctx: &mut ControlContext<'_>, clockwise: bool) {
        let next = Self::current(ctx.editor).rotated(clockwise);
        Self::apply(ctx, next, |crop| rotate_crop(crop, clockwise));
    }

    pub fn flip(&self, ctx: &mut ControlContext<'_>, horizontally: bool) {
        let next = Self::current(ctx.editor).flipped(horizontally);
        Self::apply(ctx, next, |crop| flip_crop(crop, horizontally));
    }
}

impl Control for OrientationControl {
    fn identifier(&self) -> &'static str {
        "orientation"
    }

    fn label(&self) -> &'static str {
        "Orientation"
    }

    fn icon(&self) -> &'static str {
        "⟳"
    }

    fn is_available(&self, editor: &Editor) -> bool {
        editor.supports_operation(ORIENTATION)
    }

    fn initial_state(&mut self, editor: &mut Editor, extra: SharedValues) -> SharedValues {
        let mut values = operation_entry_state(editor, &[ORIENTATION, CROP]);
        values.extend(extra);
        values
    }

    fn on_exit(&mut self, ctx: &mut ControlContext<'_>) {
        let existed_before = ctx.shared.get_bool("orientation.existed_before").unwrap_or(false);
        if !existed_before && Self::current(ctx.editor).is_identity() {
            ctx.editor.remove_operation(ORIENTATION);
        }
        // The crop box is remapped on every rotation, so both undo together.
        commit_history(ctx, &[ORIENTATION, CROP]);
    }

    fn panel_ui(&mut self, ui: &mut egui::Ui, ctx: &mut ControlContext<'_>) -> Option<ControlTarget> {
        ui.horizontal(|ui| {
            if ui.button("⟲ Rotate left").clicked() {
                self.rotate(ctx, false);
            }
            if ui.button("⟳ Rotate right").clicked() {
                self.rotate(ctx, true);
            }
            ui.separator();
            if ui.button("⇔ Flip horizontally").clicked() {
                self.flip(ctx, true);
            }
            if ui.button("⇕ Flip vertically").clicked() {
                self.flip(ctx, false);
            }
        });

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
    fn rotation_direction_follows_flip_parity() {
        let plain = Orientation::default();
        assert_eq!(plain.rotated(true).rotation, 90);
        assert_eq!(plain.rotated(false).rotation, 270);

        let mirrored = plain.flipped(true);
        assert_eq!(mirrored.rotated(true).rotation, 270);

        let both = mirrored.flipped(false);
        assert_eq!(both.rotated(true).rotation, 90);
    }

    #[test]
    fn identity_detection() {
        assert!(Orientation::default().is_identity());
        assert!(!Orientation::default().rotated(true).is_identity());
        let half_turn_flipped = Orientation {
            rotation: 180,
            flip_horizontally: true,
            flip_vertically: true,
        };
        assert!(half_turn_flipped.is_identity());
        let four_turns = (0..4).fold(Orientation::default(), |o, _| o.rotated(true));
        assert!(four_turns.is_identity());
    }

    #[test]
    fn crop_box_follows_rotation() {
        let crop = CropBox {
            start: vec2(0.0, 0.0),
            end: vec2(0.5, 0.25),
        };
        let rotated = rotate_crop(crop, true);
        assert_eq!(rotated.start, vec2(0.75, 0.0));
        assert_eq!(rotated.end, vec2(1.0, 0.5));
        assert_eq!(rotate_crop(rotated, false), crop);
    }

    #[test]
    fn crop_box_follows_flip() {
        let crop = CropBox {
            start: vec2(0.0, 0.0),
            end: vec2(0.5, 0.25),
        };
        let flipped = flip_crop(crop, true);
        assert_eq!(flipped.start, vec2(0.5, 0.0));
        assert_eq!(flipped.end, vec2(1.0, 0.25));
        assert_eq!(flip_crop(flipped, true), crop);
    }
}
