use egui::{Color32, vec2};
use serde_json::Value;
use uuid::Uuid;

use super::sprite::{
    Sprite, SpriteGesture, SpriteKind, TextAlignment, read_sprites, remove_if_empty, select_sprite,
    selected_sprite, text_galley, transform_handles, write_sprites,
};
use super::{CanvasView, Control, ControlContext, ControlTarget, commit_history, control_option, operation_entry_state};
use crate::config::EditorOptions;
use crate::editor::Editor;
use crate::operation::SPRITE;
use crate::shared_state::SharedValues;

/// Font size relative to the image width
const DEFAULT_FONT_SIZE: f32 = 0.06;
const DEFAULT_MAX_WIDTH: f32 = 0.6;

pub struct TextControl {
    default_text: String,
}

impl TextControl {
    pub fn new(options: &EditorOptions) -> Self {
        let default_text = control_option(options.control_options("text"), "placeholder")
            .and_then(Value::as_str)
            .unwrap_or("Your text")
            .to_owned();
        Self { default_text }
    }

    pub fn new_text_sprite(text: &str) -> Sprite {
        Sprite::new(
            SpriteKind::Text {
                text: text.to_owned(),
                font_size: DEFAULT_FONT_SIZE,
                color: [255, 255, 255, 255],
                max_width: DEFAULT_MAX_WIDTH,
                alignment: TextAlignment::Center,
            },
            vec2(DEFAULT_MAX_WIDTH, DEFAULT_FONT_SIZE * 1.4),
        )
    }

    pub fn add_text(&self, ctx: &mut ControlContext<'_>) -> Uuid {
        let mut sprites = read_sprites(ctx.editor);
        let sprite = Self::new_text_sprite(&self.default_text);
        let id = sprite.id;
        sprites.push(sprite);
        write_sprites(ctx, &sprites);
        select_sprite(ctx, Some(id));
        id
    }

    /// Applies `update` to the selected text sprite, if any
    pub fn update_selected(&self, ctx: &mut ControlContext<'_>, update: impl FnOnce(&mut Sprite)) {
        let Some(selected) = selected_sprite(ctx) else {
            return;
        };
        let mut sprites = read_sprites(ctx.editor);
        let Some(sprite) = sprites.iter_mut().find(|sprite| sprite.id == selected && sprite.is_text()) else {
            return;
        };
        update(sprite);
        write_sprites(ctx, &sprites);
    }

    fn selected_text(ctx: &ControlContext<'_>) -> Option<Sprite> {
        let selected = selected_sprite(ctx)?;
        read_sprites(ctx.editor)
            .into_iter()
            .find(|sprite| sprite.id == selected && sprite.is_text())
    }
}

impl Control for TextControl {
    fn identifier(&self) -> &'static str {
        "text"
    }

    fn label(&self) -> &'static str {
        "Text"
    }

    fn icon(&self) -> &'static str {
        "T"
    }

    fn is_available(&self, editor: &Editor) -> bool {
        editor.supports_operation(SPRITE)
    }

    fn initial_state(&mut self, editor: &mut Editor, extra: SharedValues) -> SharedValues {
        let mut values = operation_entry_state(editor, &[SPRITE]);
        values.extend(extra);
        values
    }

    fn on_exit(&mut self, ctx: &mut ControlContext<'_>) {
        // Blank text blocks are dropped rather than committed.
        let mut sprites = read_sprites(ctx.editor);
        let before = sprites.len();
        sprites.retain(|sprite| match &sprite.kind {
            SpriteKind::Text { text, .. } => !text.trim().is_empty(),
            SpriteKind::Sticker { .. } => true,
        });
        if sprites.len() != before {
            write_sprites(ctx, &sprites);
        }

        if !remove_if_empty(ctx) {
            commit_history(ctx, &[SPRITE]);
        }
    }

    fn panel_ui(&mut self, ui: &mut egui::Ui, ctx: &mut ControlContext<'_>) -> Option<ControlTarget> {
        if ui.button("Add text").clicked() {
            self.add_text(ctx);
        }

        if let Some(sprite) = Self::selected_text(ctx) {
            if let SpriteKind::Text {
                mut text,
                mut font_size,
                color,
                mut alignment,
                ..
            } = sprite.kind
            {
                let mut color = Color32::from_rgba_unmultiplied(color[0], color[1], color[2], color[3]);
                let mut changed = ui.text_edit_multiline(&mut text).changed();
                ui.horizontal(|ui| {
                    changed |= ui
                        .add(egui::Slider::new(&mut font_size, 0.02..=0.3).text("Size"))
                        .changed();
                    changed |= ui.color_edit_button_srgba(&mut color).changed();
                    for (value, label) in [
                        (TextAlignment::Left, "⬅"),
                        (TextAlignment::Center, "↔"),
                        (TextAlignment::Right, "➡"),
                    ] {
                        changed |= ui.selectable_value(&mut alignment, value, label).changed();
                    }
                });

                if changed {
                    self.update_selected(ctx, |sprite| {
                        if let SpriteKind::Text {
                            text: current_text,
                            font_size: current_size,
                            color: current_color,
                            alignment: current_alignment,
                            ..
                        } = &mut sprite.kind
                        {
                            *current_text = text;
                            *current_size = font_size;
                            *current_color = color.to_srgba_unmultiplied();
                            *current_alignment = alignment;
                        }
                    });
                }
            }

            if ui.button("Delete").clicked() {
                let mut sprites = read_sprites(ctx.editor);
                sprites.retain(|other| other.id != sprite.id);
                write_sprites(ctx, &sprites);
                select_sprite(ctx, None);
            }
        }

        ui.add_space(4.0);
        if ui.button("Done").clicked() {
            return Some(ControlTarget::Back);
        }
        None
    }

    fn canvas_ui(&mut self, ui: &mut egui::Ui, view: &CanvasView, ctx: &mut ControlContext<'_>) {
        let mut sprites = read_sprites(ctx.editor);
        let selected = selected_sprite(ctx);

        let mut changed = false;
        for sprite in sprites.iter_mut().filter(|sprite| sprite.is_text()) {
            // Height follows the laid out text so hit testing matches what is drawn.
            if let Some(galley) = text_galley(ui, view, sprite) {
                let scale = (view.image.width() * sprite.scale).max(1.0);
                sprite.dimensions[1] = galley.size().y / scale;
            }

            let is_selected = selected == Some(sprite.id);
            match transform_handles(ui, view, sprite, is_selected, ctx) {
                SpriteGesture::Idle => {}
                SpriteGesture::Selected => select_sprite(ctx, Some(sprite.id)),
                SpriteGesture::Changed => changed = true,
            }
        }

        if changed {
            write_sprites(ctx, &sprites);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_text_sprite_is_centered_text() {
        let sprite = TextControl::new_text_sprite("Hello");
        assert!(sprite.is_text());
        assert_eq!(sprite.position, [0.5, 0.5]);
        match sprite.kind {
            SpriteKind::Text { text, max_width, .. } => {
                assert_eq!(text, "Hello");
                assert_eq!(sprite.dimensions[0], max_width);
            }
            SpriteKind::Sticker { .. } => unreachable!(),
        }
    }

    #[test]
    fn placeholder_comes_from_options() {
        let mut options = EditorOptions::default();
        options
            .controls_options
            .insert("text".into(), serde_json::json!({ "placeholder": "Hi" }));
        assert_eq!(TextControl::new(&options).default_text, "Hi");
    }
}
