use std::fs;
use std::path::{Path, PathBuf};

use egui::vec2;
use serde::Deserialize;
use thiserror::Error;

use super::sprite::{
    Sprite, SpriteGesture, SpriteKind, read_sprites, remove_if_empty, select_sprite, selected_sprite,
    transform_handles, write_sprites,
};
use super::{CanvasView, Control, ControlContext, ControlTarget, commit_history, operation_entry_state};
use crate::config::{AssetsOptions, EditorOptions};
use crate::editor::Editor;
use crate::modal::{Modal, ModalAction};
use crate::operation::SPRITE;
use crate::shared_state::SharedValues;
use crate::texture_manager::{TextureManager, load_color_image};

pub const MANIFEST_PATH: &str = "stickers/stickers.json";

/// Width of a freshly placed sticker relative to the image width
const NEW_STICKER_WIDTH: f32 = 0.25;

#[derive(Error, Debug)]
pub enum StickerError {
    #[error("failed to read sticker manifest {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid sticker manifest: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StickerInfo {
    pub identifier: String,
    pub name: String,
    /// Relative to the assets base
    pub path: String,
    pub width: u32,
    pub height: u32,
}

impl StickerInfo {
    /// Normalized sprite dimensions for a new instance
    pub fn sprite_dimensions(&self) -> egui::Vec2 {
        let aspect = if self.width == 0 {
            1.0
        } else {
            self.height as f32 / self.width as f32
        };
        vec2(NEW_STICKER_WIDTH, NEW_STICKER_WIDTH * aspect)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StickerManifest {
    pub stickers: Vec<StickerInfo>,
}

impl StickerManifest {
    pub fn from_json(json: &str) -> Result<Self, StickerError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, StickerError> {
        let contents = fs::read_to_string(path).map_err(|source| StickerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = Self::from_json(&contents)?;
        log::info!("loaded {} stickers from {}", manifest.stickers.len(), path.display());
        Ok(manifest)
    }
}

/// Looks up (and caches) the texture for a sticker asset
pub fn sticker_texture(
    textures: &mut TextureManager,
    ctx: &egui::Context,
    assets: &AssetsOptions,
    path: &str,
) -> Option<egui::TextureHandle> {
    textures
        .get_or_create(ctx, path, 0, || load_color_image(&assets.resolve(path)))
        .ok()
}

pub struct StickersControl {
    assets: AssetsOptions,
    manifest_path: PathBuf,
    manifest: Option<Result<StickerManifest, String>>,
    textures: TextureManager,
}

impl StickersControl {
    pub fn new(options: &EditorOptions) -> Self {
        let manifest_path = super::control_option(options.control_options("stickers"), "manifest")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(MANIFEST_PATH);
        Self {
            manifest_path: options.assets.resolve(manifest_path),
            assets: options.assets.clone(),
            manifest: None,
            textures: TextureManager::new(64),
        }
    }

    pub fn manifest(&self) -> Option<&StickerManifest> {
        self.manifest.as_ref().and_then(|result| result.as_ref().ok())
    }

    pub fn add_sticker(&self, ctx: &mut ControlContext<'_>, info: &StickerInfo) {
        let mut sprites = read_sprites(ctx.editor);
        let sprite = Sprite::new(
            SpriteKind::Sticker {
                sticker: info.identifier.clone(),
                path: info.path.clone(),
            },
            info.sprite_dimensions(),
        );
        let id = sprite.id;
        sprites.push(sprite);
        write_sprites(ctx, &sprites);
        select_sprite(ctx, Some(id));
    }

    pub fn remove_selected(&self, ctx: &mut ControlContext<'_>) {
        let Some(selected) = selected_sprite(ctx) else {
            return;
        };
        let mut sprites = read_sprites(ctx.editor);
        sprites.retain(|sprite| sprite.id != selected);
        write_sprites(ctx, &sprites);
        select_sprite(ctx, None);
    }
}

impl Control for StickersControl {
    fn identifier(&self) -> &'static str {
        "stickers"
    }

    fn label(&self) -> &'static str {
        "Stickers"
    }

    fn icon(&self) -> &'static str {
        "☺"
    }

    fn is_available(&self, editor: &Editor) -> bool {
        editor.supports_operation(SPRITE)
    }

    fn initial_state(&mut self, editor: &mut Editor, extra: SharedValues) -> SharedValues {
        if self.manifest.is_none() {
            self.manifest = Some(StickerManifest::load(&self.manifest_path).map_err(|err| err.to_string()));
        }
        let mut values = operation_entry_state(editor, &[SPRITE]);
        values.extend(extra);
        values
    }

    fn on_exit(&mut self, ctx: &mut ControlContext<'_>) {
        if !remove_if_empty(ctx) {
            commit_history(ctx, &[SPRITE]);
        }
    }

    fn panel_ui(&mut self, ui: &mut egui::Ui, ctx: &mut ControlContext<'_>) -> Option<ControlTarget> {
        let stickers = match &self.manifest {
            Some(Ok(manifest)) => manifest.stickers.clone(),
            Some(Err(err)) => {
                ctx.modals.push(Modal::error(
                    "Stickers",
                    format!("Could not load stickers: {err}"),
                    ModalAction::Dismiss,
                ));
                self.manifest = None;
                return Some(ControlTarget::Home);
            }
            None => Vec::new(),
        };

        self.textures.begin_frame();
        let mut clicked = None;
        egui::ScrollArea::horizontal().show(ui, |ui| {
            ui.horizontal(|ui| {
                for info in &stickers {
                    let texture = sticker_texture(&mut self.textures, ui.ctx(), &self.assets, &info.path);
                    let response = match texture {
                        Some(texture) => ui.add(
                            egui::ImageButton::new(egui::load::SizedTexture::new(texture.id(), vec2(48.0, 48.0))),
                        ),
                        None => ui.button(&info.name),
                    };
                    if response.on_hover_text(&info.name).clicked() {
                        clicked = Some(info.clone());
                    }
                }
            });
        });
        if let Some(info) = clicked {
            self.add_sticker(ctx, &info);
        }

        ui.horizontal(|ui| {
            if ui
                .add_enabled(selected_sprite(ctx).is_some(), egui::Button::new("Delete"))
                .clicked()
            {
                self.remove_selected(ctx);
            }
            if ui.button("Done").clicked() {
                return Some(ControlTarget::Back);
            }
            None
        })
        .inner
    }

    fn canvas_ui(&mut self, ui: &mut egui::Ui, view: &CanvasView, ctx: &mut ControlContext<'_>) {
        let mut sprites = read_sprites(ctx.editor);
        let selected = selected_sprite(ctx);

        let mut changed = false;
        for sprite in sprites.iter_mut().filter(|sprite| !sprite.is_text()) {
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
    fn manifest_parses_and_sizes_stickers() {
        let manifest = StickerManifest::from_json(
            r#"{"stickers":[{"identifier":"glasses","name":"Glasses","path":"stickers/glasses.png","width":200,"height":100}]}"#,
        )
        .unwrap();
        assert_eq!(manifest.stickers.len(), 1);
        let dims = manifest.stickers[0].sprite_dimensions();
        assert!((dims.x - 0.25).abs() < 1e-6);
        assert!((dims.y - 0.125).abs() < 1e-6);
    }

    #[test]
    fn missing_manifest_is_an_io_error() {
        let err = StickerManifest::load(Path::new("/nonexistent/stickers.json")).unwrap_err();
        assert!(matches!(err, StickerError::Io { .. }));
        assert!(matches!(
            StickerManifest::from_json("{\"stickers\": 3}"),
            Err(StickerError::Parse(_))
        ));
    }
}
