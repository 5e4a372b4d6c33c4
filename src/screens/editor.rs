//! The editor screen: header, control overview, canvas and the active control's panel.

use std::cell::RefCell;
use std::rc::Rc;

use egui::{Color32, Pos2, Rect, Sense, Stroke, Vec2};
use image::RgbaImage;

use super::{ScreenEvent, ScreenId};
use crate::components::control_button::ControlButton;
use crate::config::{AssetsOptions, EditorOptions, Platform};
use crate::controls::brush::{paint_paths, read_paths};
use crate::controls::sprite::{SpriteKind, paint_sprite, read_sprites};
use crate::controls::stickers::sticker_texture;
use crate::controls::{CanvasView, ControlSwitcher, ControlTarget, value_to_color};
use crate::editor::{Editor, Feature, Zoom};
use crate::error::EditorResult;
use crate::event::EditorEvent;
use crate::export::ExportOutput;
use crate::modal::{Modal, ModalAction, ModalService};
use crate::operation::{BORDER, BRUSH, SPRITE};
use crate::sdk::PassthroughSdk;
use crate::shared_state::SharedValues;
use crate::texture_manager::{TextureManager, color_image};

const ZOOM_STEP: f32 = 1.25;
const SCROLL_ZOOM_SPEED: f32 = 0.002;
const PREVIEW_KEY: &str = "preview";

pub struct EditorScreen {
    editor: Editor,
    switcher: ControlSwitcher,
    assets: AssetsOptions,
    inbox: Rc<RefCell<Vec<EditorEvent>>>,
    textures: TextureManager,
    initial_zoom_pending: bool,
}

impl std::fmt::Debug for EditorScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorScreen")
            .field("editor", &self.editor)
            .field("switcher", &self.switcher)
            .finish()
    }
}

fn build_editor(options: &EditorOptions, platform: Platform) -> Editor {
    let mut editor = Editor::new(Box::new(PassthroughSdk::new()), options);
    editor.set_platform(platform);
    editor
}

impl EditorScreen {
    /// Builds the editor around `image`, downsampling it if it exceeds the configured caps
    pub fn new(options: &EditorOptions, image: RgbaImage, platform: Platform) -> EditorResult<Self> {
        let mut editor = build_editor(options, platform);

        let inbox = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&inbox);
        editor.subscribe(Box::new(move |event: &EditorEvent| {
            sink.borrow_mut().push(event.clone());
        }));

        editor.set_image(image)?;

        Ok(Self {
            editor,
            switcher: ControlSwitcher::new(options),
            assets: options.assets.clone(),
            inbox,
            textures: TextureManager::new(32),
            initial_zoom_pending: true,
        })
    }

    /// Whether [`EditorScreen::new`] will downsample an image of `dimensions`.
    ///
    /// Checks the megapixel cap and the engine's maximum dimensions.
    pub fn will_downsample(options: &EditorOptions, platform: Platform, dimensions: [u32; 2]) -> bool {
        build_editor(options, platform).needs_resize(dimensions)
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    /// Commits the active control and stops rendering
    pub fn dispose(&mut self, modals: &mut dyn ModalService) {
        self.switcher.exit_current(&mut self.editor, modals);
        self.editor.dispose();
        self.textures.clear();
    }

    pub fn ui(&mut self, ctx: &egui::Context, modals: &mut dyn ModalService) -> Option<ScreenEvent> {
        self.switcher.set_repaint_context(ctx.clone());
        self.textures.begin_frame();

        let mut event = None;
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            event = self.header_ui(ui, modals);
        });
        egui::TopBottomPanel::top("sub_header").show(ctx, |ui| {
            self.sub_header_ui(ui, modals);
        });
        if !self.switcher.is_home() {
            egui::TopBottomPanel::bottom("controls")
                .min_height(72.0)
                .show(ctx, |ui| {
                    self.switcher.panel_ui(ui, &mut self.editor, modals);
                });
        }
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::from_gray(24)))
            .show(ctx, |ui| {
                self.canvas_ui(ui, modals);
            });

        if self.editor.tick() || self.editor.needs_tick() {
            ctx.request_repaint();
        }
        self.drain_events(modals);
        event
    }

    fn drain_events(&mut self, modals: &mut dyn ModalService) {
        let events: Vec<EditorEvent> = self.inbox.borrow_mut().drain(..).collect();
        for event in events {
            match event {
                EditorEvent::RenderError(message) => {
                    modals.push(Modal::error("Rendering failed", message, ModalAction::Dismiss));
                }
                EditorEvent::ExportFailed(message) => {
                    modals.push(Modal::error("Export failed", message, ModalAction::Dismiss));
                }
                EditorEvent::Resize { from, to } => {
                    log::info!("resizing {}x{} to {}x{}", from[0], from[1], to[0], to[1]);
                }
                other => log::trace!("editor event: {:?}", other),
            }
        }
    }

    fn header_ui(&mut self, ui: &mut egui::Ui, modals: &mut dyn ModalService) -> Option<ScreenEvent> {
        let mut event = None;
        ui.horizontal(|ui| {
            if ui.button("⟵ New").clicked() {
                event = Some(ScreenEvent::Navigate(ScreenId::Splash));
            }
            ui.separator();

            if ui
                .add_enabled(self.editor.can_undo(), egui::Button::new("↺ Undo"))
                .clicked()
            {
                if let Err(err) = self.editor.undo() {
                    modals.push(Modal::error("Undo failed", err.to_string(), ModalAction::Dismiss));
                }
            }
            ui.separator();

            let zoom = self.editor.zoom();
            if ui.button("−").on_hover_text("Zoom out").clicked() {
                self.editor.set_zoom(Zoom::Value(zoom / ZOOM_STEP), None);
            }
            ui.label(format!("{:.0}%", zoom * 100.0));
            if ui.button("+").on_hover_text("Zoom in").clicked() {
                self.editor.set_zoom(Zoom::Value(zoom * ZOOM_STEP), None);
            }
            if ui.button("Fit").clicked() {
                self.editor.set_zoom(Zoom::Auto, None);
            }
            if ui.button("↶").on_hover_text("Previous zoom").clicked() {
                self.editor.undo_zoom();
            }

            if self.editor.export_options().show_button {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Export").clicked() {
                        self.export(modals);
                    }
                });
            }
        });
        event
    }

    fn export(&mut self, modals: &mut dyn ModalService) {
        let download = self.editor.export_options().download;
        let loading = modals.push(Modal::loading("Exporting…"));
        let result = self.editor.export(download);
        modals.close(loading);

        // Failures arrive through the event inbox.
        if let Ok(output) = result {
            match output {
                ExportOutput::Image(image) => log::info!("exported {}x{}", image.width(), image.height()),
                ExportOutput::Bytes { format, bytes } => {
                    log::info!("exported {} bytes as {}", bytes.len(), format.extension());
                }
            }
        }
    }

    fn sub_header_ui(&mut self, ui: &mut egui::Ui, modals: &mut dyn ModalService) {
        ui.horizontal(|ui| {
            if let Some(current) = self.switcher.current_identifier() {
                if ui.button("⟵ Back").clicked() {
                    self.switcher
                        .switch(ControlTarget::Back, &mut self.editor, modals, SharedValues::new());
                    return;
                }
                if ui.button("⌂").on_hover_text("All tools").clicked() {
                    self.switcher
                        .switch(ControlTarget::Home, &mut self.editor, modals, SharedValues::new());
                    return;
                }
                let label = self
                    .switcher
                    .registry()
                    .get(current)
                    .map_or(current, |descriptor| descriptor.label);
                ui.heading(label);
                return;
            }

            let groups = self
                .switcher
                .registry()
                .available_groups(&self.editor, self.switcher.options());
            let mut clicked = None;
            for (index, group) in groups.iter().enumerate() {
                if index > 0 {
                    ui.separator();
                }
                for descriptor in group {
                    if ControlButton::new(descriptor.icon, descriptor.label, false)
                        .show(ui)
                        .clicked()
                    {
                        clicked = Some(descriptor.identifier);
                    }
                }
            }
            if let Some(identifier) = clicked {
                self.switcher.switch(
                    ControlTarget::Control(identifier.to_owned()),
                    &mut self.editor,
                    modals,
                    SharedValues::new(),
                );
            }
        });
    }

    fn canvas_ui(&mut self, ui: &mut egui::Ui, modals: &mut dyn ModalService) {
        let (canvas, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());

        if self.editor.canvas_dimensions() != canvas.size() {
            self.editor.set_canvas_dimensions(canvas.size());
        }
        if self.initial_zoom_pending && canvas.width() > 0.0 && canvas.height() > 0.0 {
            self.initial_zoom_pending = false;
            self.editor.set_zoom(Zoom::Auto, None);
        }

        if response.hovered() && self.editor.is_feature_enabled(Feature::Zoom) {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                let zoom = self.editor.zoom() * (1.0 + scroll * SCROLL_ZOOM_SPEED);
                self.editor.set_zoom(Zoom::Value(zoom), None);
            }
        }
        if response.dragged() && self.editor.is_feature_enabled(Feature::Drag) {
            let offset = self.editor.offset() + response.drag_delta();
            self.editor.set_offset(offset);
        }

        let image_rect = image_rect(canvas, self.editor.output_dimensions(), self.editor.offset());
        let view = CanvasView {
            canvas,
            image: image_rect,
        };

        let painter = ui.painter_at(canvas);
        if let Some((preview, version)) = self.editor.preview() {
            let texture = self
                .textures
                .get_or_create(ui.ctx(), PREVIEW_KEY, version, || color_image(preview));
            match texture {
                Ok(texture) => {
                    painter.image(
                        texture.id(),
                        image_rect,
                        Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                        Color32::WHITE,
                    );
                }
                Err(err) => log::error!("cannot upload preview: {}", err),
            }
        } else {
            painter.text(
                canvas.center(),
                egui::Align2::CENTER_CENTER,
                "Rendering…",
                egui::FontId::proportional(16.0),
                Color32::GRAY,
            );
        }

        self.paint_layers(ui, &view);
        self.switcher.canvas_ui(ui, &view, &mut self.editor, modals);
    }

    /// Brush, sprite and frame layers drawn over the preview; the bundled engine only
    /// applies the geometry operations.
    fn paint_layers(&mut self, ui: &mut egui::Ui, view: &CanvasView) {
        let enabled = |identifier: &str| {
            self.editor
                .operation(identifier)
                .is_some_and(|operation| operation.is_enabled())
        };

        if enabled(BRUSH) {
            paint_paths(&ui.painter_at(view.canvas), view, &read_paths(&self.editor));
        }

        if enabled(SPRITE) {
            for sprite in read_sprites(&self.editor) {
                let texture = match &sprite.kind {
                    SpriteKind::Sticker { path, .. } => {
                        sticker_texture(&mut self.textures, ui.ctx(), &self.assets, path)
                    }
                    SpriteKind::Text { .. } => None,
                };
                paint_sprite(ui, view, &sprite, texture.as_ref());
            }
        }

        if let Some(border) = self.editor.operation(BORDER).filter(|operation| operation.is_enabled()) {
            let thickness = border.option_f32("thickness").unwrap_or(0.0) * view.reference_length();
            let color = border
                .option("color")
                .and_then(value_to_color)
                .unwrap_or(Color32::WHITE);
            if thickness > 0.0 {
                let inset = view.image.shrink(thickness / 2.0);
                ui.painter_at(view.canvas)
                    .rect_stroke(inset, 0.0, Stroke::new(thickness, color));
            }
        }
    }
}

/// Centered rect of `size` inside `canvas`, shifted by `offset`
pub fn image_rect(canvas: Rect, size: Vec2, offset: Vec2) -> Rect {
    Rect::from_center_size(canvas.center() + offset, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::vec2;

    #[test]
    fn image_rect_is_centered_and_offset() {
        let canvas = Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0));
        let rect = image_rect(canvas, vec2(400.0, 300.0), vec2(10.0, -20.0));
        assert_eq!(rect.min, Pos2::new(210.0, 130.0));
        assert_eq!(rect.size(), vec2(400.0, 300.0));
    }

    #[test]
    fn downsampling_checks_the_engine_dimension_cap() {
        let options = EditorOptions::default();
        assert!(!EditorScreen::will_downsample(&options, Platform::Desktop, [3000, 2000]));
        // Well under the megapixel cap but wider than the engine accepts
        assert!(EditorScreen::will_downsample(&options, Platform::Desktop, [9000, 100]));
    }
}
