//! The editor facade: the single owner of zoom, offset, operation lifecycle, history and
//! the render loop, sitting between the controls and the external SDK.
//!
//! Everything here runs on the UI thread. Controls mutate operations through the facade
//! and request renders; [`Editor::tick`] is called once per frame and performs at most
//! one SDK render for all requests gathered since the previous frame.
//!
//! # Example
//!
//! ```rust,no_run
//! use eframe_photo_editor::config::EditorOptions;
//! use eframe_photo_editor::editor::{Editor, Zoom};
//! use eframe_photo_editor::sdk::PassthroughSdk;
//!
//! let mut editor = Editor::new(Box::new(PassthroughSdk::new()), &EditorOptions::default());
//! editor.set_canvas_dimensions(egui::vec2(800.0, 600.0));
//! editor.set_image(image::RgbaImage::new(1600, 1200))?;
//! editor.set_zoom(Zoom::Auto, None);
//! editor.tick();
//! # Ok::<(), eframe_photo_editor::error::EditorError>(())
//! ```

mod features;
pub mod history;
pub mod render_loop;
pub mod resize;
pub mod zoom;

pub use features::{Feature, Features};
pub use history::{History, HistoryEntry};
pub use render_loop::{RenderCallback, RenderLoop};
pub use zoom::{Zoom, ZoomState};

use egui::Vec2;
use futures::channel::oneshot;
use image::RgbaImage;

use crate::config::{EditorOptions, MaxMegaPixels, Platform};
use crate::error::{EditorError, EditorResult};
use crate::event::{EditorEvent, EventBus, EventHandler};
use crate::export::{ExportOutput, Exporter};
use crate::operation::{Operation, OperationOptions, OperationStack, WATERMARK};
use crate::sdk::Sdk;

pub struct Editor {
    sdk: Box<dyn Sdk>,
    operations: OperationStack,
    history: History,
    zoom: ZoomState,
    offset: Vec2,
    features: Features,
    render_loop: RenderLoop,
    events: EventBus,
    exporter: Exporter,
    max_megapixels: MaxMegaPixels,
    platform: Platform,
    canvas_dimensions: Vec2,
    ready: bool,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("operations", &self.operations)
            .field("history", &self.history.len())
            .field("zoom", &self.zoom)
            .field("offset", &self.offset)
            .field("features", &self.features)
            .field("render_loop", &self.render_loop)
            .field("ready", &self.ready)
            .finish()
    }
}

impl Editor {
    pub fn new(sdk: Box<dyn Sdk>, options: &EditorOptions) -> Self {
        Self {
            sdk,
            operations: OperationStack::new(options.operations_order.clone()),
            history: History::new(),
            zoom: ZoomState::default(),
            offset: Vec2::ZERO,
            features: Features::default(),
            render_loop: RenderLoop::new(),
            events: EventBus::new(),
            exporter: Exporter::new(options.export.clone()),
            max_megapixels: options.max_megapixels,
            platform: Platform::default(),
            canvas_dimensions: Vec2::ZERO,
            ready: false,
        }
    }

    pub fn subscribe(&self, handler: Box<dyn EventHandler>) {
        self.events.subscribe(handler);
    }

    pub fn set_platform(&mut self, platform: Platform) {
        self.platform = platform;
    }

    /// Pixel cap for the current platform
    pub fn max_pixels(&self) -> u64 {
        self.max_megapixels.max_pixels(self.platform)
    }

    /// Whether an image of `dimensions` will be downsampled by [`Editor::set_image`]
    pub fn needs_resize(&self, dimensions: [u32; 2]) -> bool {
        resize::exceeds(dimensions, self.max_pixels(), self.sdk.max_dimensions())
    }

    /// Installs `image`, downsampling it first if it exceeds the caps.
    ///
    /// Emits `Resize`/`Resized` around the downsampling and `Ready` once the SDK holds the
    /// image. A failed resize leaves the editor not ready.
    pub fn set_image(&mut self, image: RgbaImage) -> EditorResult<()> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(EditorError::EmptyImage);
        }
        self.ready = false;

        let target = resize::target_dimensions(
            [width, height],
            self.max_pixels(),
            self.sdk.max_dimensions(),
        );
        let image = match target {
            Some(target) => {
                self.events.emit(EditorEvent::Resize {
                    from: [width, height],
                    to: target,
                });
                let resized = resize::downsample(&image, target)?;
                self.events.emit(EditorEvent::Resized {
                    dimensions: [resized.width(), resized.height()],
                });
                resized
            }
            None => image,
        };

        self.sdk.set_image(image);
        self.ready = true;

        self.zoom = ZoomState::default();
        self.zoom.update_bounds(self.final_dimensions(), self.canvas_dimensions);
        self.zoom.apply(Zoom::Auto);
        self.zoom.forget_previous();
        self.sdk.set_zoom(self.zoom.current());
        self.offset = Vec2::ZERO;
        self.sdk.set_offset(self.offset);

        log::info!("editor ready with {}x{} image", width, height);
        self.events.emit(EditorEvent::Ready);
        self.render(None);
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Discards every operation, the history and the image
    pub fn reset(&mut self) {
        self.operations.clear();
        self.history.clear();
        self.zoom = ZoomState::default();
        self.offset = Vec2::ZERO;
        self.features = Features::default();
        self.sdk.reset();
        self.ready = false;
    }

    /// Releases the SDK and every event subscriber
    pub fn dispose(&mut self) {
        self.render_loop.stop();
        self.sdk.dispose();
        self.events.clear();
        self.ready = false;
    }

    pub fn sdk(&self) -> &dyn Sdk {
        self.sdk.as_ref()
    }

    pub fn preview(&self) -> Option<(&RgbaImage, u64)> {
        self.sdk.preview()
    }

    pub fn final_dimensions(&self) -> Vec2 {
        self.sdk.final_dimensions(&self.operations)
    }

    pub fn output_dimensions(&self) -> Vec2 {
        self.sdk.output_dimensions(&self.operations, self.zoom.current())
    }

    // Operations

    pub fn supports_operation(&self, identifier: &str) -> bool {
        self.operations.supports(identifier)
    }

    pub fn operation(&self, identifier: &str) -> Option<&Operation> {
        self.operations.get(identifier)
    }

    pub fn operations(&self) -> &OperationStack {
        &self.operations
    }

    /// Returns the live operation for `identifier`, creating it with `options` on first use.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::UnknownOperation`] when `identifier` is not part of the
    /// configured `operations_order`.
    pub fn get_or_create_operation(
        &mut self,
        identifier: &str,
        options: OperationOptions,
    ) -> EditorResult<&mut Operation> {
        let (operation, created) = self.operations.get_or_create(identifier, options)?;
        if created {
            log::debug!("created operation `{}`", identifier);
            self.events.emit(EditorEvent::OperationCreated {
                identifier: identifier.to_owned(),
            });
        }
        Ok(operation)
    }

    /// Applies `update` to an existing operation, broadcasts the change and requests a render.
    ///
    /// Returns `false` if the operation does not exist.
    pub fn update_operation(&mut self, identifier: &str, update: impl FnOnce(&mut Operation)) -> bool {
        let Some(operation) = self.operations.get_mut(identifier) else {
            return false;
        };
        update(operation);
        self.events.emit(EditorEvent::OperationUpdated {
            identifier: identifier.to_owned(),
        });
        self.render(None);
        true
    }

    /// Creates the operation if needed, merges `options` into it and requests a render
    pub fn set_operation_options(
        &mut self,
        identifier: &str,
        options: OperationOptions,
    ) -> EditorResult<()> {
        self.get_or_create_operation(identifier, OperationOptions::new())?
            .set(options);
        self.events.emit(EditorEvent::OperationUpdated {
            identifier: identifier.to_owned(),
        });
        self.render(None);
        Ok(())
    }

    /// Removes the operation; every operation after it in the stack is marked dirty
    pub fn remove_operation(&mut self, identifier: &str) -> Option<Operation> {
        let removed = self.operations.remove(identifier)?;
        log::debug!("removed operation `{}`", identifier);
        self.events.emit(EditorEvent::OperationRemoved {
            identifier: identifier.to_owned(),
        });
        self.render(None);
        Some(removed)
    }

    // History

    pub fn add_history(&mut self, identifier: &str, prior_options: OperationOptions, existed_before: bool) {
        self.add_history_step(vec![HistoryEntry {
            operation: identifier.to_owned(),
            options: prior_options,
            existed_before,
        }]);
    }

    /// Records several operation edits as one undo step
    pub fn add_history_step(&mut self, entries: Vec<HistoryEntry>) {
        if entries.is_empty() {
            return;
        }
        self.history.push_step(entries);
        self.events.emit(EditorEvent::HistoryChanged {
            len: self.history.len(),
        });
    }

    /// Reverts the most recent history step, every entry of it. Returns `false` when there
    /// is nothing to undo.
    pub fn undo(&mut self) -> EditorResult<bool> {
        let Some(step) = self.history.pop() else {
            return Ok(false);
        };

        for entry in step.into_iter().rev() {
            if entry.existed_before {
                let (operation, _) = self
                    .operations
                    .get_or_create(&entry.operation, OperationOptions::new())?;
                operation.replace_options(entry.options);
                self.events.emit(EditorEvent::OperationUpdated {
                    identifier: entry.operation,
                });
            } else if self.operations.remove(&entry.operation).is_some() {
                self.events.emit(EditorEvent::OperationRemoved {
                    identifier: entry.operation,
                });
            }
        }

        self.events.emit(EditorEvent::HistoryChanged {
            len: self.history.len(),
        });
        self.render(None);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn has_history(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    // Zoom and offset

    pub fn set_canvas_dimensions(&mut self, dimensions: Vec2) {
        if self.canvas_dimensions == dimensions {
            return;
        }
        self.canvas_dimensions = dimensions;
        if self.ready {
            self.refresh_zoom_bounds();
            self.clamp_offset();
            self.render(None);
        }
    }

    pub fn canvas_dimensions(&self) -> Vec2 {
        self.canvas_dimensions
    }

    /// Applies `zoom`, clamped to `[min_zoom, 2 × default_zoom]`; `callback` runs after
    /// the resulting render. Returns the applied zoom.
    pub fn set_zoom(&mut self, zoom: Zoom, callback: Option<RenderCallback>) -> f32 {
        self.zoom.update_bounds(self.final_dimensions(), self.canvas_dimensions);
        let applied = self.zoom.apply(zoom);
        self.sdk.set_zoom(applied);
        self.clamp_offset();
        self.events.emit(EditorEvent::ZoomChanged { zoom: applied });
        self.render(callback);
        applied
    }

    /// Restores the zoom replaced by the last `set_zoom`, once
    pub fn undo_zoom(&mut self) -> Option<f32> {
        let restored = self.zoom.undo()?;
        self.sdk.set_zoom(restored);
        self.clamp_offset();
        self.events.emit(EditorEvent::ZoomChanged { zoom: restored });
        self.render(None);
        Some(restored)
    }

    pub fn zoom(&self) -> f32 {
        self.zoom.current()
    }

    pub fn default_zoom(&self) -> f32 {
        self.zoom.default_zoom()
    }

    pub fn min_zoom(&self) -> f32 {
        self.zoom.min_zoom()
    }

    pub fn max_zoom(&self) -> f32 {
        self.zoom.max_zoom()
    }

    /// Sets the pan offset, clamped so the output stays on the canvas. Returns the applied offset.
    pub fn set_offset(&mut self, offset: Vec2) -> Vec2 {
        self.offset = offset;
        self.clamp_offset();
        self.events.emit(EditorEvent::OffsetChanged { offset: self.offset });
        self.render(None);
        self.offset
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    fn clamp_offset(&mut self) {
        self.offset = zoom::clamp_offset(self.offset, self.output_dimensions(), self.canvas_dimensions);
        self.sdk.set_offset(self.offset);
    }

    fn refresh_zoom_bounds(&mut self) {
        let before = self.zoom.current();
        self.zoom.update_bounds(self.final_dimensions(), self.canvas_dimensions);
        self.zoom.clamp_current();
        if self.zoom.current() != before {
            self.sdk.set_zoom(self.zoom.current());
            self.events.emit(EditorEvent::ZoomChanged {
                zoom: self.zoom.current(),
            });
        }
    }

    // Features

    pub fn enable_features(&mut self, features: &[Feature]) {
        self.set_features(features, true);
    }

    pub fn disable_features(&mut self, features: &[Feature]) {
        self.set_features(features, false);
    }

    fn set_features(&mut self, features: &[Feature], enabled: bool) {
        let mut changed = false;
        for feature in features {
            changed |= self.features.set(*feature, enabled);
        }
        if changed {
            self.events.emit(EditorEvent::FeaturesChanged(self.features));
        }
    }

    pub fn is_feature_enabled(&self, feature: Feature) -> bool {
        self.features.is_enabled(feature)
    }

    pub fn features(&self) -> Features {
        self.features
    }

    // Rendering

    /// Requests a render on the next tick; `callback` runs once it has settled
    pub fn render(&mut self, callback: Option<RenderCallback>) {
        self.render_loop.request(callback);
    }

    /// Like [`Editor::render`], resolved through a future instead of a callback.
    ///
    /// The receiver reports `Canceled` if the loop is stopped before the render happens.
    pub fn render_future(&mut self) -> oneshot::Receiver<()> {
        let (sender, receiver) = oneshot::channel();
        self.render(Some(Box::new(move || {
            let _ = sender.send(());
        })));
        receiver
    }

    /// Performs the pending render, if any. Returns whether a render was attempted.
    ///
    /// SDK failures are broadcast as [`EditorEvent::RenderError`]; queued callbacks run
    /// either way, in the order they were queued.
    pub fn tick(&mut self) -> bool {
        let Some(waiters) = self.render_loop.take_pending() else {
            return false;
        };

        if self.ready {
            self.refresh_zoom_bounds();
            self.clamp_offset();
            match self.sdk.render(&mut self.operations) {
                Ok(()) => self.events.emit(EditorEvent::Rendered),
                Err(err) => {
                    log::error!("render failed: {}", err);
                    self.events.emit(EditorEvent::RenderError(err.to_string()));
                }
            }
        }

        for waiter in waiters {
            waiter();
        }
        true
    }

    pub fn needs_tick(&self) -> bool {
        self.render_loop.is_pending()
    }

    /// Stops the render loop, dropping queued callbacks
    pub fn stop(&mut self) {
        self.render_loop.stop();
    }

    pub fn start(&mut self) {
        self.render_loop.start();
    }

    // Export

    /// Exports the current image without the watermark.
    ///
    /// The watermark's enabled flag is restored afterwards whether the export succeeded or not.
    pub fn export(&mut self, download: bool) -> EditorResult<ExportOutput> {
        if !self.ready {
            return Err(EditorError::NotReady);
        }

        let watermark_enabled = self.operations.get(WATERMARK).map(Operation::is_enabled);
        if let Some(watermark) = self.operations.get_mut(WATERMARK) {
            watermark.set_enabled(false);
        }
        self.operations.mark_all_dirty();

        let result = self
            .exporter
            .export(self.sdk.as_mut(), &mut self.operations, download);

        if let (Some(enabled), Some(watermark)) =
            (watermark_enabled, self.operations.get_mut(WATERMARK))
        {
            watermark.set_enabled(enabled);
        }
        self.operations.mark_all_dirty();
        self.render(None);

        match result {
            Ok(output) => {
                self.events.emit(EditorEvent::Exported);
                Ok(output)
            }
            Err(err) => {
                log::error!("export failed: {}", err);
                self.events.emit(EditorEvent::ExportFailed(err.to_string()));
                Err(err.into())
            }
        }
    }

    pub fn export_options(&self) -> &crate::export::ExportOptions {
        self.exporter.options()
    }
}
