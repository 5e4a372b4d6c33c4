//! Boundary with the external image-processing engine.
//!
//! The editor facade owns the operation stack and hands it to the engine for every
//! render and export. Pixel work lives entirely behind this trait.

mod passthrough;

pub use passthrough::PassthroughSdk;

use egui::Vec2;
use image::RgbaImage;
use thiserror::Error;

use crate::operation::OperationStack;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("no image has been set")]
    NoImage,

    #[error("render failed: {0}")]
    RenderFailed(String),

    #[error("export failed: {0}")]
    ExportFailed(String),
}

pub trait Sdk {
    fn set_image(&mut self, image: RgbaImage);

    /// Dimensions of the installed source image
    fn image_dimensions(&self) -> Option<[u32; 2]>;

    /// Largest image the engine can hold (e.g. the maximum texture size)
    fn max_dimensions(&self) -> Option<[u32; 2]>;

    /// Dimensions of the image after dimension-changing operations (crop, orientation)
    fn final_dimensions(&self, operations: &OperationStack) -> Vec2;

    /// Dimensions of the rendered output at `zoom`
    fn output_dimensions(&self, operations: &OperationStack, zoom: f32) -> Vec2 {
        self.final_dimensions(operations) * zoom
    }

    fn set_zoom(&mut self, zoom: f32);
    fn zoom(&self) -> f32;

    fn set_offset(&mut self, offset: Vec2);
    fn offset(&self) -> Vec2;

    /// Renders the current stack. Implementations clear the dirty flags they consumed.
    fn render(&mut self, operations: &mut OperationStack) -> Result<(), SdkError>;

    /// Renders the full-resolution output for export
    fn export(&mut self, operations: &mut OperationStack) -> Result<RgbaImage, SdkError>;

    /// Last rendered preview and a counter that changes whenever it does
    fn preview(&self) -> Option<(&RgbaImage, u64)>;

    /// Drops the image and every cached output
    fn reset(&mut self);

    fn dispose(&mut self) {
        self.reset();
    }
}
