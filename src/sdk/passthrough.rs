use egui::{Vec2, vec2};
use image::{RgbaImage, imageops};

use super::{Sdk, SdkError};
use crate::geometry;
use crate::operation::{CROP, ORIENTATION, Operation, OperationStack};

const DEFAULT_MAX_DIMENSIONS: [u32; 2] = [8192, 8192];
const PREVIEW_BOUNDS: Vec2 = vec2(2048.0, 2048.0);

/// Minimal engine that only applies the dimension-changing operations.
///
/// Orientation and crop are honoured so the canvas geometry stays truthful; every
/// other operation is accepted and passed through untouched.
#[derive(Debug)]
pub struct PassthroughSdk {
    image: Option<RgbaImage>,
    preview: Option<RgbaImage>,
    preview_version: u64,
    max_dimensions: [u32; 2],
    zoom: f32,
    offset: Vec2,
    render_count: usize,
}

impl Default for PassthroughSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl PassthroughSdk {
    pub fn new() -> Self {
        Self {
            image: None,
            preview: None,
            preview_version: 0,
            max_dimensions: DEFAULT_MAX_DIMENSIONS,
            zoom: 1.0,
            offset: Vec2::ZERO,
            render_count: 0,
        }
    }

    pub fn with_max_dimensions(mut self, max_dimensions: [u32; 2]) -> Self {
        self.max_dimensions = max_dimensions;
        self
    }

    /// Number of times `render` has been called
    pub fn render_count(&self) -> usize {
        self.render_count
    }

    fn process(&self, operations: &OperationStack) -> Result<RgbaImage, SdkError> {
        let source = self.image.as_ref().ok_or(SdkError::NoImage)?;
        let mut output = match operations.get(ORIENTATION).filter(|op| op.is_enabled()) {
            Some(orientation) => orient(source, orientation),
            None => source.clone(),
        };

        if let Some(crop) = operations.get(CROP).filter(|op| op.is_enabled()) {
            let (width, height) = output.dimensions();
            let start = crop.option_vec2("start").unwrap_or(Vec2::ZERO);
            let end = crop.option_vec2("end").unwrap_or(Vec2::splat(1.0));
            let x = (start.x * width as f32).round() as u32;
            let y = (start.y * height as f32).round() as u32;
            let w = (((end.x - start.x) * width as f32).round() as u32).clamp(1, width - x.min(width - 1));
            let h = (((end.y - start.y) * height as f32).round() as u32).clamp(1, height - y.min(height - 1));
            output = imageops::crop_imm(&output, x.min(width - 1), y.min(height - 1), w, h).to_image();
        }

        Ok(output)
    }
}

fn orient(source: &RgbaImage, orientation: &Operation) -> RgbaImage {
    let rotation = orientation.option_f32("rotation").unwrap_or(0.0).round() as i32;
    let mut output = match rotation.rem_euclid(360) {
        90 => imageops::rotate90(source),
        180 => imageops::rotate180(source),
        270 => imageops::rotate270(source),
        _ => source.clone(),
    };
    if orientation.option_bool("flip_horizontally").unwrap_or(false) {
        imageops::flip_horizontal_in_place(&mut output);
    }
    if orientation.option_bool("flip_vertically").unwrap_or(false) {
        imageops::flip_vertical_in_place(&mut output);
    }
    output
}

impl Sdk for PassthroughSdk {
    fn set_image(&mut self, image: RgbaImage) {
        log::debug!("passthrough sdk received {}x{} image", image.width(), image.height());
        self.image = Some(image);
        self.preview = None;
    }

    fn image_dimensions(&self) -> Option<[u32; 2]> {
        self.image.as_ref().map(|image| [image.width(), image.height()])
    }

    fn max_dimensions(&self) -> Option<[u32; 2]> {
        Some(self.max_dimensions)
    }

    fn final_dimensions(&self, operations: &OperationStack) -> Vec2 {
        let Some([width, height]) = self.image_dimensions() else {
            return Vec2::ZERO;
        };
        let mut dimensions = vec2(width as f32, height as f32);

        if let Some(orientation) = operations.get(ORIENTATION).filter(|op| op.is_enabled()) {
            let rotation = orientation.option_f32("rotation").unwrap_or(0.0).round() as i32;
            if rotation.rem_euclid(180) == 90 {
                dimensions = vec2(dimensions.y, dimensions.x);
            }
        }

        if let Some(crop) = operations.get(CROP).filter(|op| op.is_enabled()) {
            let start = crop.option_vec2("start").unwrap_or(Vec2::ZERO);
            let end = crop.option_vec2("end").unwrap_or(Vec2::splat(1.0));
            dimensions = geometry::multiply(dimensions, end - start);
        }

        dimensions
    }

    fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom;
    }

    fn zoom(&self) -> f32 {
        self.zoom
    }

    fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    fn offset(&self) -> Vec2 {
        self.offset
    }

    fn render(&mut self, operations: &mut OperationStack) -> Result<(), SdkError> {
        self.render_count += 1;

        let stale = self.preview.is_none() || operations.iter().any(Operation::is_dirty);
        if !stale {
            return Ok(());
        }

        let output = self.process(operations)?;
        let size = vec2(output.width() as f32, output.height() as f32);
        let fitted = geometry::resize_to_fit(size, PREVIEW_BOUNDS);
        let preview = if fitted == size {
            output
        } else {
            imageops::thumbnail(&output, fitted.x.max(1.0) as u32, fitted.y.max(1.0) as u32)
        };

        self.preview = Some(preview);
        self.preview_version += 1;
        for operation in operations.iter_mut() {
            operation.set_dirty(false);
        }
        Ok(())
    }

    fn export(&mut self, operations: &mut OperationStack) -> Result<RgbaImage, SdkError> {
        self.process(operations)
    }

    fn preview(&self) -> Option<(&RgbaImage, u64)> {
        self.preview.as_ref().map(|preview| (preview, self.preview_version))
    }

    fn reset(&mut self) {
        self.image = None;
        self.preview = None;
        self.zoom = 1.0;
        self.offset = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{OperationOptions, options, vec2_to_value};
    use serde_json::json;

    fn stack() -> OperationStack {
        OperationStack::new(vec![ORIENTATION.into(), CROP.into()])
    }

    #[test]
    fn final_dimensions_follow_orientation_and_crop() {
        let mut sdk = PassthroughSdk::new();
        sdk.set_image(RgbaImage::new(400, 200));
        let mut operations = stack();

        operations
            .get_or_create(ORIENTATION, options([("rotation", json!(90))]))
            .unwrap();
        assert_eq!(sdk.final_dimensions(&operations), vec2(200.0, 400.0));

        operations
            .get_or_create(
                CROP,
                options([
                    ("start", vec2_to_value(vec2(0.0, 0.0))),
                    ("end", vec2_to_value(vec2(0.5, 0.5))),
                ]),
            )
            .unwrap();
        assert_eq!(sdk.final_dimensions(&operations), vec2(100.0, 200.0));
    }

    #[test]
    fn render_clears_dirty_flags_and_skips_clean_stacks() {
        let mut sdk = PassthroughSdk::new();
        sdk.set_image(RgbaImage::new(10, 10));
        let mut operations = stack();
        operations.get_or_create(CROP, OperationOptions::new()).unwrap();

        sdk.render(&mut operations).unwrap();
        let (_, first) = sdk.preview().unwrap();
        assert!(operations.iter().all(|op| !op.is_dirty()));

        sdk.render(&mut operations).unwrap();
        let (_, second) = sdk.preview().unwrap();
        assert_eq!(first, second);
        assert_eq!(sdk.render_count(), 2);
    }

    #[test]
    fn render_without_image_fails() {
        let mut sdk = PassthroughSdk::new();
        let mut operations = stack();
        assert!(matches!(sdk.render(&mut operations), Err(SdkError::NoImage)));
    }
}
