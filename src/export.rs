//! Exporter collaborator: asks the SDK for the full-resolution output, encodes it and
//! optionally writes it to disk.

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::operation::OperationStack;
use crate::sdk::{Sdk, SdkError};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Sdk(#[from] SdkError),

    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// What `export` hands back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// Decoded pixels
    #[default]
    Image,
    /// Encoded file bytes in the configured format
    Bytes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub show_button: bool,
    pub format: ExportFormat,
    pub kind: ExportKind,
    /// Write the encoded file to `directory` on export
    pub download: bool,
    pub file_name: String,
    pub directory: PathBuf,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            show_button: true,
            format: ExportFormat::Png,
            kind: ExportKind::Image,
            download: true,
            file_name: "photoeditor".to_owned(),
            directory: PathBuf::from("."),
        }
    }
}

impl ExportOptions {
    pub fn target_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}.{}", self.file_name, self.format.extension()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutput {
    Image(RgbaImage),
    Bytes {
        format: ExportFormat,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Exporter {
    options: ExportOptions,
}

impl Exporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn export(
        &self,
        sdk: &mut dyn Sdk,
        operations: &mut OperationStack,
        download: bool,
    ) -> Result<ExportOutput, ExportError> {
        let image = sdk.export(operations)?;
        log::info!("exporting {}x{} image", image.width(), image.height());

        let needs_bytes = download || self.options.kind == ExportKind::Bytes;
        let bytes = if needs_bytes {
            Some(encode(&image, self.options.format)?)
        } else {
            None
        };

        if let (true, Some(bytes)) = (download, &bytes) {
            let path = self.options.target_path();
            fs::write(&path, bytes)?;
            log::info!("export written to {}", path.display());
        }

        Ok(match (self.options.kind, bytes) {
            (ExportKind::Bytes, Some(bytes)) => ExportOutput::Bytes {
                format: self.options.format,
                bytes,
            },
            _ => ExportOutput::Image(image),
        })
    }
}

/// Encodes `image`; JPEG drops the alpha channel since the encoder cannot store it.
pub fn encode(image: &RgbaImage, format: ExportFormat) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);
    match format {
        ExportFormat::Png => image.write_to(&mut cursor, ImageFormat::Png)?,
        ExportFormat::Jpeg => DynamicImage::ImageRgba8(image.clone())
            .to_rgb8()
            .write_to(&mut cursor, ImageFormat::Jpeg)?,
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_and_jpeg_encode() {
        let image = RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 128]));
        let png = encode(&image, ExportFormat::Png).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let jpeg = encode(&image, ExportFormat::Jpeg).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn target_path_uses_format_extension() {
        let options = ExportOptions {
            format: ExportFormat::Jpeg,
            file_name: "out".into(),
            directory: PathBuf::from("exports"),
            ..Default::default()
        };
        assert_eq!(options.target_path(), PathBuf::from("exports").join("out.jpg"));
    }
}
