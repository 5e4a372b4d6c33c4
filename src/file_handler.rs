use std::path::{Path, PathBuf};
use std::sync::Arc;

use eframe::egui;
use image::RgbaImage;
use parking_lot::Mutex;
use thiserror::Error;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("{0} is not a supported image file")]
    NotAnImage(String),

    #[error("dropped file has no accessible data")]
    NoData,
}

type Slot = Arc<Mutex<Option<Result<RgbaImage, IntakeError>>>>;

/// Reads and decodes images off the UI thread.
///
/// Only one load runs at a time; starting a new one replaces the pending result.
#[derive(Default)]
pub struct ImageIntake {
    slot: Slot,
    loading: bool,
    last_path: Option<PathBuf>,
}

impl std::fmt::Debug for ImageIntake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageIntake")
            .field("loading", &self.loading)
            .field("last_path", &self.last_path)
            .finish()
    }
}

impl ImageIntake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Path of the most recent successful path load
    pub fn last_path(&self) -> Option<&Path> {
        self.last_path.as_deref()
    }

    pub fn open_path(&mut self, path: PathBuf, ctx: Option<egui::Context>) {
        if !has_image_extension(&path) {
            self.finish_now(Err(IntakeError::NotAnImage(path.display().to_string())));
            return;
        }
        log::info!("loading image from {}", path.display());
        self.last_path = Some(path.clone());
        self.spawn(ctx, move || {
            let bytes = std::fs::read(&path).map_err(|source| IntakeError::Io {
                path: path.clone(),
                source,
            })?;
            decode(&bytes)
        });
    }

    pub fn open_bytes(&mut self, bytes: Arc<[u8]>, ctx: Option<egui::Context>) {
        log::info!("loading image from memory ({} bytes)", bytes.len());
        self.spawn(ctx, move || decode(&bytes));
    }

    /// Starts loading the first dropped image, if any. Returns whether a file was dropped.
    pub fn check_for_dropped_files(&mut self, ctx: &egui::Context) -> bool {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return false;
        };

        if !is_image_file(&file) {
            let name = file
                .path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| file.name.clone());
            log::warn!("dropped file is not a supported type: {}", name);
            self.finish_now(Err(IntakeError::NotAnImage(name)));
            return true;
        }

        if let Some(bytes) = file.bytes {
            self.open_bytes(bytes, Some(ctx.clone()));
        } else if let Some(path) = file.path {
            self.open_path(path, Some(ctx.clone()));
        } else {
            self.finish_now(Err(IntakeError::NoData));
        }
        true
    }

    /// Takes the finished result, if the background load is done
    pub fn poll(&mut self) -> Option<Result<RgbaImage, IntakeError>> {
        let result = self.slot.lock().take();
        if result.is_some() {
            self.loading = false;
        }
        result
    }

    /// Darkens the window and lists the files hovering over it
    pub fn preview_files_being_dropped(&self, ctx: &egui::Context) {
        use egui::{Align2, Color32, FontId, Id, LayerId, Order};

        if ctx.input(|i| i.raw.hovered_files.is_empty()) {
            return;
        }

        let text = ctx.input(|i| {
            let mut text = "Drop to open:\n".to_owned();
            for file in &i.raw.hovered_files {
                match &file.path {
                    Some(path) => text += &format!("\n{}", path.display()),
                    None if !file.mime.is_empty() => text += &format!("\n{}", file.mime),
                    None => text += "\n…",
                }
            }
            text
        });

        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("file_drop_target")));
        let screen_rect = ctx.screen_rect();
        painter.rect_filled(screen_rect, 0.0, Color32::from_black_alpha(192));
        painter.text(
            screen_rect.center(),
            Align2::CENTER_CENTER,
            text,
            FontId::proportional(20.0),
            Color32::WHITE,
        );
    }

    fn finish_now(&mut self, result: Result<RgbaImage, IntakeError>) {
        *self.slot.lock() = Some(result);
        self.loading = true;
    }

    fn spawn<F>(&mut self, ctx: Option<egui::Context>, job: F)
    where
        F: FnOnce() -> Result<RgbaImage, IntakeError> + Send + 'static,
    {
        // A fresh slot so a superseded load cannot overwrite this one.
        let slot: Slot = Arc::new(Mutex::new(None));
        self.slot = Arc::clone(&slot);
        self.loading = true;

        std::thread::spawn(move || {
            let result = job();
            if let Err(err) = &result {
                log::error!("image load failed: {}", err);
            }
            *slot.lock() = Some(result);
            if let Some(ctx) = ctx {
                ctx.request_repaint();
            }
        });
    }
}

fn decode(bytes: &[u8]) -> Result<RgbaImage, IntakeError> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    log::debug!("decoded {}x{} image", image.width(), image.height());
    Ok(image)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Checks the MIME type, falling back to the extension
pub fn is_image_file(file: &egui::DroppedFile) -> bool {
    if !file.mime.is_empty() {
        file.mime.starts_with("image/")
    } else if let Some(path) = &file.path {
        has_image_extension(path)
    } else {
        has_image_extension(Path::new(&file.name))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    use super::*;

    fn wait(intake: &mut ImageIntake) -> Result<RgbaImage, IntakeError> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(result) = intake.poll() {
                return result;
            }
            assert!(Instant::now() < deadline, "image load timed out");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbaImage::new(width, height)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decodes_bytes_in_the_background() {
        let mut intake = ImageIntake::new();
        intake.open_bytes(png_bytes(6, 4).into(), None);
        assert!(intake.is_loading());

        let image = wait(&mut intake).unwrap();
        assert_eq!(image.dimensions(), (6, 4));
        assert!(!intake.is_loading());
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let mut intake = ImageIntake::new();
        intake.open_bytes(Arc::from(&b"not an image"[..]), None);
        assert!(matches!(wait(&mut intake), Err(IntakeError::Decode(_))));
    }

    #[test]
    fn rejects_non_image_paths_without_reading() {
        let mut intake = ImageIntake::new();
        intake.open_path(PathBuf::from("notes.txt"), None);
        assert!(matches!(intake.poll(), Some(Err(IntakeError::NotAnImage(_)))));
        assert!(intake.last_path().is_none());
    }

    #[test]
    fn missing_file_reports_io_error() {
        let mut intake = ImageIntake::new();
        intake.open_path(PathBuf::from("/definitely/not/here.png"), None);
        assert!(matches!(wait(&mut intake), Err(IntakeError::Io { .. })));
    }

    #[test]
    fn image_detection_prefers_mime() {
        let file = egui::DroppedFile {
            name: "photo.txt".to_owned(),
            mime: "image/png".to_owned(),
            ..Default::default()
        };
        assert!(is_image_file(&file));

        let file = egui::DroppedFile {
            name: "photo.JPG".to_owned(),
            ..Default::default()
        };
        assert!(is_image_file(&file));

        let file = egui::DroppedFile {
            path: Some(PathBuf::from("doc.pdf")),
            ..Default::default()
        };
        assert!(!is_image_file(&file));
    }
}
