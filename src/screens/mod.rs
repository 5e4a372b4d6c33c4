//! Top-level screens. Each one draws itself and reports what the app shell should do next.

pub mod editor;
pub mod splash;
pub mod webcam;

use std::path::PathBuf;

use image::RgbaImage;

pub use editor::EditorScreen;
pub use splash::SplashScreen;
pub use webcam::{NoWebcam, WebcamError, WebcamScreen, WebcamSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenId {
    Splash,
    Webcam,
    Editor,
}

/// Requests a screen hands back to the app shell
#[derive(Debug)]
pub enum ScreenEvent {
    Navigate(ScreenId),
    OpenPath(PathBuf),
    /// A decoded image, e.g. a webcam capture
    Image(RgbaImage),
}
