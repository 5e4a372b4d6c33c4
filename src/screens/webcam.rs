use image::RgbaImage;
use thiserror::Error;

use super::{ScreenEvent, ScreenId};
use crate::modal::{Modal, ModalAction, ModalService};

#[derive(Debug, Error)]
pub enum WebcamError {
    #[error("no webcam is available on this system")]
    Unavailable,
    #[error("webcam capture failed: {0}")]
    Capture(String),
}

/// Camera backend. Platform integrations implement this; the app ships with [`NoWebcam`].
pub trait WebcamSource {
    fn is_available(&self) -> bool;

    fn capture(&mut self) -> Result<RgbaImage, WebcamError>;
}

#[derive(Debug, Default)]
pub struct NoWebcam;

impl WebcamSource for NoWebcam {
    fn is_available(&self) -> bool {
        false
    }

    fn capture(&mut self) -> Result<RgbaImage, WebcamError> {
        Err(WebcamError::Unavailable)
    }
}

pub struct WebcamScreen {
    source: Box<dyn WebcamSource>,
    reported: bool,
}

impl std::fmt::Debug for WebcamScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebcamScreen")
            .field("available", &self.source.is_available())
            .field("reported", &self.reported)
            .finish()
    }
}

impl WebcamScreen {
    pub fn new(source: Box<dyn WebcamSource>) -> Self {
        Self { source, reported: false }
    }

    /// Hands the camera back, leaving this screen with [`NoWebcam`]
    pub fn take_source(&mut self) -> Box<dyn WebcamSource> {
        std::mem::replace(&mut self.source, Box::new(NoWebcam))
    }

    /// Raises the "no webcam" modal once; closing it returns to the splash screen.
    /// Returns whether the source can be used.
    pub fn check_available(&mut self, modals: &mut dyn ModalService) -> bool {
        if self.source.is_available() {
            return true;
        }
        if !self.reported {
            self.reported = true;
            modals.push(Modal::error(
                "Webcam",
                WebcamError::Unavailable.to_string(),
                ModalAction::Navigate(ScreenId::Splash),
            ));
        }
        false
    }

    pub fn capture(&mut self, modals: &mut dyn ModalService) -> Option<RgbaImage> {
        match self.source.capture() {
            Ok(image) => Some(image),
            Err(err) => {
                modals.push(Modal::error(
                    "Webcam",
                    err.to_string(),
                    ModalAction::Navigate(ScreenId::Splash),
                ));
                None
            }
        }
    }

    pub fn ui(&mut self, ctx: &egui::Context, modals: &mut dyn ModalService) -> Option<ScreenEvent> {
        let available = self.check_available(modals);
        let mut event = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() * 0.3);
                if available {
                    if ui.button("📷 Capture").clicked() {
                        event = self.capture(modals).map(ScreenEvent::Image);
                    }
                } else {
                    ui.label("Waiting for a camera…");
                }
                ui.add_space(12.0);
                if ui.button("Back").clicked() {
                    event = Some(ScreenEvent::Navigate(ScreenId::Splash));
                }
            });
        });
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::ModalManager;

    #[test]
    fn missing_webcam_reports_once_and_navigates_home() {
        let mut modals = ModalManager::new();
        let mut screen = WebcamScreen::new(Box::new(NoWebcam));

        assert!(!screen.check_available(&mut modals));
        assert!(!screen.check_available(&mut modals));
        assert_eq!(modals.len(), 1);

        let id = modals.front().map(|modal| modal.id).unwrap();
        assert_eq!(modals.close(id), Some(ModalAction::Navigate(ScreenId::Splash)));
    }

    struct FixedWebcam;

    impl WebcamSource for FixedWebcam {
        fn is_available(&self) -> bool {
            true
        }

        fn capture(&mut self) -> Result<RgbaImage, WebcamError> {
            Ok(RgbaImage::new(4, 3))
        }
    }

    #[test]
    fn available_webcam_captures() {
        let mut modals = ModalManager::new();
        let mut screen = WebcamScreen::new(Box::new(FixedWebcam));
        assert!(screen.check_available(&mut modals));
        let image = screen.capture(&mut modals).unwrap();
        assert_eq!(image.dimensions(), (4, 3));
        assert!(modals.is_empty());
    }
}
