use std::path::PathBuf;

use image::RgbaImage;
use uuid::Uuid;

use crate::config::{EditorOptions, Platform};
use crate::file_handler::ImageIntake;
use crate::modal::{Modal, ModalAction, ModalManager, ModalService};
use crate::screens::{
    EditorScreen, NoWebcam, ScreenEvent, ScreenId, SplashScreen, WebcamScreen, WebcamSource,
};

/// What survives a restart.
#[derive(serde::Deserialize, serde::Serialize, Debug, Default)]
#[serde(default)]
pub struct Persisted {
    pub config_path: Option<PathBuf>,
    pub last_image: Option<PathBuf>,
}

enum Screen {
    Splash(SplashScreen),
    Webcam(WebcamScreen),
    Editor(Box<EditorScreen>),
}

impl Screen {
    fn id(&self) -> ScreenId {
        match self {
            Self::Splash(_) => ScreenId::Splash,
            Self::Webcam(_) => ScreenId::Webcam,
            Self::Editor(_) => ScreenId::Editor,
        }
    }
}

pub struct PhotoEditorApp {
    options: EditorOptions,
    persisted: Persisted,
    screen: Screen,
    modals: ModalManager,
    intake: ImageIntake,
    /// Decoded image waiting for the editor, e.g. behind the oversize warning
    pending_image: Option<RgbaImage>,
    loading_modal: Option<Uuid>,
    webcam_source: Option<Box<dyn WebcamSource>>,
}

impl std::fmt::Debug for PhotoEditorApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoEditorApp")
            .field("screen", &self.screen.id())
            .field("persisted", &self.persisted)
            .field("modals", &self.modals)
            .field("intake", &self.intake)
            .finish()
    }
}

impl PhotoEditorApp {
    /// Called once before the first frame.
    ///
    /// `config_path` overrides the path remembered from the previous run.
    pub fn new(cc: &eframe::CreationContext<'_>, config_path: Option<PathBuf>) -> Self {
        let mut persisted: Persisted = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();
        if config_path.is_some() {
            persisted.config_path = config_path;
        }

        let mut modals = ModalManager::new();
        let options = match &persisted.config_path {
            Some(path) => match EditorOptions::load(path) {
                Ok(options) => options,
                Err(err) => {
                    modals.push(Modal::error(
                        "Configuration",
                        format!("{}: {}", path.display(), err),
                        ModalAction::Dismiss,
                    ));
                    EditorOptions::default()
                }
            },
            None => EditorOptions::default(),
        };

        Self::with_options(options, persisted, modals)
    }

    pub fn with_options(options: EditorOptions, persisted: Persisted, modals: ModalManager) -> Self {
        log::info!("starting editor, language `{}`", options.language);
        let splash = SplashScreen::new(options.webcam, persisted.last_image.clone());
        Self {
            options,
            persisted,
            screen: Screen::Splash(splash),
            modals,
            intake: ImageIntake::new(),
            pending_image: None,
            loading_modal: None,
            webcam_source: None,
        }
    }

    /// Replaces the camera backend used by the webcam screen
    pub fn with_webcam_source(mut self, source: Box<dyn WebcamSource>) -> Self {
        self.webcam_source = Some(source);
        self
    }

    fn platform(&self, ctx: &egui::Context) -> Platform {
        if self.options.responsive {
            Platform::from_screen_width(ctx.screen_rect().width())
        } else {
            Platform::Desktop
        }
    }

    fn navigate(&mut self, target: ScreenId, ctx: &egui::Context) {
        if target == ScreenId::Editor && self.pending_image.is_none() {
            log::warn!("no image to edit");
            return;
        }
        match &mut self.screen {
            Screen::Editor(editor) => editor.dispose(&mut self.modals),
            Screen::Webcam(webcam) => self.webcam_source = Some(webcam.take_source()),
            Screen::Splash(_) => {}
        }

        self.screen = match target {
            ScreenId::Splash => Screen::Splash(SplashScreen::new(
                self.options.webcam,
                self.persisted.last_image.clone(),
            )),
            ScreenId::Webcam => {
                let source = self
                    .webcam_source
                    .take()
                    .unwrap_or_else(|| Box::new(NoWebcam));
                Screen::Webcam(WebcamScreen::new(source))
            }
            ScreenId::Editor => {
                let loading = self.modals.push(Modal::loading("Preparing image…"));
                let screen = self
                    .pending_image
                    .take()
                    .map(|image| EditorScreen::new(&self.options, image, self.platform(ctx)));
                self.modals.close(loading);
                match screen {
                    Some(Ok(screen)) => Screen::Editor(Box::new(screen)),
                    Some(Err(err)) => {
                        self.modals.push(Modal::error(
                            "Cannot open image",
                            err.to_string(),
                            ModalAction::Dismiss,
                        ));
                        Screen::Splash(SplashScreen::new(
                            self.options.webcam,
                            self.persisted.last_image.clone(),
                        ))
                    }
                    None => return,
                }
            }
        };
        log::debug!("navigated to {:?}", self.screen.id());
    }

    /// Opens the editor for `image`, warning first if it will be downsampled
    fn accept_image(&mut self, image: RgbaImage, ctx: &egui::Context) {
        let dimensions = [image.width(), image.height()];
        let platform = self.platform(ctx);
        let max_pixels = self.options.max_megapixels.max_pixels(platform);
        self.pending_image = Some(image);

        if EditorScreen::will_downsample(&self.options, platform, dimensions) {
            let megapixels = max_pixels as f64 / 1_000_000.0;
            self.modals.push(Modal::warning(
                "Large image",
                format!(
                    "This image is {}×{} pixels and will be reduced to fit the editor (at most {:.1} megapixels).",
                    dimensions[0], dimensions[1], megapixels
                ),
                ModalAction::Navigate(ScreenId::Editor),
            ));
        } else {
            self.navigate(ScreenId::Editor, ctx);
        }
    }

    fn handle_screen_event(&mut self, event: ScreenEvent, ctx: &egui::Context) {
        match event {
            ScreenEvent::Navigate(target) => self.navigate(target, ctx),
            ScreenEvent::OpenPath(path) => self.intake.open_path(path, Some(ctx.clone())),
            ScreenEvent::Image(image) => self.accept_image(image, ctx),
        }
    }

    fn poll_intake(&mut self, ctx: &egui::Context) {
        if self.intake.is_loading() && self.loading_modal.is_none() {
            self.loading_modal = Some(self.modals.push(Modal::loading("Loading image…")));
        }
        let Some(result) = self.intake.poll() else {
            return;
        };
        if let Some(id) = self.loading_modal.take() {
            self.modals.close(id);
        }

        match result {
            Ok(image) => {
                if let Some(path) = self.intake.last_path() {
                    self.persisted.last_image = Some(path.to_path_buf());
                }
                self.accept_image(image, ctx);
            }
            Err(err) => {
                self.modals
                    .push(Modal::error("Cannot open image", err.to_string(), ModalAction::Dismiss));
            }
        }
    }
}

impl eframe::App for PhotoEditorApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.persisted);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if matches!(self.screen, Screen::Splash(_)) {
            self.intake.preview_files_being_dropped(ctx);
            self.intake.check_for_dropped_files(ctx);
        }
        self.poll_intake(ctx);

        let loading = self.intake.is_loading();
        let event = match &mut self.screen {
            Screen::Splash(splash) => splash.ui(ctx, loading),
            Screen::Webcam(webcam) => webcam.ui(ctx, &mut self.modals),
            Screen::Editor(editor) => editor.ui(ctx, &mut self.modals),
        };
        if let Some(event) = event {
            self.handle_screen_event(event, ctx);
        }

        match self.modals.show_front(ctx) {
            Some(ModalAction::Navigate(target)) => self.navigate(target, ctx),
            Some(ModalAction::Dismiss) | None => {}
        }
    }
}
