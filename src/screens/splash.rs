use std::path::PathBuf;

use egui::{Align, Layout, RichText};

use super::{ScreenEvent, ScreenId};

/// First screen: pick an image by path, by dropping it, or from the webcam
#[derive(Debug, Default)]
pub struct SplashScreen {
    path: String,
    webcam_enabled: bool,
}

impl SplashScreen {
    pub fn new(webcam_enabled: bool, last_path: Option<PathBuf>) -> Self {
        Self {
            path: last_path.map(|path| path.display().to_string()).unwrap_or_default(),
            webcam_enabled,
        }
    }

    pub fn ui(&mut self, ctx: &egui::Context, loading: bool) -> Option<ScreenEvent> {
        let mut event = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.with_layout(Layout::top_down(Align::Center), |ui| {
                ui.add_space(ui.available_height() * 0.25);
                ui.heading(RichText::new("Photo Editor").size(32.0));
                ui.add_space(24.0);

                ui.add_enabled_ui(!loading, |ui| {
                    ui.horizontal(|ui| {
                        let field = ui.add(
                            egui::TextEdit::singleline(&mut self.path)
                                .hint_text("Path to an image")
                                .desired_width(320.0),
                        );
                        let submitted = field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                        let trimmed = self.path.trim();
                        if (ui.button("Open").clicked() || submitted) && !trimmed.is_empty() {
                            event = Some(ScreenEvent::OpenPath(PathBuf::from(trimmed)));
                        }
                    });

                    if self.webcam_enabled {
                        ui.add_space(12.0);
                        if ui.button("📷 Take a photo").clicked() {
                            event = Some(ScreenEvent::Navigate(ScreenId::Webcam));
                        }
                    }
                });

                ui.add_space(24.0);
                ui.label(RichText::new("…or drop an image anywhere in this window").weak());
            });
        });
        event
    }
}
