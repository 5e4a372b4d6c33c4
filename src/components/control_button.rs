use eframe::egui;

/// Square sub-header button for one control, icon on top and label below
pub struct ControlButton<'a> {
    pub icon: &'a str,
    pub label: &'a str,
    pub selected: bool,
}

impl<'a> ControlButton<'a> {
    pub fn new(icon: &'a str, label: &'a str, selected: bool) -> Self {
        Self { icon, label, selected }
    }

    pub fn show(&self, ui: &mut egui::Ui) -> egui::Response {
        let button_size = egui::vec2(64.0, 52.0);
        let (rect, response) = ui.allocate_exact_size(button_size, egui::Sense::click());

        if ui.is_rect_visible(rect) {
            let bg_color = if self.selected {
                egui::Color32::from_rgb(100, 181, 246)
            } else if response.hovered() {
                egui::Color32::from_gray(40)
            } else {
                egui::Color32::from_gray(30)
            };
            ui.painter().rect_filled(rect, 4.0, bg_color);

            let text_color = if self.selected {
                egui::Color32::BLACK
            } else {
                egui::Color32::WHITE
            };
            ui.painter().text(
                rect.center_top() + egui::vec2(0.0, 18.0),
                egui::Align2::CENTER_CENTER,
                self.icon,
                egui::FontId::proportional(20.0),
                text_color,
            );
            ui.painter().text(
                rect.center_bottom() - egui::vec2(0.0, 10.0),
                egui::Align2::CENTER_CENTER,
                self.label,
                egui::FontId::proportional(11.0),
                text_color,
            );
        }

        response.on_hover_text(self.label)
    }
}
