use egui::{Color32, CursorIcon, Id, Pos2, Rect, Response, Sense, Stroke, Ui, Vec2};

pub const KNOB_RADIUS: f32 = 9.0;
const KNOB_COLOR: Color32 = Color32::from_rgb(30, 120, 255);

/// Represents a corner of a box-shaped overlay (crop area, sprite bounds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Corner::TopLeft => "top_left",
            Corner::TopRight => "top_right",
            Corner::BottomLeft => "bottom_left",
            Corner::BottomRight => "bottom_right",
        }
    }

    pub fn cursor_icon(&self) -> CursorIcon {
        match self {
            Corner::TopLeft => CursorIcon::ResizeNwSe,
            Corner::TopRight => CursorIcon::ResizeNeSw,
            Corner::BottomLeft => CursorIcon::ResizeNeSw,
            Corner::BottomRight => CursorIcon::ResizeNwSe,
        }
    }

    /// Direction from the opposite corner towards this one
    pub fn direction(&self) -> Vec2 {
        match self {
            Corner::TopLeft => Vec2::new(-1.0, -1.0),
            Corner::TopRight => Vec2::new(1.0, -1.0),
            Corner::BottomLeft => Vec2::new(-1.0, 1.0),
            Corner::BottomRight => Vec2::new(1.0, 1.0),
        }
    }

    pub fn of(&self, rect: Rect) -> Pos2 {
        match self {
            Corner::TopLeft => rect.left_top(),
            Corner::TopRight => rect.right_top(),
            Corner::BottomLeft => rect.left_bottom(),
            Corner::BottomRight => rect.right_bottom(),
        }
    }

    pub fn opposite(&self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }
}

/// A draggable round handle drawn on the canvas overlay
pub struct Knob {
    id: Id,
    position: Pos2,
    cursor: CursorIcon,
}

impl Knob {
    pub fn new(id: impl std::hash::Hash, position: Pos2) -> Self {
        Self {
            id: Id::new(("knob", id)),
            position,
            cursor: CursorIcon::Grab,
        }
    }

    pub fn with_cursor(mut self, cursor: CursorIcon) -> Self {
        self.cursor = cursor;
        self
    }

    /// Show the knob and return the response
    pub fn show(&self, ui: &mut Ui) -> Response {
        let rect = Rect::from_center_size(self.position, Vec2::splat(KNOB_RADIUS * 2.0));

        let response = ui
            .interact(rect, self.id, Sense::drag())
            .on_hover_cursor(self.cursor);

        let fill = if response.hovered() || response.dragged() {
            Color32::from_rgb(135, 206, 250)
        } else {
            KNOB_COLOR
        };
        ui.painter().circle_filled(self.position, KNOB_RADIUS, fill);
        ui.painter()
            .circle_stroke(self.position, KNOB_RADIUS, Stroke::new(1.5, Color32::WHITE));

        response
    }
}
