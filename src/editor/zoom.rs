use egui::{Vec2, vec2};

use crate::geometry;

/// Output is never shrunk below what fits into this box
pub const MIN_ZOOM_BOUNDS: Vec2 = vec2(300.0, 300.0);

/// A zoom request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Zoom {
    /// Fit the final image into the canvas
    Auto,
    Value(f32),
}

/// Current zoom, its bounds and the single remembered previous level.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomState {
    current: f32,
    previous: Option<f32>,
    default_zoom: f32,
    min_zoom: f32,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            current: 1.0,
            previous: None,
            default_zoom: 1.0,
            min_zoom: 1.0,
        }
    }
}

impl ZoomState {
    /// Recomputes the bounds for new final or canvas dimensions.
    ///
    /// The minimum is capped at the default so `Auto` always lands inside the range.
    pub fn update_bounds(&mut self, final_dimensions: Vec2, canvas_dimensions: Vec2) {
        self.default_zoom = geometry::fit_scale(final_dimensions, canvas_dimensions);
        self.min_zoom = geometry::fit_scale(final_dimensions, MIN_ZOOM_BOUNDS).min(self.default_zoom);
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn default_zoom(&self) -> f32 {
        self.default_zoom
    }

    pub fn min_zoom(&self) -> f32 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f32 {
        self.default_zoom * 2.0
    }

    pub fn resolve(&self, zoom: Zoom) -> f32 {
        match zoom {
            Zoom::Auto => self.default_zoom,
            Zoom::Value(value) => value.clamp(self.min_zoom, self.max_zoom()),
        }
    }

    /// Applies `zoom` and remembers the level it replaced. Returns the applied zoom.
    pub fn apply(&mut self, zoom: Zoom) -> f32 {
        self.previous = Some(self.current);
        self.current = self.resolve(zoom);
        self.current
    }

    /// Restores the remembered level once; later calls return `None` until the next `apply`.
    pub fn undo(&mut self) -> Option<f32> {
        let previous = self.previous.take()?;
        self.current = previous.clamp(self.min_zoom, self.max_zoom());
        Some(self.current)
    }

    pub fn forget_previous(&mut self) {
        self.previous = None;
    }

    /// Re-clamps the current zoom after the bounds moved
    pub fn clamp_current(&mut self) {
        self.current = self.current.clamp(self.min_zoom, self.max_zoom());
    }
}

/// Clamps `offset` so the output cannot be dragged further than its overflow past the canvas.
///
/// Axes where the output fits inside the canvas are pinned to zero.
pub fn clamp_offset(offset: Vec2, output_dimensions: Vec2, canvas_dimensions: Vec2) -> Vec2 {
    let overflow = ((output_dimensions - canvas_dimensions) / 2.0).max(Vec2::ZERO);
    geometry::clamp_vec(offset, -overflow, overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(final_dimensions: Vec2, canvas: Vec2) -> ZoomState {
        let mut state = ZoomState::default();
        state.update_bounds(final_dimensions, canvas);
        state
    }

    #[test]
    fn auto_is_default_fit() {
        let state = state(vec2(4000.0, 3000.0), vec2(800.0, 600.0));
        assert_eq!(state.resolve(Zoom::Auto), 0.2);
    }

    #[test]
    fn values_are_clamped() {
        let state = state(vec2(4000.0, 3000.0), vec2(800.0, 600.0));
        assert_eq!(state.resolve(Zoom::Value(10.0)), 0.4);
        assert_eq!(state.resolve(Zoom::Value(0.0)), state.min_zoom());
        assert_eq!(state.min_zoom(), 0.075);
    }

    #[test]
    fn min_never_exceeds_default() {
        let state = state(vec2(4000.0, 4000.0), vec2(200.0, 200.0));
        assert_eq!(state.default_zoom(), 0.05);
        assert_eq!(state.min_zoom(), 0.05);
    }

    #[test]
    fn undo_restores_once() {
        let mut state = state(vec2(1000.0, 1000.0), vec2(1000.0, 1000.0));
        state.apply(Zoom::Value(0.5));
        state.apply(Zoom::Value(1.5));
        assert_eq!(state.undo(), Some(0.5));
        assert_eq!(state.undo(), None);
        assert_eq!(state.current(), 0.5);
    }

    #[test]
    fn offset_pinned_when_output_fits() {
        let clamped = clamp_offset(vec2(50.0, -50.0), vec2(400.0, 1000.0), vec2(800.0, 600.0));
        assert_eq!(clamped, vec2(0.0, -50.0));
        let clamped = clamp_offset(vec2(0.0, -900.0), vec2(400.0, 1000.0), vec2(800.0, 600.0));
        assert_eq!(clamped, vec2(0.0, -200.0));
    }
}
