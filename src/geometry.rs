//! Small vector helpers shared by the zoom bookkeeping and the geometry-heavy controls.

use egui::{Pos2, Rect, Vec2, vec2};

/// Component-wise clamp of `v` into `[min, max]`.
pub fn clamp_vec(v: Vec2, min: Vec2, max: Vec2) -> Vec2 {
    vec2(v.x.clamp(min.x, max.x), v.y.clamp(min.y, max.y))
}

/// Component-wise division. Zero divisors yield zero instead of infinity.
pub fn divide(a: Vec2, b: Vec2) -> Vec2 {
    let div = |n: f32, d: f32| if d == 0.0 { 0.0 } else { n / d };
    vec2(div(a.x, b.x), div(a.y, b.y))
}

/// Component-wise multiplication.
pub fn multiply(a: Vec2, b: Vec2) -> Vec2 {
    vec2(a.x * b.x, a.y * b.y)
}

/// Scale factor that fits `size` into `bounds`, never scaling up.
///
/// Returns `1.0` for degenerate sizes so callers never divide by zero.
pub fn fit_scale(size: Vec2, bounds: Vec2) -> f32 {
    if size.x <= 0.0 || size.y <= 0.0 || bounds.x <= 0.0 || bounds.y <= 0.0 {
        return 1.0;
    }
    (bounds.x / size.x).min(bounds.y / size.y).min(1.0)
}

/// `size` scaled down to fit into `bounds`, aspect ratio preserved.
pub fn resize_to_fit(size: Vec2, bounds: Vec2) -> Vec2 {
    size * fit_scale(size, bounds)
}

/// Rotates `v` counter-clockwise (in screen space: clockwise) by `angle` radians.
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    vec2(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Maps a screen position into the normalized `[0, 1]` space of `rect`.
pub fn to_normalized(rect: Rect, pos: Pos2) -> Vec2 {
    divide(pos - rect.min, rect.size())
}

/// Maps a normalized position back onto `rect`.
pub fn from_normalized(rect: Rect, v: Vec2) -> Pos2 {
    rect.min + multiply(v, rect.size())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_scale_only_shrinks() {
        assert_eq!(fit_scale(vec2(100.0, 100.0), vec2(400.0, 400.0)), 1.0);
        assert_eq!(fit_scale(vec2(800.0, 400.0), vec2(400.0, 400.0)), 0.5);
        assert_eq!(fit_scale(Vec2::ZERO, vec2(400.0, 400.0)), 1.0);
    }

    #[test]
    fn divide_by_zero_is_zero() {
        assert_eq!(divide(vec2(4.0, 3.0), vec2(2.0, 0.0)), vec2(2.0, 0.0));
    }

    #[test]
    fn normalized_round_trip() {
        let rect = Rect::from_min_size(Pos2::new(10.0, 20.0), vec2(200.0, 100.0));
        let pos = Pos2::new(110.0, 45.0);
        let normalized = to_normalized(rect, pos);
        assert_eq!(normalized, vec2(0.5, 0.25));
        assert_eq!(from_normalized(rect, normalized), pos);
    }

    #[test]
    fn rotate_quarter_turn() {
        let rotated = rotate(vec2(1.0, 0.0), std::f32::consts::FRAC_PI_2);
        assert!(rotated.x.abs() < 1e-6);
        assert!((rotated.y - 1.0).abs() < 1e-6);
    }
}
