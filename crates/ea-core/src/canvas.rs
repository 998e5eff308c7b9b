//! Pan/zoom transform between view space and document space.
//!
//! View space is the platform's coordinate system: `y` grows downward and
//! `center` is the middle of the canvas view. Document space is centered on
//! the origin with `y` growing upward.

use crate::position::Position;
use serde::{Deserialize, Serialize};

/// A point or offset in view space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewPoint {
    pub x: f64,
    pub y: f64,
}

impl ViewPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Committed zoom and pan of a document view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasTransform {
    zoom: f64,
    pan: ViewPoint,
}

impl Default for CanvasTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: ViewPoint::default(),
        }
    }
}

impl CanvasTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> ViewPoint {
        self.pan
    }

    /// Fold a finished pinch into the zoom. Non-positive or non-finite
    /// scales are ignored.
    pub fn commit_zoom(&mut self, scale: f64) -> bool {
        let zoom = self.zoom * scale;
        if !(scale.is_finite() && zoom.is_finite() && zoom > 0.0) {
            log::warn!("ignoring zoom scale {scale}");
            return false;
        }
        self.zoom = zoom;
        true
    }

    /// Fold a finished drag into the pan.
    pub fn commit_pan(&mut self, translation: ViewPoint) {
        self.pan.x += translation.x;
        self.pan.y += translation.y;
    }

    /// Document coordinates of a view location, truncated toward zero.
    pub fn document_position(&self, location: ViewPoint, center: ViewPoint) -> Position {
        let x = (location.x - center.x - self.pan.x) / self.zoom;
        let y = -(location.y - center.y - self.pan.y) / self.zoom;
        Position::new(x as i32, y as i32)
    }

    /// Where a document position lands in the view.
    pub fn view_location(&self, position: Position, center: ViewPoint) -> ViewPoint {
        ViewPoint::new(
            center.x + f64::from(position.x) * self.zoom + self.pan.x,
            center.y - f64::from(position.y) * self.zoom + self.pan.y,
        )
    }

    /// Document size of an emoji dragged from a palette drawn at `palette_size`.
    pub fn drop_size(&self, palette_size: u32) -> u32 {
        let size = f64::from(palette_size) / self.zoom;
        if size < 1.0 { 1 } else { size as u32 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTER: ViewPoint = ViewPoint::new(200.0, 300.0);

    #[test]
    fn center_maps_to_origin() {
        let t = CanvasTransform::new();
        assert_eq!(t.document_position(CENTER, CENTER), Position::ZERO);
    }

    #[test]
    fn y_axis_points_up() {
        let t = CanvasTransform::new();
        let above = ViewPoint::new(CENTER.x + 10.0, CENTER.y - 20.0);
        assert_eq!(t.document_position(above, CENTER), Position::new(10, 20));
    }

    #[test]
    fn pan_and_zoom_are_undone_on_drop() {
        let mut t = CanvasTransform::new();
        t.commit_zoom(2.0);
        t.commit_pan(ViewPoint::new(50.0, -50.0));
        let p = Position::new(12, -7);
        let view = t.view_location(p, CENTER);
        assert_eq!(t.document_position(view, CENTER), p);
    }

    #[test]
    fn drop_size_shrinks_with_zoom() {
        let mut t = CanvasTransform::new();
        assert_eq!(t.drop_size(40), 40);
        t.commit_zoom(4.0);
        assert_eq!(t.drop_size(40), 10);
        t.commit_zoom(100.0);
        assert_eq!(t.drop_size(40), 1);
    }

    #[test]
    fn invalid_zoom_is_ignored() {
        let mut t = CanvasTransform::new();
        assert!(!t.commit_zoom(0.0));
        assert!(!t.commit_zoom(-1.0));
        assert!(!t.commit_zoom(f64::INFINITY));
        assert_eq!(t.zoom(), 1.0);
    }
}
