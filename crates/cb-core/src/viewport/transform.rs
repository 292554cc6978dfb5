//! Data space to pixel space mapping

use tracing::debug;

use super::{ZoomRange, BORDER_PX, MIN_SPAN_FRACTION};
use crate::point::{PixelPoint, Point};

/// Project `points` into pixel space for a given zoom range and viewport,
/// with the default [`BORDER_PX`] margin.
///
/// Points outside the zoom range (inclusive bounds) are dropped. Every
/// produced coordinate lies within `[border, dimension - border]`.
pub fn scale_to_pixels(points: &[Point], zoom: &ZoomRange, width: u32, height: u32) -> Vec<PixelPoint> {
    ViewportTransform::new(*zoom, width, height).scale_to_pixels(points)
}

/// Precomputed factors of one projection
struct Projector {
    zoom: ZoomRange,
    inner_width: f64,
    inner_height: f64,
    border: f64,
}

impl Projector {
    fn new(zoom: &ZoomRange, width: u32, height: u32, border: u32) -> Self {
        let border = f64::from(border);
        Self {
            zoom: *zoom,
            inner_width: (f64::from(width) - 2.0 * border).max(0.0),
            inner_height: (f64::from(height) - 2.0 * border).max(0.0),
            border,
        }
    }

    fn project(&self, x: f64, y: f64) -> Option<(i32, i32)> {
        if !self.zoom.contains(x, y) {
            return None;
        }
        let fx = (x - self.zoom.min_x) / self.zoom.span_x();
        let fy = (y - self.zoom.min_y) / self.zoom.span_y();
        let px = (fx * self.inner_width).round() + self.border;
        let py = (fy * self.inner_height).round() + self.border;
        Some((px as i32, py as i32))
    }
}

/// Current zoom state of one dataset view
#[derive(Debug, Clone)]
pub struct ViewportTransform {
    zoom: ZoomRange,
    full: ZoomRange,
    width: u32,
    height: u32,
    border: u32,
}

impl ViewportTransform {
    /// Create a transform showing the whole of `full`
    pub fn new(full: ZoomRange, width: u32, height: u32) -> Self {
        Self {
            zoom: full,
            full,
            width: width.max(1),
            height: height.max(1),
            border: BORDER_PX,
        }
    }

    /// Use a different pixel margin around the drawing area
    pub fn with_border(mut self, border: u32) -> Self {
        self.border = border;
        self
    }

    pub fn zoom_range(&self) -> ZoomRange {
        self.zoom
    }

    pub fn full_range(&self) -> ZoomRange {
        self.full
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    /// Project points through the current zoom range
    pub fn scale_to_pixels(&self, points: &[Point]) -> Vec<PixelPoint> {
        let projector = Projector::new(&self.zoom, self.width, self.height, self.border);
        points
            .iter()
            .filter_map(|p| projector.project(p.x, p.y).map(|(x, y)| PixelPoint { id: p.id.clone(), x, y }))
            .collect()
    }

    /// Project a single data-space coordinate, `None` when outside the zoom range
    pub fn project(&self, x: f64, y: f64) -> Option<(i32, i32)> {
        Projector::new(&self.zoom, self.width, self.height, self.border).project(x, y)
    }

    /// Replace the zoom range, e.g. with one restored from saved view state.
    /// Degenerate ranges are ignored.
    pub fn set_zoom_range(&mut self, range: ZoomRange) -> ZoomRange {
        self.apply(range);
        self.zoom
    }

    /// Go back to the bounding box of the whole dataset
    pub fn zoom_full(&mut self) -> ZoomRange {
        self.zoom = self.full;
        self.zoom
    }

    /// Zoom into the pixel rectangle spanned by two corners.
    ///
    /// The rectangle's height is forced to match the viewport's aspect
    /// ratio; its width is kept as drawn.
    pub fn zoom_to_rect(&mut self, p1: (f64, f64), p2: (f64, f64)) -> ZoomRange {
        let px_min_x = p1.0.min(p2.0);
        let px_max_x = p1.0.max(p2.0);
        let px_min_y = p1.1.min(p2.1);

        let aspect_ratio = f64::from(self.width) / f64::from(self.height);
        let px_max_y = px_min_y + (px_max_x - px_min_x) / aspect_ratio;

        let x_mult = self.zoom.span_x() / f64::from(self.width);
        let y_mult = self.zoom.span_y() / f64::from(self.height);

        let old = self.zoom;
        let candidate = ZoomRange {
            min_x: old.min_x + px_min_x * x_mult,
            max_x: old.min_x + px_max_x * x_mult,
            min_y: old.min_y + px_min_y * y_mult,
            max_y: old.min_y + px_max_y * y_mult,
        };
        self.apply(candidate);
        self.zoom
    }

    /// Grow (positive factor) or shrink (negative factor) the range around
    /// its center by `factor` times its span on each side.
    pub fn zoom_by_factor(&mut self, factor: f64) -> ZoomRange {
        let x_range = self.zoom.span_x().abs();
        let y_range = self.zoom.span_y().abs();
        let candidate = ZoomRange {
            min_x: self.zoom.min_x - x_range * factor,
            max_x: self.zoom.max_x + x_range * factor,
            min_y: self.zoom.min_y - y_range * factor,
            max_y: self.zoom.max_y + y_range * factor,
        };
        self.apply(candidate);
        self.zoom
    }

    /// Translate the range by a pixel delta, keeping its size
    pub fn pan_by_pixels(&mut self, dx: f64, dy: f64) -> ZoomRange {
        let dx_data = dx * (self.zoom.span_x() / f64::from(self.width));
        let dy_data = dy * (self.zoom.span_y() / f64::from(self.height));
        let candidate = ZoomRange {
            min_x: self.zoom.min_x + dx_data,
            max_x: self.zoom.max_x + dx_data,
            min_y: self.zoom.min_y + dy_data,
            max_y: self.zoom.max_y + dy_data,
        };
        self.apply(candidate);
        self.zoom
    }

    /// Pan for a mouse drag from `start` to `end`: the view moves against
    /// the drag direction so the content follows the pointer.
    pub fn pan_drag(&mut self, start: (f64, f64), end: (f64, f64)) -> ZoomRange {
        self.pan_by_pixels(start.0 - end.0, start.1 - end.1)
    }

    fn apply(&mut self, candidate: ZoomRange) -> bool {
        let min_x = self.full.span_x() * MIN_SPAN_FRACTION;
        let min_y = self.full.span_y() * MIN_SPAN_FRACTION;
        let finite = [candidate.min_x, candidate.max_x, candidate.min_y, candidate.max_y]
            .iter()
            .all(|v| v.is_finite());

        if !finite || candidate.span_x() < min_x || candidate.span_y() < min_y {
            debug!("Ignoring degenerate zoom range {:?}", candidate);
            return false;
        }
        self.zoom = candidate;
        true
    }
}
