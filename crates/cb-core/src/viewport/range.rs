use serde::{Serialize, Deserialize};

use crate::point::Point;

/// Rectangle of data space mapped onto the viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            max_x: 1.0,
            min_y: 0.0,
            max_y: 1.0,
        }
    }
}

impl ZoomRange {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self { min_x, max_x, min_y, max_y }
    }

    /// Bounding box of a point set.
    ///
    /// An axis on which every point has the same value is widened by 0.5 on
    /// both sides so that the range keeps a positive span. An empty point
    /// set yields the unit square.
    pub fn bounding(points: &[Point]) -> Self {
        if points.is_empty() {
            return Self::default();
        }

        let mut range = Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for p in points {
            range.min_x = range.min_x.min(p.x);
            range.max_x = range.max_x.max(p.x);
            range.min_y = range.min_y.min(p.y);
            range.max_y = range.max_y.max(p.y);
        }

        if range.span_x() <= 0.0 {
            range.min_x -= 0.5;
            range.max_x += 0.5;
        }
        if range.span_y() <= 0.0 {
            range.min_y -= 0.5;
            range.max_y += 0.5;
        }
        range
    }

    pub fn span_x(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn span_y(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Inclusive containment test
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Whether both spans are finite and at least `min_span`
    pub fn has_min_span(&self, min_span: f64) -> bool {
        let (sx, sy) = (self.span_x(), self.span_y());
        sx.is_finite() && sy.is_finite() && sx >= min_span && sy >= min_span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box() {
        let points = vec![
            Point::new("a", -1.0, 4.0),
            Point::new("b", 3.0, -2.0),
            Point::new("c", 0.5, 0.5),
        ];
        let range = ZoomRange::bounding(&points);
        assert_eq!(range, ZoomRange::new(-1.0, 3.0, -2.0, 4.0));
    }

    #[test]
    fn test_degenerate_axis_is_widened() {
        let points = vec![Point::new("a", 2.0, 1.0), Point::new("b", 2.0, 5.0)];
        let range = ZoomRange::bounding(&points);
        assert_eq!(range.min_x, 1.5);
        assert_eq!(range.max_x, 2.5);
        assert_eq!(range.span_y(), 4.0);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let range = ZoomRange::new(0.0, 10.0, 0.0, 10.0);
        assert!(range.contains(0.0, 10.0));
        assert!(range.contains(10.0, 0.0));
        assert!(!range.contains(10.0001, 5.0));
    }
}
