//! Points in data space and their pixel projections

use std::sync::Arc;
use serde::{Serialize, Deserialize};

/// Identifier of a point, unique within a dataset.
///
/// Shared between the master point list, the shown subset, the pixel
/// projection, the class assignment and the selection, so cloning it must
/// be cheap.
pub type PointId = Arc<str>;

/// One sample with its 2D embedding coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: PointId,
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(id: impl Into<PointId>, x: f64, y: f64) -> Self {
        Self { id: id.into(), x, y }
    }
}

/// A point projected into integer pixel space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelPoint {
    pub id: PointId,
    pub x: i32,
    pub y: i32,
}
