//! Viewport and per-dataset settings

use serde::{Serialize, Deserialize};

use crate::legend::MAX_LEGEND_CLASSES;
use crate::selection::MAX_MARKED;
use crate::viewport::{BORDER_PX, WHEEL_ZOOM_STEP, ZOOM_STEP};

/// Viewport and interaction settings of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    /// Viewport width in pixels
    pub width: u32,

    /// Viewport height in pixels
    pub height: u32,

    /// Margin around the drawing area in pixels
    pub border: u32,

    /// Zoom factor of the zoom in/out buttons
    pub zoom_step: f64,

    /// Zoom factor of one mouse wheel notch
    pub wheel_zoom_step: f64,

    /// Categorical fields with more distinct values cannot be colored on
    pub max_legend_classes: usize,

    /// Maximum number of points that can be marked at once
    pub max_marked: usize,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            border: BORDER_PX,
            zoom_step: ZOOM_STEP,
            wheel_zoom_step: WHEEL_ZOOM_STEP,
            max_legend_classes: MAX_LEGEND_CLASSES,
            max_marked: MAX_MARKED,
        }
    }
}

/// Per-dataset choices made by the dataset's configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetOptions {
    /// Field the initial legend colors by
    pub cluster_field: Option<String>,

    /// Field whose values are drawn as labels over the cloud
    pub label_field: Option<String>,
}
