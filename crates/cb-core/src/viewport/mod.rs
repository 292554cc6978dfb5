//! Viewport: the zoomable window onto data space

mod range;
mod transform;

pub use range::ZoomRange;
pub use transform::{scale_to_pixels, ViewportTransform};

/// Fixed margin between the plotted points and the viewport edge
pub const BORDER_PX: u32 = 5;

/// Zoom/pan results whose span falls below this fraction of the full
/// range's span are rejected
pub const MIN_SPAN_FRACTION: f64 = 1e-9;

/// Step used by the zoom-in/zoom-out buttons
pub const ZOOM_STEP: f64 = 0.2;

/// Step used per mouse wheel notch
pub const WHEEL_ZOOM_STEP: f64 = 0.03;
