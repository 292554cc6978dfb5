//! Computational engine of the cell browser
//!
//! This crate holds everything below the presentation layer: the viewport
//! transform between data and pixel space, the legend/classification engine,
//! decile binning of expression values, selection and filtering, and the
//! coordinator that decides when a dataset has finished loading. It does no
//! I/O; parsed data comes in through [`load::SourcePayload`].

pub mod dataset;
pub mod deciles;
pub mod empty;
pub mod error;
pub mod legend;
pub mod load;
pub mod point;
pub mod selection;
pub mod session;
pub mod settings;
pub mod store;
pub mod viewport;

// Re-export commonly used types
pub use dataset::{
    AcronymTable, ByteRange, ColorTable, ExpressionOffsets, ExpressionVector, GeneInfo, LoadedDataset, MetaTable,
    PreloadedExpression, MISSING_META,
};
pub use deciles::{compute_deciles, DecileBoundaries, ExprBin};
pub use empty::EmptyLabelConfig;
pub use error::{CoreError, Result};
pub use legend::{ClassAssignment, ClassificationEngine, Legend, LegendClass, LegendKind, Rgb, SortMode};
pub use load::{
    Completion, Generation, LoadCoordinator, LoadEvent, SessionManager, SourceCompletion, SourceKind, SourcePayload,
};
pub use point::{PixelPoint, Point, PointId};
pub use selection::{FilterMode, SelectionIndex, SelectionSet};
pub use session::Session;
pub use settings::{DatasetOptions, ViewSettings};
pub use store::{MemoryStore, PreferenceStore};
pub use viewport::{ViewportTransform, ZoomRange};
