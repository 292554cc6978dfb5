//! Decile binning for numeric coloring
//!
//! A value distribution is cut into ten equal-rank bins described by eleven
//! boundaries. Boundaries use nearest-rank positions, never interpolation,
//! so every boundary is an actual observed value.

use serde::{Serialize, Deserialize};

/// Number of boundaries that delimit the ten bins
pub const BOUNDARY_COUNT: usize = 11;

/// Number of real bins
pub const BIN_COUNT: usize = BOUNDARY_COUNT - 1;

/// The eleven boundaries of a value distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecileBoundaries(pub [f64; BOUNDARY_COUNT]);

/// Result of binning one value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprBin {
    /// The point has no value for this gene
    NoValue,
    /// One of the ten decile bins, 0..=9
    Decile(usize),
}

impl ExprBin {
    /// Position of this bin in an expression legend, where class 0 is "No Value"
    pub fn class_index(self) -> usize {
        match self {
            ExprBin::NoValue => 0,
            ExprBin::Decile(bin) => bin + 1,
        }
    }
}

/// Compute decile boundaries of `values`.
///
/// Non-finite values are ignored. Returns `None` when nothing is left.
pub fn compute_deciles(values: &[f64]) -> Option<DecileBoundaries> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let last = sorted.len() - 1;
    let mut boundaries = [0.0; BOUNDARY_COUNT];
    for (i, boundary) in boundaries.iter_mut().enumerate() {
        // integer arithmetic keeps floor(i * (n-1) / 10) exact
        let pos = (i * last) / BIN_COUNT;
        *boundary = sorted[pos];
    }
    Some(DecileBoundaries(boundaries))
}

impl DecileBoundaries {
    pub fn min(&self) -> f64 {
        self.0[0]
    }

    pub fn max(&self) -> f64 {
        self.0[BIN_COUNT]
    }

    /// Find the bin holding `value`: the first `i` with
    /// `b[i] <= value <= b[i+1]`.
    ///
    /// A value sitting exactly on an interior boundary `b[k]` lands in bin
    /// `k-1`. Returns `None` outside `[min, max]` or for NaN.
    pub fn find_bin(&self, value: f64) -> Option<usize> {
        if value.is_nan() || value < self.min() || value > self.max() {
            return None;
        }
        // Boundaries are non-decreasing, so the first bin whose upper edge
        // reaches the value is the first match of the linear scan.
        let upper = &self.0[1..];
        let bin = upper.partition_point(|&edge| edge < value);
        Some(bin.min(BIN_COUNT - 1))
    }

    /// Bin a possibly missing value.
    ///
    /// Values outside the boundaries (possible when the boundaries were
    /// computed from a different population) clamp to the nearest end bin.
    pub fn bin_of(&self, value: Option<f64>) -> ExprBin {
        match value {
            Some(v) if v.is_finite() => match self.find_bin(v) {
                Some(bin) => ExprBin::Decile(bin),
                None if v < self.min() => ExprBin::Decile(0),
                None => ExprBin::Decile(BIN_COUNT - 1),
            },
            _ => ExprBin::NoValue,
        }
    }

    /// Legend label of a bin, e.g. `"0.25 to 1.50"`
    pub fn label(&self, bin: usize) -> String {
        format!("{:.2} to {:.2}", self.0[bin], self.0[bin + 1])
    }
}
