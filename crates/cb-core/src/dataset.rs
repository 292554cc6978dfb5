//! Typed model of a loaded dataset

use ahash::AHashMap;
use indexmap::IndexMap;

use crate::deciles::{compute_deciles, DecileBoundaries};
use crate::legend::Rgb;
use crate::point::{Point, PointId};

/// Value used for points that have coordinates but no metadata row
pub const MISSING_META: &str = "(missingMetaData)";

/// Per-point string annotations, positionally aligned with a field list
/// that is fixed for the lifetime of the dataset.
///
/// Field 0 is the identifier column of the metadata table.
#[derive(Debug, Clone, Default)]
pub struct MetaTable {
    fields: Vec<String>,
    rows: AHashMap<PointId, Vec<String>>,
}

impl MetaTable {
    /// Build a table; rows shorter than the field list are padded with
    /// empty values, longer rows are truncated.
    pub fn new(fields: Vec<String>, rows: impl IntoIterator<Item = (PointId, Vec<String>)>) -> Self {
        let width = fields.len();
        let rows = rows
            .into_iter()
            .map(|(id, mut values)| {
                values.resize(width, String::new());
                (id, values)
            })
            .collect();
        Self { fields, rows }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field_name(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    pub fn row(&self, id: &str) -> Option<&[String]> {
        self.rows.get(id).map(Vec::as_slice)
    }

    /// Value of one field for one point; `None` if the point has no row
    pub fn value(&self, id: &str, field: usize) -> Option<&str> {
        self.rows.get(id).and_then(|row| row.get(field)).map(String::as_str)
    }

    /// Value used for classification: the field value, or
    /// [`MISSING_META`] when the point has no metadata row
    pub fn class_value(&self, id: &str, field: usize) -> &str {
        self.value(id, field).unwrap_or(MISSING_META)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Gene description from the expression sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneInfo {
    pub id: String,
    pub symbol: String,
    pub description: String,
}

/// Expression values of one gene plus their decile boundaries
#[derive(Debug, Clone)]
pub struct ExpressionVector {
    pub gene: GeneInfo,
    values: AHashMap<PointId, f64>,
    pub deciles: Option<DecileBoundaries>,
}

impl ExpressionVector {
    /// Build a vector from per-point values, computing deciles when none
    /// are supplied. Non-finite values are treated as missing.
    pub fn new(
        gene: GeneInfo,
        values: impl IntoIterator<Item = (PointId, Option<f64>)>,
        deciles: Option<DecileBoundaries>,
    ) -> Self {
        let values: AHashMap<PointId, f64> = values
            .into_iter()
            .filter_map(|(id, v)| v.filter(|v| v.is_finite()).map(|v| (id, v)))
            .collect();
        let deciles = deciles.or_else(|| {
            let all: Vec<f64> = values.values().copied().collect();
            compute_deciles(&all)
        });
        Self { gene, values, deciles }
    }

    /// Value of a point, `None` when missing
    pub fn get(&self, id: &str) -> Option<f64> {
        self.values.get(id).copied()
    }

    /// Number of points with a value
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Expression values shipped with the dataset for a handful of genes
#[derive(Debug, Clone, Default)]
pub struct PreloadedExpression {
    pub genes: Vec<GeneInfo>,
    /// point -> one value per gene, in `genes` order
    pub cell_expr: AHashMap<PointId, Vec<Option<f64>>>,
    /// gene id -> decile boundaries
    pub deciles: AHashMap<String, DecileBoundaries>,
}

impl PreloadedExpression {
    /// Index of a gene by symbol or id
    pub fn gene_index(&self, key: &str) -> Option<usize> {
        self.genes.iter().position(|g| g.symbol == key || g.id == key)
    }

    /// Extract the expression vector of the gene at `index`
    pub fn vector(&self, index: usize) -> Option<ExpressionVector> {
        let gene = self.genes.get(index)?.clone();
        let deciles = self.deciles.get(&gene.id).copied();
        let values = self
            .cell_expr
            .iter()
            .map(|(id, row)| (id.clone(), row.get(index).copied().flatten()));
        Some(ExpressionVector::new(gene, values, deciles))
    }

    /// Expression vectors of every gene, in gene order
    pub fn vectors(&self) -> Vec<ExpressionVector> {
        (0..self.genes.len()).filter_map(|i| self.vector(i)).collect()
    }
}

/// Byte range of one gene line inside the expression matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: u64,
    pub length: u64,
}

/// Gene symbol -> location of its line in the expression matrix
#[derive(Debug, Clone, Default)]
pub struct ExpressionOffsets {
    pub ranges: IndexMap<String, ByteRange>,
}

impl ExpressionOffsets {
    /// Key of the matrix header line
    pub const HEADER_KEY: &'static str = "_header";

    pub fn get(&self, symbol: &str) -> Option<ByteRange> {
        self.ranges.get(symbol).copied()
    }

    pub fn header(&self) -> Option<ByteRange> {
        self.get(Self::HEADER_KEY)
    }

    /// Gene symbols, excluding the header entry
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.ranges
            .keys()
            .map(String::as_str)
            .filter(|k| *k != Self::HEADER_KEY)
    }
}

/// Dataset-supplied fixed label -> color mapping
pub type ColorTable = AHashMap<String, Rgb>;

/// Abbreviation -> expansion
pub type AcronymTable = AHashMap<String, String>;

/// Everything a dataset provides once loading has settled.
///
/// Optional parts are `None` both when their source failed and when it was
/// never configured.
#[derive(Debug, Clone, Default)]
pub struct LoadedDataset {
    pub name: String,
    pub points: Vec<Point>,
    pub meta: MetaTable,
    pub colors: Option<ColorTable>,
    pub acronyms: Option<AcronymTable>,
    pub offsets: Option<ExpressionOffsets>,
    pub preload: Option<PreloadedExpression>,
}
