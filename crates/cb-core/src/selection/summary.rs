use std::sync::Arc;
use indexmap::IndexMap;
use serde::Serialize;

use crate::dataset::{ExpressionVector, MetaTable};
use crate::deciles::ExprBin;
use crate::point::PointId;

/// How often a value occurs among the selected points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
    pub fraction: f64,
}

/// Value histogram of one annotation field over the selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub field: String,
    pub values: Vec<ValueCount>,
}

/// Histogram of every annotation field (the id column excluded) over
/// `selected`, most frequent values first
pub fn selection_summary<'a>(meta: &MetaTable, selected: impl IntoIterator<Item = &'a PointId>) -> Vec<FieldSummary> {
    let selected: Vec<&PointId> = selected.into_iter().collect();
    if selected.is_empty() {
        return Vec::new();
    }
    let total = selected.len() as f64;

    (1..meta.fields().len())
        .map(|field| {
            let mut counts: IndexMap<&str, usize> = IndexMap::new();
            for id in &selected {
                *counts.entry(meta.class_value(id, field)).or_insert(0) += 1;
            }
            let mut values: Vec<ValueCount> = counts
                .into_iter()
                .map(|(value, count)| ValueCount {
                    value: value.to_string(),
                    count,
                    fraction: count as f64 / total,
                })
                .collect();
            values.sort_by(|a, b| b.count.cmp(&a.count));
            FieldSummary {
                field: meta.fields()[field].clone(),
                values,
            }
        })
        .collect()
}

/// Expression level of one gene over a set of cells, as shown in a gene bar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneIntensity {
    pub symbol: String,
    /// Mean decile bin (0..=9) over the cells, rounded. Cells without a
    /// value count as bin 0.
    pub bin: usize,
    /// The cell's value when the set holds exactly one cell
    pub value: Option<f64>,
}

/// Average decile bin of every gene over `cells`. Values of different genes
/// are not comparable, their bins are.
pub fn gene_intensities<'a>(
    genes: &[Arc<ExpressionVector>],
    cells: impl IntoIterator<Item = &'a PointId>,
) -> Vec<GeneIntensity> {
    let cells: Vec<&PointId> = cells.into_iter().collect();
    genes
        .iter()
        .map(|gene| {
            let bin = match gene.deciles {
                Some(deciles) if !cells.is_empty() => {
                    let sum: usize = cells
                        .iter()
                        .map(|id| match deciles.bin_of(gene.get(id)) {
                            ExprBin::Decile(bin) => bin,
                            ExprBin::NoValue => 0,
                        })
                        .sum();
                    (sum as f64 / cells.len() as f64).round() as usize
                }
                _ => 0,
            };
            let value = match cells.as_slice() {
                [only] => gene.get(only),
                _ => None,
            };
            GeneIntensity {
                symbol: gene.gene.symbol.clone(),
                bin,
                value,
            }
        })
        .collect()
}
