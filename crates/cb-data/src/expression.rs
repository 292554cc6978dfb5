//! JSON expression sources: the matrix offset index and the preloaded genes

use std::collections::HashMap;
use std::io::Read;
use ahash::AHashMap;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Deserialize;
use tracing::{debug, warn};

use cb_core::deciles::BOUNDARY_COUNT;
use cb_core::{compute_deciles, ByteRange, DecileBoundaries, ExpressionOffsets, GeneInfo, PointId, PreloadedExpression};
use crate::Result;

/// Parse the offset index: gene symbol -> `[offset, length]` of its line in
/// the expression matrix, plus the `_header` entry
pub fn parse_offsets<R: Read>(reader: R) -> Result<ExpressionOffsets> {
    let raw: IndexMap<String, (u64, u64)> = serde_json::from_reader(reader)?;
    let ranges = raw
        .into_iter()
        .map(|(symbol, (offset, length))| (symbol, ByteRange { offset, length }))
        .collect::<IndexMap<_, _>>();
    if !ranges.contains_key(ExpressionOffsets::HEADER_KEY) {
        warn!("Expression offsets have no '{}' entry", ExpressionOffsets::HEADER_KEY);
    }
    debug!("Parsed offsets of {} genes", ranges.len());
    Ok(ExpressionOffsets { ranges })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPreload {
    genes: Vec<Vec<String>>,
    #[serde(default)]
    cell_expr: HashMap<String, Vec<Option<f64>>>,
    #[serde(default)]
    deciles: HashMap<String, Vec<f64>>,
}

/// Parse the preloaded expression blob. Genes shipped without (valid)
/// decile boundaries get them computed here, in parallel across genes.
pub fn parse_preload<R: Read>(reader: R) -> Result<PreloadedExpression> {
    let raw: RawPreload = serde_json::from_reader(reader)?;

    let genes: Vec<GeneInfo> = raw
        .genes
        .into_iter()
        .map(|entry| {
            let mut parts = entry.into_iter();
            let id = parts.next().unwrap_or_default();
            let symbol = parts.next().unwrap_or_else(|| id.clone());
            let description = parts.next().unwrap_or_default();
            GeneInfo { id, symbol, description }
        })
        .collect();

    let cell_expr: AHashMap<PointId, Vec<Option<f64>>> = raw
        .cell_expr
        .into_iter()
        .map(|(id, values)| (PointId::from(id), values))
        .collect();

    let mut deciles = AHashMap::new();
    let mut missing = Vec::new();
    for (index, gene) in genes.iter().enumerate() {
        match raw.deciles.get(&gene.id).and_then(|d| to_boundaries(d)) {
            Some(boundaries) => {
                deciles.insert(gene.id.clone(), boundaries);
            }
            None => missing.push((index, gene.id.clone())),
        }
    }

    if !missing.is_empty() {
        debug!("Computing deciles of {} preloaded genes", missing.len());
        let computed: Vec<(String, Option<DecileBoundaries>)> = missing
            .into_par_iter()
            .map(|(index, id)| {
                let values: Vec<f64> = cell_expr
                    .values()
                    .filter_map(|row| row.get(index).copied().flatten())
                    .collect();
                (id, compute_deciles(&values))
            })
            .collect();
        for (id, boundaries) in computed {
            if let Some(boundaries) = boundaries {
                deciles.insert(id, boundaries);
            }
        }
    }

    Ok(PreloadedExpression { genes, cell_expr, deciles })
}

fn to_boundaries(values: &[f64]) -> Option<DecileBoundaries> {
    let boundaries: [f64; BOUNDARY_COUNT] = values.try_into().ok()?;
    Some(DecileBoundaries(boundaries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_keep_file_order() {
        let json = r#"{"_header": [0, 20], "CD3E": [20, 15], "ACTB": [35, 15]}"#;
        let offsets = parse_offsets(json.as_bytes()).unwrap();
        assert_eq!(offsets.header(), Some(ByteRange { offset: 0, length: 20 }));
        assert_eq!(offsets.symbols().collect::<Vec<_>>(), vec!["CD3E", "ACTB"]);
        assert!(parse_offsets("[1, 2]".as_bytes()).is_err());
    }

    #[test]
    fn test_preload_with_and_without_deciles() {
        let json = r#"{
            "genes": [["g1", "CD3E", "T cell marker"], ["g2", "ACTB"]],
            "cellExpr": {"c1": [1.0, 2.0], "c2": [null, 4.0], "c3": [3.0, 6.0]},
            "deciles": {"g1": [0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1]}
        }"#;
        let preload = parse_preload(json.as_bytes()).unwrap();
        assert_eq!(preload.genes[1].description, "");
        assert_eq!(preload.deciles["g1"].max(), 1.0);

        let computed = preload.deciles["g2"];
        assert_eq!(computed.min(), 2.0);
        assert_eq!(computed.max(), 6.0);

        let cd3e = preload.vector(preload.gene_index("CD3E").unwrap()).unwrap();
        assert_eq!(cd3e.get("c2"), None);
        assert_eq!(cd3e.get("c3"), Some(3.0));
    }

    #[test]
    fn test_wrong_decile_count_is_recomputed() {
        let json = r#"{"genes": [["g1", "A", ""]], "cellExpr": {"c1": [5.0]}, "deciles": {"g1": [1, 2]}}"#;
        let preload = parse_preload(json.as_bytes()).unwrap();
        assert_eq!(preload.deciles["g1"], DecileBoundaries([5.0; BOUNDARY_COUNT]));
    }
}
