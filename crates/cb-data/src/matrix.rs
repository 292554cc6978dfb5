//! Ranged reads of single genes from the expression matrix
//!
//! The matrix is a TSV file with one gene per line. Its first line is
//! `gene<TAB>cell1<TAB>cell2...`; every other line is
//! `geneId<TAB>v1<TAB>v2...`. The offset index says where each line starts
//! and how long it is, so one gene can be read without touching the rest.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use rayon::prelude::*;
use tracing::{debug, warn};

use cb_core::{ByteRange, ExpressionOffsets, ExpressionVector, GeneInfo, PointId};
use crate::{DataError, Result};

/// Genes read for a gene list
#[derive(Debug, Default)]
pub struct GeneList {
    /// Genes that were read, in request order
    pub genes: Vec<ExpressionVector>,
    /// Symbols that could not be read, with the reason
    pub missing: Vec<(String, DataError)>,
}

impl GeneList {
    pub fn missing_symbols(&self) -> Vec<&str> {
        self.missing.iter().map(|(symbol, _)| symbol.as_str()).collect()
    }
}

/// An expression matrix file together with its offset index
#[derive(Debug, Clone)]
pub struct ExpressionMatrix {
    path: PathBuf,
    offsets: ExpressionOffsets,
    cell_ids: Vec<PointId>,
}

impl ExpressionMatrix {
    /// Open a matrix and read its header line
    pub fn open(path: impl AsRef<Path>, offsets: ExpressionOffsets) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let header = offsets
            .header()
            .ok_or_else(|| DataError::Other(format!("no '{}' entry in the offset index", ExpressionOffsets::HEADER_KEY)))?;
        let line = read_range(&path, header)?;
        let cell_ids: Vec<PointId> = line.trim_end_matches(['\r', '\n']).split('\t').skip(1).map(PointId::from).collect();
        debug!("Opened expression matrix {:?} with {} cells", path, cell_ids.len());
        Ok(Self { path, offsets, cell_ids })
    }

    /// Ids of the matrix columns
    pub fn cell_ids(&self) -> &[PointId] {
        &self.cell_ids
    }

    pub fn offsets(&self) -> &ExpressionOffsets {
        &self.offsets
    }

    pub fn has_gene(&self, symbol: &str) -> bool {
        symbol != ExpressionOffsets::HEADER_KEY && self.offsets.get(symbol).is_some()
    }

    /// Read one gene. Cells whose value is not a number have no value.
    pub fn fetch_gene(&self, symbol: &str) -> Result<ExpressionVector> {
        let range = match self.offsets.get(symbol) {
            Some(range) if symbol != ExpressionOffsets::HEADER_KEY => range,
            _ => return Err(DataError::GeneNotFound(symbol.to_string())),
        };
        let line = read_range(&self.path, range)?;
        let mut fields = line.trim_end_matches(['\r', '\n']).split('\t');
        let gene_id = fields.next().unwrap_or(symbol).to_string();

        let values = self
            .cell_ids
            .iter()
            .cloned()
            .zip(fields.map(|v| v.trim().parse::<f64>().ok()));
        let gene = GeneInfo {
            id: gene_id,
            symbol: symbol.to_string(),
            description: String::new(),
        };
        Ok(ExpressionVector::new(gene, values, None))
    }

    /// Read several genes in parallel. A missing gene fails on its own;
    /// its siblings are unaffected.
    pub fn fetch_genes<S: AsRef<str> + Sync>(&self, symbols: &[S]) -> Vec<(String, Result<ExpressionVector>)> {
        symbols
            .par_iter()
            .map(|symbol| {
                let symbol = symbol.as_ref();
                let result = self.fetch_gene(symbol);
                if let Err(e) = &result {
                    warn!("Cannot load gene {}: {}", symbol, e);
                }
                (symbol.to_string(), result)
            })
            .collect()
    }

    /// Read a user's gene list. Symbols that cannot be read end up in
    /// [`GeneList::missing`]; the rest of the list still loads.
    pub fn fetch_gene_list<S: AsRef<str> + Sync>(&self, symbols: &[S]) -> GeneList {
        let mut list = GeneList::default();
        for (symbol, result) in self.fetch_genes(symbols) {
            match result {
                Ok(vector) => list.genes.push(vector),
                Err(e) => list.missing.push((symbol, e)),
            }
        }
        debug!("Gene list: {} read, {} missing", list.genes.len(), list.missing.len());
        list
    }
}

fn read_range(path: &Path, range: ByteRange) -> Result<String> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(range.offset))?;
    let mut line = String::new();
    file.take(range.length).read_to_string(&mut line)?;
    Ok(line)
}
