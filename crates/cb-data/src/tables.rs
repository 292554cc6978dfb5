//! Tab-separated tables of a dataset directory

use std::io::Read;
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, warn};

use cb_core::{AcronymTable, ColorTable, MetaTable, Point, PointId, Rgb};
use crate::{DataError, Result};

/// Expected header of the coordinate table
pub const COORD_HEADER: [&str; 3] = ["cellId", "x", "y"];

/// Coordinates read from a layout file
#[derive(Debug, Default)]
pub struct CoordTable {
    /// Rows accepted before parsing stopped
    pub points: Vec<Point>,

    /// Why parsing stopped early, if it did
    pub stopped: Option<DataError>,
}

impl CoordTable {
    pub fn is_complete(&self) -> bool {
        self.stopped.is_none()
    }
}

fn tsv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader)
}

fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or("")
}

/// Parse a coordinate table.
///
/// The first row that does not hold two numbers stops parsing; the rows read
/// until then are kept and the problem is reported in
/// [`CoordTable::stopped`]. A wrong header is an error.
pub fn parse_coords<R: Read>(reader: R) -> Result<CoordTable> {
    let mut records = tsv_reader(reader).into_records();

    let header = match records.next() {
        Some(record) => record?,
        None => StringRecord::new(),
    };
    let found: Vec<&str> = header.iter().take(3).collect();
    if found != COORD_HEADER {
        return Err(DataError::BadHeader {
            expected: COORD_HEADER.join(", "),
            found: found.join(", "),
        });
    }

    let mut table = CoordTable::default();
    for (i, record) in records.enumerate() {
        let row = i + 1;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                table.stopped = Some(e.into());
                break;
            }
        };
        let id = field(&record, 0);
        if id.is_empty() {
            continue;
        }
        let x = field(&record, 1).trim().parse::<f64>();
        let y = field(&record, 2).trim().parse::<f64>();
        match (x, y) {
            (Ok(x), Ok(y)) if x.is_finite() && y.is_finite() => table.points.push(Point::new(id, x, y)),
            _ => {
                warn!("Row {} of the coordinate table is not numeric, parsing stopped", row);
                table.stopped = Some(DataError::MalformedRow {
                    row,
                    reason: format!("not a number: {:?}", record.iter().collect::<Vec<_>>()),
                });
                break;
            }
        }
    }
    debug!("Parsed {} coordinates", table.points.len());
    Ok(table)
}

/// Parse the metadata table. The header row gives the field names; field 0
/// is the point id.
pub fn parse_meta<R: Read>(reader: R) -> Result<MetaTable> {
    let mut records = tsv_reader(reader).into_records();
    let fields: Vec<String> = match records.next() {
        Some(header) => header?.iter().map(str::to_string).collect(),
        None => {
            return Err(DataError::BadHeader {
                expected: "field names".to_string(),
                found: "empty file".to_string(),
            })
        }
    };

    let mut rows: Vec<(PointId, Vec<String>)> = Vec::new();
    for record in records {
        let record = record?;
        let id = field(&record, 0);
        if id.is_empty() {
            continue;
        }
        rows.push((PointId::from(id), record.iter().map(str::to_string).collect()));
    }
    debug!("Parsed metadata: {} fields, {} rows", fields.len(), rows.len());
    Ok(MetaTable::new(fields, rows))
}

/// Parse the label color table: a header row, then `label, #rrggbb` rows.
/// Rows with invalid colors are skipped.
pub fn parse_colors<R: Read>(reader: R) -> Result<ColorTable> {
    let mut colors = ColorTable::default();
    for (i, record) in tsv_reader(reader).into_records().enumerate().skip(1) {
        let record = record?;
        let label = field(&record, 0);
        match Rgb::from_hex(field(&record, 1)) {
            Some(color) => {
                colors.insert(label.to_string(), color);
            }
            None => warn!("Invalid color on row {} of the color table: {:?}", i, field(&record, 1)),
        }
    }
    Ok(colors)
}

/// Parse the acronym table: `key, expansion` rows without a header
pub fn parse_acronyms<R: Read>(reader: R) -> Result<AcronymTable> {
    let mut acronyms = AcronymTable::default();
    for record in tsv_reader(reader).into_records() {
        let record = record?;
        let key = field(&record, 0);
        if !key.is_empty() {
            acronyms.insert(key.to_string(), field(&record, 1).to_string());
        }
    }
    Ok(acronyms)
}
