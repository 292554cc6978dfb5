//! Dataset and view configuration files

pub mod dataset;

pub use dataset::*;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use serde::de::DeserializeOwned;

use cb_core::ViewSettings;
use crate::Result;

/// Read a JSON configuration file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Read viewport settings; keys missing from the file keep their defaults
pub fn read_view_settings(path: &Path) -> Result<ViewSettings> {
    read_json(path)
}
