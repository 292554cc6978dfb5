//! Configuration of one dataset directory

use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};
use tracing::debug;

use cb_core::{DatasetOptions, EmptyLabelConfig, SourceKind};
use crate::{DataError, Result};

/// Name of the configuration file inside a dataset directory
pub const DATASET_CONFIG_FILE: &str = "dataset.json";

/// One 2D layout of the points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordFile {
    /// Name shown in the layout chooser
    pub label: String,

    /// Coordinate table, relative to the dataset directory
    pub file: PathBuf,
}

/// Contents of `dataset.json`. Files are relative to the dataset directory;
/// optional files that are not given are simply absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Dataset name; defaults to the directory name
    pub name: String,

    /// What one point is, e.g. "cell"
    pub sample_desc: String,

    /// Available layouts, the first one is shown initially
    pub coord_files: Vec<CoordFile>,

    /// Metadata table
    pub meta_file: PathBuf,

    /// Fixed label colors
    pub colors_file: Option<PathBuf>,

    /// Label abbreviations
    pub acronyms_file: Option<PathBuf>,

    /// Offset index of the expression matrix
    pub offsets_file: Option<PathBuf>,

    /// Expression of a few genes shipped with the dataset
    pub preload_file: Option<PathBuf>,

    /// Expression matrix read gene by gene
    pub matrix_file: Option<PathBuf>,

    /// Field the initial legend colors by
    pub cluster_field: Option<String>,

    /// Field drawn as labels over the cloud
    pub label_field: Option<String>,

    /// Labels rendered with the neutral color
    pub empty_labels: EmptyLabelConfig,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            sample_desc: "cell".to_string(),
            coord_files: vec![CoordFile {
                label: "default".to_string(),
                file: PathBuf::from("coords.tsv"),
            }],
            meta_file: PathBuf::from("meta.tsv"),
            colors_file: None,
            acronyms_file: None,
            offsets_file: None,
            preload_file: None,
            matrix_file: None,
            cluster_field: None,
            label_field: None,
            empty_labels: EmptyLabelConfig::default(),
        }
    }
}

impl DatasetConfig {
    /// Read `dataset.json` from a dataset directory. A directory without
    /// one uses the default file names.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(DATASET_CONFIG_FILE);
        let mut config = if path.exists() {
            super::read_json::<DatasetConfig>(&path)?
        } else {
            debug!("No {} in {:?}, using default file names", DATASET_CONFIG_FILE, dir);
            Self::default()
        };
        if config.name.is_empty() {
            config.name = dir
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("dataset")
                .to_string();
        }
        if config.coord_files.is_empty() {
            return Err(DataError::Other(format!("{:?} lists no coordinate files", path)));
        }
        Ok(config)
    }

    /// Coordinate file of a layout
    pub fn coord_file(&self, layout: usize) -> Option<&CoordFile> {
        self.coord_files.get(layout)
    }

    /// Optional sources this dataset provides
    pub fn configured_sources(&self) -> Vec<SourceKind> {
        [
            (SourceKind::Colors, &self.colors_file),
            (SourceKind::Acronyms, &self.acronyms_file),
            (SourceKind::Offsets, &self.offsets_file),
            (SourceKind::Preload, &self.preload_file),
        ]
        .into_iter()
        .filter(|(_, file)| file.is_some())
        .map(|(kind, _)| kind)
        .collect()
    }

    /// File of a source, if configured
    pub fn source_file(&self, kind: SourceKind, layout: usize) -> Option<&Path> {
        match kind {
            SourceKind::Coords => self.coord_file(layout).map(|c| c.file.as_path()),
            SourceKind::Meta => Some(self.meta_file.as_path()),
            SourceKind::Colors => self.colors_file.as_deref(),
            SourceKind::Acronyms => self.acronyms_file.as_deref(),
            SourceKind::Offsets => self.offsets_file.as_deref(),
            SourceKind::Preload => self.preload_file.as_deref(),
        }
    }

    /// Choices handed to the session once the dataset is ready
    pub fn options(&self) -> DatasetOptions {
        DatasetOptions {
            cluster_field: self.cluster_field.clone(),
            label_field: self.label_field.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{"name": "pbmc", "colors_file": "colors.tsv", "cluster_field": "Louvain"}"#;
        let config: DatasetConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.sample_desc, "cell");
        assert_eq!(config.meta_file, PathBuf::from("meta.tsv"));
        assert_eq!(config.configured_sources(), vec![SourceKind::Colors]);
        assert_eq!(config.options().cluster_field.as_deref(), Some("Louvain"));
        assert_eq!(config.source_file(SourceKind::Coords, 0), Some(Path::new("coords.tsv")));
        assert_eq!(config.source_file(SourceKind::Coords, 3), None);
        assert_eq!(config.source_file(SourceKind::Offsets, 0), None);
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatasetConfig::load(dir.path()).unwrap();
        assert!(!config.name.is_empty());

        std::fs::write(dir.path().join(DATASET_CONFIG_FILE), r#"{"coord_files": []}"#).unwrap();
        assert!(DatasetConfig::load(dir.path()).is_err());

        std::fs::write(dir.path().join(DATASET_CONFIG_FILE), "{not json").unwrap();
        assert!(matches!(DatasetConfig::load(dir.path()), Err(DataError::Json(_))));
    }
}
