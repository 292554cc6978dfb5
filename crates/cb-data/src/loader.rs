//! Asynchronous loading of a dataset's sources
//!
//! Every source is fetched and parsed on its own task. Completions are sent
//! over a channel tagged with the generation of the load that requested
//! them, and handed to the [`SessionManager`] one at a time.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{bail, Context};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use cb_core::{
    Completion, DatasetOptions, ExpressionOffsets, Generation, SessionManager, SourceCompletion, SourceKind,
    SourcePayload,
};
use crate::config::DatasetConfig;
use crate::expression::{parse_offsets, parse_preload};
use crate::matrix::ExpressionMatrix;
use crate::tables::{parse_acronyms, parse_colors, parse_coords, parse_meta};
use crate::{DataError, Result};

/// Something a dataset can be loaded from
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Dataset name
    fn name(&self) -> &str;

    /// Optional sources that exist for this dataset
    fn configured(&self) -> Vec<SourceKind>;

    /// Choices handed to the session
    fn options(&self) -> DatasetOptions;

    /// Fetch and parse one source
    async fn fetch(&self, kind: SourceKind) -> Completion;
}

/// A dataset stored as files in one directory
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    config: DatasetConfig,
    layout: usize,
}

impl DirectorySource {
    /// Open a dataset directory and read its configuration
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let config = DatasetConfig::load(&dir)?;
        Ok(Self { dir, config, layout: 0 })
    }

    /// Load another layout than the first
    pub fn with_layout(mut self, layout: usize) -> Self {
        self.layout = layout;
        self
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Open the expression matrix, if the dataset has one
    pub fn open_matrix(&self, offsets: ExpressionOffsets) -> Option<Result<ExpressionMatrix>> {
        let file = self.config.matrix_file.as_ref()?;
        Some(ExpressionMatrix::open(self.dir.join(file), offsets))
    }

    async fn read<T, F>(&self, kind: SourceKind, parse: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(BufReader<File>) -> Result<T> + Send + 'static,
    {
        let file = self
            .config
            .source_file(kind, self.layout)
            .ok_or_else(|| DataError::Other(format!("no {} file configured", kind)))?;
        let path = self.dir.join(file);
        debug!("Reading {} from {:?}", kind, path);

        tokio::task::spawn_blocking(move || {
            let file = File::open(&path)?;
            parse(BufReader::new(file))
        })
        .await?
    }
}

fn to_completion(result: Result<SourcePayload>) -> Completion {
    match result {
        Ok(payload) => Completion::Ok(payload),
        Err(e) => Completion::Failed(e.to_string()),
    }
}

#[async_trait]
impl DatasetSource for DirectorySource {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn configured(&self) -> Vec<SourceKind> {
        self.config.configured_sources()
    }

    fn options(&self) -> DatasetOptions {
        self.config.options()
    }

    async fn fetch(&self, kind: SourceKind) -> Completion {
        match kind {
            SourceKind::Coords => match self.read(kind, parse_coords).await {
                Ok(table) => match table.stopped {
                    None => Completion::Ok(SourcePayload::Coords(table.points)),
                    Some(e) => Completion::Partial(SourcePayload::Coords(table.points), e.to_string()),
                },
                Err(e) => Completion::Failed(e.to_string()),
            },
            SourceKind::Meta => to_completion(self.read(kind, parse_meta).await.map(SourcePayload::Meta)),
            SourceKind::Colors => to_completion(self.read(kind, parse_colors).await.map(SourcePayload::Colors)),
            SourceKind::Acronyms => to_completion(self.read(kind, parse_acronyms).await.map(SourcePayload::Acronyms)),
            SourceKind::Offsets => to_completion(self.read(kind, parse_offsets).await.map(SourcePayload::Offsets)),
            SourceKind::Preload => to_completion(self.read(kind, parse_preload).await.map(SourcePayload::Preload)),
        }
    }
}

/// Fetch every source of `source` on its own task, sending tagged
/// completions to `tx` in whatever order they finish
pub fn spawn_load(
    source: Arc<dyn DatasetSource>,
    generation: Generation,
    tx: mpsc::UnboundedSender<SourceCompletion>,
) -> Vec<JoinHandle<()>> {
    let configured = source.configured();
    SourceKind::ALL
        .into_iter()
        .filter(|kind| kind.is_required() || configured.contains(kind))
        .map(|kind| {
            let source = source.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let completion = source.fetch(kind).await;
                if tx.send(SourceCompletion { generation, kind, completion }).is_err() {
                    debug!("Nobody waits for {} of {} anymore", kind, generation);
                }
            })
        })
        .collect()
}

/// Load a dataset into `manager` and wait until it is ready
pub async fn load_dataset(manager: &mut SessionManager, source: Arc<dyn DatasetSource>) -> anyhow::Result<Generation> {
    let name = source.name().to_string();
    let generation = manager.begin_load(&name, source.options(), &source.configured());
    let (tx, mut rx) = mpsc::unbounded_channel();
    spawn_load(source, generation, tx);

    while let Some(completion) = rx.recv().await {
        let ready = manager
            .complete(completion)
            .with_context(|| format!("Failed to load dataset '{}'", name))?;
        if ready {
            info!("Dataset '{}' loaded ({})", name, generation);
            return Ok(generation);
        }
    }
    bail!("All sources of '{}' finished but the dataset never became ready", name)
}
