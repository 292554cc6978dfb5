//! Join over the independent sources of one dataset load.
//!
//! Every load is tagged with a [`Generation`]. Completions carry the
//! generation of the load that requested them, so results of a superseded
//! load are recognised and dropped instead of overwriting current state.

mod manager;

pub use manager::SessionManager;

use std::fmt;
use ahash::AHashMap;
use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use crate::dataset::{AcronymTable, ColorTable, ExpressionOffsets, LoadedDataset, MetaTable, PreloadedExpression};
use crate::point::Point;

/// Monotonically increasing id of a dataset load
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// The sources a dataset is assembled from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Coords,
    Meta,
    Colors,
    Acronyms,
    Offsets,
    Preload,
}

impl SourceKind {
    pub const ALL: [SourceKind; 6] = [
        SourceKind::Coords,
        SourceKind::Meta,
        SourceKind::Colors,
        SourceKind::Acronyms,
        SourceKind::Offsets,
        SourceKind::Preload,
    ];

    /// Required sources must succeed for the dataset to become ready
    pub fn is_required(self) -> bool {
        matches!(self, SourceKind::Coords | SourceKind::Meta)
    }

    pub fn name(self) -> &'static str {
        match self {
            SourceKind::Coords => "coordinates",
            SourceKind::Meta => "metadata",
            SourceKind::Colors => "colors",
            SourceKind::Acronyms => "acronyms",
            SourceKind::Offsets => "expression offsets",
            SourceKind::Preload => "preloaded expression",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Settlement state of one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    Pending,
    Ok,
    Error(String),
}

impl SourceStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, SourceStatus::Pending)
    }
}

/// Parsed content of one source
#[derive(Debug, Clone)]
pub enum SourcePayload {
    Coords(Vec<Point>),
    Meta(MetaTable),
    Colors(ColorTable),
    Acronyms(AcronymTable),
    Offsets(ExpressionOffsets),
    Preload(PreloadedExpression),
}

impl SourcePayload {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourcePayload::Coords(_) => SourceKind::Coords,
            SourcePayload::Meta(_) => SourceKind::Meta,
            SourcePayload::Colors(_) => SourceKind::Colors,
            SourcePayload::Acronyms(_) => SourceKind::Acronyms,
            SourcePayload::Offsets(_) => SourceKind::Offsets,
            SourcePayload::Preload(_) => SourceKind::Preload,
        }
    }
}

/// Outcome of fetching and parsing one source
#[derive(Debug, Clone)]
pub enum Completion {
    Ok(SourcePayload),
    /// Parsing stopped early; the rows read so far are kept but the source
    /// counts as failed
    Partial(SourcePayload, String),
    Failed(String),
}

/// A completion tagged with the load it belongs to
#[derive(Debug, Clone)]
pub struct SourceCompletion {
    pub generation: Generation,
    pub kind: SourceKind,
    pub completion: Completion,
}

/// What a completion did to the coordinator
#[derive(Debug, Clone)]
pub enum LoadEvent {
    /// Belongs to another load
    Stale,
    /// The source had already settled
    Duplicate,
    /// Recorded; other sources are still pending
    Pending,
    /// The last source settled and both required sources succeeded
    Ready(Box<LoadedDataset>),
    /// The last source settled but a required source failed
    Failed { source: SourceKind, reason: String },
}

/// Join/barrier over the sources of one dataset load
#[derive(Debug)]
pub struct LoadCoordinator {
    generation: Generation,
    name: String,
    status: AHashMap<SourceKind, SourceStatus>,
    dataset: LoadedDataset,
    finished: bool,
}

impl LoadCoordinator {
    /// Start a load. Optional sources that are not in `configured` settle
    /// immediately as absent.
    pub fn new(generation: Generation, name: impl Into<String>, configured: &[SourceKind]) -> Self {
        let name = name.into();
        let status = SourceKind::ALL
            .iter()
            .map(|&kind| {
                let status = if kind.is_required() || configured.contains(&kind) {
                    SourceStatus::Pending
                } else {
                    SourceStatus::Error("not configured".to_string())
                };
                (kind, status)
            })
            .collect();
        info!("Loading dataset '{}' ({})", name, generation);
        Self {
            generation,
            dataset: LoadedDataset {
                name: name.clone(),
                ..Default::default()
            },
            name,
            status,
            finished: false,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self, kind: SourceKind) -> &SourceStatus {
        static PENDING: SourceStatus = SourceStatus::Pending;
        self.status.get(&kind).unwrap_or(&PENDING)
    }

    /// Readiness or failure has already been reported
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Sources that have not settled yet
    pub fn pending(&self) -> Vec<SourceKind> {
        SourceKind::ALL
            .iter()
            .copied()
            .filter(|k| !self.status(*k).is_settled())
            .collect()
    }

    /// Record a completion and report whether the load is now settled
    pub fn complete(&mut self, completion: SourceCompletion) -> LoadEvent {
        let SourceCompletion { generation, kind, completion } = completion;
        if generation != self.generation {
            debug!("Discarding {} completion of {} (current {})", kind, generation, self.generation);
            return LoadEvent::Stale;
        }
        if self.finished || self.status(kind).is_settled() {
            debug!("Ignoring repeated {} completion", kind);
            return LoadEvent::Duplicate;
        }

        let status = match completion {
            Completion::Ok(payload) => {
                self.store(kind, payload);
                SourceStatus::Ok
            }
            Completion::Partial(payload, reason) => {
                warn!("Source {} of '{}' only partially loaded: {}", kind, self.name, reason);
                // partial required data is kept, partial optional data is dropped
                if kind.is_required() {
                    self.store(kind, payload);
                }
                SourceStatus::Error(reason)
            }
            Completion::Failed(reason) => {
                if kind.is_required() {
                    warn!("Required source {} of '{}' failed: {}", kind, self.name, reason);
                } else {
                    info!("Optional source {} of '{}' unavailable: {}", kind, self.name, reason);
                }
                SourceStatus::Error(reason)
            }
        };
        debug!("Source {} settled: {:?}", kind, status);
        self.status.insert(kind, status);

        self.evaluate()
    }

    fn store(&mut self, kind: SourceKind, payload: SourcePayload) {
        if payload.kind() != kind {
            warn!("Source {} delivered {} data, ignoring it", kind, payload.kind());
            return;
        }
        match payload {
            SourcePayload::Coords(points) => self.dataset.points = points,
            SourcePayload::Meta(meta) => self.dataset.meta = meta,
            SourcePayload::Colors(colors) => self.dataset.colors = Some(colors),
            SourcePayload::Acronyms(acronyms) => self.dataset.acronyms = Some(acronyms),
            SourcePayload::Offsets(offsets) => self.dataset.offsets = Some(offsets),
            SourcePayload::Preload(preload) => self.dataset.preload = Some(preload),
        }
    }

    fn evaluate(&mut self) -> LoadEvent {
        if SourceKind::ALL.iter().any(|k| !self.status(*k).is_settled()) {
            return LoadEvent::Pending;
        }
        self.finished = true;

        for kind in [SourceKind::Coords, SourceKind::Meta] {
            if let SourceStatus::Error(reason) = self.status(kind) {
                let reason = reason.clone();
                warn!("Dataset '{}' cannot be shown: {} failed", self.name, kind);
                return LoadEvent::Failed { source: kind, reason };
            }
        }

        info!(
            "Dataset '{}' ready: {} points, {} fields",
            self.name,
            self.dataset.points.len(),
            self.dataset.meta.fields().len()
        );
        LoadEvent::Ready(Box::new(std::mem::take(&mut self.dataset)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::PointId;

    const GEN: Generation = Generation(1);

    fn done(kind: SourceKind, completion: Completion) -> SourceCompletion {
        SourceCompletion { generation: GEN, kind, completion }
    }

    fn coords() -> Completion {
        Completion::Ok(SourcePayload::Coords(vec![Point::new("a", 0.0, 1.0)]))
    }

    fn meta() -> Completion {
        Completion::Ok(SourcePayload::Meta(MetaTable::new(
            vec!["cellId".into(), "cluster".into()],
            vec![(PointId::from("a"), vec!["a".into(), "1".into()])],
        )))
    }

    fn optional(kind: SourceKind, ok: bool) -> SourceCompletion {
        let completion = match (kind, ok) {
            (_, false) => Completion::Failed("404".into()),
            (SourceKind::Colors, true) => Completion::Ok(SourcePayload::Colors(ColorTable::default())),
            (SourceKind::Acronyms, true) => Completion::Ok(SourcePayload::Acronyms(AcronymTable::default())),
            (SourceKind::Offsets, true) => Completion::Ok(SourcePayload::Offsets(ExpressionOffsets::default())),
            (_, true) => Completion::Ok(SourcePayload::Preload(PreloadedExpression::default())),
        };
        done(kind, completion)
    }

    #[test]
    fn test_ready_fires_once_in_any_order() {
        let optionals = [SourceKind::Colors, SourceKind::Acronyms, SourceKind::Offsets, SourceKind::Preload];
        // every rotation of the arrival order, each with a different failure mix
        for shift in 0..6 {
            let mut arrivals = vec![done(SourceKind::Coords, coords()), done(SourceKind::Meta, meta())];
            for (i, kind) in optionals.iter().enumerate() {
                arrivals.push(optional(*kind, (i + shift) % 2 == 0));
            }
            arrivals.rotate_left(shift);

            let mut coordinator = LoadCoordinator::new(GEN, "test", &optionals);
            let mut ready = 0;
            for arrival in arrivals {
                let repeat = arrival.clone();
                if let LoadEvent::Ready(_) = coordinator.complete(arrival) {
                    ready += 1;
                }
                assert!(matches!(coordinator.complete(repeat), LoadEvent::Duplicate));
            }
            assert_eq!(ready, 1, "rotation {shift}");
        }
    }

    #[test]
    fn test_failed_optional_sources_are_absent() {
        let mut coordinator = LoadCoordinator::new(GEN, "test", &[SourceKind::Colors, SourceKind::Offsets]);
        assert_eq!(coordinator.pending().len(), 4);
        coordinator.complete(optional(SourceKind::Colors, false));
        coordinator.complete(optional(SourceKind::Offsets, true));
        coordinator.complete(done(SourceKind::Meta, meta()));
        let event = coordinator.complete(done(SourceKind::Coords, coords()));

        let dataset = match event {
            LoadEvent::Ready(dataset) => dataset,
            other => panic!("expected ready, got {other:?}"),
        };
        assert!(dataset.colors.is_none());
        assert!(dataset.acronyms.is_none());
        assert!(dataset.offsets.is_some());
        assert_eq!(dataset.points.len(), 1);
        assert_eq!(dataset.name, "test");
    }

    #[test]
    fn test_required_failure_never_becomes_ready() {
        let mut coordinator = LoadCoordinator::new(GEN, "test", &[]);
        let partial = Completion::Partial(SourcePayload::Coords(vec![Point::new("a", 0.0, 0.0)]), "bad row 3".into());
        assert!(matches!(coordinator.complete(done(SourceKind::Coords, partial)), LoadEvent::Pending));
        match coordinator.complete(done(SourceKind::Meta, meta())) {
            LoadEvent::Failed { source, reason } => {
                assert_eq!(source, SourceKind::Coords);
                assert_eq!(reason, "bad row 3");
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(coordinator.is_finished());
        assert!(matches!(coordinator.complete(done(SourceKind::Meta, meta())), LoadEvent::Duplicate));
    }

    #[test]
    fn test_stale_completions_are_ignored() {
        let mut coordinator = LoadCoordinator::new(Generation(2), "new", &[]);
        let stale = SourceCompletion { generation: Generation(1), kind: SourceKind::Coords, completion: coords() };
        assert!(matches!(coordinator.complete(stale), LoadEvent::Stale));
        assert_eq!(coordinator.status(SourceKind::Coords), &SourceStatus::Pending);
    }
}
