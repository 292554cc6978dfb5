use std::sync::Arc;
use tracing::{debug, info};

use super::{Generation, LoadCoordinator, LoadEvent, SourceCompletion, SourceKind};
use crate::empty::EmptyLabelConfig;
use crate::error::{CoreError, Result};
use crate::session::Session;
use crate::settings::{DatasetOptions, ViewSettings};
use crate::store::PreferenceStore;

/// Owns the current session and the load that will replace it
pub struct SessionManager {
    generation: Generation,
    coordinator: Option<LoadCoordinator>,
    options: DatasetOptions,
    session: Option<Session>,
    settings: ViewSettings,
    store: Arc<dyn PreferenceStore>,
    empty_labels: EmptyLabelConfig,
}

impl SessionManager {
    pub fn new(store: Arc<dyn PreferenceStore>, settings: ViewSettings) -> Self {
        Self {
            generation: Generation::default(),
            coordinator: None,
            options: DatasetOptions::default(),
            session: None,
            settings,
            store,
            empty_labels: EmptyLabelConfig::default(),
        }
    }

    pub fn with_empty_labels(mut self, config: EmptyLabelConfig) -> Self {
        self.empty_labels = config;
        self
    }

    /// Start loading a dataset. Completions of any earlier load become
    /// stale. The current session stays usable until the new one is ready.
    pub fn begin_load(&mut self, name: &str, options: DatasetOptions, configured: &[SourceKind]) -> Generation {
        self.generation = self.generation.next();
        if let Some(previous) = &self.coordinator {
            if !previous.is_finished() {
                info!("Abandoning load of '{}' ({})", previous.name(), previous.generation());
            }
        }
        self.coordinator = Some(LoadCoordinator::new(self.generation, name, configured));
        self.options = options;
        self.generation
    }

    /// Generation of the most recent load
    pub fn current_generation(&self) -> Generation {
        self.generation
    }

    /// A load has been started and has not settled yet
    pub fn is_loading(&self) -> bool {
        self.coordinator.as_ref().is_some_and(|c| !c.is_finished())
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    /// Route a completion to the current load.
    ///
    /// Returns `Ok(true)` when it made the dataset ready and a new session
    /// replaced the previous one.
    pub fn complete(&mut self, completion: SourceCompletion) -> Result<bool> {
        let Some(coordinator) = self.coordinator.as_mut() else {
            debug!("No load in progress, dropping {} completion", completion.kind);
            return Ok(false);
        };

        match coordinator.complete(completion) {
            LoadEvent::Stale | LoadEvent::Duplicate | LoadEvent::Pending => Ok(false),
            LoadEvent::Failed { source, reason } => Err(CoreError::RequiredSourceFailed {
                source_name: source.to_string(),
                reason,
            }),
            LoadEvent::Ready(dataset) => {
                let session = Session::new(
                    self.generation,
                    Arc::new(*dataset),
                    &self.options,
                    self.settings.clone(),
                    self.store.clone(),
                    self.empty_labels.clone(),
                );
                self.session = Some(session);
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::MetaTable;
    use crate::load::{Completion, SourcePayload};
    use crate::point::{Point, PointId};
    use crate::store::MemoryStore;

    fn coords(generation: Generation, ids: &[&str]) -> SourceCompletion {
        let points = ids.iter().enumerate().map(|(i, id)| Point::new(*id, i as f64, i as f64)).collect();
        SourceCompletion {
            generation,
            kind: SourceKind::Coords,
            completion: Completion::Ok(SourcePayload::Coords(points)),
        }
    }

    fn meta(generation: Generation, ids: &[&str]) -> SourceCompletion {
        let rows = ids.iter().map(|id| (PointId::from(*id), vec![id.to_string(), "x".to_string()]));
        SourceCompletion {
            generation,
            kind: SourceKind::Meta,
            completion: Completion::Ok(SourcePayload::Meta(MetaTable::new(vec!["cellId".into(), "cluster".into()], rows))),
        }
    }

    fn manager() -> SessionManager {
        SessionManager::new(Arc::new(MemoryStore::new()), ViewSettings::default())
    }

    #[test]
    fn test_superseded_load_is_ignored() {
        let mut manager = manager();
        let first = manager.begin_load("first", DatasetOptions::default(), &[]);
        let second = manager.begin_load("second", DatasetOptions::default(), &[]);
        assert!(second > first);

        assert_eq!(manager.complete(coords(first, &["a"])), Ok(false));
        assert_eq!(manager.complete(meta(first, &["a"])), Ok(false));
        assert!(manager.session().is_none());
        assert!(manager.is_loading());

        assert_eq!(manager.complete(coords(second, &["b", "c"])), Ok(false));
        assert_eq!(manager.complete(meta(second, &["b", "c"])), Ok(true));
        let session = manager.session().unwrap();
        assert_eq!(session.generation(), second);
        assert_eq!(session.dataset().name, "second");
        assert_eq!(session.shown_points().len(), 2);
        assert!(!manager.is_loading());
    }

    #[test]
    fn test_session_is_replaced_wholesale() {
        let mut manager = manager();
        let first = manager.begin_load("first", DatasetOptions::default(), &[]);
        manager.complete(coords(first, &["a", "b"])).unwrap();
        manager.complete(meta(first, &["a", "b"])).unwrap();
        manager.session_mut().unwrap().select_all_visible();
        assert_eq!(manager.session().unwrap().selection().len(), 2);

        let second = manager.begin_load("second", DatasetOptions::default(), &[]);
        // the old session stays until the new dataset is ready
        assert_eq!(manager.session().unwrap().generation(), first);
        manager.complete(coords(second, &["z"])).unwrap();
        manager.complete(meta(second, &["z"])).unwrap();
        let session = manager.session().unwrap();
        assert!(session.selection().is_empty());
        assert_eq!(session.shown_points().len(), 1);
    }

    #[test]
    fn test_required_failure_is_reported() {
        let mut manager = manager();
        let generation = manager.begin_load("broken", DatasetOptions::default(), &[]);
        manager.complete(meta(generation, &["a"])).unwrap();
        let failed = SourceCompletion {
            generation,
            kind: SourceKind::Coords,
            completion: Completion::Failed("missing file".into()),
        };
        let err = manager.complete(failed).unwrap_err();
        assert_eq!(
            err,
            CoreError::RequiredSourceFailed { source_name: "coordinates".into(), reason: "missing file".into() }
        );
        assert!(manager.session().is_none());
    }
}
