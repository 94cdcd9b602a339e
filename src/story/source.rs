use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::analysis::{IngestReport, SceneAnalysis};
use super::lifecycle::{LifecycleError, LifecycleManager, StatusUpdate};
use super::model::{Consequence, ConsequenceId, ConsequenceStatus, StoryEvent};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("project {requested} is not served here (loaded project {loaded})")]
    UnknownProject { requested: u64, loaded: u64 },
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Parameters of the upstream list endpoints.
#[derive(Clone, Debug, PartialEq)]
pub struct StoryQuery {
    pub project_id: u64,
    pub statuses: Vec<ConsequenceStatus>,
    pub chapter: Option<u32>,
}

impl StoryQuery {
    pub fn all_statuses(project_id: u64) -> Self {
        Self {
            project_id,
            statuses: ConsequenceStatus::ALL.to_vec(),
            chapter: None,
        }
    }
}

/// On-disk shape of a project export.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    #[serde(default)]
    pub project_id: u64,
    #[serde(default)]
    pub events: Vec<StoryEvent>,
    #[serde(default)]
    pub consequences: Vec<Consequence>,
}

/// Upstream collaborator owning the authoritative story state.
pub trait StoryBackend: Send {
    /// Gives the backend a chance to pick up external changes before a fetch.
    fn refresh(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn fetch_events(&self, query: &StoryQuery) -> Result<Vec<StoryEvent>, BackendError>;

    fn fetch_consequences(&self, query: &StoryQuery) -> Result<Vec<Consequence>, BackendError>;

    fn update_status(
        &mut self,
        id: ConsequenceId,
        update: StatusUpdate,
    ) -> Result<Consequence, BackendError>;

    fn ingest_analysis(&mut self, analysis: SceneAnalysis) -> Result<IngestReport, BackendError>;
}

/// Serves a JSON project snapshot, keeping lifecycle changes in memory for the session.
///
/// The file is re-read when its modification time changes; doing so replaces any session
/// changes with the file contents.
pub struct FileBackend {
    path: PathBuf,
    project_id: u64,
    modified: Option<SystemTime>,
    ledger: LifecycleManager,
}

impl FileBackend {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let path = path.into();
        let (snapshot, modified) = read_snapshot(&path)?;
        tracing::info!(
            path = %path.display(),
            events = snapshot.events.len(),
            consequences = snapshot.consequences.len(),
            "loaded project snapshot"
        );

        Ok(Self {
            project_id: snapshot.project_id,
            ledger: LifecycleManager::new(snapshot.events, snapshot.consequences),
            path,
            modified,
        })
    }

    pub fn project_id(&self) -> u64 {
        self.project_id
    }

    pub fn ledger(&self) -> &LifecycleManager {
        &self.ledger
    }

    fn check_project(&self, query: &StoryQuery) -> Result<(), BackendError> {
        if query.project_id != self.project_id {
            return Err(BackendError::UnknownProject {
                requested: query.project_id,
                loaded: self.project_id,
            });
        }
        Ok(())
    }
}

impl StoryBackend for FileBackend {
    fn refresh(&mut self) -> Result<(), BackendError> {
        let modified = fs::metadata(&self.path)
            .and_then(|metadata| metadata.modified())
            .map_err(|source| BackendError::Io {
                path: self.path.clone(),
                source,
            })?;
        if self.modified == Some(modified) {
            return Ok(());
        }

        let (snapshot, modified) = read_snapshot(&self.path)?;
        tracing::info!(path = %self.path.display(), "snapshot changed on disk, reloading");
        self.project_id = snapshot.project_id;
        self.ledger = LifecycleManager::new(snapshot.events, snapshot.consequences);
        self.modified = modified;
        Ok(())
    }

    fn fetch_events(&self, query: &StoryQuery) -> Result<Vec<StoryEvent>, BackendError> {
        self.check_project(query)?;
        Ok(self
            .ledger
            .events()
            .filter(|event| query.chapter.is_none() || event.chapter_number == query.chapter)
            .cloned()
            .collect())
    }

    fn fetch_consequences(&self, query: &StoryQuery) -> Result<Vec<Consequence>, BackendError> {
        self.check_project(query)?;
        Ok(self
            .ledger
            .consequences()
            .filter(|consequence| query.statuses.contains(&consequence.status))
            .filter(|consequence| match query.chapter {
                None => true,
                Some(chapter) => self
                    .ledger
                    .event(consequence.source_event_id)
                    .is_some_and(|event| event.chapter_number == Some(chapter)),
            })
            .cloned()
            .collect())
    }

    fn update_status(
        &mut self,
        id: ConsequenceId,
        update: StatusUpdate,
    ) -> Result<Consequence, BackendError> {
        Ok(self.ledger.apply(id, update)?)
    }

    fn ingest_analysis(&mut self, analysis: SceneAnalysis) -> Result<IngestReport, BackendError> {
        Ok(analysis.ingest(&mut self.ledger))
    }
}

fn read_snapshot(path: &Path) -> Result<(ProjectSnapshot, Option<SystemTime>), BackendError> {
    let raw = fs::read_to_string(path).map_err(|source| BackendError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot = serde_json::from_str(&raw).map_err(|source| BackendError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let modified = fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .ok();
    Ok((snapshot, modified))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::story::model::EventId;

    const SNAPSHOT: &str = r#"{
        "project_id": 4,
        "events": [
            {"id": 1, "title": "The duel", "event_type": "conflict", "magnitude": 0.9, "chapter_number": 2},
            {"id": 2, "title": "Exile", "event_type": "loss", "magnitude": 0.4, "chapter_number": 3}
        ],
        "consequences": [
            {"id": 10, "source_event_id": 1, "description": "A feud begins", "probability": 0.85,
             "severity": 0.6, "timeframe": "short_term", "status": "active",
             "predicted_at": "2024-05-01T12:00:00Z"},
            {"id": 11, "source_event_id": 2, "description": "Lost inheritance", "probability": 0.3,
             "severity": 0.2, "timeframe": "long_term", "status": "potential",
             "predicted_at": "2024-05-01T12:00:00Z"}
        ]
    }"#;

    fn snapshot_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_and_filters() {
        let file = snapshot_file();
        let backend = FileBackend::open(file.path()).unwrap();
        assert_eq!(backend.project_id(), 4);

        let query = StoryQuery::all_statuses(4);
        assert_eq!(backend.fetch_events(&query).unwrap().len(), 2);
        assert_eq!(backend.fetch_consequences(&query).unwrap().len(), 2);

        let active_only = StoryQuery {
            statuses: vec![ConsequenceStatus::Active],
            ..query.clone()
        };
        let consequences = backend.fetch_consequences(&active_only).unwrap();
        assert_eq!(consequences.len(), 1);
        assert_eq!(consequences[0].id, ConsequenceId(10));

        let chapter_three = StoryQuery {
            chapter: Some(3),
            ..query
        };
        let events = backend.fetch_events(&chapter_three).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, EventId(2));
        let consequences = backend.fetch_consequences(&chapter_three).unwrap();
        assert_eq!(consequences[0].id, ConsequenceId(11));
    }

    #[test]
    fn wrong_project_is_rejected() {
        let file = snapshot_file();
        let backend = FileBackend::open(file.path()).unwrap();
        assert!(matches!(
            backend.fetch_events(&StoryQuery::all_statuses(5)),
            Err(BackendError::UnknownProject {
                requested: 5,
                loaded: 4
            })
        ));
    }

    #[test]
    fn status_updates_go_through_the_ledger() {
        let file = snapshot_file();
        let mut backend = FileBackend::open(file.path()).unwrap();

        let updated = backend
            .update_status(ConsequenceId(10), StatusUpdate::realize(EventId(2)))
            .unwrap();
        assert_eq!(updated.status, ConsequenceStatus::Realized);

        let rejected = backend.update_status(ConsequenceId(10), StatusUpdate::activate());
        assert!(matches!(
            rejected,
            Err(BackendError::Lifecycle(LifecycleError::InvalidTransition { .. }))
        ));
    }

    #[test]
    fn unchanged_file_keeps_session_state() {
        let file = snapshot_file();
        let mut backend = FileBackend::open(file.path()).unwrap();
        backend
            .update_status(ConsequenceId(11), StatusUpdate::activate())
            .unwrap();
        backend.refresh().unwrap();
        assert_eq!(
            backend.ledger().get(ConsequenceId(11)).unwrap().status,
            ConsequenceStatus::Active
        );
    }

    #[test]
    fn missing_and_malformed_files_fail() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert!(matches!(
            FileBackend::open(&missing),
            Err(BackendError::Io { .. })
        ));

        let mut broken = tempfile::NamedTempFile::new().unwrap();
        broken.write_all(b"{ not json").unwrap();
        assert!(matches!(
            FileBackend::open(broken.path()),
            Err(BackendError::Parse { .. })
        ));
    }

    #[test]
    fn refresh_reports_deleted_file() {
        let file = snapshot_file();
        let mut backend = FileBackend::open(file.path()).unwrap();
        file.close().unwrap();
        assert!(backend.refresh().is_err());
    }
}
