mod analysis;
mod lifecycle;
mod model;
mod source;
mod stats;

pub use analysis::{IngestReport, SceneAnalysis};
pub use lifecycle::{LifecycleError, LifecycleManager, StatusUpdate};
pub use model::{
    AffectedEntities, Consequence, ConsequenceId, ConsequenceStatus, EventId, EventType,
    Prediction, StoryEvent, Timeframe,
};
pub use source::{BackendError, FileBackend, ProjectSnapshot, StoryBackend, StoryQuery};
pub use stats::{ConsequenceStats, EventStats};
