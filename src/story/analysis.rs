use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::lifecycle::LifecycleManager;
use super::model::{ConsequenceId, EventId, Prediction, StoryEvent};

/// Output of the external scene-analysis step: freshly extracted events plus predicted
/// consequences. Predictions may point at events from the same batch by their batch ids.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SceneAnalysis {
    #[serde(default)]
    pub events: Vec<StoryEvent>,
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IngestReport {
    pub events: Vec<EventId>,
    pub consequences: Vec<ConsequenceId>,
    pub rejected: Vec<String>,
}

impl SceneAnalysis {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read scene analysis {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid scene analysis JSON in {}", path.display()))
    }

    /// Stores the events and predictions. Individual predictions that fail validation are
    /// reported and skipped; the rest of the batch still lands.
    pub fn ingest(self, ledger: &mut LifecycleManager) -> IngestReport {
        let mut report = IngestReport::default();
        let mut remapped = HashMap::new();

        for event in self.events {
            let batch_id = event.id;
            match ledger.insert_event(event) {
                Ok(stored) => {
                    remapped.insert(batch_id, stored);
                    report.events.push(stored);
                }
                Err(error) => {
                    tracing::warn!(%error, "skipping analysed event");
                    report.rejected.push(error.to_string());
                }
            }
        }

        for prediction in self.predictions {
            let source = remapped
                .get(&prediction.source_event_id)
                .copied()
                .unwrap_or(prediction.source_event_id);
            match ledger.create(source, prediction) {
                Ok(consequence) => report.consequences.push(consequence.id),
                Err(error) => {
                    tracing::warn!(%error, "skipping predicted consequence");
                    report.rejected.push(error.to_string());
                }
            }
        }

        report
    }
}
