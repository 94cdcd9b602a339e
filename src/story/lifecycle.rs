//! Guarded consequence state machine.
//!
//! `potential -> active -> realized` and `potential|active -> invalidated`. Terminal states
//! reject every further transition; a rejected request leaves the record untouched.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::{
    Consequence, ConsequenceId, ConsequenceStatus, EventId, Prediction, StoryEvent,
};

#[derive(Clone, Debug, PartialEq, Error)]
pub enum LifecycleError {
    #[error("consequence {0} does not exist")]
    NotFound(ConsequenceId),
    #[error("event {0} does not exist")]
    UnknownEvent(EventId),
    #[error("consequence {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: ConsequenceId,
        from: ConsequenceStatus,
        to: ConsequenceStatus,
    },
    #[error("{0}")]
    Validation(String),
}

/// Body of a status change request, shaped like the upstream
/// `consequences/{id}/status` payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: ConsequenceStatus,
    #[serde(default)]
    pub target_event_id: Option<EventId>,
    #[serde(default)]
    pub invalidation_reason: Option<String>,
}

impl StatusUpdate {
    pub fn activate() -> Self {
        Self {
            status: ConsequenceStatus::Active,
            target_event_id: None,
            invalidation_reason: None,
        }
    }

    pub fn realize(target: EventId) -> Self {
        Self {
            status: ConsequenceStatus::Realized,
            target_event_id: Some(target),
            invalidation_reason: None,
        }
    }

    pub fn invalidate(reason: impl Into<String>) -> Self {
        Self {
            status: ConsequenceStatus::Invalidated,
            target_event_id: None,
            invalidation_reason: Some(reason.into()),
        }
    }
}

/// Authoritative ledger of events and consequences for one project.
#[derive(Clone, Debug, Default)]
pub struct LifecycleManager {
    events: BTreeMap<EventId, StoryEvent>,
    consequences: BTreeMap<ConsequenceId, Consequence>,
    next_consequence_id: u64,
    next_event_id: u64,
}

impl LifecycleManager {
    pub fn new(events: Vec<StoryEvent>, consequences: Vec<Consequence>) -> Self {
        let mut manager = Self::default();
        for event in events {
            if let Err(error) = manager.insert_event(event) {
                tracing::warn!(%error, "skipping loaded event");
            }
        }
        for consequence in consequences {
            let Some(next_id) = consequence.id.0.checked_add(1) else {
                tracing::warn!(id = %consequence.id, "skipping consequence with an exhausted id");
                continue;
            };
            if let Some(violation) = consequence.invariant_violation() {
                tracing::warn!(id = %consequence.id, violation, "loaded inconsistent consequence");
            }
            manager.next_consequence_id = manager.next_consequence_id.max(next_id);
            manager
                .consequences
                .insert(consequence.id, consequence.normalized());
        }
        manager
    }

    pub fn events(&self) -> impl Iterator<Item = &StoryEvent> {
        self.events.values()
    }

    pub fn consequences(&self) -> impl Iterator<Item = &Consequence> {
        self.consequences.values()
    }

    pub fn event(&self, id: EventId) -> Option<&StoryEvent> {
        self.events.get(&id)
    }

    pub fn get(&self, id: ConsequenceId) -> Option<&Consequence> {
        self.consequences.get(&id)
    }

    /// Stores an event, re-keying it when its id is already taken. Returns the stored id.
    ///
    /// Fails when the id is `u64::MAX`, since no id would be left for the next event.
    pub fn insert_event(&mut self, mut event: StoryEvent) -> Result<EventId, LifecycleError> {
        if self.events.contains_key(&event.id) {
            event.id = EventId(self.next_event_id);
        }
        let next_id = event.id.0.checked_add(1).ok_or_else(|| {
            LifecycleError::Validation(format!("event id {} exhausts the id space", event.id))
        })?;
        self.next_event_id = self.next_event_id.max(next_id);
        let id = event.id;
        self.events.insert(id, event.normalized());
        Ok(id)
    }

    pub fn create(
        &mut self,
        source_event_id: EventId,
        prediction: Prediction,
    ) -> Result<Consequence, LifecycleError> {
        if !self.events.contains_key(&source_event_id) {
            return Err(LifecycleError::UnknownEvent(source_event_id));
        }
        if !prediction.probability.is_finite() || !prediction.severity.is_finite() {
            return Err(LifecycleError::Validation(
                "probability and severity must be finite".to_owned(),
            ));
        }

        let id = ConsequenceId(self.next_consequence_id);
        self.next_consequence_id = id.0.checked_add(1).ok_or_else(|| {
            LifecycleError::Validation("no consequence ids are left".to_owned())
        })?;

        let consequence = Consequence {
            id,
            source_event_id,
            target_event_id: None,
            description: prediction.description,
            probability: prediction.probability,
            severity: prediction.severity,
            timeframe: prediction.timeframe,
            status: ConsequenceStatus::Potential,
            plot_impact: prediction.plot_impact,
            affected_entities: prediction.affected_entities,
            predicted_at: Utc::now(),
            realized_at: None,
            invalidated_at: None,
            invalidation_reason: None,
        }
        .normalized();

        tracing::info!(%id, source = %source_event_id, "consequence predicted");
        self.consequences.insert(id, consequence.clone());
        Ok(consequence)
    }

    pub fn activate(&mut self, id: ConsequenceId) -> Result<Consequence, LifecycleError> {
        let consequence = self.open_consequence(id, ConsequenceStatus::Active)?;
        if consequence.status != ConsequenceStatus::Potential {
            return Err(LifecycleError::InvalidTransition {
                id,
                from: consequence.status,
                to: ConsequenceStatus::Active,
            });
        }

        consequence.status = ConsequenceStatus::Active;
        tracing::info!(%id, "consequence activated");
        Ok(consequence.clone())
    }

    pub fn realize(
        &mut self,
        id: ConsequenceId,
        target_event_id: EventId,
    ) -> Result<Consequence, LifecycleError> {
        let source = self
            .consequences
            .get(&id)
            .map(|consequence| consequence.source_event_id)
            .ok_or(LifecycleError::NotFound(id))?;
        // Status is checked before the target so terminal records always report the transition.
        self.open_consequence(id, ConsequenceStatus::Realized)?;
        if !self.events.contains_key(&target_event_id) {
            return Err(LifecycleError::UnknownEvent(target_event_id));
        }
        if source == target_event_id {
            return Err(LifecycleError::Validation(
                "a consequence cannot be realized at its own source event".to_owned(),
            ));
        }

        let consequence = self.open_consequence(id, ConsequenceStatus::Realized)?;
        consequence.status = ConsequenceStatus::Realized;
        consequence.target_event_id = Some(target_event_id);
        consequence.realized_at = Some(Utc::now());
        tracing::info!(%id, target = %target_event_id, "consequence realized");
        Ok(consequence.clone())
    }

    pub fn invalidate(
        &mut self,
        id: ConsequenceId,
        reason: &str,
    ) -> Result<Consequence, LifecycleError> {
        let consequence = self.open_consequence(id, ConsequenceStatus::Invalidated)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LifecycleError::Validation(
                "an invalidation reason is required".to_owned(),
            ));
        }

        consequence.status = ConsequenceStatus::Invalidated;
        consequence.invalidation_reason = Some(reason.to_owned());
        consequence.invalidated_at = Some(Utc::now());
        tracing::info!(%id, reason, "consequence invalidated");
        Ok(consequence.clone())
    }

    pub fn apply(
        &mut self,
        id: ConsequenceId,
        update: StatusUpdate,
    ) -> Result<Consequence, LifecycleError> {
        match update.status {
            ConsequenceStatus::Active => self.activate(id),
            ConsequenceStatus::Realized => {
                let target = update.target_event_id.ok_or_else(|| {
                    LifecycleError::Validation("realizing requires a target event".to_owned())
                })?;
                self.realize(id, target)
            }
            ConsequenceStatus::Invalidated => {
                self.invalidate(id, update.invalidation_reason.as_deref().unwrap_or_default())
            }
            ConsequenceStatus::Potential => {
                let from = self.get(id).ok_or(LifecycleError::NotFound(id))?.status;
                Err(LifecycleError::InvalidTransition {
                    id,
                    from,
                    to: ConsequenceStatus::Potential,
                })
            }
        }
    }

    fn open_consequence(
        &mut self,
        id: ConsequenceId,
        to: ConsequenceStatus,
    ) -> Result<&mut Consequence, LifecycleError> {
        let consequence = self
            .consequences
            .get_mut(&id)
            .ok_or(LifecycleError::NotFound(id))?;
        if consequence.status.is_terminal() {
            tracing::warn!(%id, from = %consequence.status, %to, "rejected transition on terminal consequence");
            return Err(LifecycleError::InvalidTransition {
                id,
                from: consequence.status,
                to,
            });
        }
        Ok(consequence)
    }
}
