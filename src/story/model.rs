use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::clamp_unit;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsequenceId(pub u64);

impl fmt::Display for ConsequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Decision,
    Revelation,
    Conflict,
    Resolution,
    Relationship,
    Discovery,
    Loss,
    Transformation,
}

impl EventType {
    pub const ALL: [Self; 8] = [
        Self::Decision,
        Self::Revelation,
        Self::Conflict,
        Self::Resolution,
        Self::Relationship,
        Self::Discovery,
        Self::Loss,
        Self::Transformation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Decision => "decision",
            Self::Revelation => "revelation",
            Self::Conflict => "conflict",
            Self::Resolution => "resolution",
            Self::Relationship => "relationship",
            Self::Discovery => "discovery",
            Self::Loss => "loss",
            Self::Transformation => "transformation",
        }
    }
}

/// Lifecycle state of a consequence.
///
/// `Potential` and `Active` are open; `Realized` and `Invalidated` are terminal and accept no
/// further transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsequenceStatus {
    Potential,
    Active,
    Realized,
    Invalidated,
}

impl ConsequenceStatus {
    pub const ALL: [Self; 4] = [
        Self::Potential,
        Self::Active,
        Self::Realized,
        Self::Invalidated,
    ];

    pub const DEFAULT_FILTER: [Self; 2] = [Self::Potential, Self::Active];

    pub fn label(self) -> &'static str {
        match self {
            Self::Potential => "potential",
            Self::Active => "active",
            Self::Realized => "realized",
            Self::Invalidated => "invalidated",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Realized | Self::Invalidated)
    }
}

impl fmt::Display for ConsequenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Immediate,
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl Timeframe {
    pub const ALL: [Self; 4] = [
        Self::Immediate,
        Self::ShortTerm,
        Self::MediumTerm,
        Self::LongTerm,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::ShortTerm => "short term",
            Self::MediumTerm => "medium term",
            Self::LongTerm => "long term",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedEntities {
    #[serde(default)]
    pub characters: BTreeSet<u64>,
    #[serde(default)]
    pub locations: BTreeSet<u64>,
    #[serde(default)]
    pub threads: BTreeSet<u64>,
}

impl AffectedEntities {
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty() && self.locations.is_empty() && self.threads.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoryEvent {
    pub id: EventId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub event_type: EventType,
    pub magnitude: f32,
    #[serde(default)]
    pub emotional_impact: Option<f32>,
    #[serde(default)]
    pub chapter_number: Option<u32>,
    #[serde(default)]
    pub causes: Vec<EventId>,
    #[serde(default)]
    pub effects: Vec<EventId>,
}

impl StoryEvent {
    /// Clamps the unit-interval scores; upstream extraction occasionally overshoots.
    pub fn normalized(mut self) -> Self {
        self.magnitude = clamp_unit(self.magnitude);
        self.emotional_impact = self.emotional_impact.map(clamp_unit);
        self
    }

    pub fn in_chapter_range(&self, range: Option<(u32, u32)>) -> bool {
        match (range, self.chapter_number) {
            (None, _) | (Some(_), None) => true,
            (Some((from, to)), Some(chapter)) => chapter >= from && chapter <= to,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Consequence {
    pub id: ConsequenceId,
    pub source_event_id: EventId,
    #[serde(default)]
    pub target_event_id: Option<EventId>,
    pub description: String,
    pub probability: f32,
    pub severity: f32,
    pub timeframe: Timeframe,
    pub status: ConsequenceStatus,
    #[serde(default)]
    pub plot_impact: Option<String>,
    #[serde(default)]
    pub affected_entities: AffectedEntities,
    pub predicted_at: DateTime<Utc>,
    #[serde(default)]
    pub realized_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub invalidated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub invalidation_reason: Option<String>,
}

impl Consequence {
    pub fn normalized(mut self) -> Self {
        self.probability = clamp_unit(self.probability);
        self.severity = clamp_unit(self.severity);
        self
    }

    /// Describes the first broken record invariant, if any.
    pub fn invariant_violation(&self) -> Option<&'static str> {
        let realized = self.status == ConsequenceStatus::Realized;
        let invalidated = self.status == ConsequenceStatus::Invalidated;

        if self.target_event_id.is_some() && !realized {
            return Some("target_event_id set on a consequence that is not realized");
        }
        if realized && self.target_event_id.is_none() {
            return Some("realized consequence without target_event_id");
        }
        let has_reason = self
            .invalidation_reason
            .as_deref()
            .is_some_and(|reason| !reason.trim().is_empty());
        if has_reason != invalidated {
            return Some("invalidation_reason must be present exactly when invalidated");
        }
        None
    }
}

/// A consequence as predicted by the external scene-analysis step, before it gets an id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub source_event_id: EventId,
    pub description: String,
    pub probability: f32,
    pub severity: f32,
    pub timeframe: Timeframe,
    #[serde(default)]
    pub plot_impact: Option<String>,
    #[serde(default)]
    pub affected_entities: AffectedEntities,
}
