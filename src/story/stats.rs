use std::collections::BTreeMap;

use super::model::{Consequence, ConsequenceId, ConsequenceStatus, EventType, StoryEvent, Timeframe};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConsequenceStats {
    pub total: usize,
    pub by_status: BTreeMap<ConsequenceStatus, usize>,
    pub by_timeframe: BTreeMap<Timeframe, usize>,
    /// Realized share of terminal consequences; `None` until something has resolved.
    pub realization_rate: Option<f32>,
    pub open_mean_probability: Option<f32>,
    pub open_mean_severity: Option<f32>,
    /// Open consequences ordered by `severity * probability`, highest first.
    pub most_pressing: Vec<ConsequenceId>,
}

impl ConsequenceStats {
    pub fn collect(consequences: &[Consequence]) -> Self {
        let mut stats = Self {
            total: consequences.len(),
            ..Self::default()
        };

        let mut open = Vec::new();
        for consequence in consequences {
            *stats.by_status.entry(consequence.status).or_default() += 1;
            *stats.by_timeframe.entry(consequence.timeframe).or_default() += 1;
            if !consequence.status.is_terminal() {
                open.push(consequence);
            }
        }

        let realized = stats.count(ConsequenceStatus::Realized);
        let terminal = realized + stats.count(ConsequenceStatus::Invalidated);
        if terminal > 0 {
            stats.realization_rate = Some(realized as f32 / terminal as f32);
        }

        if !open.is_empty() {
            let count = open.len() as f32;
            stats.open_mean_probability =
                Some(open.iter().map(|c| c.probability).sum::<f32>() / count);
            stats.open_mean_severity = Some(open.iter().map(|c| c.severity).sum::<f32>() / count);
        }

        open.sort_by(|a, b| {
            (b.severity * b.probability)
                .total_cmp(&(a.severity * a.probability))
                .then_with(|| a.id.cmp(&b.id))
        });
        stats.most_pressing = open.into_iter().map(|c| c.id).collect();
        stats
    }

    pub fn count(&self, status: ConsequenceStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    pub fn timeframe_count(&self, timeframe: Timeframe) -> usize {
        self.by_timeframe.get(&timeframe).copied().unwrap_or(0)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventStats {
    pub total: usize,
    pub by_type: BTreeMap<EventType, usize>,
    pub mean_magnitude: Option<f32>,
    pub chapter_span: Option<(u32, u32)>,
}

impl EventStats {
    pub fn collect(events: &[StoryEvent]) -> Self {
        let mut stats = Self {
            total: events.len(),
            ..Self::default()
        };

        for event in events {
            *stats.by_type.entry(event.event_type).or_default() += 1;
            if let Some(chapter) = event.chapter_number {
                stats.chapter_span = Some(match stats.chapter_span {
                    Some((low, high)) => (low.min(chapter), high.max(chapter)),
                    None => (chapter, chapter),
                });
            }
        }

        if !events.is_empty() {
            stats.mean_magnitude =
                Some(events.iter().map(|e| e.magnitude).sum::<f32>() / events.len() as f32);
        }
        stats
    }
}
