use crate::service::{ServiceReply, ServiceRequest};
use crate::story::{
    Consequence, ConsequenceId, ConsequenceStats, EventId, EventStats, StatusUpdate, StoryEvent,
};

use super::super::{MAX_NOTICES, Notice, ViewModel};

impl ViewModel {
    pub(in crate::app) fn take_requests(&mut self) -> Vec<ServiceRequest> {
        std::mem::take(&mut self.outbox)
    }

    pub(in crate::app) fn awaiting_replies(&self) -> bool {
        self.reload_in_flight || !self.pending.is_empty()
    }

    /// Queues a fetch unless one is already outstanding.
    pub(in crate::app) fn request_reload(&mut self) {
        if self.reload_in_flight {
            return;
        }
        self.reload_in_flight = true;
        self.outbox.push(ServiceRequest::Reload {
            query: self.query.clone(),
        });
    }

    pub(in crate::app) fn request_transition(&mut self, id: ConsequenceId, update: StatusUpdate) {
        if !self.pending.insert(id) {
            return;
        }
        self.outbox
            .push(ServiceRequest::UpdateStatus { id, update });
    }

    /// Keeps the last good graph on screen and flags it as out of date.
    pub(in crate::app) fn mark_stale(&mut self, reason: String) {
        tracing::warn!(%reason, "showing stale graph");
        self.reload_in_flight = false;
        self.stale = Some(reason);
    }

    pub(in crate::app) fn push_notice(&mut self, text: String, is_error: bool) {
        self.notices.push_back(Notice { text, is_error });
        while self.notices.len() > MAX_NOTICES {
            self.notices.pop_front();
        }
    }

    pub(in crate::app) fn select_event(&mut self, id: EventId) {
        self.interaction.select(Some(id));
    }

    pub(in crate::app) fn handle_reply(&mut self, reply: ServiceReply) {
        match reply {
            ServiceReply::Snapshot(Ok(snapshot)) => {
                self.reload_in_flight = false;
                self.stale = None;
                self.replace_inputs(snapshot.events, snapshot.consequences);
            }
            ServiceReply::Snapshot(Err(error)) => {
                self.mark_stale(error.to_string());
            }
            ServiceReply::StatusUpdated { id, result } => {
                self.pending.remove(&id);
                match result {
                    Ok(consequence) => {
                        self.push_notice(
                            format!("Consequence #{id} is now {}", consequence.status),
                            false,
                        );
                        self.upsert_consequence(consequence);
                        self.request_reload();
                    }
                    Err(error) => {
                        self.push_notice(format!("Consequence #{id}: {error}"), true);
                    }
                }
            }
            ServiceReply::Ingested(Ok(report)) => {
                let mut text = format!(
                    "Imported {} events and {} consequences",
                    report.events.len(),
                    report.consequences.len()
                );
                if !report.rejected.is_empty() {
                    text.push_str(&format!(" ({} rejected)", report.rejected.len()));
                }
                self.push_notice(text, !report.rejected.is_empty());
                self.request_reload();
            }
            ServiceReply::Ingested(Err(error)) => {
                self.push_notice(format!("Import failed: {error}"), true);
            }
        }
    }

    fn replace_inputs(&mut self, events: Vec<StoryEvent>, consequences: Vec<Consequence>) {
        self.events = events;
        self.consequences = consequences;
        if self
            .realize_target
            .is_some_and(|target| !self.events.iter().any(|event| event.id == target))
        {
            self.realize_target = None;
        }
        self.inputs_changed();
    }

    fn upsert_consequence(&mut self, consequence: Consequence) {
        match self
            .consequences
            .iter_mut()
            .find(|existing| existing.id == consequence.id)
        {
            Some(existing) => *existing = consequence,
            None => self.consequences.push(consequence),
        }
        self.inputs_changed();
    }

    fn inputs_changed(&mut self) {
        self.consequence_stats = ConsequenceStats::collect(&self.consequences);
        self.event_stats = EventStats::collect(&self.events);
        self.graph_dirty = true;
    }
}
