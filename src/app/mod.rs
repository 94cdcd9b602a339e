use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::mpsc::TryRecvError;
use std::time::Duration;

use eframe::egui::{self, Context};

use crate::config::Settings;
use crate::service::{ServiceHandle, ServiceReply, ServiceRequest};
use crate::story::{
    Consequence, ConsequenceId, ConsequenceStats, EventId, EventStats, SceneAnalysis,
    StoryEvent, StoryQuery,
};

pub mod graph;
pub mod physics;
pub mod render;
mod render_utils;
mod ui;

use graph::{GraphFilter, InteractionController};
use physics::{SimulationContext, TickClock};

const LOADING_POLL: Duration = Duration::from_millis(100);
const MAX_NOTICES: usize = 6;

pub struct PlotwebApp {
    query: StoryQuery,
    settings: Settings,
    chapters: Option<(u32, u32)>,
    service: ServiceHandle,
    state: AppState,
}

enum AppState {
    Loading,
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    query: StoryQuery,
    settings: Settings,
    events: Vec<StoryEvent>,
    consequences: Vec<Consequence>,
    filter: GraphFilter,
    chapter_filter: bool,
    chapter_from: u32,
    chapter_to: u32,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    simulation: SimulationContext,
    interaction: InteractionController,
    clock: TickClock,
    live_physics: bool,
    settled: bool,
    graph_dirty: bool,
    graph_revision: u64,
    stale: Option<String>,
    notices: VecDeque<Notice>,
    pending: HashSet<ConsequenceId>,
    reload_in_flight: bool,
    invalidation_reason: String,
    realize_target: Option<EventId>,
    consequence_stats: ConsequenceStats,
    event_stats: EventStats,
    outbox: Vec<ServiceRequest>,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<HashSet<usize>>,
}

#[derive(Clone, Debug, PartialEq)]
struct Notice {
    text: String,
    is_error: bool,
}

impl PlotwebApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        service: ServiceHandle,
        query: StoryQuery,
        settings: Settings,
        chapters: Option<(u32, u32)>,
        import: Option<SceneAnalysis>,
    ) -> Self {
        if let Some(analysis) = import {
            service.send(ServiceRequest::Ingest(analysis));
        }

        let mut app = Self {
            query,
            settings,
            chapters,
            service,
            state: AppState::Loading,
        };
        app.start_load();
        app
    }

    fn start_load(&mut self) {
        self.state = if self.service.send(ServiceRequest::Reload {
            query: self.query.clone(),
        }) {
            AppState::Loading
        } else {
            AppState::Error("Story service is not running".to_owned())
        };
    }

    fn drain_replies(&mut self) {
        loop {
            match self.service.try_recv() {
                Ok(reply) => self.handle_reply(reply),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !matches!(self.state, AppState::Error(_)) {
                        self.state = AppState::Error("Story service disconnected".to_owned());
                    }
                    break;
                }
            }
        }
    }

    fn handle_reply(&mut self, reply: ServiceReply) {
        if let AppState::Ready(model) = &mut self.state {
            model.handle_reply(reply);
            return;
        }

        match reply {
            ServiceReply::Snapshot(Ok(snapshot)) => {
                self.state = AppState::Ready(Box::new(ViewModel::new(
                    self.query.clone(),
                    self.settings,
                    snapshot.events,
                    snapshot.consequences,
                    self.chapters,
                )));
            }
            ServiceReply::Snapshot(Err(error)) => {
                self.state = AppState::Error(error.to_string());
            }
            ServiceReply::Ingested(Ok(report)) => {
                tracing::info!(
                    events = report.events.len(),
                    consequences = report.consequences.len(),
                    "import applied before first load"
                );
            }
            ServiceReply::Ingested(Err(error)) => {
                tracing::warn!(%error, "import failed");
            }
            ServiceReply::StatusUpdated { id, .. } => {
                tracing::debug!(%id, "status reply arrived without a graph view");
            }
        }
    }
}

impl eframe::App for PlotwebApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.drain_replies();

        let mut retry = false;
        match &mut self.state {
            AppState::Loading => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading story graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint_after(LOADING_POLL);
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the story graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        retry = true;
                    }
                });
            }
            AppState::Ready(model) => {
                model.show(ctx);
                for request in model.take_requests() {
                    if !self.service.send(request) {
                        model.mark_stale("story service is not running".to_owned());
                    }
                }
                if model.awaiting_replies() {
                    ctx.request_repaint_after(LOADING_POLL);
                }
            }
        }

        if retry {
            self.start_load();
        }
    }
}
