use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use eframe::egui::{self, Align, Color32, Context, Layout};

use crate::config::Settings;
use crate::story::{Consequence, ConsequenceStats, EventStats, StoryEvent, StoryQuery};

use super::super::graph::{GraphFilter, InteractionController};
use super::super::physics::{SimulationContext, TickClock};
use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn new(
        query: StoryQuery,
        settings: Settings,
        events: Vec<StoryEvent>,
        consequences: Vec<Consequence>,
        chapters: Option<(u32, u32)>,
    ) -> Self {
        let event_stats = EventStats::collect(&events);
        let (first_chapter, last_chapter) = event_stats.chapter_span.unwrap_or((1, 1));
        let (chapter_from, chapter_to) = chapters.unwrap_or((first_chapter, last_chapter));

        Self {
            query,
            settings,
            consequence_stats: ConsequenceStats::collect(&consequences),
            event_stats,
            events,
            consequences,
            filter: GraphFilter {
                chapters,
                ..GraphFilter::default()
            },
            chapter_filter: chapters.is_some(),
            chapter_from,
            chapter_to,
            search: String::new(),
            search_match_cache: None,
            simulation: SimulationContext::default(),
            interaction: InteractionController::new(settings.view.node_radius),
            clock: TickClock::new(Duration::from_millis(settings.view.tick_ms)),
            live_physics: true,
            settled: false,
            graph_dirty: true,
            graph_revision: 0,
            stale: None,
            notices: VecDeque::new(),
            pending: HashSet::new(),
            reload_in_flight: false,
            invalidation_reason: String::new(),
            realize_target: None,
            outbox: Vec::new(),
        }
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context) {
        if self.graph_dirty {
            self.rebuild_graph();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("plotweb");
                    ui.separator();
                    ui.label(format!("project {}", self.query.project_id));
                    ui.label(self.graph_summary_text());
                    let reload_button =
                        ui.add_enabled(!self.reload_in_flight, egui::Button::new("Reload"));
                    if reload_button.clicked() {
                        self.request_reload();
                    }
                    if ui.button("Reset view").clicked() {
                        self.interaction.reset_view();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.simulation_status_text());
                        if let Some(stale) = self.stale_text() {
                            ui.colored_label(Color32::from_rgb(240, 170, 80), stale);
                        }
                        if self.reload_in_flight {
                            ui.spinner();
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.draw_controls(ui);
                    ui.separator();
                    self.draw_stats(ui);
                });
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(360.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));
    }
}
