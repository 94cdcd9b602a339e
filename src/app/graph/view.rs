use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui::{self, Sense, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::super::render::{SceneFrame, draw_scene};
use super::super::{SearchMatchCache, ViewModel};
use super::{DragState, GraphModel};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

impl ViewModel {
    /// Rebuilds nodes, edges and floating annotations from the current inputs and filter.
    pub(in crate::app) fn rebuild_graph(&mut self) {
        self.filter.chapters = self.chapter_range();
        let model = GraphModel::build(
            &self.events,
            &self.consequences,
            &self.filter,
            &self.settings.view,
        );
        tracing::debug!(
            nodes = model.nodes.len(),
            edges = model.edges.len(),
            floating = model.floating.len(),
            "graph rebuilt"
        );

        self.simulation
            .replace_model(model, self.settings.view.keep_positions_on_rebuild);
        self.interaction.cancel_drag();
        if let Some(selected) = self.interaction.selected()
            && self.simulation.model().index_of(selected).is_none()
        {
            self.interaction.select(None);
        }

        self.graph_revision += 1;
        self.graph_dirty = false;
        self.settled = false;
    }

    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let search_query = self.search.trim();
        if search_query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.graph_revision == self.graph_revision
            && cached.query == search_query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .simulation
            .model()
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                fuzzy_match_score(&matcher, &node.event.title, search_query).is_some()
            })
            .map(|(index, _)| index)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: search_query.to_owned(),
            graph_revision: self.graph_revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    fn handle_graph_input(&mut self, ui: &Ui, response: &egui::Response) {
        let center = response.rect.center();
        let (pressed, released, pointer, scroll) = ui.input(|input| {
            (
                input.pointer.primary_pressed(),
                input.pointer.primary_released(),
                input.pointer.interact_pos(),
                input.raw_scroll_delta.y,
            )
        });

        if response.contains_pointer() && scroll != 0.0 {
            self.interaction.wheel(scroll.signum() as i32);
        }

        let Some(pointer) = pointer else {
            return;
        };

        if pressed && response.contains_pointer() {
            self.interaction
                .pointer_down(&mut self.simulation, center, pointer);
            self.settled = false;
        } else if self.interaction.drag_state() != DragState::Idle {
            self.interaction
                .pointer_move(&mut self.simulation, center, pointer);
        }

        if released {
            self.release_pointer();
        }
    }

    /// A released node rejoins the simulation, so the layout is live again even if no tick
    /// lands in this frame.
    pub(in crate::app) fn release_pointer(&mut self) {
        if self.interaction.pointer_up(&mut self.simulation) {
            self.settled = false;
        }
    }

    /// Whether the next tick is worth a scheduled repaint.
    pub(in crate::app) fn wants_tick_repaint(&self) -> bool {
        let dragging = matches!(
            self.interaction.drag_state(),
            DragState::Dragging { .. }
        );
        self.clock.is_running() && (!self.settled || dragging)
    }

    fn advance_simulation(&mut self, ui: &Ui) {
        let frame_delta = ui.input(|input| input.stable_dt).max(0.0);
        let ticks = self
            .clock
            .advance(Duration::from_secs_f32(frame_delta));

        for _ in 0..ticks {
            let moved = self.simulation.step(&self.settings.physics);
            self.settled = !moved;
        }

        if self.wants_tick_repaint() {
            ui.ctx().request_repaint_after(self.clock.interval());
        }
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        if self.graph_dirty {
            self.rebuild_graph();
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());

        self.handle_graph_input(ui, &response);
        self.advance_simulation(ui);

        let hovered = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|_| response.contains_pointer())
            .and_then(|pointer| {
                self.interaction
                    .hovered(&self.simulation, rect.center(), pointer)
            });
        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let search_matches = self.cached_search_matches();
        let frame = SceneFrame {
            rect,
            transform: self.interaction.transform,
            view: &self.settings.view,
            selected: self.interaction.selected(),
            hovered,
            search_matches: search_matches.as_deref(),
        };

        let mut painter = ui.painter_at(rect);
        draw_scene(&mut painter, self.simulation.model(), &frame);
    }
}
