use eframe::egui::{Pos2, Vec2};

use super::build::GraphModel;
use super::transform::ViewTransform;
use crate::app::physics::SimulationContext;
use crate::story::EventId;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DragState {
    Idle,
    Dragging { node: usize },
    Panning { last: Pos2 },
}

/// Nearest node whose centre lies strictly within `radius` of `world`.
pub fn hit_test(model: &GraphModel, world: Vec2, radius: f32) -> Option<usize> {
    model
        .nodes
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let distance = (node.position - world).length();
            (distance < radius).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

/// Pointer-driven pan, zoom, drag-pin and selection for one graph view.
#[derive(Clone, Debug)]
pub struct InteractionController {
    pub transform: ViewTransform,
    drag: DragState,
    selected: Option<EventId>,
    hit_radius: f32,
}

impl InteractionController {
    pub fn new(hit_radius: f32) -> Self {
        Self {
            transform: ViewTransform::default(),
            drag: DragState::Idle,
            selected: None,
            hit_radius,
        }
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn selected(&self) -> Option<EventId> {
        self.selected
    }

    pub fn select(&mut self, selected: Option<EventId>) {
        self.selected = selected;
    }

    pub fn hovered(
        &self,
        simulation: &SimulationContext,
        screen_center: Pos2,
        screen: Pos2,
    ) -> Option<usize> {
        let world = self.transform.screen_to_world(screen_center, screen);
        hit_test(simulation.model(), world, self.hit_radius)
    }

    pub fn pointer_down(
        &mut self,
        simulation: &mut SimulationContext,
        screen_center: Pos2,
        screen: Pos2,
    ) {
        self.release(simulation);

        match self.hovered(simulation, screen_center, screen) {
            Some(index) => {
                let node = &simulation.model().nodes[index];
                let (id, position) = (node.event.id, node.position);
                simulation.pin(index, position);
                self.selected = Some(id);
                self.drag = DragState::Dragging { node: index };
            }
            None => {
                self.selected = None;
                self.drag = DragState::Panning { last: screen };
            }
        }
    }

    pub fn pointer_move(
        &mut self,
        simulation: &mut SimulationContext,
        screen_center: Pos2,
        screen: Pos2,
    ) {
        match self.drag {
            DragState::Dragging { node } => {
                let world = self.transform.screen_to_world(screen_center, screen);
                simulation.pin(node, world);
            }
            DragState::Panning { last } => {
                self.transform.pan_by(screen - last);
                self.drag = DragState::Panning { last: screen };
            }
            DragState::Idle => {}
        }
    }

    /// Ends the current gesture. Returns true when a dragged node was handed back to the
    /// simulation.
    pub fn pointer_up(&mut self, simulation: &mut SimulationContext) -> bool {
        self.release(simulation)
    }

    pub fn wheel(&mut self, notches: i32) {
        self.transform.zoom_notches(notches);
    }

    pub fn reset_view(&mut self) {
        self.transform.reset();
    }

    /// Drops any drag without touching the model; used when node membership changes.
    pub fn cancel_drag(&mut self) {
        self.drag = DragState::Idle;
    }

    fn release(&mut self, simulation: &mut SimulationContext) -> bool {
        let unpinned = match self.drag {
            DragState::Dragging { node } => {
                simulation.unpin(node);
                true
            }
            DragState::Panning { .. } | DragState::Idle => false,
        };
        self.drag = DragState::Idle;
        unpinned
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;
    use crate::app::graph::GraphFilter;
    use crate::config::ViewConfig;
    use crate::story::{EventType, StoryEvent};

    fn simulation() -> SimulationContext {
        let events = (1..=2)
            .map(|id| StoryEvent {
                id: EventId(id),
                title: format!("Event {id}"),
                description: String::new(),
                event_type: EventType::Decision,
                magnitude: 0.5,
                emotional_impact: None,
                chapter_number: None,
                causes: Vec::new(),
                effects: Vec::new(),
            })
            .collect::<Vec<_>>();
        let mut context = SimulationContext::new(GraphModel::build(
            &events,
            &[],
            &GraphFilter::default(),
            &ViewConfig::default(),
        ));
        context.model_mut().nodes[0].position = vec2(-100.0, 0.0);
        context.model_mut().nodes[1].position = vec2(100.0, 0.0);
        context
    }

    const CENTER: Pos2 = pos2(400.0, 300.0);

    #[test]
    fn hit_test_uses_strict_radius_and_nearest() {
        let simulation = simulation();
        let model = simulation.model();
        assert_eq!(hit_test(model, vec2(-80.0, 10.0), 35.0), Some(0));
        assert_eq!(hit_test(model, vec2(-65.0, 0.0), 35.0), None);
        assert_eq!(hit_test(model, vec2(0.0, 0.0), 35.0), None);
        assert_eq!(hit_test(model, vec2(0.0, 0.0), 150.0), Some(0));
    }

    #[test]
    fn press_on_node_pins_and_selects() {
        let mut simulation = simulation();
        let mut controller = InteractionController::new(35.0);
        controller.pointer_down(&mut simulation, CENTER, pos2(510.0, 305.0));

        assert_eq!(controller.selected(), Some(EventId(2)));
        assert_eq!(controller.drag_state(), DragState::Dragging { node: 1 });
        assert_eq!(simulation.model().nodes[1].pin, Some(vec2(100.0, 0.0)));

        controller.pointer_move(&mut simulation, CENTER, pos2(520.0, 260.0));
        assert_eq!(simulation.model().nodes[1].pin, Some(vec2(120.0, -40.0)));
        assert_eq!(simulation.model().nodes[1].position, vec2(120.0, -40.0));

        assert!(controller.pointer_up(&mut simulation));
        assert_eq!(simulation.model().nodes[1].pin, None);
        assert_eq!(controller.drag_state(), DragState::Idle);
        assert_eq!(controller.selected(), Some(EventId(2)));
    }

    #[test]
    fn press_on_background_pans_and_clears_selection() {
        let mut simulation = simulation();
        let mut controller = InteractionController::new(35.0);
        controller.select(Some(EventId(1)));

        controller.pointer_down(&mut simulation, CENTER, pos2(400.0, 100.0));
        assert_eq!(controller.selected(), None);

        controller.pointer_move(&mut simulation, CENTER, pos2(410.0, 90.0));
        controller.pointer_move(&mut simulation, CENTER, pos2(425.0, 95.0));
        assert_eq!(controller.transform.pan, vec2(25.0, -5.0));

        assert!(!controller.pointer_up(&mut simulation));
        controller.pointer_move(&mut simulation, CENTER, pos2(0.0, 0.0));
        assert_eq!(controller.transform.pan, vec2(25.0, -5.0));
    }

    #[test]
    fn hit_testing_respects_zoom_and_pan() {
        let mut simulation = simulation();
        let mut controller = InteractionController::new(35.0);
        controller.wheel(5);
        controller.transform.pan = vec2(-50.0, 20.0);

        let screen = controller
            .transform
            .world_to_screen(CENTER, vec2(-100.0, 0.0));
        controller.pointer_down(&mut simulation, CENTER, screen);
        assert_eq!(controller.selected(), Some(EventId(1)));

        controller.reset_view();
        assert_eq!(controller.transform, ViewTransform::default());
    }
}
