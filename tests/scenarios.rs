use chrono::Utc;
use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

use plotweb::app::graph::{GraphFilter, GraphModel, InteractionController};
use plotweb::app::physics::SimulationContext;
use plotweb::app::render::{EdgeCurve, RecordingCanvas, SceneFrame, draw_scene};
use plotweb::config::{PhysicsConfig, ViewConfig};
use plotweb::story::{
    AffectedEntities, Consequence, ConsequenceId, ConsequenceStatus, EventId, EventType,
    LifecycleError, LifecycleManager, StoryEvent, Timeframe,
};

fn event(id: u64, title: &str, magnitude: f32) -> StoryEvent {
    StoryEvent {
        id: EventId(id),
        title: title.to_owned(),
        description: String::new(),
        event_type: EventType::Decision,
        magnitude,
        emotional_impact: None,
        chapter_number: Some(id as u32),
        causes: Vec::new(),
        effects: Vec::new(),
    }
}

fn consequence(id: u64, source: u64, status: ConsequenceStatus, probability: f32) -> Consequence {
    Consequence {
        id: ConsequenceId(id),
        source_event_id: EventId(source),
        target_event_id: None,
        description: format!("consequence {id}"),
        probability,
        severity: 0.6,
        timeframe: Timeframe::MediumTerm,
        status,
        plot_impact: None,
        affected_entities: AffectedEntities::default(),
        predicted_at: Utc::now(),
        realized_at: None,
        invalidated_at: None,
        invalidation_reason: None,
    }
}

fn build(ledger: &LifecycleManager, filter: &GraphFilter) -> GraphModel {
    let events = ledger.events().cloned().collect::<Vec<_>>();
    let consequences = ledger.consequences().cloned().collect::<Vec<_>>();
    GraphModel::build(&events, &consequences, filter, &ViewConfig::default())
}

fn render(model: &GraphModel, view: &ViewConfig) -> (RecordingCanvas, Rect) {
    let rect = Rect::from_min_size(Pos2::ZERO, vec2(1000.0, 700.0));
    let frame = SceneFrame {
        rect,
        transform: Default::default(),
        view,
        selected: None,
        hovered: None,
        search_matches: None,
    };
    let mut canvas = RecordingCanvas::default();
    draw_scene(&mut canvas, model, &frame);
    (canvas, rect)
}

#[test]
fn realizing_turns_a_floating_consequence_into_a_labelled_edge() {
    let view = ViewConfig::default();
    let filter = GraphFilter::with_statuses(ConsequenceStatus::ALL);
    let mut ledger = LifecycleManager::new(
        vec![event(1, "A", 0.9), event(2, "B", 0.3)],
        vec![consequence(1, 1, ConsequenceStatus::Active, 0.85)],
    );

    let before = build(&ledger, &filter);
    assert_eq!(before.floating.len(), 1);
    assert_eq!(before.floating[0].source, before.index_of(EventId(1)).unwrap());
    assert!(before.edges.is_empty());
    let (canvas, _) = render(&before, &view);
    assert_eq!(canvas.dashed_segments(), 1);
    assert_eq!(canvas.curves().count(), 0);

    ledger.realize(ConsequenceId(1), EventId(2)).unwrap();

    let after = build(&ledger, &filter);
    assert!(after.floating.is_empty());
    assert_eq!(after.edges.len(), 1);
    let edge = &after.edges[0];
    assert_eq!(edge.source, after.index_of(EventId(1)).unwrap());
    assert_eq!(edge.target, after.index_of(EventId(2)).unwrap());

    let (canvas, rect) = render(&after, &view);
    assert_eq!(canvas.dashed_segments(), 0);
    assert_eq!(canvas.curves().count(), 1);
    assert_eq!(canvas.polygons().count(), 1);

    let curve = EdgeCurve::between(
        rect.center() + after.nodes[edge.source].position,
        rect.center() + after.nodes[edge.target].position,
        edge.lane,
    );
    let label = canvas.text_position("85%").expect("probability label");
    assert!((label - curve.midpoint()).length() < 1e-3);

    let arrow = canvas.polygons().next().unwrap();
    let target_center = rect.center() + after.nodes[edge.target].position;
    let tip_distance = (arrow[0] - target_center).length();
    assert!((tip_distance - view.node_radius).abs() < 1e-2);
}

#[test]
fn invalidating_without_reason_changes_nothing() {
    let mut ledger = LifecycleManager::new(
        vec![event(1, "A", 0.5)],
        vec![consequence(7, 1, ConsequenceStatus::Active, 0.5)],
    );
    let before = ledger.get(ConsequenceId(7)).cloned();

    let error = ledger.invalidate(ConsequenceId(7), "").unwrap_err();
    assert!(matches!(error, LifecycleError::Validation(_)));
    assert_eq!(ledger.get(ConsequenceId(7)).cloned(), before);

    let only_active = GraphFilter::with_statuses([ConsequenceStatus::Active]);
    let model = build(&ledger, &only_active);
    assert_eq!(model.floating.len(), 1);
    assert_eq!(model.floating[0].consequence.id, ConsequenceId(7));
}

#[test]
fn terminal_consequences_reject_every_transition() {
    let mut ledger = LifecycleManager::new(
        vec![event(1, "A", 0.5), event(2, "B", 0.5)],
        vec![consequence(3, 1, ConsequenceStatus::Potential, 0.5)],
    );
    ledger.invalidate(ConsequenceId(3), "contradicted in chapter 2").unwrap();
    let settled = ledger.get(ConsequenceId(3)).cloned();

    assert!(ledger.activate(ConsequenceId(3)).is_err());
    assert!(ledger.realize(ConsequenceId(3), EventId(2)).is_err());
    assert!(ledger.invalidate(ConsequenceId(3), "again").is_err());
    assert_eq!(ledger.get(ConsequenceId(3)).cloned(), settled);
    assert_eq!(
        settled.and_then(|c| c.invalidation_reason).as_deref(),
        Some("contradicted in chapter 2")
    );
}

#[test]
fn dragged_node_stays_put_on_release_then_drifts() {
    let mut ledger = LifecycleManager::new(
        vec![event(1, "A", 0.5), event(2, "B", 0.5)],
        vec![consequence(1, 1, ConsequenceStatus::Active, 0.7)],
    );
    ledger.realize(ConsequenceId(1), EventId(2)).unwrap();

    let mut simulation = SimulationContext::new(build(
        &ledger,
        &GraphFilter::with_statuses(ConsequenceStatus::ALL),
    ));
    let mut controller = InteractionController::new(ViewConfig::default().node_radius);
    let center = pos2(500.0, 350.0);
    let a = simulation.model().index_of(EventId(1)).unwrap();

    let grab = controller
        .transform
        .world_to_screen(center, simulation.model().nodes[a].position);
    controller.pointer_down(&mut simulation, center, grab);
    assert_eq!(controller.selected(), Some(EventId(1)));

    let drop_at = controller.transform.world_to_screen(center, vec2(120.0, -40.0));
    controller.pointer_move(&mut simulation, center, drop_at);
    controller.pointer_up(&mut simulation);

    let released = simulation.model().nodes[a].position;
    assert!((released - vec2(120.0, -40.0)).length() < 1e-4);
    assert_eq!(simulation.model().nodes[a].pin, None);

    let config = PhysicsConfig::default();
    simulation.step(&config);
    let moved = (simulation.model().nodes[a].position - released).length();
    assert!(moved > 0.0);
    assert!(moved <= config.max_speed);
}

#[test]
fn five_node_chain_damps_out_within_five_hundred_ticks() {
    let events = (1..=5)
        .map(|id| event(id, &format!("E{id}"), 0.5))
        .collect::<Vec<_>>();
    let mut consequences = (1..=4)
        .map(|id| consequence(id, id, ConsequenceStatus::Active, 0.5))
        .collect::<Vec<_>>();
    for consequence in &mut consequences {
        consequence.status = ConsequenceStatus::Realized;
        consequence.target_event_id = Some(EventId(consequence.source_event_id.0 + 1));
    }

    let model = GraphModel::build(
        &events,
        &consequences,
        &GraphFilter::with_statuses(ConsequenceStatus::ALL),
        &ViewConfig::default(),
    );
    assert_eq!(model.edges.len(), 4);

    let config = PhysicsConfig::default();
    let mut simulation = SimulationContext::new(model);
    let energy = (0..500)
        .map(|_| {
            simulation.step(&config);
            simulation.kinetic_energy()
        })
        .collect::<Vec<_>>();

    let (peak_tick, peak) = energy
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap();
    assert!(peak > 0.0);
    assert!(peak_tick < 10, "energy peaked late at tick {peak_tick}");

    // Springs rebound a few times, so single ticks may rise; each window's peak still drops.
    let window_peaks = energy[peak_tick..]
        .chunks(25)
        .map(|window| window.iter().copied().fold(0.0_f32, f32::max))
        .collect::<Vec<_>>();
    for pair in window_peaks.windows(2) {
        let (earlier, later) = (pair[0], pair[1]);
        assert!(
            later < earlier || (earlier == 0.0 && later == 0.0),
            "energy swelled again: {window_peaks:?}"
        );
    }

    let tail = energy[400..].iter().copied().fold(0.0_f32, f32::max);
    assert!(tail < 1e-3, "still moving: {tail}");
    assert!(energy[499] < 1e-3);

    for node in &simulation.model().nodes {
        assert!(node.position.x.is_finite() && node.position.y.is_finite());
        assert!(node.position.length() < 2_000.0);
        assert_eq!(node.velocity, Vec2::ZERO);
    }
}
