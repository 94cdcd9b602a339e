use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use plotweb::app::graph::{GraphFilter, GraphModel, MAX_ZOOM, MIN_ZOOM, ViewTransform};
use plotweb::config::ViewConfig;
use plotweb::story::{
    AffectedEntities, Consequence, ConsequenceId, ConsequenceStatus, EventId, EventType,
    StoryEvent, Timeframe,
};

fn status_strategy() -> impl Strategy<Value = ConsequenceStatus> {
    prop::sample::select(ConsequenceStatus::ALL.to_vec())
}

fn event(id: u64, chapter: Option<u32>) -> StoryEvent {
    StoryEvent {
        id: EventId(id),
        title: format!("Event {id}"),
        description: String::new(),
        event_type: EventType::ALL[id as usize % EventType::ALL.len()],
        magnitude: 0.5,
        emotional_impact: None,
        chapter_number: chapter,
        causes: Vec::new(),
        effects: Vec::new(),
    }
}

/// Events `1..=event_count` and consequences whose endpoints always exist.
fn story_strategy() -> impl Strategy<Value = (Vec<StoryEvent>, Vec<Consequence>)> {
    (1u64..25).prop_flat_map(|event_count| {
        let consequence = (
            1..=event_count,
            prop::option::of(1..=event_count),
            status_strategy(),
            0.0f32..=1.0,
        );
        (
            prop::collection::vec(prop::option::of(1u32..12), event_count as usize),
            prop::collection::vec(consequence, 0..40),
        )
            .prop_map(move |(chapters, raw)| {
                let events = chapters
                    .into_iter()
                    .enumerate()
                    .map(|(index, chapter)| event(index as u64 + 1, chapter))
                    .collect::<Vec<_>>();
                let consequences = raw
                    .into_iter()
                    .enumerate()
                    .map(|(index, (source, target, status, probability))| Consequence {
                        id: ConsequenceId(index as u64 + 1),
                        source_event_id: EventId(source),
                        target_event_id: target.map(EventId),
                        description: String::new(),
                        probability,
                        severity: probability,
                        timeframe: Timeframe::Immediate,
                        status,
                        plot_impact: None,
                        affected_entities: AffectedEntities::default(),
                        predicted_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
                        realized_at: None,
                        invalidated_at: None,
                        invalidation_reason: None,
                    })
                    .collect::<Vec<_>>();
                (events, consequences)
            })
    })
}

proptest! {
    #[test]
    fn zoom_stays_clamped(notches in prop::collection::vec(-30i32..30, 0..60)) {
        let mut transform = ViewTransform::default();
        for step in notches {
            transform.zoom_notches(step);
            prop_assert!(transform.zoom >= MIN_ZOOM && transform.zoom <= MAX_ZOOM);
        }
    }

    #[test]
    fn edges_and_floating_partition_the_filtered_consequences(
        (events, consequences) in story_strategy(),
        statuses in prop::collection::btree_set(status_strategy(), 0..=4),
    ) {
        let filter = GraphFilter { statuses: statuses.clone(), chapters: None };
        let model = GraphModel::build(&events, &consequences, &filter, &ViewConfig::default());

        let shown = consequences.iter().filter(|c| statuses.contains(&c.status));
        let expected_edges = shown.clone().filter(|c| c.target_event_id.is_some()).count();
        let expected_total = shown.count();

        prop_assert_eq!(model.nodes.len(), events.len());
        prop_assert_eq!(model.edges.len(), expected_edges);
        prop_assert_eq!(model.floating.len(), expected_total - expected_edges);
    }

    #[test]
    fn chapter_filter_keeps_only_matching_or_unnumbered_events(
        (events, consequences) in story_strategy(),
        from in 1u32..12,
        span in 0u32..6,
    ) {
        let filter = GraphFilter {
            statuses: ConsequenceStatus::ALL.into_iter().collect(),
            chapters: Some((from, from + span)),
        };
        let model = GraphModel::build(&events, &consequences, &filter, &ViewConfig::default());

        for node in &model.nodes {
            let chapter = node.event.chapter_number;
            prop_assert!(chapter.is_none_or(|chapter| chapter >= from && chapter <= from + span));
        }
        for edge in &model.edges {
            prop_assert!(edge.source < model.nodes.len() && edge.target < model.nodes.len());
        }
    }

    #[test]
    fn building_is_deterministic((events, consequences) in story_strategy()) {
        let filter = GraphFilter::with_statuses(ConsequenceStatus::ALL);
        let view = ViewConfig::default();
        let first = GraphModel::build(&events, &consequences, &filter, &view);
        let second = GraphModel::build(&events, &consequences, &filter, &view);
        prop_assert_eq!(first, second);
    }
}
