use std::collections::{BTreeSet, HashMap};

use eframe::egui::{Vec2, vec2};

use crate::config::ViewConfig;
use crate::story::{Consequence, ConsequenceStatus, EventId, StoryEvent};

/// Which consequences take part in the graph, and which chapters' events.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphFilter {
    pub statuses: BTreeSet<ConsequenceStatus>,
    /// Inclusive chapter range; events without a chapter always pass.
    pub chapters: Option<(u32, u32)>,
}

impl Default for GraphFilter {
    fn default() -> Self {
        Self {
            statuses: ConsequenceStatus::DEFAULT_FILTER.into_iter().collect(),
            chapters: None,
        }
    }
}

impl GraphFilter {
    pub fn with_statuses(statuses: impl IntoIterator<Item = ConsequenceStatus>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
            chapters: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub event: StoryEvent,
    pub position: Vec2,
    pub velocity: Vec2,
    /// While set, the node sits exactly here and ignores forces.
    pub pin: Option<Vec2>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
    pub consequence: Consequence,
    pub source: usize,
    pub target: usize,
    /// How many earlier edges join the same ordered pair; spreads parallel curves apart.
    pub lane: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FloatingConsequence {
    pub consequence: Consequence,
    pub source: usize,
}

/// Nodes, edges and floating annotations derived from one set of inputs.
///
/// Membership is fixed for the life of a model; the simulation only moves nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphModel {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub floating: Vec<FloatingConsequence>,
    index_by_id: HashMap<EventId, usize>,
}

/// Initial placement: five columns, rows top to bottom, the whole grid centred on the origin.
pub fn grid_position(index: usize, count: usize, columns: usize, spacing: f32) -> Vec2 {
    let columns = columns.max(1);
    let used_columns = count.clamp(1, columns);
    let rows = count.div_ceil(columns).max(1);
    let row = index / columns;
    let col = index % columns;

    vec2(
        (col as f32 - (used_columns - 1) as f32 * 0.5) * spacing,
        (row as f32 - (rows - 1) as f32 * 0.5) * spacing,
    )
}

impl GraphModel {
    pub fn build(
        events: &[StoryEvent],
        consequences: &[Consequence],
        filter: &GraphFilter,
        view: &ViewConfig,
    ) -> Self {
        let kept = events
            .iter()
            .filter(|event| event.in_chapter_range(filter.chapters))
            .collect::<Vec<_>>();

        let mut index_by_id = HashMap::with_capacity(kept.len());
        let mut nodes = Vec::with_capacity(kept.len());
        for event in kept {
            if index_by_id.contains_key(&event.id) {
                tracing::warn!(id = %event.id, "duplicate event id, keeping the first");
                continue;
            }
            index_by_id.insert(event.id, nodes.len());
            nodes.push(GraphNode {
                event: event.clone(),
                position: Vec2::ZERO,
                velocity: Vec2::ZERO,
                pin: None,
            });
        }

        let count = nodes.len();
        for (index, node) in nodes.iter_mut().enumerate() {
            node.position = grid_position(index, count, view.grid_columns, view.grid_spacing);
        }

        let mut edges: Vec<GraphEdge> = Vec::new();
        let mut floating = Vec::new();
        let mut lanes: HashMap<(usize, usize), usize> = HashMap::new();

        for consequence in consequences {
            if !filter.statuses.contains(&consequence.status) {
                continue;
            }

            let Some(&source) = index_by_id.get(&consequence.source_event_id) else {
                tracing::debug!(
                    id = %consequence.id,
                    source = %consequence.source_event_id,
                    "source event not in view, consequence skipped"
                );
                continue;
            };

            let target = match consequence.target_event_id {
                Some(target_id) => {
                    let resolved = index_by_id.get(&target_id).copied();
                    if resolved.is_none() {
                        tracing::warn!(
                            id = %consequence.id,
                            target = %target_id,
                            "realized consequence target not in view, showing it as floating"
                        );
                    }
                    resolved
                }
                None => None,
            };

            match target {
                Some(target) => {
                    let lane = lanes.entry((source, target)).or_insert(0);
                    edges.push(GraphEdge {
                        consequence: consequence.clone(),
                        source,
                        target,
                        lane: *lane,
                    });
                    *lane += 1;
                }
                None => floating.push(FloatingConsequence {
                    consequence: consequence.clone(),
                    source,
                }),
            }
        }

        Self {
            nodes,
            edges,
            floating,
            index_by_id,
        }
    }

    pub fn index_of(&self, id: EventId) -> Option<usize> {
        self.index_by_id.get(&id).copied()
    }

    pub fn node(&self, id: EventId) -> Option<&GraphNode> {
        self.index_of(id).and_then(|index| self.nodes.get(index))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Copies simulation state of events present in both models.
    pub fn adopt_positions(&mut self, previous: &GraphModel) {
        for node in &mut self.nodes {
            if let Some(prior) = previous.node(node.event.id) {
                node.position = prior.position;
                node.velocity = prior.velocity;
            }
        }
    }
}
