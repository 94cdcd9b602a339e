//! Immediate-mode scene drawing for the consequence graph.
//!
//! Everything here draws through [`Canvas`], so a frame can be recorded and inspected
//! without a window. Draw order is background, edges, floating consequences, nodes, legend.

mod canvas;

use std::collections::HashSet;

use eframe::egui::{Align2, Color32, Pos2, Rect, Stroke, Vec2, pos2, vec2};

use super::graph::{GraphModel, GraphNode, ViewTransform};
use super::render_utils::{
    blend_color, bubble_fill_alpha, bubble_radius, dim_color, edge_opacity, edge_width,
    event_type_color, floating_offset, magnitude_ring_alpha, shows_probability_label,
    status_color, with_alpha,
};
use crate::config::ViewConfig;
use crate::story::{ConsequenceStatus, EventId, EventType};
use crate::util::{format_percent, truncate_chars};

pub use canvas::{Canvas, DrawOp, RecordingCanvas};

pub const EMPTY_STATE_TEXT: &str = "No events match the current filters";

const GRADIENT_STEPS: usize = 6;
const ARROW_LENGTH: f32 = 12.0;
const RING_GAP: f32 = 6.0;
const BADGE_GAP: f32 = 6.0;
const SEARCH_TINT: Color32 = Color32::from_rgb(103, 196, 255);

/// A quadratic edge curve in screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeCurve {
    pub start: Pos2,
    pub control: Pos2,
    pub end: Pos2,
}

impl EdgeCurve {
    /// Bends to the left of `start -> end`; later lanes of the same pair bend further.
    pub fn between(start: Pos2, end: Pos2, lane: usize) -> Self {
        let delta = end - start;
        let length = delta.length();
        let normal = if length > f32::EPSILON {
            vec2(-delta.y, delta.x) / length
        } else {
            vec2(0.0, -1.0)
        };
        let bend = length * 0.2 * (1.0 + lane as f32 * 0.5);

        Self {
            start,
            control: start + delta * 0.5 + normal * bend,
            end,
        }
    }

    pub fn points(&self) -> [Pos2; 3] {
        [self.start, self.control, self.end]
    }

    pub fn point_at(&self, t: f32) -> Pos2 {
        let u = 1.0 - t;
        (self.start.to_vec2() * (u * u)
            + self.control.to_vec2() * (2.0 * u * t)
            + self.end.to_vec2() * (t * t))
            .to_pos2()
    }

    pub fn midpoint(&self) -> Pos2 {
        self.point_at(0.5)
    }

    /// Unit direction of travel where the curve meets its end point.
    pub fn end_tangent(&self) -> Vec2 {
        let tangent = self.end - self.control;
        let chord = self.end - self.start;
        if tangent.length_sq() > f32::EPSILON {
            tangent.normalized()
        } else if chord.length_sq() > f32::EPSILON {
            chord.normalized()
        } else {
            Vec2::X
        }
    }
}

/// Per-frame view state the renderer needs besides the model.
pub struct SceneFrame<'a> {
    pub rect: Rect,
    pub transform: ViewTransform,
    pub view: &'a ViewConfig,
    pub selected: Option<EventId>,
    pub hovered: Option<usize>,
    /// Node indices matching the search box; `None` when no search is active.
    pub search_matches: Option<&'a HashSet<usize>>,
}

impl SceneFrame<'_> {
    fn to_screen(&self, world: Vec2) -> Pos2 {
        self.transform.world_to_screen(self.rect.center(), world)
    }

    fn zoom(&self) -> f32 {
        self.transform.zoom
    }

    fn node_radius(&self, node: &GraphNode) -> f32 {
        let radius = if self.selected == Some(node.event.id) {
            self.view.selected_node_radius
        } else {
            self.view.node_radius
        };
        radius * self.zoom()
    }

    fn font_size(&self, base: f32) -> f32 {
        (base * self.zoom()).clamp(7.0, 28.0)
    }
}

pub fn draw_scene(canvas: &mut impl Canvas, model: &GraphModel, frame: &SceneFrame<'_>) {
    draw_background(canvas, frame.rect, frame.transform);

    if model.is_empty() {
        canvas.text(
            frame.rect.center(),
            Align2::CENTER_CENTER,
            EMPTY_STATE_TEXT,
            16.0,
            Color32::from_gray(200),
        );
    } else {
        draw_edges(canvas, model, frame);
        draw_floating(canvas, model, frame);
        draw_nodes(canvas, model, frame);
    }

    draw_legend(canvas, frame.rect);
}

pub fn draw_background(canvas: &mut impl Canvas, rect: Rect, transform: ViewTransform) {
    canvas.rect(rect, Color32::from_rgb(19, 23, 29));

    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));
    let step = (56.0 * transform.zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + transform.pan;

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        canvas.segment([pos2(x, rect.top()), pos2(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        canvas.segment([pos2(rect.left(), y), pos2(rect.right(), y)], stroke);
        y += step;
    }
}

fn draw_edges(canvas: &mut impl Canvas, model: &GraphModel, frame: &SceneFrame<'_>) {
    let zoom = frame.zoom();
    let selected = frame.selected.and_then(|id| model.index_of(id));

    for edge in &model.edges {
        let (Some(source), Some(target)) = (model.nodes.get(edge.source), model.nodes.get(edge.target))
        else {
            continue;
        };
        let consequence = &edge.consequence;

        let curve = EdgeCurve::between(
            frame.to_screen(source.position),
            frame.to_screen(target.position),
            edge.lane,
        );

        let mut alpha = edge_opacity(consequence.status);
        if selected.is_some_and(|index| index != edge.source && index != edge.target) {
            alpha *= 0.5;
        }
        let color = with_alpha(status_color(consequence.status), alpha);
        let width = edge_width(consequence.probability) * zoom;
        canvas.curve(curve.points(), Stroke::new(width, color));

        let tangent = curve.end_tangent();
        let tip = curve.end - tangent * frame.node_radius(target);
        let length = ARROW_LENGTH * zoom + width;
        let back = tip - tangent * length;
        let side = vec2(-tangent.y, tangent.x) * (length * 0.5);
        canvas.polygon(vec![tip, back + side, back - side], color);

        if shows_probability_label(consequence.probability, consequence.status) {
            canvas.text(
                curve.midpoint(),
                Align2::CENTER_CENTER,
                &format_percent(consequence.probability),
                frame.font_size(11.0),
                Color32::from_gray(230),
            );
        }
    }
}

fn draw_floating(canvas: &mut impl Canvas, model: &GraphModel, frame: &SceneFrame<'_>) {
    let zoom = frame.zoom();

    for floating in &model.floating {
        let Some(source) = model.nodes.get(floating.source) else {
            continue;
        };
        let consequence = &floating.consequence;

        let offset = floating_offset(source.event.id, consequence.id, frame.view.floating_radius);
        let anchor = frame.to_screen(source.position);
        let center = frame.to_screen(source.position + offset);
        let color = status_color(consequence.status);

        canvas.dashed_segment(
            [anchor, center],
            Stroke::new(1.0, with_alpha(color, 0.6)),
            4.0,
            4.0,
        );
        canvas.circle(
            center,
            bubble_radius(consequence.severity) * zoom,
            with_alpha(color, bubble_fill_alpha(consequence.probability)),
            Stroke::new(1.0, color),
        );
    }
}

fn draw_nodes(canvas: &mut impl Canvas, model: &GraphModel, frame: &SceneFrame<'_>) {
    let zoom = frame.zoom();
    let search_active = frame
        .search_matches
        .is_some_and(|matches| !matches.is_empty());

    for (index, node) in model.nodes.iter().enumerate() {
        let center = frame.to_screen(node.position);
        let radius = frame.node_radius(node);
        let is_selected = frame.selected == Some(node.event.id);
        let is_hovered = frame.hovered == Some(index);
        let is_match = frame
            .search_matches
            .is_some_and(|matches| matches.contains(&index));

        let base = event_type_color(node.event.event_type);
        let color = if is_match {
            blend_color(base, SEARCH_TINT, 0.45)
        } else if search_active {
            dim_color(base, 0.4)
        } else {
            base
        };

        fill_radial_gradient(canvas, center, radius, color);

        let outline = if is_selected {
            Stroke::new(3.0, Color32::from_rgb(245, 206, 93))
        } else if is_hovered {
            Stroke::new(2.0, Color32::from_gray(235))
        } else {
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190))
        };
        canvas.circle(center, radius, Color32::TRANSPARENT, outline);

        if let Some(alpha) = magnitude_ring_alpha(node.event.magnitude) {
            canvas.circle(
                center,
                radius + RING_GAP * zoom,
                Color32::TRANSPARENT,
                Stroke::new(2.0 * zoom.max(0.5), with_alpha(color, alpha)),
            );
        }

        canvas.text(
            center,
            Align2::CENTER_CENTER,
            &truncate_chars(&node.event.title, frame.view.title_chars),
            frame.font_size(11.0),
            Color32::WHITE,
        );

        if let Some(chapter) = node.event.chapter_number {
            canvas.text(
                center - vec2(0.0, radius + (RING_GAP + BADGE_GAP) * zoom),
                Align2::CENTER_BOTTOM,
                &format!("Ch. {chapter}"),
                frame.font_size(10.0),
                Color32::from_gray(190),
            );
        }

        if is_selected {
            canvas.text(
                center + vec2(0.0, radius + (RING_GAP + BADGE_GAP) * zoom),
                Align2::CENTER_TOP,
                &node.event.title,
                frame.font_size(13.0),
                Color32::from_gray(240),
            );
        }
    }
}

/// Concentric fills from a darkened rim to a lightened, upper-left-shifted core.
fn fill_radial_gradient(canvas: &mut impl Canvas, center: Pos2, radius: f32, base: Color32) {
    let rim = blend_color(base, Color32::BLACK, 0.35);
    let core = blend_color(base, Color32::WHITE, 0.45);
    let highlight = vec2(-0.3, -0.3) * radius;

    for step in 0..GRADIENT_STEPS {
        let t = step as f32 / (GRADIENT_STEPS - 1) as f32;
        canvas.circle(
            center + highlight * t,
            radius * (1.0 - t * 0.85),
            blend_color(rim, core, t),
            Stroke::NONE,
        );
    }
}

pub fn draw_legend(canvas: &mut impl Canvas, rect: Rect) {
    const ROW: f32 = 16.0;
    const WIDTH: f32 = 150.0;
    const PADDING: f32 = 8.0;

    let rows = EventType::ALL.len() + ConsequenceStatus::ALL.len() + 2;
    let height = rows as f32 * ROW + PADDING * 2.0;
    let top_left = pos2(
        rect.left() + PADDING,
        rect.bottom() - height - PADDING,
    );
    canvas.rect(
        Rect::from_min_size(top_left, vec2(WIDTH, height)),
        Color32::from_rgba_unmultiplied(12, 15, 20, 210),
    );

    let mut cursor = top_left + vec2(PADDING, PADDING + ROW * 0.5);
    let heading = Color32::from_gray(210);
    let entry = Color32::from_gray(180);

    canvas.text(cursor, Align2::LEFT_CENTER, "Event types", 12.0, heading);
    cursor.y += ROW;
    for event_type in EventType::ALL {
        canvas.circle(
            cursor + vec2(5.0, 0.0),
            5.0,
            event_type_color(event_type),
            Stroke::NONE,
        );
        canvas.text(
            cursor + vec2(16.0, 0.0),
            Align2::LEFT_CENTER,
            event_type.label(),
            11.0,
            entry,
        );
        cursor.y += ROW;
    }

    canvas.text(cursor, Align2::LEFT_CENTER, "Consequences", 12.0, heading);
    cursor.y += ROW;
    for status in ConsequenceStatus::ALL {
        canvas.segment(
            [cursor, cursor + vec2(10.0, 0.0)],
            Stroke::new(3.0, with_alpha(status_color(status), edge_opacity(status))),
        );
        canvas.text(
            cursor + vec2(16.0, 0.0),
            Align2::LEFT_CENTER,
            status.label(),
            11.0,
            entry,
        );
        cursor.y += ROW;
    }
}
