use eframe::egui::epaint::QuadraticBezierShape;
use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke};

/// The drawing primitives the graph renderer needs from a 2-D surface.
pub trait Canvas {
    fn circle(&mut self, center: Pos2, radius: f32, fill: Color32, stroke: Stroke);
    fn curve(&mut self, points: [Pos2; 3], stroke: Stroke);
    fn polygon(&mut self, points: Vec<Pos2>, fill: Color32);
    fn segment(&mut self, points: [Pos2; 2], stroke: Stroke);
    fn dashed_segment(&mut self, points: [Pos2; 2], stroke: Stroke, dash: f32, gap: f32);
    fn text(&mut self, pos: Pos2, anchor: Align2, text: &str, size: f32, color: Color32);
    fn rect(&mut self, rect: Rect, fill: Color32);
}

impl Canvas for Painter {
    fn circle(&mut self, center: Pos2, radius: f32, fill: Color32, stroke: Stroke) {
        Painter::circle(self, center, radius, fill, stroke);
    }

    fn curve(&mut self, points: [Pos2; 3], stroke: Stroke) {
        self.add(QuadraticBezierShape::from_points_stroke(
            points,
            false,
            Color32::TRANSPARENT,
            stroke,
        ));
    }

    fn polygon(&mut self, points: Vec<Pos2>, fill: Color32) {
        self.add(Shape::convex_polygon(points, fill, Stroke::NONE));
    }

    fn segment(&mut self, points: [Pos2; 2], stroke: Stroke) {
        self.line_segment(points, stroke);
    }

    fn dashed_segment(&mut self, points: [Pos2; 2], stroke: Stroke, dash: f32, gap: f32) {
        self.extend(Shape::dashed_line(&points, stroke, dash, gap));
    }

    fn text(&mut self, pos: Pos2, anchor: Align2, text: &str, size: f32, color: Color32) {
        Painter::text(self, pos, anchor, text, FontId::proportional(size), color);
    }

    fn rect(&mut self, rect: Rect, fill: Color32) {
        self.rect_filled(rect, 4.0, fill);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Circle {
        center: Pos2,
        radius: f32,
        fill: Color32,
        stroke: Stroke,
    },
    Curve {
        points: [Pos2; 3],
        stroke: Stroke,
    },
    Polygon {
        points: Vec<Pos2>,
        fill: Color32,
    },
    Segment {
        points: [Pos2; 2],
        stroke: Stroke,
    },
    DashedSegment {
        points: [Pos2; 2],
        stroke: Stroke,
    },
    Text {
        pos: Pos2,
        anchor: Align2,
        text: String,
        size: f32,
        color: Color32,
    },
    Rect {
        rect: Rect,
        fill: Color32,
    },
}

/// Canvas that keeps every primitive instead of drawing it.
#[derive(Clone, Debug, Default)]
pub struct RecordingCanvas {
    pub ops: Vec<DrawOp>,
}

impl RecordingCanvas {
    pub fn texts(&self) -> impl Iterator<Item = (&str, Pos2)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, pos, .. } => Some((text.as_str(), *pos)),
            _ => None,
        })
    }

    pub fn text_position(&self, needle: &str) -> Option<Pos2> {
        self.texts()
            .find(|(text, _)| *text == needle)
            .map(|(_, pos)| pos)
    }

    pub fn curves(&self) -> impl Iterator<Item = &[Pos2; 3]> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Curve { points, .. } => Some(points),
            _ => None,
        })
    }

    pub fn polygons(&self) -> impl Iterator<Item = &[Pos2]> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Polygon { points, .. } => Some(points.as_slice()),
            _ => None,
        })
    }

    pub fn dashed_segments(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::DashedSegment { .. }))
            .count()
    }
}

impl Canvas for RecordingCanvas {
    fn circle(&mut self, center: Pos2, radius: f32, fill: Color32, stroke: Stroke) {
        self.ops.push(DrawOp::Circle {
            center,
            radius,
            fill,
            stroke,
        });
    }

    fn curve(&mut self, points: [Pos2; 3], stroke: Stroke) {
        self.ops.push(DrawOp::Curve { points, stroke });
    }

    fn polygon(&mut self, points: Vec<Pos2>, fill: Color32) {
        self.ops.push(DrawOp::Polygon { points, fill });
    }

    fn segment(&mut self, points: [Pos2; 2], stroke: Stroke) {
        self.ops.push(DrawOp::Segment { points, stroke });
    }

    fn dashed_segment(&mut self, points: [Pos2; 2], stroke: Stroke, _dash: f32, _gap: f32) {
        self.ops.push(DrawOp::DashedSegment { points, stroke });
    }

    fn text(&mut self, pos: Pos2, anchor: Align2, text: &str, size: f32, color: Color32) {
        self.ops.push(DrawOp::Text {
            pos,
            anchor,
            text: text.to_owned(),
            size,
            color,
        });
    }

    fn rect(&mut self, rect: Rect, fill: Color32) {
        self.ops.push(DrawOp::Rect { rect, fill });
    }
}
