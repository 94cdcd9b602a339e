//! Pure visual encodings: every data-to-pixel mapping the renderer uses lives here so it can
//! be checked without a drawing surface.

use eframe::egui::{Color32, Vec2};

use crate::story::{ConsequenceId, ConsequenceStatus, EventId, EventType};
use crate::util::{clamp_unit, stable_unit};

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

/// Replaces the alpha of an opaque color.
pub(super) fn with_alpha(color: Color32, alpha: f32) -> Color32 {
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (clamp_unit(alpha) * 255.0).round() as u8,
    )
}

pub(super) fn event_type_color(event_type: EventType) -> Color32 {
    match event_type {
        EventType::Decision => Color32::from_rgb(59, 130, 246),
        EventType::Revelation => Color32::from_rgb(168, 85, 247),
        EventType::Conflict => Color32::from_rgb(239, 68, 68),
        EventType::Resolution => Color32::from_rgb(34, 197, 94),
        EventType::Relationship => Color32::from_rgb(236, 72, 153),
        EventType::Discovery => Color32::from_rgb(245, 158, 11),
        EventType::Loss => Color32::from_rgb(107, 114, 128),
        EventType::Transformation => Color32::from_rgb(20, 184, 166),
    }
}

pub(super) fn status_color(status: ConsequenceStatus) -> Color32 {
    match status {
        ConsequenceStatus::Potential => Color32::from_rgb(148, 163, 184),
        ConsequenceStatus::Active => Color32::from_rgb(249, 115, 22),
        ConsequenceStatus::Realized => Color32::from_rgb(74, 222, 128),
        ConsequenceStatus::Invalidated => Color32::from_rgb(248, 113, 113),
    }
}

/// Stroke width in world units.
pub(super) fn edge_width(probability: f32) -> f32 {
    1.0 + clamp_unit(probability) * 4.0
}

pub(super) fn edge_opacity(status: ConsequenceStatus) -> f32 {
    if status == ConsequenceStatus::Invalidated {
        0.3
    } else {
        0.8
    }
}

pub(super) fn shows_probability_label(probability: f32, status: ConsequenceStatus) -> bool {
    clamp_unit(probability) > 0.6 && status != ConsequenceStatus::Invalidated
}

pub(super) fn bubble_radius(severity: f32) -> f32 {
    6.0 + clamp_unit(severity) * 14.0
}

pub(super) fn bubble_fill_alpha(probability: f32) -> f32 {
    clamp_unit(probability).max(0.15)
}

/// Opacity of the outer magnitude ring, if the event is significant enough to get one.
pub(super) fn magnitude_ring_alpha(magnitude: f32) -> Option<f32> {
    let magnitude = clamp_unit(magnitude);
    (magnitude > 0.6).then_some(magnitude)
}

/// World-space offset of a floating consequence from its source node.
pub(super) fn floating_offset(source: EventId, consequence: ConsequenceId, radius: f32) -> Vec2 {
    let angle = stable_unit(&(source.0, consequence.0)) * std::f32::consts::TAU;
    Vec2::angled(angle) * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palettes_are_distinct() {
        let types = EventType::ALL.map(event_type_color);
        for (i, a) in types.iter().enumerate() {
            for b in &types[i + 1..] {
                assert_ne!(a, b);
            }
        }
        let statuses = ConsequenceStatus::ALL.map(status_color);
        for (i, a) in statuses.iter().enumerate() {
            for b in &statuses[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(
            event_type_color(EventType::Conflict),
            Color32::from_rgb(239, 68, 68)
        );
    }

    #[test]
    fn edge_encodings() {
        assert_eq!(edge_width(0.0), 1.0);
        assert_eq!(edge_width(1.0), 5.0);
        assert_eq!(edge_width(7.0), 5.0);
        assert!(edge_width(0.9) > edge_width(0.3));

        assert_eq!(edge_opacity(ConsequenceStatus::Invalidated), 0.3);
        assert_eq!(edge_opacity(ConsequenceStatus::Realized), 0.8);

        assert!(shows_probability_label(0.85, ConsequenceStatus::Realized));
        assert!(!shows_probability_label(0.6, ConsequenceStatus::Realized));
        assert!(!shows_probability_label(0.95, ConsequenceStatus::Invalidated));
    }

    #[test]
    fn bubble_and_ring_encodings() {
        assert_eq!(bubble_radius(0.0), 6.0);
        assert_eq!(bubble_radius(1.0), 20.0);
        assert_eq!(bubble_radius(-3.0), 6.0);
        assert_eq!(bubble_fill_alpha(0.9), 0.9);
        assert_eq!(bubble_fill_alpha(0.0), 0.15);

        assert_eq!(magnitude_ring_alpha(0.9), Some(0.9));
        assert_eq!(magnitude_ring_alpha(0.6), None);
        assert_eq!(magnitude_ring_alpha(4.0), Some(1.0));
    }

    #[test]
    fn floating_offsets_are_stable_and_on_the_circle() {
        let a = floating_offset(EventId(1), ConsequenceId(1), 80.0);
        assert_eq!(a, floating_offset(EventId(1), ConsequenceId(1), 80.0));
        assert!((a.length() - 80.0).abs() < 1e-3);

        let b = floating_offset(EventId(1), ConsequenceId(2), 80.0);
        assert_ne!(a, b);
    }

    #[test]
    fn alpha_replacement() {
        let color = with_alpha(Color32::from_rgb(10, 20, 30), 1.0);
        assert_eq!(color, Color32::from_rgb(10, 20, 30));
        assert_eq!(with_alpha(Color32::WHITE, 0.0).a(), 0);
    }
}
