use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Clamps to `[0, 1]`, mapping NaN to zero.
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

pub fn format_percent(value: f32) -> String {
    format!("{:.0}%", clamp_unit(value) * 100.0)
}

/// Shortens to `max_chars` characters, marking the cut with an ellipsis.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }

    let mut shortened = text
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    shortened.push('…');
    shortened
}

/// Maps a key to `[0, 1)`; equal keys always land on the same value.
pub fn stable_unit<K: Hash>(key: &K) -> f32 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    let hash = hasher.finish();

    ((hash >> 40) as f64 / (1u64 << 24) as f64) as f32
}
