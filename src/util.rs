use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub const LABEL_MAX_CHARS: usize = 12;

pub fn truncate_label(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

pub fn preview(text: &str, max_chars: usize) -> String {
    let truncated = truncate_label(text, max_chars);
    if truncated.len() < text.len() {
        format!("{truncated}...")
    } else {
        truncated.to_owned()
    }
}

pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}
