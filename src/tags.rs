//! Tag labels and colours
//!
//! Section tags are free-form strings. Known language tags get a friendlier
//! label, and every tag gets a stable colour so the same tag looks the same on
//! every page.

use serde::{Deserialize, Serialize};

const PALETTE: [&str; 10] = [
    "#0ea5e9", // sky
    "#22c55e", // green
    "#f97316", // orange
    "#e11d48", // rose
    "#6366f1", // indigo
    "#14b8a6", // teal
    "#f59e0b", // amber
    "#10b981", // emerald
    "#8b5cf6", // violet
    "#06b6d4", // cyan
];

const DARK_TEXT: &str = "#111827";
const LIGHT_TEXT: &str = "#ffffff";

/// Background and foreground for a tag badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagColor {
    pub background: &'static str,
    pub text: &'static str,
}

fn normalize(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Display label for a tag
pub fn format_tag_label(tag: &str) -> String {
    match normalize(tag).as_str() {
        "cpp" | "c++" => "C++".to_string(),
        "python" => "Python".to_string(),
        _ => tag.to_string(),
    }
}

pub fn format_tag_list(tags: &[String]) -> Vec<String> {
    tags.iter().map(|t| format_tag_label(t)).collect()
}

/// 32-bit wrapping `h * 31 + unit` over UTF-16 code units
fn hash_string(value: &str) -> u32 {
    let hash = value
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_shl(5).wrapping_sub(h).wrapping_add(i32::from(unit)));
    hash.unsigned_abs()
}

/// Relative luminance threshold between dark and light text
fn text_color(background: &str) -> &'static str {
    let hex = background.trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .map_or(0.0, |v| f64::from(v) / 255.0)
    };
    let luminance = 0.2126 * channel(0..2) + 0.7152 * channel(2..4) + 0.0722 * channel(4..6);
    if luminance > 0.6 { DARK_TEXT } else { LIGHT_TEXT }
}

/// Stable badge colours for a tag (case and surrounding whitespace ignored)
pub fn tag_color(tag: &str) -> TagColor {
    let index = hash_string(&normalize(tag)) as usize % PALETTE.len();
    let background = PALETTE[index];
    TagColor { background, text: text_color(background) }
}
