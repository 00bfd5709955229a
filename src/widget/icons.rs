//! Bubble icon table
//!
//! Static mapping from icon names to the glyph rendered on the toggle
//! bubble. The fallback rule: an unknown name, or a glyph wider than
//! [`MAX_GLYPH_UTF16_UNITS`] UTF-16 code units, renders the configured
//! bubble text instead — never a blank bubble.

use super::config::WidgetConfig;

/// Glyphs longer than this many UTF-16 code units are treated as text and
/// replaced by the bubble fallback text. Every shipped glyph fits; the
/// boundary separates single emoji from longer strings.
pub const MAX_GLYPH_UTF16_UNITS: usize = 2;

/// The icon table. Immutable; keyed by the lower-cased icon name.
pub const ICON_GLYPHS: &[(&str, &str)] = &[
    ("chat", "\u{1F4AC}"),    // 💬
    ("message", "\u{2709}\u{FE0F}"), // ✉️
    ("help", "\u{2753}"),     // ❓
    ("support", "\u{1F3A7}"), // 🎧
    ("question", "\u{2754}"), // ❔
    ("bot", "\u{1F916}"),     // 🤖
];

/// Look up the glyph for an icon name.
pub fn glyph_for(name: &str) -> Option<&'static str> {
    ICON_GLYPHS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, glyph)| *glyph)
}

/// Resolve the label rendered on the toggle bubble for a config: the icon
/// glyph when the name is known and the glyph is short enough, otherwise
/// the bubble text.
pub fn bubble_label(config: &WidgetConfig) -> String {
    match glyph_for(config.bubble_icon.name()) {
        Some(glyph) if fits_bubble(glyph) => glyph.to_string(),
        _ => config.bubble_text.clone(),
    }
}

/// The width rule: anything wider than a single emoji's UTF-16 footprint is
/// treated as text rather than a glyph.
fn fits_bubble(glyph: &str) -> bool {
    glyph.encode_utf16().count() <= MAX_GLYPH_UTF16_UNITS
}
