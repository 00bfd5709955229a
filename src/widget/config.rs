//! Widget configuration resolution
//!
//! Merges script-tag-supplied attributes with the documented defaults into
//! a canonical [`WidgetConfig`]. Resolution never fails: malformed values
//! fall back to their defaults field by field.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default accent color (also the bubble color default).
pub const DEFAULT_PRIMARY_COLOR: &str = "#2563eb";

/// Default panel title and bubble fallback text.
pub const DEFAULT_TITLE: &str = "Chat";

/// Default bubble offset from the anchored corner, in pixels.
pub const DEFAULT_OFFSET: u32 = 20;

/// Which screen corner the widget anchors to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    #[default]
    Right,
}

impl Position {
    /// Parse a raw attribute value; case-insensitive, unmatched → default.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "left" => Position::Left,
            "right" => Position::Right,
            _ => Position::default(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Position::Left => "left",
            Position::Right => "right",
        }
    }
}

/// Widget color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    /// Parse a raw attribute value; case-insensitive, unmatched → default.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "light" => Theme::Light,
            "dark" => Theme::Dark,
            _ => Theme::default(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Named bubble icon. Unknown names are kept verbatim so the glyph lookup
/// can apply its fallback-to-text rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BubbleIcon {
    Chat,
    Message,
    Help,
    Support,
    Question,
    Bot,
    /// Unrecognized attribute value (lower-cased).
    Unknown(String),
}

impl Default for BubbleIcon {
    fn default() -> Self {
        BubbleIcon::Chat
    }
}

impl BubbleIcon {
    /// Parse a raw attribute value; case-insensitive. Unknown values are
    /// preserved rather than rejected — the glyph lookup decides what to
    /// render for them.
    pub fn parse(value: &str) -> Self {
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "chat" => BubbleIcon::Chat,
            "message" => BubbleIcon::Message,
            "help" => BubbleIcon::Help,
            "support" => BubbleIcon::Support,
            "question" => BubbleIcon::Question,
            "bot" => BubbleIcon::Bot,
            _ => BubbleIcon::Unknown(normalized),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            BubbleIcon::Chat => "chat",
            BubbleIcon::Message => "message",
            BubbleIcon::Help => "help",
            BubbleIcon::Support => "support",
            BubbleIcon::Question => "question",
            BubbleIcon::Bot => "bot",
            BubbleIcon::Unknown(name) => name,
        }
    }
}

/// Canonical widget configuration.
///
/// Built exactly once per widget instantiation and immutable afterward;
/// owned by the widget instance that created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    pub agent_id: String,
    pub position: Position,
    pub theme: Theme,
    pub primary_color: String,
    pub title: String,
    pub bubble_color: String,
    pub offset_x: u32,
    pub offset_y: u32,
    pub font_family: String,
    pub bubble_icon: BubbleIcon,
    pub bubble_text: String,
}

/// Resolve a configuration from raw attribute values.
///
/// Keys are the camelCase attribute names (`agentId`, `primaryColor`, ...);
/// the synthesized script derives them from the `data-*` attributes before
/// this merge logic runs in the host page. Per-field precedence: explicit
/// non-empty attribute, else documented default. `agent_id` falls back to
/// the identifier embedded in the delivery URL at synthesis time.
pub fn resolve(raw: &HashMap<String, String>, fallback_agent_id: &str) -> WidgetConfig {
    WidgetConfig {
        agent_id: text_attr(raw, "agentId").unwrap_or_else(|| fallback_agent_id.to_string()),
        position: text_attr(raw, "position")
            .map(|v| Position::parse(&v))
            .unwrap_or_default(),
        theme: text_attr(raw, "theme")
            .map(|v| Theme::parse(&v))
            .unwrap_or_default(),
        primary_color: text_attr(raw, "primaryColor")
            .unwrap_or_else(|| DEFAULT_PRIMARY_COLOR.to_string()),
        title: text_attr(raw, "title").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        bubble_color: text_attr(raw, "bubbleColor")
            .unwrap_or_else(|| DEFAULT_PRIMARY_COLOR.to_string()),
        offset_x: numeric_attr(raw, "offsetX"),
        offset_y: numeric_attr(raw, "offsetY"),
        font_family: text_attr(raw, "fontFamily").unwrap_or_default(),
        bubble_icon: text_attr(raw, "bubbleIcon")
            .map(|v| BubbleIcon::parse(&v))
            .unwrap_or_default(),
        bubble_text: text_attr(raw, "bubbleText").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
    }
}

/// Present-and-non-empty attribute value.
fn text_attr(raw: &HashMap<String, String>, key: &str) -> Option<String> {
    raw.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

/// Non-negative integer attribute; parse failure falls back to the default
/// rather than surfacing an error.
fn numeric_attr(raw: &HashMap<String, String>, key: &str) -> u32 {
    text_attr(raw, key)
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(DEFAULT_OFFSET)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolve_empty_attrs_gives_documented_defaults() {
        let config = resolve(&HashMap::new(), "agent-7");
        assert_eq!(config.agent_id, "agent-7");
        assert_eq!(config.position, Position::Right);
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.primary_color, "#2563eb");
        assert_eq!(config.title, "Chat");
        assert_eq!(config.bubble_color, "#2563eb");
        assert_eq!(config.offset_x, 20);
        assert_eq!(config.offset_y, 20);
        assert_eq!(config.font_family, "");
        assert_eq!(config.bubble_icon, BubbleIcon::Chat);
        assert_eq!(config.bubble_text, "Chat");
    }

    #[test]
    fn test_explicit_attrs_take_precedence() {
        let raw = attrs(&[
            ("agentId", "override"),
            ("position", "left"),
            ("theme", "light"),
            ("primaryColor", "#ff0000"),
            ("title", "Ask us"),
            ("offsetX", "48"),
            ("offsetY", "12"),
            ("fontFamily", "Inter, sans-serif"),
            ("bubbleIcon", "bot"),
            ("bubbleText", "Hi"),
        ]);
        let config = resolve(&raw, "fallback");
        assert_eq!(config.agent_id, "override");
        assert_eq!(config.position, Position::Left);
        assert_eq!(config.theme, Theme::Light);
        assert_eq!(config.primary_color, "#ff0000");
        assert_eq!(config.title, "Ask us");
        assert_eq!(config.offset_x, 48);
        assert_eq!(config.offset_y, 12);
        assert_eq!(config.font_family, "Inter, sans-serif");
        assert_eq!(config.bubble_icon, BubbleIcon::Bot);
        assert_eq!(config.bubble_text, "Hi");
    }

    #[test]
    fn test_numeric_parse_failure_falls_back() {
        let config = resolve(&attrs(&[("offsetX", "abc")]), "id");
        assert_eq!(config.offset_x, 20);

        let config = resolve(&attrs(&[("offsetY", "-5")]), "id");
        assert_eq!(config.offset_y, 20);
    }

    #[test]
    fn test_enum_attrs_case_normalized() {
        let config = resolve(&attrs(&[("position", "LEFT"), ("theme", "Light")]), "id");
        assert_eq!(config.position, Position::Left);
        assert_eq!(config.theme, Theme::Light);
    }

    #[test]
    fn test_unmatched_enum_values_fall_back_to_default() {
        let config = resolve(&attrs(&[("position", "center"), ("theme", "solar")]), "id");
        assert_eq!(config.position, Position::Right);
        assert_eq!(config.theme, Theme::Dark);
    }

    #[test]
    fn test_unknown_bubble_icon_preserved() {
        let config = resolve(&attrs(&[("bubbleIcon", "UNKNOWN")]), "id");
        assert_eq!(config.bubble_icon, BubbleIcon::Unknown("unknown".to_string()));
    }

    #[test]
    fn test_empty_attr_treated_as_absent() {
        let config = resolve(&attrs(&[("title", "  "), ("agentId", "")]), "agent-7");
        assert_eq!(config.title, "Chat");
        assert_eq!(config.agent_id, "agent-7");
    }

    #[test]
    fn test_free_text_passed_through_verbatim() {
        let config = resolve(&attrs(&[("primaryColor", "not-a-color")]), "id");
        assert_eq!(config.primary_color, "not-a-color");
    }
}
