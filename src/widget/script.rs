//! Widget script synthesis
//!
//! Emits the self-contained bootstrap script served from
//! `GET /agent/{agentId}.js`. The script is a single self-executing closure
//! with no exported bindings: it locates its own script tag, resolves a
//! widget configuration from `data-*` attributes, builds the bubble UI, and
//! opens the chat-surface frame. A script tag that cannot be located aborts
//! widget creation silently — a broken embed must never break the host page.
//!
//! The defaults, icon table, and glyph-width rule embedded in the generated
//! code are rendered from the same constants `widget::config` and
//! `widget::icons` use, so the in-page resolution cannot drift from the
//! canonical Rust rules.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;

use super::config::{DEFAULT_OFFSET, DEFAULT_PRIMARY_COLOR, DEFAULT_TITLE};
use super::icons::{ICON_GLYPHS, MAX_GLYPH_UTF16_UNITS};

/// Agent identifiers are embedded into generated code as string literals;
/// restricting them to URL-safe identifier characters makes a literal
/// break-out impossible.
static AGENT_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Whether an agent id is safe to embed into a synthesized script.
pub fn is_safe_agent_id(agent_id: &str) -> bool {
    AGENT_ID_PATTERN.is_match(agent_id)
}

/// The chat-surface URL prefix for an agent, up to and including the `?`
/// that starts the style query parameters.
pub fn chat_surface_prefix(deployment_base_url: &str, agent_id: &str) -> String {
    format!(
        "{}/public/agent/{}?",
        deployment_base_url.trim_end_matches('/'),
        agent_id
    )
}

/// Synthesize the widget bootstrap script for an agent.
///
/// The caller is responsible for validating `agent_id` (see
/// [`is_safe_agent_id`]); all embedded values are additionally rendered as
/// JSON string literals.
pub fn synthesize(agent_id: &str, deployment_base_url: &str) -> String {
    let base = deployment_base_url.trim_end_matches('/');
    let surface_base = format!("{}/public/agent/", base);
    let surface_url = chat_surface_prefix(base, agent_id);
    let script_marker = format!("/agent/{}.js", agent_id);

    let defaults = json!({
        "position": "right",
        "theme": "dark",
        "primaryColor": DEFAULT_PRIMARY_COLOR,
        "title": DEFAULT_TITLE,
        "bubbleColor": DEFAULT_PRIMARY_COLOR,
        "offsetX": DEFAULT_OFFSET,
        "offsetY": DEFAULT_OFFSET,
        "fontFamily": "",
        "bubbleIcon": "chat",
        "bubbleText": DEFAULT_TITLE
    });

    let mut icon_table = serde_json::Map::new();
    for (name, glyph) in ICON_GLYPHS {
        icon_table.insert(name.to_string(), json!(glyph));
    }

    BOOTSTRAP_TEMPLATE
        .replace("__AGENT_ID__", &js_string(agent_id))
        .replace("__SURFACE_URL__", &js_string(&surface_url))
        .replace("__SURFACE_BASE__", &js_string(&surface_base))
        .replace("__SCRIPT_MARKER__", &js_string(&script_marker))
        .replace("__DEFAULTS__", &defaults.to_string())
        .replace("__ICON_GLYPHS__", &serde_json::Value::Object(icon_table).to_string())
        .replace("__MAX_GLYPH_UNITS__", &MAX_GLYPH_UTF16_UNITS.to_string())
}

/// Render a value as a JS string literal (JSON escaping is valid JS).
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// The generated bootstrap. A plain template with `__*__` placeholders; no
/// format!-style braces so the JS body can use `{}` freely.
const BOOTSTRAP_TEMPLATE: &str = r##"(function () {
  "use strict";

  var FALLBACK_AGENT_ID = __AGENT_ID__;
  var SCRIPT_MARKER = __SCRIPT_MARKER__;
  var DEFAULTS = __DEFAULTS__;
  var ICON_GLYPHS = __ICON_GLYPHS__;
  var MAX_GLYPH_UNITS = __MAX_GLYPH_UNITS__;

  var script = document.currentScript;
  if (!script) {
    var candidates = document.getElementsByTagName("script");
    for (var i = 0; i < candidates.length; i++) {
      var src = candidates[i].getAttribute("src") || "";
      if (src.indexOf(SCRIPT_MARKER) !== -1) {
        script = candidates[i];
        break;
      }
    }
  }
  if (!script) {
    return;
  }

  function textAttr(name, fallback) {
    var value = script.getAttribute("data-" + name);
    if (value === null) {
      return fallback;
    }
    value = value.trim();
    return value === "" ? fallback : value;
  }

  function enumAttr(name, allowed, fallback) {
    var value = textAttr(name, fallback).toLowerCase();
    return allowed.indexOf(value) !== -1 ? value : fallback;
  }

  function intAttr(name, fallback) {
    var value = parseInt(textAttr(name, ""), 10);
    return isNaN(value) || value < 0 ? fallback : value;
  }

  var config = {
    agentId: textAttr("agent-id", FALLBACK_AGENT_ID),
    position: enumAttr("position", ["left", "right"], DEFAULTS.position),
    theme: enumAttr("theme", ["light", "dark"], DEFAULTS.theme),
    primaryColor: textAttr("primary-color", DEFAULTS.primaryColor),
    title: textAttr("title", DEFAULTS.title),
    bubbleColor: textAttr("bubble-color", DEFAULTS.bubbleColor),
    offsetX: intAttr("offset-x", DEFAULTS.offsetX),
    offsetY: intAttr("offset-y", DEFAULTS.offsetY),
    fontFamily: textAttr("font-family", DEFAULTS.fontFamily),
    bubbleIcon: textAttr("bubble-icon", DEFAULTS.bubbleIcon).toLowerCase(),
    bubbleText: textAttr("bubble-text", DEFAULTS.bubbleText)
  };

  var surfaceUrl = __SURFACE_URL__;
  if (config.agentId !== FALLBACK_AGENT_ID) {
    surfaceUrl = __SURFACE_BASE__ + encodeURIComponent(config.agentId) + "?";
  }
  surfaceUrl +=
    "theme=" + encodeURIComponent(config.theme) +
    "&primaryColor=" + encodeURIComponent(config.primaryColor) +
    "&title=" + encodeURIComponent(config.title);

  var glyph = ICON_GLYPHS[config.bubbleIcon];
  var label = glyph && glyph.length <= MAX_GLYPH_UNITS ? glyph : config.bubbleText;

  var container = document.createElement("div");
  container.style.position = "fixed";
  container.style.bottom = config.offsetY + "px";
  container.style[config.position === "left" ? "left" : "right"] = config.offsetX + "px";
  container.style.zIndex = "2147483000";
  if (config.fontFamily) {
    container.style.fontFamily = config.fontFamily;
  }

  var panel = document.createElement("div");
  panel.style.display = "none";
  panel.style.width = "380px";
  panel.style.height = "560px";
  panel.style.maxWidth = "calc(100vw - 40px)";
  panel.style.maxHeight = "calc(100vh - 120px)";
  panel.style.marginBottom = "12px";
  panel.style.borderRadius = "12px";
  panel.style.overflow = "hidden";
  panel.style.boxShadow = "0 12px 40px rgba(0, 0, 0, 0.25)";
  panel.style.background = config.theme === "light" ? "#ffffff" : "#111827";

  var frame = document.createElement("iframe");
  frame.src = surfaceUrl;
  frame.title = config.title;
  frame.style.border = "0";
  frame.style.width = "100%";
  frame.style.height = "100%";
  panel.appendChild(frame);

  var button = document.createElement("button");
  button.type = "button";
  button.setAttribute("aria-label", config.title);
  button.style.width = "56px";
  button.style.height = "56px";
  button.style.borderRadius = "50%";
  button.style.border = "none";
  button.style.cursor = "pointer";
  button.style.display = "block";
  button.style.marginLeft = "auto";
  button.style.fontSize = label === config.bubbleText ? "14px" : "24px";
  button.style.color = "#ffffff";
  button.style.background = config.bubbleColor;
  button.style.boxShadow = "0 4px 16px rgba(0, 0, 0, 0.2)";
  button.appendChild(document.createTextNode(label));

  var open = false;
  button.addEventListener("click", function () {
    open = !open;
    panel.style.display = open ? "block" : "none";
  });

  container.appendChild(panel);
  container.appendChild(button);
  document.body.appendChild(container);
})();
"##;
