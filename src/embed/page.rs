//! Chat surface page
//!
//! Server-rendered page behind `GET /public/agent/{agentId}`. Style and
//! agent parameters arrive as URL query values; they are folded into a JSON
//! config block the page script applies at load time, so no user-supplied
//! value is ever interpolated into markup or CSS. The page owns the
//! transcript UI and posts sends to the gateway's `/public/chat` relay.

use serde::Deserialize;
use serde_json::json;

use crate::embed::relay::NETWORK_ERROR_TEXT;
use crate::widget::config::{Theme, DEFAULT_PRIMARY_COLOR, DEFAULT_TITLE};

/// Query parameters the widget frame passes to the surface.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub theme: Option<String>,
    #[serde(rename = "primaryColor")]
    pub primary_color: Option<String>,
    pub title: Option<String>,
}

/// Render the chat surface for an agent.
pub fn render_chat_page(agent_id: &str, query: &PageQuery) -> String {
    let theme = query
        .theme
        .as_deref()
        .map(Theme::parse)
        .unwrap_or_default();
    let primary_color = query
        .primary_color
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(DEFAULT_PRIMARY_COLOR);
    let title = query
        .title
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(DEFAULT_TITLE);

    let config = json!({
        "agentId": agent_id,
        "theme": theme.as_str(),
        "primaryColor": primary_color,
        "title": title,
        "networkErrorText": NETWORK_ERROR_TEXT,
    });

    CHAT_PAGE_TEMPLATE.replace("__PAGE_CONFIG__", &embed_json(&config))
}

/// Serialize a value for embedding inside a `<script>` block. `<` is
/// escaped so a crafted title cannot terminate the script element.
fn embed_json(value: &serde_json::Value) -> String {
    value.to_string().replace('<', "\\u003c")
}

const CHAT_PAGE_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Chat</title>
<style>
  * { box-sizing: border-box; }
  html, body { height: 100%; margin: 0; }
  body {
    display: flex;
    flex-direction: column;
    font: 14px/1.45 system-ui, -apple-system, "Segoe UI", sans-serif;
  }
  body.dark { background: #111827; color: #f9fafb; }
  body.light { background: #ffffff; color: #111827; }
  #chat-header {
    padding: 12px 16px;
    font-weight: 600;
    color: #ffffff;
    background: var(--accent, #2563eb);
  }
  #chat-log {
    flex: 1;
    overflow-y: auto;
    padding: 12px;
  }
  .turn {
    max-width: 85%;
    margin-bottom: 8px;
    padding: 8px 12px;
    border-radius: 12px;
    white-space: pre-wrap;
    word-break: break-word;
  }
  .turn.user {
    margin-left: auto;
    color: #ffffff;
    background: var(--accent, #2563eb);
  }
  body.dark .turn.agent { background: #1f2937; }
  body.light .turn.agent { background: #f3f4f6; }
  #chat-form {
    display: flex;
    gap: 8px;
    padding: 12px;
    border-top: 1px solid rgba(128, 128, 128, 0.25);
  }
  #chat-input {
    flex: 1;
    padding: 8px 12px;
    border: 1px solid rgba(128, 128, 128, 0.4);
    border-radius: 8px;
    background: transparent;
    color: inherit;
  }
  #chat-send {
    padding: 8px 16px;
    border: none;
    border-radius: 8px;
    color: #ffffff;
    background: var(--accent, #2563eb);
    cursor: pointer;
  }
  #chat-send:disabled { opacity: 0.5; cursor: default; }
</style>
</head>
<body>
<header id="chat-header"><span id="chat-title"></span></header>
<main id="chat-log"></main>
<form id="chat-form">
  <input id="chat-input" autocomplete="off" placeholder="Type a message">
  <button id="chat-send" type="submit">Send</button>
</form>
<script>
(function () {
  "use strict";

  var PAGE_CONFIG = __PAGE_CONFIG__;

  document.body.className = PAGE_CONFIG.theme;
  document.documentElement.style.setProperty("--accent", PAGE_CONFIG.primaryColor);
  document.getElementById("chat-title").textContent = PAGE_CONFIG.title;

  var log = document.getElementById("chat-log");
  var form = document.getElementById("chat-form");
  var input = document.getElementById("chat-input");
  var send = document.getElementById("chat-send");

  var sessionId = makeSessionId();
  var inFlight = false;

  function makeSessionId() {
    if (window.crypto && window.crypto.randomUUID) {
      return window.crypto.randomUUID();
    }
    return "s-" + Date.now().toString(36) + "-" + Math.random().toString(36).slice(2, 10);
  }

  function appendTurn(role, content) {
    var turn = document.createElement("div");
    turn.className = "turn " + (role === "user" ? "user" : "agent");
    turn.textContent = content;
    log.appendChild(turn);
    log.scrollTop = log.scrollHeight;
  }

  form.addEventListener("submit", function (event) {
    event.preventDefault();
    var text = input.value.trim();
    if (text === "" || inFlight) {
      return;
    }

    appendTurn("user", text);
    input.value = "";
    inFlight = true;
    send.disabled = true;

    fetch("/public/chat", {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify({
        agentId: PAGE_CONFIG.agentId,
        message: text,
        sessionId: sessionId
      })
    }).then(function (response) {
      if (response.status === 204) {
        return null;
      }
      return response.json();
    }).then(function (turn) {
      if (turn && turn.content) {
        appendTurn(turn.role || "agent", turn.content);
      }
    }).catch(function () {
      appendTurn("agent", PAGE_CONFIG.networkErrorText);
    }).finally(function () {
      inFlight = false;
      send.disabled = false;
      input.focus();
    });
  });
})();
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn query(theme: Option<&str>, color: Option<&str>, title: Option<&str>) -> PageQuery {
        PageQuery {
            theme: theme.map(|s| s.to_string()),
            primary_color: color.map(|s| s.to_string()),
            title: title.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_defaults_applied_without_query() {
        let html = render_chat_page("agent-7", &PageQuery::default());
        assert!(html.contains(r#""agentId":"agent-7""#));
        assert!(html.contains(r#""theme":"dark""#));
        assert!(html.contains(r##""primaryColor":"#2563eb""##));
        assert!(html.contains(r#""title":"Chat""#));
    }

    #[test]
    fn test_query_parameters_flow_into_config() {
        let html = render_chat_page(
            "a1",
            &query(Some("light"), Some("#ff0000"), Some("Support")),
        );
        assert!(html.contains(r#""theme":"light""#));
        assert!(html.contains(r##""primaryColor":"#ff0000""##));
        assert!(html.contains(r#""title":"Support""#));
    }

    #[test]
    fn test_unknown_theme_falls_back_to_dark() {
        let html = render_chat_page("a1", &query(Some("solarized"), None, None));
        assert!(html.contains(r#""theme":"dark""#));
    }

    #[test]
    fn test_title_cannot_break_out_of_script_block() {
        let html = render_chat_page("a1", &query(None, None, Some("</script><script>x()")));
        assert!(!html.contains("</script><script>x()"));
        assert!(html.contains("\\u003c/script>"));
    }

    #[test]
    fn test_page_posts_to_relay_endpoint() {
        let html = render_chat_page("a1", &PageQuery::default());
        assert!(html.contains(r#"fetch("/public/chat""#));
        assert!(html.contains("sessionId: sessionId"));
    }

    #[test]
    fn test_page_guards_empty_and_in_flight_sends() {
        let html = render_chat_page("a1", &PageQuery::default());
        assert!(html.contains(r#"if (text === "" || inFlight)"#));
        assert!(html.contains("send.disabled = true"));
    }
}
