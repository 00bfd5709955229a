//! Embeddable widget pipeline
//!
//! Everything behind `GET /agent/{agentId}.js`: the canonical widget
//! configuration and its resolution rules ([`config`]), the bubble icon
//! table ([`icons`]), and the script synthesizer that emits the
//! self-contained bootstrap script third-party pages embed ([`script`]).
//!
//! The synthesized script resolves its configuration in the host page from
//! `data-*` attributes; the defaults and icon table it carries are
//! code-generated from the same constants the Rust resolver uses, so the
//! two cannot drift.

pub mod config;
pub mod icons;
pub mod script;

pub use config::{resolve, BubbleIcon, Position, Theme, WidgetConfig};
pub use script::{is_safe_agent_id, synthesize};
