//! gatehouse gateway library
//!
//! Edge delivery and access gateway for embeddable chat agents: route
//! guarding for the dashboard, widget script synthesis and delivery, and
//! the public chat surface with its backend relay.

pub mod cli;
pub mod config;
pub mod embed;
pub mod guard;
pub mod logging;
pub mod server;
pub mod session;
pub mod widget;
