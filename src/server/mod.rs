//! HTTP serving layer
//!
//! Router assembly, security headers, bind-mode resolution, health
//! endpoint, and testable startup.

pub mod bind;
pub mod headers;
pub mod health;
pub mod http;
pub mod startup;
