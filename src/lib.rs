//! hookrelay - a webhook adapter for Discord
//!
//! Receives monitoring incidents and subscription lifecycle events over HTTP,
//! normalizes each into a single-embed Discord webhook message and posts it
//! to the webhook configured for its source.

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod formatting;
pub mod internal_metrics;
pub mod notification;
pub mod render;
pub mod server;
pub mod sources;
pub mod verification;

// Re-export core types for convenience
pub use core::*;
