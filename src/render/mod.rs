//! Notification renderers.
//!
//! Each classified event type knows how to turn itself into an
//! [`OutputMessage`]. The render instant is passed in rather than read from
//! the clock so identical input always renders identically.

pub mod incident;
pub mod subscription;

use crate::core::OutputMessage;
use chrono::{DateTime, Utc};

/// A classified event that can be rendered as a chat message.
pub trait Render {
    /// Renders the event. `now` becomes the embed timestamp.
    fn render(&self, now: DateTime<Utc>) -> OutputMessage;
}
