//! Outbound delivery of rendered messages.
//!
//! Delivery sits behind [`discord::DiscordClientTrait`] so the HTTP boundary
//! can be exercised in tests without a real webhook.
pub mod discord;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use discord::{DiscordClient, DiscordClientTrait};
