use crate::{core::OutputMessage, notification::DiscordClientTrait};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Fake Discord client that records every delivery instead of sending it.
#[derive(Clone, Default)]
pub struct RecordingDiscordClient {
    sent: Arc<Mutex<Vec<(String, OutputMessage)>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingDiscordClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent deliveries fail (or succeed again).
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// All `(webhook_url, message)` pairs delivered so far.
    pub fn sent(&self) -> Vec<(String, OutputMessage)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl DiscordClientTrait for RecordingDiscordClient {
    async fn send(&self, webhook_url: &str, message: &OutputMessage) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("Simulated delivery failure");
        }
        self.sent
            .lock()
            .unwrap()
            .push((webhook_url.to_string(), message.clone()));
        Ok(())
    }
}
