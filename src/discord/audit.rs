//! Audit sink for state-changing outcomes.
//!
//! Every successful link/unlink mutation produces one structured log line and
//! one post to the configured audit channel. The channel post is best-effort
//! and runs off the interaction path: a failure there is logged and never
//! delays or breaks the user-visible reply.

use std::sync::Arc;

use serenity::all::{ChannelId, CreateAllowedMentions, CreateMessage, Http};

#[derive(Debug, Clone)]
pub struct Audit {
    channel: ChannelId,
}

impl Audit {
    pub fn new(channel: ChannelId) -> Self {
        Self { channel }
    }

    /// Records one audit line: logs it, then posts it to the audit channel
    /// in a spawned task with mentions suppressed.
    pub fn record(&self, http: &Arc<Http>, line: impl Into<String>) {
        let line = line.into();
        log::info!("audit: {line}");

        let http = Arc::clone(http);
        let channel = self.channel;
        tokio::spawn(async move {
            let message = CreateMessage::new()
                .content(line)
                .allowed_mentions(CreateAllowedMentions::new());

            if let Err(err) = channel.send_message(&http, message).await {
                log::warn!("audit post to channel {channel} failed: {err}");
            }
        });
    }
}
