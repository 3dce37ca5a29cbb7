// Discord REST dispatcher: posts one message per event, deletes messages the
// engine retracts, and forwards bookings and results to the sheet backends.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use scrimbot_core::config::DiscordConfig;
use scrimbot_core::{Dispatcher, MessageHandle, ScrimEvent};

use crate::embed::Renderer;
use crate::poll::PollWeek;
use crate::sheet::ScrimSheet;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_CONTENT_CHARS: usize = 2000;

#[derive(Debug, Deserialize)]
struct PostedMessage {
    id: String,
}

// ---------------------------------------------------------------------------
// DiscordDispatcher
// ---------------------------------------------------------------------------

pub struct DiscordDispatcher {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
    channel_id: String,
    error_channel_id: Option<String>,
    ping_role_id: Option<String>,
    renderer: Renderer,
    sheets: Vec<Box<dyn ScrimSheet>>,
}

impl DiscordDispatcher {
    pub fn new(config: &DiscordConfig, token: Option<String>, team_name: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build discord http client")?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            channel_id: config.channel_id.clone(),
            error_channel_id: config.error_channel_id.clone().filter(|c| !c.is_empty()),
            ping_role_id: config.ping_role_id.clone().filter(|r| !r.is_empty()),
            renderer: Renderer::new(team_name, config.team_page_base.clone()),
            sheets: Vec::new(),
        })
    }

    /// Add a sheet backend notified of bookings and played blocks.
    pub fn with_sheet(mut self, sheet: Box<dyn ScrimSheet>) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// The underlying client, for backends that share its connection pool.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn messages_url(&self, channel: &str) -> String {
        format!("{}/channels/{channel}/messages", self.api_base)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bot {token}")),
            None => request,
        }
    }

    #[instrument(skip(self, body))]
    async fn post(&self, channel: &str, body: &Value) -> Result<MessageHandle> {
        let request = self.authorize(self.http.post(self.messages_url(channel)).json(body));
        let response = request
            .send()
            .await
            .with_context(|| format!("failed to post message to channel {channel}"))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("discord returned {status} posting to channel {channel}: {text}");
        }
        let posted: PostedMessage = response
            .json()
            .await
            .context("failed to decode posted message")?;
        Ok(MessageHandle::new(channel, posted.id))
    }

    /// Body for an event post: the embed, plus a role mention on booking and
    /// cancellation posts.
    fn message_body(&self, event: &ScrimEvent) -> Option<Value> {
        let embed = self.renderer.render(event)?;
        let pings = event.is_booking() || matches!(event, ScrimEvent::FoundCancelled(_));
        let body = match self.ping_role_id.as_deref() {
            Some(role) if pings => json!({
                "content": format!("<@&{role}>"),
                "embeds": [embed],
                "allowed_mentions": {"roles": [role]},
            }),
            _ => json!({"embeds": [embed]}),
        };
        Some(body)
    }

    /// Post the weekly availability poll to the scrim channel.
    pub async fn post_poll(&self, week: &PollWeek) -> Result<MessageHandle> {
        let handle = self.post(&self.channel_id, &week.payload()).await?;
        info!(question = %week.question(), message = %handle, "weekly poll posted");
        Ok(handle)
    }

    /// Forward bookings, fallen-through bookings and results to every sheet
    /// backend. Failures are logged only.
    async fn record(&self, event: &ScrimEvent) {
        let scrim = event.scrim();
        let cancelled = match event {
            ScrimEvent::FoundCancelled(old) => Some(old),
            ScrimEvent::CreatedCancelled(old) if !old.open => Some(old),
            ScrimEvent::BookedUpdated { old, .. }
            | ScrimEvent::WildcardBookedUpdated { old, .. } => Some(old),
            _ => None,
        };
        let booking = event.is_booking() && scrim.opponent.is_known();
        let played = matches!(event, ScrimEvent::Played(_));

        for sheet in &self.sheets {
            if let Some(old) = cancelled {
                if let Err(e) = sheet.scrim_cancelled(old).await {
                    warn!(event = event.kind(), scrim = %old, error = %e, "sheet cancellation failed");
                }
            }
            let result = if booking {
                sheet.scrim_found(scrim).await
            } else if played {
                sheet.update_results().await
            } else {
                continue;
            };
            if let Err(e) = result {
                warn!(event = event.kind(), scrim = %scrim, error = %e, "sheet update failed");
            }
        }
    }
}

#[async_trait]
impl Dispatcher for DiscordDispatcher {
    async fn announce(&self, event: &ScrimEvent) -> Result<Option<MessageHandle>> {
        self.record(event).await;

        let Some(body) = self.message_body(event) else {
            debug!(event = event.kind(), "nothing to post");
            return Ok(None);
        };
        let handle = self
            .post(&self.channel_id, &body)
            .await
            .with_context(|| format!("failed to announce {}", event.kind()))?;
        debug!(event = event.kind(), message = %handle, "event posted");
        Ok(Some(handle))
    }

    async fn retract(&self, handle: &MessageHandle) -> Result<()> {
        let url = format!("{}/{}", self.messages_url(&handle.channel), handle.id);
        let response = self
            .authorize(self.http.delete(url))
            .send()
            .await
            .with_context(|| format!("failed to delete message {handle}"))?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                debug!(message = %handle, "message already deleted");
                Ok(())
            }
            status => anyhow::bail!("discord returned {status} deleting message {handle}"),
        }
    }

    async fn report_failure(&self, context: &str, error: &str) -> Result<()> {
        let Some(channel) = &self.error_channel_id else {
            return Ok(());
        };
        let content: String = format!("⚠️ **{context}** failed: {error}")
            .chars()
            .take(MAX_CONTENT_CHARS)
            .collect();
        self.post(channel, &json!({ "content": content }))
            .await
            .map(|_| ())
    }
}
