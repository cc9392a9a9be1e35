use crate::error::{DiscordApiError, Result};
use crate::types::{ChannelId, FollowupMessage, Guild, GuildId, ThreadRef, UserId};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use std::time::Duration;

const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Public thread spawned from a channel message context.
const GUILD_PUBLIC_THREAD: u8 = 11;
/// Threads auto-archive after 24 hours of inactivity.
const THREAD_AUTO_ARCHIVE_MINUTES: u32 = 1440;

/// Outbound Discord REST contract.
///
/// Handlers and the notification dispatcher depend on this trait, never on
/// the concrete HTTP client, so tests can observe and fail deliveries.
#[async_trait]
pub trait DiscordClient: Send + Sync {
    async fn register_commands(
        &self,
        application_id: &str,
        commands: &[serde_json::Value],
    ) -> Result<()>;

    async fn fetch_guild(&self, guild_id: &GuildId) -> Result<Guild>;

    /// Create a public thread on `channel_id` and, when given, post the
    /// opening message into it.
    async fn create_thread(
        &self,
        channel_id: &ChannelId,
        name: &str,
        first_message: Option<&str>,
    ) -> Result<ThreadRef>;

    async fn send_message(&self, channel_id: &ChannelId, content: &str) -> Result<()>;

    /// Deliver a DM, opening (or reusing) the recipient's DM channel first.
    async fn send_direct_message(&self, user_id: &UserId, content: &str) -> Result<()>;

    /// Complete a deferred interaction via its continuation token.
    async fn send_followup(
        &self,
        application_id: &str,
        interaction_token: &str,
        message: &FollowupMessage,
    ) -> Result<()>;
}

/// reqwest-backed client authenticated with the bot token.
#[derive(Clone)]
pub struct DiscordRestClient {
    http: reqwest::Client,
    bot_token: String,
    /// user id -> DM channel id, so repeated DMs skip the open-channel call.
    dm_channels: DashMap<UserId, ChannelId>,
}

impl DiscordRestClient {
    pub fn new(bot_token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            bot_token: bot_token.to_string(),
            dm_channels: DashMap::new(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{DISCORD_API_BASE}{path}")
    }

    async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response> {
        let mut req = self
            .http
            .request(method, self.api_url(path))
            .header("Authorization", format!("Bot {}", self.bot_token));
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(status, path, "discord api call failed");
            return Err(DiscordApiError::Status { status, body });
        }
        Ok(resp)
    }

    async fn open_dm_channel(&self, user_id: &UserId) -> Result<ChannelId> {
        if let Some(existing) = self.dm_channels.get(user_id) {
            return Ok(existing.value().clone());
        }

        #[derive(Deserialize)]
        struct DmChannel {
            id: ChannelId,
        }

        let resp = self
            .request(
                reqwest::Method::POST,
                "/users/@me/channels",
                Some(&serde_json::json!({ "recipient_id": user_id })),
            )
            .await?;
        let channel: DmChannel = resp.json().await?;
        self.dm_channels
            .insert(user_id.clone(), channel.id.clone());
        Ok(channel.id)
    }
}

#[async_trait]
impl DiscordClient for DiscordRestClient {
    async fn register_commands(
        &self,
        application_id: &str,
        commands: &[serde_json::Value],
    ) -> Result<()> {
        self.request(
            reqwest::Method::PUT,
            &format!("/applications/{application_id}/commands"),
            Some(&serde_json::Value::Array(commands.to_vec())),
        )
        .await?;
        Ok(())
    }

    async fn fetch_guild(&self, guild_id: &GuildId) -> Result<Guild> {
        let resp = self
            .request(reqwest::Method::GET, &format!("/guilds/{guild_id}"), None)
            .await?;
        Ok(resp.json().await?)
    }

    async fn create_thread(
        &self,
        channel_id: &ChannelId,
        name: &str,
        first_message: Option<&str>,
    ) -> Result<ThreadRef> {
        let resp = self
            .request(
                reqwest::Method::POST,
                &format!("/channels/{channel_id}/threads"),
                Some(&serde_json::json!({
                    "name": name,
                    "type": GUILD_PUBLIC_THREAD,
                    "auto_archive_duration": THREAD_AUTO_ARCHIVE_MINUTES,
                })),
            )
            .await?;
        let thread: ThreadRef = resp.json().await?;

        if let Some(content) = first_message {
            self.send_message(&thread.id, content).await?;
        }

        Ok(thread)
    }

    async fn send_message(&self, channel_id: &ChannelId, content: &str) -> Result<()> {
        self.request(
            reqwest::Method::POST,
            &format!("/channels/{channel_id}/messages"),
            Some(&serde_json::json!({ "content": content })),
        )
        .await?;
        Ok(())
    }

    async fn send_direct_message(&self, user_id: &UserId, content: &str) -> Result<()> {
        let dm_channel = self.open_dm_channel(user_id).await?;
        self.send_message(&dm_channel, content).await
    }

    async fn send_followup(
        &self,
        application_id: &str,
        interaction_token: &str,
        message: &FollowupMessage,
    ) -> Result<()> {
        self.request(
            reqwest::Method::POST,
            &format!("/webhooks/{application_id}/{interaction_token}"),
            Some(&serde_json::to_value(message)?),
        )
        .await?;
        Ok(())
    }
}
