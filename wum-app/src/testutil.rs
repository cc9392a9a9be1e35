//! Recording Discord client used across handler, dispatcher, and route
//! tests: every outbound call is captured, and individual destinations can
//! be told to fail.

use crate::config::WumtodoConfig;
use crate::deferred::DeferredCoordinator;
use crate::handlers::CommandContext;
use crate::server::AppState;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use wum_discord::{
    ChannelId, DiscordApiError, DiscordClient, DiscordUser, FollowupMessage, Guild, GuildId,
    GuildMember, ThreadRef, UserId,
};
use wum_store::Store;

/// In-memory application state wired to a [`RecordingClient`].
pub fn test_state() -> (Arc<RecordingClient>, AppState) {
    let recording = Arc::new(RecordingClient::default());
    let client: Arc<dyn DiscordClient> = recording.clone();
    let mut config = WumtodoConfig::default();
    config.discord.application_id = "app-1".to_string();
    config.discord.site_url = "https://wumtodo.test".to_string();
    let state = AppState {
        config,
        store: Store::open_in_memory().expect("in-memory store"),
        deferred: DeferredCoordinator::new(Arc::clone(&client), "app-1"),
        discord: client,
    };
    (recording, state)
}

pub fn guild_context(
    guild_id: &str,
    user_id: &str,
    username: &str,
    channel_id: Option<&str>,
    admin: bool,
) -> CommandContext {
    CommandContext {
        guild_id: GuildId::new(guild_id),
        channel_id: channel_id.map(ChannelId::new),
        member: GuildMember {
            user: DiscordUser {
                id: UserId::new(user_id),
                username: username.to_string(),
                avatar: None,
            },
            permissions: Some(if admin { "8" } else { "0" }.to_string()),
        },
    }
}

#[derive(Default)]
struct RecordingState {
    channel_messages: Vec<(String, String)>,
    dms: Vec<(String, String)>,
    threads: Vec<(String, String, Option<String>)>,
    followups: Vec<(String, FollowupMessage)>,
    failing_channels: HashSet<String>,
    failing_dm_recipients: HashSet<String>,
    fail_thread_creation: bool,
    fail_followups: bool,
    guild_name: Option<String>,
}

#[derive(Default)]
pub struct RecordingClient {
    state: Mutex<RecordingState>,
}

impl RecordingClient {
    fn state(&self) -> std::sync::MutexGuard<'_, RecordingState> {
        self.state.lock().expect("recording client lock")
    }

    pub fn fail_channel(&self, channel_id: &str) {
        self.state().failing_channels.insert(channel_id.to_string());
    }

    pub fn fail_dms_to(&self, user_id: &str) {
        self.state()
            .failing_dm_recipients
            .insert(user_id.to_string());
    }

    pub fn fail_thread_creation(&self) {
        self.state().fail_thread_creation = true;
    }

    pub fn fail_followups(&self) {
        self.state().fail_followups = true;
    }

    pub fn set_guild_name(&self, name: &str) {
        self.state().guild_name = Some(name.to_string());
    }

    pub fn channel_messages(&self, channel_id: &str) -> Vec<String> {
        self.state()
            .channel_messages
            .iter()
            .filter(|(id, _)| id == channel_id)
            .map(|(_, content)| content.clone())
            .collect()
    }

    pub fn dms_to(&self, user_id: &str) -> Vec<String> {
        self.state()
            .dms
            .iter()
            .filter(|(id, _)| id == user_id)
            .map(|(_, content)| content.clone())
            .collect()
    }

    pub fn dm_recipients(&self) -> Vec<String> {
        self.state().dms.iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn created_threads(&self) -> Vec<(String, String, Option<String>)> {
        self.state().threads.clone()
    }

    pub fn followups(&self) -> Vec<(String, FollowupMessage)> {
        self.state().followups.clone()
    }
}

fn send_failure() -> DiscordApiError {
    DiscordApiError::Status {
        status: 502,
        body: "simulated delivery failure".to_string(),
    }
}

#[async_trait]
impl DiscordClient for RecordingClient {
    async fn register_commands(
        &self,
        _application_id: &str,
        _commands: &[serde_json::Value],
    ) -> Result<(), DiscordApiError> {
        Ok(())
    }

    async fn fetch_guild(&self, guild_id: &GuildId) -> Result<Guild, DiscordApiError> {
        let name = self.state().guild_name.clone();
        match name {
            Some(name) => Ok(Guild {
                id: guild_id.clone(),
                name,
            }),
            None => Err(send_failure()),
        }
    }

    async fn create_thread(
        &self,
        channel_id: &ChannelId,
        name: &str,
        first_message: Option<&str>,
    ) -> Result<ThreadRef, DiscordApiError> {
        let mut state = self.state();
        if state.fail_thread_creation {
            return Err(send_failure());
        }
        let thread_id = format!("thread-of-{channel_id}");
        state.threads.push((
            channel_id.to_string(),
            name.to_string(),
            first_message.map(str::to_string),
        ));
        Ok(ThreadRef {
            id: ChannelId::new(thread_id),
        })
    }

    async fn send_message(
        &self,
        channel_id: &ChannelId,
        content: &str,
    ) -> Result<(), DiscordApiError> {
        let mut state = self.state();
        if state.failing_channels.contains(channel_id.as_str()) {
            return Err(send_failure());
        }
        state
            .channel_messages
            .push((channel_id.to_string(), content.to_string()));
        Ok(())
    }

    async fn send_direct_message(
        &self,
        user_id: &UserId,
        content: &str,
    ) -> Result<(), DiscordApiError> {
        let mut state = self.state();
        if state.failing_dm_recipients.contains(user_id.as_str()) {
            return Err(send_failure());
        }
        state.dms.push((user_id.to_string(), content.to_string()));
        Ok(())
    }

    async fn send_followup(
        &self,
        _application_id: &str,
        interaction_token: &str,
        message: &FollowupMessage,
    ) -> Result<(), DiscordApiError> {
        let mut state = self.state();
        if state.fail_followups {
            return Err(send_failure());
        }
        state
            .followups
            .push((interaction_token.to_string(), message.clone()));
        Ok(())
    }
}
