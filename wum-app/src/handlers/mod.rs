//! Slash-command handlers.
//!
//! Every handler has the same shape: act on typed arguments, perform the
//! single state mutation its command implies (mutation failures propagate),
//! fan out best-effort notifications (delivery failures never propagate),
//! and return the acknowledgement reply.

mod assign;
mod close;
mod comment;
mod create;
mod due;
mod list;
mod setup;
mod status;

use crate::args::TaskCommand;
use crate::server::AppState;
use anyhow::Result;
use wum_discord::{ChannelId, GuildId, GuildMember};

pub use setup::run_setup;

/// Guild invocation context extracted at the dispatch boundary; commands
/// without one are rejected before reaching any handler.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub guild_id: GuildId,
    pub channel_id: Option<ChannelId>,
    pub member: GuildMember,
}

impl CommandContext {
    pub fn invoker_discord_id(&self) -> &str {
        self.member.user.id.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub content: String,
    pub ephemeral: bool,
}

impl CommandReply {
    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
        }
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }
}

pub async fn run(state: &AppState, ctx: &CommandContext, command: TaskCommand) -> Result<CommandReply> {
    match command {
        TaskCommand::Create(args) => create::run(state, ctx, args).await,
        TaskCommand::List(args) => list::run(state, ctx, args).await,
        TaskCommand::Status(args) => status::run(state, ctx, args).await,
        TaskCommand::Assign(args) => assign::run(state, ctx, args).await,
        TaskCommand::Due(args) => due::run(state, ctx, args).await,
        TaskCommand::Close(args) => close::run(state, ctx, args).await,
        TaskCommand::Comment(args) => comment::run(state, ctx, args).await,
    }
}

pub(crate) fn task_link(state: &AppState, task_id: &str) -> String {
    format!("{}/tasks/{task_id}", state.config.discord.site_url)
}

pub(crate) fn task_not_found(task_id: &str) -> CommandReply {
    CommandReply::public(format!("Task (ID: {task_id}) was not found."))
}
