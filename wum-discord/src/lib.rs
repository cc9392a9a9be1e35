//! Discord I/O for wumtodo.
//!
//! This crate is pure protocol plumbing: the interaction wire model, webhook
//! signature verification, the slash-command registration payloads, and the
//! outbound REST client. It knows nothing about tasks or persistence.

mod api;
mod commands;
mod error;
mod types;
mod verify;

pub use api::{DiscordClient, DiscordRestClient};
pub use commands::command_definitions;
pub use error::DiscordApiError;
pub use types::{
    ChannelId, CommandData, CommandOption, DiscordUser, FollowupMessage, Guild, GuildId,
    GuildMember, Interaction, InteractionResponse, InteractionType, OptionValue, ThreadRef,
    UserId, EPHEMERAL,
};
pub use verify::verify_signature;
