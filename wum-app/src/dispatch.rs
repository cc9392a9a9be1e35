//! Interaction classification and command dispatch.
//!
//! Everything that can be answered within the protocol's latency budget is
//! answered synchronously here: the liveness probe, server-only rejections,
//! unknown subcommands, and argument validation failures. Dispatchable
//! commands are acknowledged with a deferred response and handed to the
//! coordinator, which owns the follow-up.

use crate::args::{self, TaskCommand};
use crate::handlers::{self, CommandContext};
use crate::server::AppState;
use std::sync::Arc;
use wum_discord::{Interaction, InteractionResponse, InteractionType};

pub const SERVER_ONLY: &str = "This command can only be used inside a server.";
pub const UNKNOWN_SUBCOMMAND: &str = "Unknown subcommand.";

#[derive(Debug, PartialEq)]
pub enum DispatchOutcome {
    /// Immediate protocol response (synchronous or deferred acknowledgement).
    Response(InteractionResponse),
    /// Not an interaction this endpoint understands; answered with a
    /// protocol-level 400 by the route.
    Unhandled,
}

pub fn dispatch(state: &Arc<AppState>, interaction: Interaction) -> DispatchOutcome {
    match interaction.kind {
        InteractionType::Ping => DispatchOutcome::Response(InteractionResponse::pong()),
        InteractionType::ApplicationCommand => dispatch_command(state, interaction),
        InteractionType::Other(kind) => {
            tracing::debug!(kind, "unsupported interaction type");
            DispatchOutcome::Unhandled
        }
    }
}

fn dispatch_command(state: &Arc<AppState>, interaction: Interaction) -> DispatchOutcome {
    let Some(data) = &interaction.data else {
        return DispatchOutcome::Unhandled;
    };
    if data.name != "task" && data.name != "wumtodo" {
        return DispatchOutcome::Response(InteractionResponse::message(UNKNOWN_SUBCOMMAND));
    }

    // Dispatchable only with a server context and a known member identity.
    let (Some(guild_id), Some(member)) = (&interaction.guild_id, &interaction.member) else {
        return DispatchOutcome::Response(InteractionResponse::message(SERVER_ONLY));
    };
    let ctx = CommandContext {
        guild_id: guild_id.clone(),
        channel_id: interaction.channel_id.clone(),
        member: member.clone(),
    };

    if data.name == "wumtodo" {
        return match data.subcommand().map(|sub| sub.name.as_str()) {
            Some("setup") => {
                let task_state = Arc::clone(state);
                state
                    .deferred
                    .spawn(interaction.token.clone(), "wumtodo setup", async move {
                        handlers::run_setup(&task_state, &ctx).await
                    });
                DispatchOutcome::Response(InteractionResponse::deferred(false))
            }
            _ => DispatchOutcome::Response(InteractionResponse::message(UNKNOWN_SUBCOMMAND)),
        };
    }

    let Some(sub) = data.subcommand() else {
        return DispatchOutcome::Response(InteractionResponse::message(UNKNOWN_SUBCOMMAND));
    };
    match args::parse_task_command(sub) {
        None => DispatchOutcome::Response(InteractionResponse::message(UNKNOWN_SUBCOMMAND)),
        // Validation failures are corrective messages, not system errors.
        Some(Err(arg_error)) => {
            DispatchOutcome::Response(InteractionResponse::message(arg_error.message()))
        }
        Some(Ok(command)) => {
            let ephemeral_ack = command.ephemeral_ack();
            spawn_deferred(state, interaction.token.clone(), ctx, command);
            DispatchOutcome::Response(InteractionResponse::deferred(ephemeral_ack))
        }
    }
}

fn spawn_deferred(
    state: &Arc<AppState>,
    interaction_token: String,
    ctx: CommandContext,
    command: TaskCommand,
) {
    let task_state = Arc::clone(state);
    let name = command.name();
    state.deferred.spawn(interaction_token, name, async move {
        handlers::run(&task_state, &ctx, command).await
    });
}
