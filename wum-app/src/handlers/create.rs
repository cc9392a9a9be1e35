use crate::args::CreateArgs;
use crate::handlers::{task_link, CommandContext, CommandReply};
use crate::mention::{format_mention_notification, resolve_mentions};
use crate::server::AppState;
use anyhow::Result;
use wum_store::{MembershipRole, NewTask};

pub async fn run(state: &AppState, ctx: &CommandContext, args: CreateArgs) -> Result<CommandReply> {
    let invoker = state.store.upsert_discord_user(
        ctx.invoker_discord_id(),
        &ctx.member.user.username,
        ctx.member.user.avatar_url().as_deref(),
    )?;

    // Guild names are not part of webhook payloads; setup fixes this up.
    let team = state.store.ensure_team(ctx.guild_id.as_str(), "Discord Server")?;
    state
        .store
        .ensure_membership(&team.id, &invoker.id, MembershipRole::Member)?;

    // An unknown assignee leaves the task unassigned rather than failing.
    let assignee_id = match &args.assignee {
        Some(discord_id) => state
            .store
            .find_user_by_discord_id(discord_id)?
            .map(|user| user.id),
        None => None,
    };

    let task = state.store.insert_task(NewTask {
        title: args.title,
        description: args.description,
        priority: args.priority,
        team_id: team.id,
        assignee_id,
        creator_id: invoker.id,
        discord_channel_id: ctx.channel_id.as_ref().map(|c| c.to_string()),
    })?;

    let mention_text = match &task.description {
        Some(description) => format!("{} {description}", task.title),
        None => task.title.clone(),
    };
    let mentions = resolve_mentions(&state.store, &mention_text)?;

    // Companion thread is best-effort: a failure here leaves the task
    // without a thread reference but the command still succeeds.
    if let Some(channel_id) = &ctx.channel_id {
        let summary = [
            format!("📋 **Task: {}**", task.title),
            String::new(),
            task.description
                .clone()
                .unwrap_or_else(|| "No description".to_string()),
            String::new(),
            format!("**Priority**: {}", task.priority.label()),
            format!(
                "**Assignee**: {}",
                args.assignee
                    .as_ref()
                    .map(|id| format!("<@{id}>"))
                    .unwrap_or_else(|| "Unassigned".to_string())
            ),
            format!("**Creator**: <@{}>", ctx.invoker_discord_id()),
            String::new(),
            format!("🔗 **Details**: <{}>", task_link(state, &task.id)),
        ]
        .join("\n");

        match state
            .discord
            .create_thread(channel_id, &format!("📋 {}", task.title), Some(&summary))
            .await
        {
            Ok(thread) => {
                if let Err(e) = state.store.set_task_thread(&task.id, thread.id.as_str()) {
                    tracing::warn!(task_id = %task.id, error = %e, "thread backfill failed");
                }
                if let Some(body) = format_mention_notification(
                    &mentions,
                    &task.title,
                    &task.id,
                    "task created",
                    &state.config.discord.site_url,
                ) {
                    if let Err(e) = state.discord.send_message(&thread.id, &body).await {
                        tracing::warn!(task_id = %task.id, error = %e, "mention notification failed");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(task_id = %task.id, error = %e, "thread creation failed");
            }
        }
    }

    let mut lines = vec![
        "✅ Task created!".to_string(),
        format!("**Title**: {}", task.title),
        format!("**ID**: {}", task.id),
    ];
    if let Some(description) = &task.description {
        lines.push(format!("**Description**: {description}"));
    }
    if let Some(assignee) = &args.assignee {
        lines.push(format!("**Assignee**: <@{assignee}>"));
    }
    lines.push(format!("**Priority**: {}", task.priority.label()));
    lines.push(String::new());
    lines.push(format!("🔗 **Details**: <{}>", task_link(state, &task.id)));

    Ok(CommandReply::public(lines.join("\n")))
}
