use crate::args::ListArgs;
use crate::handlers::{CommandContext, CommandReply};
use crate::server::AppState;
use anyhow::Result;
use wum_store::TaskListFilter;

/// Every list reply is ephemeral: only the invoking user sees it.
pub async fn run(state: &AppState, ctx: &CommandContext, args: ListArgs) -> Result<CommandReply> {
    let Some(team) = state.store.find_team_by_guild(ctx.guild_id.as_str())? else {
        return Ok(CommandReply::ephemeral(
            "No tasks have been created in this server yet.",
        ));
    };

    let mut filter = TaskListFilter {
        status: args.status,
        assignee_id: None,
    };
    if let Some(assignee_discord_id) = &args.assignee {
        match state.store.find_user_by_discord_id(assignee_discord_id)? {
            Some(user) => filter.assignee_id = Some(user.id),
            // An exact filter on an unknown user can match nothing.
            None => return Ok(CommandReply::ephemeral("No matching tasks found.")),
        }
    }

    let tasks = state.store.list_tasks(&team.id, &filter)?;
    if tasks.is_empty() {
        return Ok(CommandReply::ephemeral("No matching tasks found."));
    }

    let rows = tasks
        .iter()
        .map(|task| {
            let assignee = task
                .assignee_discord_id
                .as_ref()
                .map(|id| format!("<@{id}>"))
                .unwrap_or_else(|| "Unassigned".to_string());
            let due = task
                .due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "none".to_string());
            format!(
                "{} **{}** (ID: {})\n   {} {} priority | Assignee: {assignee} | Due: {due}",
                task.status.glyph(),
                task.title,
                task.id,
                task.priority.glyph(),
                task.priority.label(),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(CommandReply::ephemeral(format!(
        "📋 **Task list**\n\n{rows}\n\n🔗 **All tasks**: {}/tasks",
        state.config.discord.site_url
    )))
}
