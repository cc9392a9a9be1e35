use crate::args::AssignArgs;
use crate::handlers::{task_link, task_not_found, CommandContext, CommandReply};
use crate::notify::{self, NotificationPlan};
use crate::resolver::{resolve_task_id, TASK_NOT_RESOLVED};
use crate::server::AppState;
use anyhow::Result;

pub async fn run(state: &AppState, ctx: &CommandContext, args: AssignArgs) -> Result<CommandReply> {
    let Some(task_id) = resolve_task_id(&state.store, ctx.channel_id.as_ref(), args.task_id) else {
        return Ok(CommandReply::public(TASK_NOT_RESOLVED));
    };

    // The new assignee may never have interacted with wumtodo; a stub
    // record is enough to hold the assignment.
    let assignee = state.store.upsert_stub_user(&args.user)?;

    let Some(detail) = state.store.task_detail(&task_id)? else {
        return Ok(task_not_found(&task_id));
    };
    state.store.update_task_assignee(&task_id, &assignee.id)?;

    let previous = detail
        .assignee_discord_id
        .as_ref()
        .map(|id| format!("<@{id}>"))
        .unwrap_or_else(|| "Unassigned".to_string());
    let notification = [
        "👥 **Task reassigned**".to_string(),
        String::new(),
        format!("📌 **Task**: {}", detail.task.title),
        format!("👤 **Changed by**: <@{}>", ctx.invoker_discord_id()),
        format!("🔄 **Change**: {previous} → <@{}>", args.user),
        String::new(),
        format!("🔗 Task ID: {task_id}"),
    ]
    .join("\n");

    let dm = [
        "🎯 **A task was assigned to you**".to_string(),
        String::new(),
        format!("📌 **Task**: {}", detail.task.title),
        format!("👤 **Assigned by**: <@{}>", ctx.invoker_discord_id()),
        String::new(),
        format!("🔗 Task ID: {task_id}"),
    ]
    .join("\n");

    let plan = NotificationPlan::new()
        .channel_message(
            detail.task.discord_thread_id.as_deref(),
            detail.task.discord_channel_id.as_deref(),
            notification,
        )
        .direct_message(&args.user, dm);
    notify::dispatch(&state.discord, plan).await;

    Ok(CommandReply::public(format!(
        "👤 Task \"**{}**\" reassigned to <@{}>.\n\n🔗 **Details**: {}",
        detail.task.title,
        args.user,
        task_link(state, &task_id)
    )))
}
