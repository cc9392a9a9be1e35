use crate::args::CloseArgs;
use crate::handlers::{task_link, task_not_found, CommandContext, CommandReply};
use crate::notify::{self, NotificationPlan};
use crate::resolver::{resolve_task_id, TASK_NOT_RESOLVED};
use crate::server::AppState;
use anyhow::Result;
use chrono::{DateTime, Utc};
use wum_store::TaskStatus;

pub async fn run(state: &AppState, ctx: &CommandContext, args: CloseArgs) -> Result<CommandReply> {
    let Some(task_id) = resolve_task_id(&state.store, ctx.channel_id.as_ref(), args.task_id) else {
        return Ok(CommandReply::public(TASK_NOT_RESOLVED));
    };
    let Some(detail) = state.store.task_detail(&task_id)? else {
        return Ok(task_not_found(&task_id));
    };

    // Closing twice is a no-op: no mutation, no notification.
    if detail.task.status == TaskStatus::Completed {
        return Ok(CommandReply::public("This task is already completed."));
    }

    state
        .store
        .update_task_status(&task_id, TaskStatus::Completed)?;

    let duration = elapsed_text(detail.task.created_at, Utc::now());
    let mut lines = vec![
        "✅ **Task completed!** 🎉".to_string(),
        String::new(),
        format!("📌 **Task**: {}", detail.task.title),
        format!("👤 **Closed by**: <@{}>", ctx.invoker_discord_id()),
    ];
    if let Some(assignee) = &detail.assignee_discord_id {
        lines.push(format!("👥 **Assignee**: <@{assignee}>"));
    }
    lines.push(format!("⏱️ **Time to completion**: {duration}"));
    lines.push(String::new());
    lines.push(format!("🔗 Task ID: {task_id}"));
    lines.push(String::new());
    lines.push("Nice work! 🎆".to_string());

    let plan = NotificationPlan::new().channel_message(
        detail.task.discord_thread_id.as_deref(),
        detail.task.discord_channel_id.as_deref(),
        lines.join("\n"),
    );
    notify::dispatch(&state.discord, plan).await;

    let assignee_text = detail
        .assignee_discord_id
        .as_ref()
        .map(|id| format!(" (assigned to <@{id}>)"))
        .unwrap_or_default();
    Ok(CommandReply::public(format!(
        "✅ Task \"**{}**\" completed!{assignee_text}\nNice work! 🎉\n\n🔗 **Details**: {}",
        detail.task.title,
        task_link(state, &task_id)
    )))
}

/// Coarsest non-zero unit pair: "N days M hours", "N hours", or "N minutes".
fn elapsed_text(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created_at);
    let days = elapsed.num_days();
    let hours = elapsed.num_hours() % 24;
    if days > 0 {
        format!("{days} days {hours} hours")
    } else if elapsed.num_hours() > 0 {
        format!("{} hours", elapsed.num_hours())
    } else {
        format!("{} minutes", elapsed.num_minutes().max(0))
    }
}
