use crate::args::StatusArgs;
use crate::handlers::{task_link, task_not_found, CommandContext, CommandReply};
use crate::notify::{self, NotificationPlan};
use crate::resolver::{resolve_task_id, TASK_NOT_RESOLVED};
use crate::server::AppState;
use anyhow::Result;

pub async fn run(state: &AppState, ctx: &CommandContext, args: StatusArgs) -> Result<CommandReply> {
    let Some(task_id) = resolve_task_id(&state.store, ctx.channel_id.as_ref(), args.task_id) else {
        return Ok(CommandReply::public(TASK_NOT_RESOLVED));
    };
    let Some(detail) = state.store.task_detail(&task_id)? else {
        return Ok(task_not_found(&task_id));
    };

    let changed = state.store.update_task_status(&task_id, args.status)?;
    // The task can vanish between the lookup above and the update.
    if changed == 0 {
        return Ok(task_not_found(&task_id));
    }

    let old_status = detail.task.status;
    let new_status = args.status;
    let mut lines = vec![
        format!("{} **Task status updated**", new_status.glyph()),
        String::new(),
        format!("📌 **Task**: {}", detail.task.title),
        format!("👤 **Updated by**: <@{}>", ctx.invoker_discord_id()),
        format!(
            "🔄 **Change**: {} → **{}**",
            old_status.label(),
            new_status.label()
        ),
    ];
    if let Some(assignee) = &detail.assignee_discord_id {
        lines.push(format!("👥 **Assignee**: <@{assignee}>"));
    }
    lines.push(String::new());
    lines.push(format!("🔗 **Details**: <{}>", task_link(state, &task_id)));

    let plan = NotificationPlan::new().channel_message(
        detail.task.discord_thread_id.as_deref(),
        detail.task.discord_channel_id.as_deref(),
        lines.join("\n"),
    );
    notify::dispatch(&state.discord, plan).await;

    Ok(CommandReply::public(format!(
        "{} Task \"**{}**\" status changed to **{}**.\n\n🔗 **Details**: <{}>",
        new_status.glyph(),
        detail.task.title,
        new_status.label(),
        task_link(state, &task_id)
    )))
}

#[cfg(test)]
mod tests {
    use crate::args::StatusArgs;
    use crate::resolver::TASK_NOT_RESOLVED;
    use crate::testutil::{guild_context, test_state};
    use wum_store::{NewTask, TaskPriority, TaskStatus};

    fn seed_task(state: &crate::server::AppState, thread: Option<&str>) -> String {
        let team = state.store.ensure_team("guild-1", "Acme").expect("team");
        let alice = state
            .store
            .upsert_discord_user("10", "alice", None)
            .expect("user");
        let task = state
            .store
            .insert_task(NewTask {
                title: "release".to_string(),
                description: None,
                priority: TaskPriority::Medium,
                team_id: team.id,
                assignee_id: None,
                creator_id: alice.id,
                discord_channel_id: Some("chan-1".to_string()),
            })
            .expect("task");
        if let Some(thread) = thread {
            state.store.set_task_thread(&task.id, thread).expect("thread");
        }
        task.id
    }

    #[tokio::test]
    async fn unresolvable_context_gets_the_guidance_message() {
        let (_recording, state) = test_state();
        let ctx = guild_context("guild-1", "10", "alice", Some("not-a-thread"), false);
        let reply = super::run(
            &state,
            &ctx,
            StatusArgs {
                status: TaskStatus::InProgress,
                task_id: None,
            },
        )
        .await
        .expect("reply");
        assert_eq!(reply.content, TASK_NOT_RESOLVED);
    }

    #[tokio::test]
    async fn explicit_unknown_id_is_reported_with_the_id() {
        let (_recording, state) = test_state();
        seed_task(&state, None);
        let ctx = guild_context("guild-1", "10", "alice", None, false);
        let reply = super::run(
            &state,
            &ctx,
            StatusArgs {
                status: TaskStatus::Completed,
                task_id: Some("ghost".to_string()),
            },
        )
        .await
        .expect("reply");
        assert_eq!(reply.content, "Task (ID: ghost) was not found.");
    }

    #[tokio::test]
    async fn updates_status_and_notifies_the_thread() {
        let (recording, state) = test_state();
        let task_id = seed_task(&state, Some("thread-1"));
        // Invoked from inside the task thread, no explicit id.
        let ctx = guild_context("guild-1", "10", "alice", Some("thread-1"), false);

        let reply = super::run(
            &state,
            &ctx,
            StatusArgs {
                status: TaskStatus::InProgress,
                task_id: None,
            },
        )
        .await
        .expect("reply");
        assert!(reply.content.contains("status changed to **In progress**"));

        let detail = state
            .store
            .task_detail(&task_id)
            .expect("query")
            .expect("detail");
        assert_eq!(detail.task.status, TaskStatus::InProgress);

        let notifications = recording.channel_messages("thread-1");
        assert_eq!(notifications.len(), 1);
        assert!(notifications[0].contains("To do → **In progress**"));
        // Thread preferred: nothing goes to the origin channel.
        assert!(recording.channel_messages("chan-1").is_empty());
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_the_command() {
        let (recording, state) = test_state();
        seed_task(&state, Some("thread-1"));
        recording.fail_channel("thread-1");
        let ctx = guild_context("guild-1", "10", "alice", Some("thread-1"), false);

        let reply = super::run(
            &state,
            &ctx,
            StatusArgs {
                status: TaskStatus::Completed,
                task_id: None,
            },
        )
        .await
        .expect("reply");
        assert!(reply.content.contains("status changed to **Completed**"));
    }
}
