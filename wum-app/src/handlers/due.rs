use crate::args::DueArgs;
use crate::handlers::{task_not_found, CommandContext, CommandReply};
use crate::notify::{self, NotificationPlan};
use crate::resolver::{resolve_task_id, TASK_NOT_RESOLVED};
use crate::server::AppState;
use crate::urgency;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use regex::Regex;
use std::sync::LazyLock;

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern"));

pub async fn run(state: &AppState, ctx: &CommandContext, args: DueArgs) -> Result<CommandReply> {
    let Some(task_id) = resolve_task_id(&state.store, ctx.channel_id.as_ref(), args.task_id) else {
        return Ok(CommandReply::public(TASK_NOT_RESOLVED));
    };

    // Shape gate first, then a real parse to reject dates like 2024-13-45.
    if !DATE_PATTERN.is_match(&args.date) {
        return Ok(CommandReply::public(
            "The date must be in YYYY-MM-DD format.",
        ));
    }
    let Ok(due_date) = NaiveDate::parse_from_str(&args.date, "%Y-%m-%d") else {
        return Ok(CommandReply::public("That date does not exist."));
    };

    let Some(detail) = state.store.task_detail(&task_id)? else {
        return Ok(task_not_found(&task_id));
    };
    state.store.update_task_due_date(&task_id, due_date)?;

    let today = Utc::now().date_naive();
    let banner = urgency::classify(due_date, today).banner();

    let previous = detail
        .task
        .due_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "none".to_string());
    let mut lines = vec![
        "📅 **Task due date set**".to_string(),
        String::new(),
        format!("📌 **Task**: {}", detail.task.title),
        format!("👤 **Set by**: <@{}>", ctx.invoker_discord_id()),
        format!("🔄 **Change**: {previous} → **{}**", args.date),
    ];
    if let Some(assignee) = &detail.assignee_discord_id {
        lines.push(format!("👥 **Assignee**: <@{assignee}>"));
    }
    lines.push(String::new());
    lines.push(banner.clone());
    lines.push(String::new());
    lines.push(format!("🔗 Task ID: {task_id}"));

    let mut plan = NotificationPlan::new().channel_message(
        detail.task.discord_thread_id.as_deref(),
        detail.task.discord_channel_id.as_deref(),
        lines.join("\n"),
    );
    if let Some(assignee) = &detail.assignee_discord_id {
        let dm = [
            "⏰ **Task due date set**".to_string(),
            String::new(),
            format!("📌 **Task**: {}", detail.task.title),
            format!("📅 **Due**: {}", args.date),
            String::new(),
            banner.clone(),
            String::new(),
            format!("🔗 Task ID: {task_id}"),
        ]
        .join("\n");
        plan = plan.direct_message(assignee, dm);
    }
    notify::dispatch(&state.discord, plan).await;

    Ok(CommandReply::public(format!(
        "📅 Task \"**{}**\" due date set to **{}**. {banner}",
        detail.task.title, args.date
    )))
}

#[cfg(test)]
mod tests {
    use crate::args::DueArgs;
    use crate::testutil::{guild_context, test_state};
    use chrono::{Duration, Utc};
    use wum_store::{NewTask, TaskPriority};

    fn seed_task(state: &crate::server::AppState, assignee: Option<&str>) -> String {
        let team = state.store.ensure_team("guild-1", "Acme").expect("team");
        let alice = state
            .store
            .upsert_discord_user("10", "alice", None)
            .expect("user");
        let assignee_id = assignee.map(|discord_id| {
            state
                .store
                .upsert_discord_user(discord_id, "bob", None)
                .expect("user")
                .id
        });
        let task = state
            .store
            .insert_task(NewTask {
                title: "deadline".to_string(),
                description: None,
                priority: TaskPriority::Medium,
                team_id: team.id,
                assignee_id,
                creator_id: alice.id,
                discord_channel_id: Some("chan-1".to_string()),
            })
            .expect("task");
        state
            .store
            .set_task_thread(&task.id, "thread-1")
            .expect("thread");
        task.id
    }

    #[tokio::test]
    async fn malformed_and_impossible_dates_are_rejected_without_mutation() {
        let (_recording, state) = test_state();
        let task_id = seed_task(&state, None);
        let ctx = guild_context("guild-1", "10", "alice", Some("thread-1"), false);

        let malformed = super::run(
            &state,
            &ctx,
            DueArgs {
                date: "tomorrow".to_string(),
                task_id: None,
            },
        )
        .await
        .expect("reply");
        assert_eq!(malformed.content, "The date must be in YYYY-MM-DD format.");

        let impossible = super::run(
            &state,
            &ctx,
            DueArgs {
                date: "2024-13-45".to_string(),
                task_id: None,
            },
        )
        .await
        .expect("reply");
        assert_eq!(impossible.content, "That date does not exist.");

        let detail = state
            .store
            .task_detail(&task_id)
            .expect("query")
            .expect("detail");
        assert_eq!(detail.task.due_date, None);
    }

    #[tokio::test]
    async fn sets_the_date_and_notifies_thread_and_assignee() {
        let (recording, state) = test_state();
        let task_id = seed_task(&state, Some("20"));
        let ctx = guild_context("guild-1", "10", "alice", Some("thread-1"), false);

        let tomorrow = (Utc::now().date_naive() + Duration::days(1))
            .format("%Y-%m-%d")
            .to_string();
        let reply = super::run(
            &state,
            &ctx,
            DueArgs {
                date: tomorrow.clone(),
                task_id: None,
            },
        )
        .await
        .expect("reply");
        assert!(reply.content.contains(&format!("due date set to **{tomorrow}**")));
        assert!(reply.content.contains("🟠 **Due tomorrow**"));

        let detail = state
            .store
            .task_detail(&task_id)
            .expect("query")
            .expect("detail");
        assert_eq!(
            detail.task.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
            Some(tomorrow)
        );

        let thread = recording.channel_messages("thread-1");
        assert_eq!(thread.len(), 1);
        assert!(thread[0].contains("none → "));
        let dms = recording.dms_to("20");
        assert_eq!(dms.len(), 1);
        assert!(dms[0].contains("⏰ **Task due date set**"));
    }

    #[tokio::test]
    async fn unassigned_task_sends_no_dm() {
        let (recording, state) = test_state();
        seed_task(&state, None);
        let ctx = guild_context("guild-1", "10", "alice", Some("thread-1"), false);

        super::run(
            &state,
            &ctx,
            DueArgs {
                date: "2030-01-15".to_string(),
                task_id: None,
            },
        )
        .await
        .expect("reply");
        assert!(recording.dm_recipients().is_empty());
        assert_eq!(recording.channel_messages("thread-1").len(), 1);
    }
}
