use crate::args::CommentArgs;
use crate::handlers::{task_not_found, CommandContext, CommandReply};
use crate::mention::{format_mention_notification, resolve_mentions, MentionKind};
use crate::notify::{self, NotificationPlan};
use crate::resolver::{resolve_task_id, TASK_NOT_RESOLVED};
use crate::server::AppState;
use anyhow::Result;

pub async fn run(state: &AppState, ctx: &CommandContext, args: CommentArgs) -> Result<CommandReply> {
    let Some(task_id) = resolve_task_id(&state.store, ctx.channel_id.as_ref(), args.task_id) else {
        return Ok(CommandReply::public(TASK_NOT_RESOLVED));
    };

    // Unlike the other mutating commands, commenting requires an existing
    // user record; there is deliberately no implicit upsert here.
    let Some(commenter) = state
        .store
        .find_user_by_discord_id(ctx.invoker_discord_id())?
    else {
        return Ok(CommandReply::public(
            "Your user record was not found. Run another task command first.",
        ));
    };

    let Some(detail) = state.store.task_detail(&task_id)? else {
        return Ok(task_not_found(&task_id));
    };

    state
        .store
        .insert_comment(&task_id, &commenter.id, &args.content)?;

    let mentions = resolve_mentions(&state.store, &args.content)?;
    let commenter_discord_id = ctx.invoker_discord_id();

    let mut plan = NotificationPlan::new().channel_message(
        detail.task.discord_thread_id.as_deref(),
        detail.task.discord_channel_id.as_deref(),
        [
            "💬 **New comment**".to_string(),
            String::new(),
            format!("📌 **Task**: {}", detail.task.title),
            format!("👤 **Comment by**: <@{commenter_discord_id}>"),
            String::new(),
            "**Content**:".to_string(),
            args.content.clone(),
            String::new(),
            format!("🔗 Task ID: {task_id}"),
        ]
        .join("\n"),
    );

    // Mentioned users get the mention notification with a short excerpt.
    if let Some(mention_body) = format_mention_notification(
        &mentions,
        &detail.task.title,
        &task_id,
        &format!("Comment: \"{}\"", truncate(&args.content, 50)),
        &state.config.discord.site_url,
    ) {
        for mention in mentions.iter().filter(|m| m.kind == MentionKind::User) {
            plan = plan.direct_message(&mention.discord_id, mention_body.clone());
        }
    }

    // Stakeholders (creator, assignee) get a longer excerpt, skipping the
    // commenter themselves.
    let mut stakeholders: Vec<&str> = Vec::new();
    for id in [&detail.creator_discord_id, &detail.assignee_discord_id]
        .into_iter()
        .flatten()
    {
        if id.as_str() != commenter_discord_id && !stakeholders.contains(&id.as_str()) {
            stakeholders.push(id.as_str());
        }
    }
    for stakeholder in stakeholders {
        let dm = [
            "💬 **New comment on a task you follow**".to_string(),
            String::new(),
            format!("📌 **Task**: {}", detail.task.title),
            format!("👤 **Comment by**: <@{commenter_discord_id}>"),
            String::new(),
            "**Content**:".to_string(),
            truncate(&args.content, 200),
            String::new(),
            format!("🔗 Task ID: {task_id}"),
        ]
        .join("\n");
        plan = plan.direct_message(stakeholder, dm);
    }

    notify::dispatch(&state.discord, plan).await;

    Ok(CommandReply::public("💬 Comment added."))
}

fn truncate(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let mut excerpt: String = content.chars().take(max_chars).collect();
    excerpt.push_str("...");
    excerpt
}

#[cfg(test)]
mod tests {
    use super::truncate;
    use crate::args::CommentArgs;
    use crate::testutil::{guild_context, test_state};
    use wum_store::{NewTask, TaskPriority};

    /// Creator "10" (alice), assignee "20" (bob), thread "thread-1".
    fn seed_task(state: &crate::server::AppState) -> String {
        let team = state.store.ensure_team("guild-1", "Acme").expect("team");
        let alice = state
            .store
            .upsert_discord_user("10", "alice", None)
            .expect("user");
        let bob = state
            .store
            .upsert_discord_user("20", "bob", None)
            .expect("user");
        let task = state
            .store
            .insert_task(NewTask {
                title: "review".to_string(),
                description: None,
                priority: TaskPriority::Medium,
                team_id: team.id,
                assignee_id: Some(bob.id),
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

    #[test]
    fn truncate_appends_ellipsis_only_past_the_limit() {
        assert_eq!(truncate("short", 50), "short");
        let long = "x".repeat(60);
        let cut = truncate(&long, 50);
        assert_eq!(cut.chars().count(), 53);
        assert!(cut.ends_with("..."));
    }

    #[tokio::test]
    async fn commenter_must_already_exist() {
        let (_recording, state) = test_state();
        seed_task(&state);
        let ctx = guild_context("guild-1", "99", "stranger", Some("thread-1"), false);

        let reply = super::run(
            &state,
            &ctx,
            CommentArgs {
                content: "hi".to_string(),
                task_id: None,
            },
        )
        .await
        .expect("reply");
        assert!(reply.content.contains("Your user record was not found"));
    }

    #[tokio::test]
    async fn comment_notifies_thread_mentions_and_stakeholders() {
        let (recording, state) = test_state();
        let task_id = seed_task(&state);
        state
            .store
            .upsert_discord_user("30", "carol", None)
            .expect("user");
        // bob (assignee) comments, mentioning carol.
        let ctx = guild_context("guild-1", "20", "bob", Some("thread-1"), false);

        let reply = super::run(
            &state,
            &ctx,
            CommentArgs {
                content: "ready for <@30> to review".to_string(),
                task_id: None,
            },
        )
        .await
        .expect("reply");
        assert_eq!(reply.content, "💬 Comment added.");

        let comments = state.store.comments_for_task(&task_id).expect("comments");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].content, "ready for <@30> to review");

        let thread = recording.channel_messages("thread-1");
        assert_eq!(thread.len(), 1);
        assert!(thread[0].contains("ready for <@30> to review"));

        // carol got a mention DM; alice (creator) a stakeholder DM; bob is
        // the commenter and got nothing.
        assert!(recording.dms_to("30")[0].contains("🔔 **You were mentioned**"));
        assert!(recording.dms_to("10")[0].contains("💬 **New comment on a task you follow**"));
        assert!(recording.dms_to("20").is_empty());
    }

    #[tokio::test]
    async fn long_comments_are_truncated_in_stakeholder_dms() {
        let (recording, state) = test_state();
        seed_task(&state);
        let long_comment = "a".repeat(250);
        let ctx = guild_context("guild-1", "20", "bob", Some("thread-1"), false);

        super::run(
            &state,
            &ctx,
            CommentArgs {
                content: long_comment.clone(),
                task_id: None,
            },
        )
        .await
        .expect("reply");

        // Channel notification carries the full content.
        assert!(recording.channel_messages("thread-1")[0].contains(&long_comment));
        // Stakeholder DM carries the 200-char excerpt.
        let dm = &recording.dms_to("10")[0];
        assert!(dm.contains(&format!("{}...", "a".repeat(200))));
        assert!(!dm.contains(&long_comment));
    }
}
