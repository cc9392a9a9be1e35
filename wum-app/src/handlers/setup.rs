use crate::handlers::{CommandContext, CommandReply};
use crate::server::AppState;
use anyhow::Result;
use wum_store::MembershipRole;

const COMMAND_GUIDE: &str = "\
• `/task create` - Create a new task
• `/task list` - List tasks
• `/task status` - Change a task's status
• `/task assign` - Reassign a task
• `/task due` - Set a task's due date
• `/task close` - Close a task
• `/task comment` - Comment on a task";

/// `/wumtodo setup`: one team per server, created by an administrator.
pub async fn run_setup(state: &AppState, ctx: &CommandContext) -> Result<CommandReply> {
    if !ctx.member.is_admin() {
        return Ok(CommandReply::ephemeral(
            "❌ Only server administrators can run this command.",
        ));
    }

    // Idempotent: a second setup reports the existing team and writes nothing.
    if let Some(team) = state.store.find_team_by_guild(ctx.guild_id.as_str())? {
        return Ok(CommandReply::ephemeral(format!(
            "✅ This server is already set up!\n\nTeam: **{}**\n\nAvailable commands:\n{COMMAND_GUIDE}\n\nWeb interface: {}",
            team.name, state.config.discord.site_url
        )));
    }

    // The webhook payload has no guild name; best-effort fetch, with a
    // placeholder when the lookup fails.
    let guild_name = match state.discord.fetch_guild(&ctx.guild_id).await {
        Ok(guild) => guild.name,
        Err(e) => {
            tracing::warn!(guild_id = %ctx.guild_id, error = %e, "guild name lookup failed");
            "Discord Server".to_string()
        }
    };

    let team = state.store.ensure_team(ctx.guild_id.as_str(), &guild_name)?;
    let admin = state.store.upsert_discord_user(
        ctx.invoker_discord_id(),
        &ctx.member.user.username,
        ctx.member.user.avatar_url().as_deref(),
    )?;
    state
        .store
        .ensure_membership(&team.id, &admin.id, MembershipRole::Admin)?;

    Ok(CommandReply::public(format!(
        "🎉 **wumtodo setup complete!**\n\n\
         Team: **{guild_name}**\n\
         Admin: <@{}>\n\n\
         **📝 Available commands:**\n{COMMAND_GUIDE}\n\n\
         **🌐 Web interface:**\n{}\n\n\
         **📌 Tips:**\n\
         • Creating a task spawns a discussion thread automatically\n\
         • Mentioned users are notified by DM\n\
         • Tasks with an approaching due date get automatic reminders",
        ctx.invoker_discord_id(),
        state.config.discord.site_url
    )))
}

#[cfg(test)]
mod tests {
    use crate::testutil::{guild_context, test_state};

    #[tokio::test]
    async fn setup_requires_administrator_permission() {
        let (_recording, state) = test_state();
        let ctx = guild_context("guild-1", "10", "alice", None, false);

        let reply = super::run_setup(&state, &ctx).await.expect("reply");
        assert!(reply.ephemeral);
        assert!(reply.content.contains("Only server administrators"));
        assert!(state
            .store
            .find_team_by_guild("guild-1")
            .expect("query")
            .is_none());
    }

    #[tokio::test]
    async fn setup_creates_team_admin_membership_and_uses_guild_name() {
        let (recording, state) = test_state();
        recording.set_guild_name("Acme Corp");
        let ctx = guild_context("guild-1", "10", "alice", None, true);

        let reply = super::run_setup(&state, &ctx).await.expect("reply");
        assert!(!reply.ephemeral);
        assert!(reply.content.contains("🎉 **wumtodo setup complete!**"));
        assert!(reply.content.contains("Team: **Acme Corp**"));

        let team = state
            .store
            .find_team_by_guild("guild-1")
            .expect("query")
            .expect("team");
        assert_eq!(team.name, "Acme Corp");
        assert!(state
            .store
            .find_user_by_discord_id("10")
            .expect("query")
            .is_some());
    }

    #[tokio::test]
    async fn setup_twice_creates_exactly_one_team() {
        let (recording, state) = test_state();
        recording.set_guild_name("Acme Corp");
        let ctx = guild_context("guild-1", "10", "alice", None, true);

        super::run_setup(&state, &ctx).await.expect("reply");
        let second = super::run_setup(&state, &ctx).await.expect("reply");
        assert!(second.ephemeral);
        assert!(second.content.contains("already set up"));
        assert!(second.content.contains("**Acme Corp**"));
        assert_eq!(state.store.count_teams().expect("count"), 1);
    }

    #[tokio::test]
    async fn guild_name_lookup_failure_falls_back_to_placeholder() {
        let (_recording, state) = test_state();
        // RecordingClient without a guild name fails the fetch.
        let ctx = guild_context("guild-1", "10", "alice", None, true);

        let reply = super::run_setup(&state, &ctx).await.expect("reply");
        assert!(reply.content.contains("Team: **Discord Server**"));
    }
}
