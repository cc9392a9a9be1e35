//! Deferred-response coordination.
//!
//! Discord gives webhook handlers a three-second budget. Dispatchable
//! commands are acknowledged immediately with a deferred response; the real
//! work runs as a tracked background task whose completion posts exactly one
//! follow-up message on the interaction's continuation token — the handler's
//! reply, or a generic failure message when the handler errored. The server
//! waits on the tracker during shutdown so acknowledged work is never
//! abandoned.

use crate::handlers::CommandReply;
use std::future::Future;
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use wum_discord::{DiscordClient, FollowupMessage};

/// Shown to the user when the deferred handler failed; the cause is logged
/// for operators, never exposed.
pub const GENERIC_FAILURE: &str = "An error occurred. Please try again.";

#[derive(Clone)]
pub struct DeferredCoordinator {
    tracker: TaskTracker,
    discord: Arc<dyn DiscordClient>,
    application_id: String,
}

impl DeferredCoordinator {
    pub fn new(discord: Arc<dyn DiscordClient>, application_id: &str) -> Self {
        Self {
            tracker: TaskTracker::new(),
            discord,
            application_id: application_id.to_string(),
        }
    }

    /// Run `work` out-of-band and complete the interaction with one
    /// follow-up message, on both the success and the error path.
    pub fn spawn<F>(&self, interaction_token: String, command: &'static str, work: F)
    where
        F: Future<Output = anyhow::Result<CommandReply>> + Send + 'static,
    {
        let discord = Arc::clone(&self.discord);
        let application_id = self.application_id.clone();
        self.tracker.spawn(async move {
            let followup = match work.await {
                Ok(reply) => {
                    if reply.ephemeral {
                        FollowupMessage::ephemeral(reply.content)
                    } else {
                        FollowupMessage::new(reply.content)
                    }
                }
                Err(e) => {
                    tracing::error!(command, error = %e, "deferred command failed");
                    FollowupMessage::new(GENERIC_FAILURE)
                }
            };
            if let Err(e) = discord
                .send_followup(&application_id, &interaction_token, &followup)
                .await
            {
                tracing::warn!(command, error = %e, "follow-up delivery failed");
            }
        });
    }

    /// Stop accepting work and wait for every acknowledged interaction to
    /// complete its follow-up.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::{DeferredCoordinator, GENERIC_FAILURE};
    use crate::handlers::CommandReply;
    use crate::testutil::RecordingClient;
    use std::sync::Arc;
    use wum_discord::DiscordClient;

    fn coordinator() -> (Arc<RecordingClient>, DeferredCoordinator) {
        let recording = Arc::new(RecordingClient::default());
        let client: Arc<dyn DiscordClient> = recording.clone();
        (recording, DeferredCoordinator::new(client, "app-1"))
    }

    #[tokio::test]
    async fn success_posts_exactly_one_followup_with_the_reply() {
        let (recording, coordinator) = coordinator();
        coordinator.spawn("token-1".to_string(), "task create", async {
            Ok(CommandReply::public("done"))
        });
        coordinator.shutdown().await;

        let followups = recording.followups();
        assert_eq!(followups.len(), 1);
        assert_eq!(followups[0].0, "token-1");
        assert_eq!(followups[0].1.content, "done");
        assert_eq!(followups[0].1.flags, None);
    }

    #[tokio::test]
    async fn ephemeral_replies_keep_the_flag_on_the_followup() {
        let (recording, coordinator) = coordinator();
        coordinator.spawn("token-2".to_string(), "task list", async {
            Ok(CommandReply::ephemeral("only you"))
        });
        coordinator.shutdown().await;

        let followups = recording.followups();
        assert_eq!(followups.len(), 1);
        assert_eq!(followups[0].1.flags, Some(wum_discord::EPHEMERAL));
    }

    #[tokio::test]
    async fn handler_error_still_posts_exactly_one_generic_followup() {
        let (recording, coordinator) = coordinator();
        coordinator.spawn("token-3".to_string(), "task create", async {
            anyhow::bail!("database unavailable")
        });
        coordinator.shutdown().await;

        let followups = recording.followups();
        assert_eq!(followups.len(), 1);
        assert_eq!(followups[0].1.content, GENERIC_FAILURE);
    }

    #[tokio::test]
    async fn followup_send_failure_is_swallowed() {
        let (recording, coordinator) = coordinator();
        recording.fail_followups();
        coordinator.spawn("token-4".to_string(), "task close", async {
            Ok(CommandReply::public("closed"))
        });
        // Must complete without panicking even though delivery failed.
        coordinator.shutdown().await;
        assert!(recording.followups().is_empty());
    }
}
