//! Best-effort notification fan-out.
//!
//! A handler produces one `NotificationPlan`; every delivery in the plan is
//! an isolated failure domain. A failed or timed-out send is logged and
//! dropped — it never fails the command, and it never blocks the other
//! sends from being attempted.

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use wum_discord::{ChannelId, DiscordClient, UserId};

/// Upper bound on any single delivery, timeout counts as ordinary failure.
const SEND_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Default)]
pub struct NotificationPlan {
    channel: Option<(ChannelId, String)>,
    direct: Vec<(UserId, String)>,
}

impl NotificationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Public notification target: the task thread when one exists,
    /// otherwise the origin channel — never both.
    pub fn channel_message(
        mut self,
        thread_id: Option<&str>,
        channel_id: Option<&str>,
        content: impl Into<String>,
    ) -> Self {
        let target = thread_id.or(channel_id);
        if let Some(target) = target {
            self.channel = Some((ChannelId::new(target), content.into()));
        }
        self
    }

    pub fn direct_message(mut self, user_id: &str, content: impl Into<String>) -> Self {
        self.direct.push((UserId::new(user_id), content.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_none() && self.direct.is_empty()
    }
}

/// Aggregated outcome, for logging only — callers never branch on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub attempted: usize,
    pub delivered: usize,
}

impl DeliveryReport {
    pub fn failed(&self) -> usize {
        self.attempted - self.delivered
    }
}

pub async fn dispatch(client: &Arc<dyn DiscordClient>, plan: NotificationPlan) -> DeliveryReport {
    if plan.is_empty() {
        return DeliveryReport::default();
    }
    let mut sends = Vec::new();

    if let Some((channel_id, content)) = plan.channel {
        let client = Arc::clone(client);
        sends.push(tokio::spawn(async move {
            deliver(
                format!("channel {channel_id}"),
                tokio::time::timeout(SEND_TIMEOUT, client.send_message(&channel_id, &content)),
            )
            .await
        }));
    }

    for (user_id, content) in plan.direct {
        let client = Arc::clone(client);
        sends.push(tokio::spawn(async move {
            deliver(
                format!("dm {user_id}"),
                tokio::time::timeout(SEND_TIMEOUT, client.send_direct_message(&user_id, &content)),
            )
            .await
        }));
    }

    let mut report = DeliveryReport::default();
    for outcome in join_all(sends).await {
        report.attempted += 1;
        // A panicked send task counts as a plain delivery failure.
        if matches!(outcome, Ok(true)) {
            report.delivered += 1;
        }
    }
    if report.failed() > 0 {
        tracing::warn!(
            attempted = report.attempted,
            failed = report.failed(),
            "notification fan-out completed with failures"
        );
    }
    report
}

async fn deliver<F>(target: String, send: F) -> bool
where
    F: std::future::Future<
        Output = Result<Result<(), wum_discord::DiscordApiError>, tokio::time::error::Elapsed>,
    >,
{
    match send.await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::warn!(target = %target, error = %e, "notification delivery failed");
            false
        }
        Err(_) => {
            tracing::warn!(target = %target, "notification delivery timed out");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{dispatch, NotificationPlan};
    use crate::testutil::RecordingClient;
    use std::sync::Arc;
    use wum_discord::DiscordClient;

    #[test]
    fn thread_is_preferred_over_origin_channel() {
        let plan = NotificationPlan::new().channel_message(Some("thread-1"), Some("chan-1"), "hi");
        assert!(!plan.is_empty());
        let plan_without_thread =
            NotificationPlan::new().channel_message(None, Some("chan-1"), "hi");
        assert!(!plan_without_thread.is_empty());
        let no_target = NotificationPlan::new().channel_message(None, None, "hi");
        assert!(no_target.is_empty());
    }

    #[tokio::test]
    async fn one_failing_delivery_does_not_stop_the_rest() {
        let recording = Arc::new(RecordingClient::default());
        recording.fail_dms_to("broken");
        let client: Arc<dyn DiscordClient> = recording.clone();

        let plan = NotificationPlan::new()
            .channel_message(Some("thread-1"), None, "public")
            .direct_message("broken", "dm one")
            .direct_message("fine", "dm two");
        let report = dispatch(&client, plan).await;

        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(recording.channel_messages("thread-1"), vec!["public"]);
        assert_eq!(recording.dms_to("fine"), vec!["dm two"]);
        assert!(recording.dms_to("broken").is_empty());
    }

    #[tokio::test]
    async fn failing_channel_send_still_delivers_dms() {
        let recording = Arc::new(RecordingClient::default());
        recording.fail_channel("thread-1");
        let client: Arc<dyn DiscordClient> = recording.clone();

        let plan = NotificationPlan::new()
            .channel_message(Some("thread-1"), None, "public")
            .direct_message("user-1", "dm");
        let report = dispatch(&client, plan).await;

        assert_eq!(report.attempted, 2);
        assert_eq!(report.delivered, 1);
        assert_eq!(recording.dms_to("user-1"), vec!["dm"]);
    }
}
