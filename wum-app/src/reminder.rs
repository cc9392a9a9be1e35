//! Scheduled due-date reminders.
//!
//! A cron-triggered sweep over every open task with a due date: overdue,
//! due-today, and due-tomorrow tasks notify their thread (or origin
//! channel), their assignee, and their creator. Deliberately not
//! re-entrant-safe — running the sweep twice inside one urgency window
//! re-notifies; no dedup state is kept.

use crate::notify::{self, NotificationPlan};
use crate::urgency::{self, Urgency};
use anyhow::Result;
use chrono::Utc;
use cron::Schedule;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use wum_discord::DiscordClient;
use wum_store::{Store, TaskDetail};

pub struct ReminderJob {
    store: Store,
    discord: Arc<dyn DiscordClient>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderRunSummary {
    pub examined: usize,
    pub notified: usize,
}

impl ReminderJob {
    pub fn new(store: Store, discord: Arc<dyn DiscordClient>) -> Self {
        Self { store, discord }
    }

    /// One sweep. Store failures propagate; delivery failures are logged
    /// and dropped like every other notification.
    pub async fn run_once(&self) -> Result<ReminderRunSummary> {
        let today = Utc::now().date_naive();
        let candidates = self.store.due_candidates()?;
        let mut summary = ReminderRunSummary {
            examined: candidates.len(),
            ..Default::default()
        };

        for detail in &candidates {
            let Some(due_date) = detail.task.due_date else {
                continue;
            };
            let tier = urgency::classify(due_date, today);
            let Some((emoji, label)) = tier.reminder_heading() else {
                continue;
            };

            summary.notified += 1;
            let plan = build_plan(detail, tier, emoji, label);
            notify::dispatch(&self.discord, plan).await;
        }

        tracing::info!(
            examined = summary.examined,
            notified = summary.notified,
            "reminder sweep completed"
        );
        Ok(summary)
    }

    /// Run the sweep on the given schedule until shutdown is requested.
    pub fn start(self: Arc<Self>, schedule: Schedule, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let Some(next) = schedule.upcoming(Utc).next() else {
                    tracing::warn!("reminder schedule has no upcoming fire time; stopping");
                    return;
                };
                let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    _ = tokio::time::sleep(wait) => {}
                }
                if let Err(e) = self.run_once().await {
                    tracing::error!(error = %e, "reminder sweep failed");
                }
            }
        })
    }
}

fn build_plan(detail: &TaskDetail, tier: Urgency, emoji: &str, label: &str) -> NotificationPlan {
    let task = &detail.task;
    let due = task
        .due_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    let mut lines = vec![
        format!("{emoji} **Task reminder: {label}**"),
        String::new(),
        format!("📌 **Task**: {}", task.title),
        format!("📅 **Due**: {due}"),
        format!("📊 **Status**: {}", task.status.label()),
    ];
    if let Some(assignee) = &detail.assignee_discord_id {
        lines.push(format!("👤 **Assignee**: <@{assignee}>"));
    }
    lines.push(String::new());
    lines.push(format!("🔗 Task ID: {}", task.id));

    let mut plan = NotificationPlan::new().channel_message(
        task.discord_thread_id.as_deref(),
        task.discord_channel_id.as_deref(),
        lines.join("\n"),
    );

    if let Some(assignee) = &detail.assignee_discord_id {
        let deadline_line = match tier {
            Urgency::Overdue { days } => format!("⏰ This task is {days} day(s) late."),
            Urgency::DueToday => "⏰ This task needs to be finished today.".to_string(),
            Urgency::DueTomorrow => "⏰ This task needs to be finished by tomorrow.".to_string(),
            Urgency::Upcoming { .. } => String::new(),
        };
        let dm = [
            format!("{emoji} **Reminder: this task is {label}!**"),
            String::new(),
            format!("📌 **Task**: {}", task.title),
            format!("📅 **Due**: {due}"),
            String::new(),
            deadline_line,
            String::new(),
            format!("🔗 Task ID: {}", task.id),
        ]
        .join("\n");
        plan = plan.direct_message(assignee, dm);
    }

    if let Some(creator) = &detail.creator_discord_id {
        if detail.assignee_discord_id.as_deref() != Some(creator.as_str()) {
            let assignee_line = detail
                .assignee_discord_id
                .as_ref()
                .map(|id| format!("👤 **Assignee**: <@{id}>"))
                .unwrap_or_else(|| "👤 **Assignee**: Unassigned".to_string());
            let dm = [
                format!("{emoji} **Reminder for a task you created**"),
                String::new(),
                format!("📌 **Task**: {}", task.title),
                format!("📅 **Due**: {due} ({label})"),
                assignee_line,
                String::new(),
                format!("🔗 Task ID: {}", task.id),
            ]
            .join("\n");
            plan = plan.direct_message(creator, dm);
        }
    }

    plan
}
