//! Mention scanning and resolution.
//!
//! Free text may reference users (`<@123>` / `<@!123>`), roles (`<@&456>`),
//! or the broadcast markers `@everyone` / `@here`. Numeric tokens are
//! resolved against the user store by Discord id; tokens that match nobody
//! (including role ids) are dropped silently — an unresolvable mention is
//! not an error.

use regex::Regex;
use std::sync::LazyLock;
use wum_store::{Store, StoreError};

static MENTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@!?(\d+)>|<@&(\d+)>|@(everyone|here)").expect("mention pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionKind {
    User,
    Everyone,
    Here,
}

/// A resolved mention; transient, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionInfo {
    pub discord_id: String,
    pub username: String,
    pub kind: MentionKind,
}

/// Raw mention tokens in first-seen order, deduplicated.
pub fn parse_mentions(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for capture in MENTION_PATTERN.captures_iter(text) {
        let token = capture
            .get(1)
            .or_else(|| capture.get(2))
            .or_else(|| capture.get(3))
            .map(|m| m.as_str().to_string());
        if let Some(token) = token {
            if !seen.contains(&token) {
                seen.push(token);
            }
        }
    }
    seen
}

pub fn resolve_mentions(store: &Store, text: &str) -> Result<Vec<MentionInfo>, StoreError> {
    let mut resolved = Vec::new();
    for token in parse_mentions(text) {
        match token.as_str() {
            "everyone" => resolved.push(MentionInfo {
                discord_id: token.clone(),
                username: token,
                kind: MentionKind::Everyone,
            }),
            "here" => resolved.push(MentionInfo {
                discord_id: token.clone(),
                username: token,
                kind: MentionKind::Here,
            }),
            _ => {
                if let Some(user) = store.find_user_by_discord_id(&token)? {
                    resolved.push(MentionInfo {
                        discord_id: user.discord_id,
                        username: user.username,
                        kind: MentionKind::User,
                    });
                }
            }
        }
    }
    Ok(resolved)
}

/// Notification body addressed to the user-typed mentions, or `None` when
/// the set contains no users (broadcast-only sets trigger no DM fan-out).
pub fn format_mention_notification(
    mentions: &[MentionInfo],
    task_title: &str,
    task_id: &str,
    context: &str,
    site_url: &str,
) -> Option<String> {
    let users: Vec<&MentionInfo> = mentions
        .iter()
        .filter(|m| m.kind == MentionKind::User)
        .collect();
    if users.is_empty() {
        return None;
    }

    let mention_list = users
        .iter()
        .map(|m| format!("<@{}>", m.discord_id))
        .collect::<Vec<_>>()
        .join(", ");

    Some(
        [
            "🔔 **You were mentioned**".to_string(),
            String::new(),
            mention_list,
            String::new(),
            format!("📌 **Task**: {task_title}"),
            format!("💬 **Context**: {context}"),
            String::new(),
            format!("🔗 **Details**: {site_url}/tasks/{task_id}"),
        ]
        .join("\n"),
    )
}
