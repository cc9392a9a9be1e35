//! Task context resolution.
//!
//! "Act on the current task" commands accept an optional explicit id; when
//! it is absent the invoking channel is assumed to be a task's companion
//! thread and looked up by thread reference.

use wum_discord::ChannelId;
use wum_store::Store;

/// Fixed guidance returned by handlers when no task can be resolved.
pub const TASK_NOT_RESOLVED: &str = "Task not found. Run this command inside the task's thread, \
or pass task_id explicitly.";

/// An explicit id is returned unchanged — existence is the caller's concern.
/// Otherwise the invoking channel is matched against stored thread
/// references; lookup misses and store failures both yield `None`.
pub fn resolve_task_id(
    store: &Store,
    channel_id: Option<&ChannelId>,
    explicit: Option<String>,
) -> Option<String> {
    if let Some(id) = explicit {
        return Some(id);
    }
    let channel_id = channel_id?;
    match store.resolve_task_by_thread(channel_id.as_str()) {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(error = %e, channel_id = %channel_id, "task resolution query failed");
            None
        }
    }
}
