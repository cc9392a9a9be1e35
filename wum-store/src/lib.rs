//! Typed persistence layer for wumtodo.
//!
//! One SQLite database holds users, teams, memberships, tasks, and comments.
//! Repositories expose exactly the query shapes the command handlers need:
//! unique-key upserts (insert, ignore on conflict), point lookups, filtered
//! lists, and single-statement mutations. Handlers never see raw rows.

mod comments;
mod error;
mod models;
mod schema;
mod store;
mod tasks;
mod teams;
mod users;

pub use error::StoreError;
pub use models::{
    Comment, MembershipRole, NewTask, Task, TaskDetail, TaskListFilter, TaskPriority, TaskStatus,
    TaskSummary, Team, User,
};
pub use store::Store;
