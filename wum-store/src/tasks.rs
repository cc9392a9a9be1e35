use crate::error::Result;
use crate::models::{NewTask, Task, TaskDetail, TaskListFilter, TaskStatus, TaskSummary};
use crate::store::{decode_date, decode_opt, decode_timestamp, encode_date, encode_timestamp, Store};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};

const DETAIL_QUERY: &str = "
    SELECT t.id, t.title, t.description, t.status, t.priority, t.team_id,
           t.assignee_id, t.creator_id, t.discord_thread_id, t.discord_channel_id,
           t.due_date, t.created_at, t.updated_at,
           a.discord_id, a.username, c.discord_id, c.username
    FROM tasks t
    LEFT JOIN users a ON a.id = t.assignee_id
    LEFT JOIN users c ON c.id = t.creator_id
";

fn detail_from_row(row: &Row<'_>) -> rusqlite::Result<TaskDetail> {
    let task = Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        priority: row.get(4)?,
        team_id: row.get(5)?,
        assignee_id: row.get(6)?,
        creator_id: row.get(7)?,
        discord_thread_id: row.get(8)?,
        discord_channel_id: row.get(9)?,
        due_date: decode_opt(row.get(10)?, decode_date)?,
        created_at: decode_timestamp(&row.get::<_, String>(11)?)?,
        updated_at: decode_timestamp(&row.get::<_, String>(12)?)?,
    };
    Ok(TaskDetail {
        task,
        assignee_discord_id: row.get(13)?,
        assignee_username: row.get(14)?,
        creator_discord_id: row.get(15)?,
        creator_username: row.get(16)?,
    })
}

impl Store {
    pub fn insert_task(&self, new_task: NewTask) -> Result<Task> {
        let now = Utc::now();
        let task = Task {
            id: Self::new_id(),
            title: new_task.title,
            description: new_task.description,
            status: TaskStatus::Todo,
            priority: new_task.priority,
            team_id: new_task.team_id,
            assignee_id: new_task.assignee_id,
            creator_id: new_task.creator_id,
            discord_thread_id: None,
            discord_channel_id: new_task.discord_channel_id,
            due_date: None,
            created_at: now,
            updated_at: now,
        };
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO tasks (id, title, description, status, priority, team_id,
                                assignee_id, creator_id, discord_thread_id,
                                discord_channel_id, due_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?9, NULL, ?10, ?10)",
            params![
                task.id,
                task.title,
                task.description,
                task.status,
                task.priority,
                task.team_id,
                task.assignee_id,
                task.creator_id,
                task.discord_channel_id,
                encode_timestamp(now),
            ],
        )?;
        Ok(task)
    }

    pub fn task_detail(&self, task_id: &str) -> Result<Option<TaskDetail>> {
        let conn = self.conn()?;
        let detail = conn
            .query_row(
                &format!("{DETAIL_QUERY} WHERE t.id = ?1"),
                params![task_id],
                detail_from_row,
            )
            .optional()?;
        Ok(detail)
    }

    /// Task whose companion thread is the given channel, if any.
    pub fn resolve_task_by_thread(&self, thread_id: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM tasks WHERE discord_thread_id = ?1",
                params![thread_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Returns the number of rows changed (zero when the task vanished
    /// between lookup and update).
    pub fn update_task_status(&self, task_id: &str, status: TaskStatus) -> Result<usize> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE tasks SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![task_id, status, encode_timestamp(Utc::now())],
        )?;
        Ok(changed)
    }

    pub fn update_task_assignee(&self, task_id: &str, assignee_id: &str) -> Result<usize> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE tasks SET assignee_id = ?2, updated_at = ?3 WHERE id = ?1",
            params![task_id, assignee_id, encode_timestamp(Utc::now())],
        )?;
        Ok(changed)
    }

    pub fn update_task_due_date(&self, task_id: &str, due_date: NaiveDate) -> Result<usize> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE tasks SET due_date = ?2, updated_at = ?3 WHERE id = ?1",
            params![task_id, encode_date(due_date), encode_timestamp(Utc::now())],
        )?;
        Ok(changed)
    }

    pub fn set_task_thread(&self, task_id: &str, thread_id: &str) -> Result<usize> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE tasks SET discord_thread_id = ?2 WHERE id = ?1",
            params![task_id, thread_id],
        )?;
        Ok(changed)
    }

    /// Team task list ordered by severity (high first), then age.
    pub fn list_tasks(&self, team_id: &str, filter: &TaskListFilter) -> Result<Vec<TaskSummary>> {
        let mut sql = String::from(
            "SELECT t.id, t.title, t.status, t.priority, t.due_date, a.discord_id
             FROM tasks t
             LEFT JOIN users a ON a.id = t.assignee_id
             WHERE t.team_id = ?1",
        );
        let mut args: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(team_id.to_string())];
        if let Some(status) = filter.status {
            args.push(Box::new(status));
            sql.push_str(&format!(" AND t.status = ?{}", args.len()));
        }
        if let Some(assignee_id) = &filter.assignee_id {
            args.push(Box::new(assignee_id.clone()));
            sql.push_str(&format!(" AND t.assignee_id = ?{}", args.len()));
        }
        sql.push_str(
            " ORDER BY CASE t.priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END,
              t.created_at",
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())), |row| {
            Ok(TaskSummary {
                id: row.get(0)?,
                title: row.get(1)?,
                status: row.get(2)?,
                priority: row.get(3)?,
                due_date: decode_opt(row.get(4)?, decode_date)?,
                assignee_discord_id: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Non-completed tasks carrying a due date, for the reminder sweep.
    pub fn due_candidates(&self) -> Result<Vec<TaskDetail>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{DETAIL_QUERY} WHERE t.status != 'completed' AND t.due_date IS NOT NULL"
        ))?;
        let rows = stmt.query_map([], detail_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
