use crate::error::Result;
use crate::models::Comment;
use crate::store::{decode_timestamp, encode_timestamp, Store};
use chrono::Utc;
use rusqlite::params;

impl Store {
    /// Comments are immutable once written; there is no update path.
    pub fn insert_comment(&self, task_id: &str, user_id: &str, content: &str) -> Result<Comment> {
        let now = Utc::now();
        let comment = Comment {
            id: Self::new_id(),
            task_id: task_id.to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            created_at: now,
        };
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO task_comments (id, task_id, user_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                comment.id,
                comment.task_id,
                comment.user_id,
                comment.content,
                encode_timestamp(now),
            ],
        )?;
        Ok(comment)
    }

    /// Task comments in creation order.
    pub fn comments_for_task(&self, task_id: &str) -> Result<Vec<Comment>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, task_id, user_id, content, created_at
             FROM task_comments WHERE task_id = ?1 ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![task_id], |row| {
            Ok(Comment {
                id: row.get(0)?,
                task_id: row.get(1)?,
                user_id: row.get(2)?,
                content: row.get(3)?,
                created_at: decode_timestamp(&row.get::<_, String>(4)?)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
