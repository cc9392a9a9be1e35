use crate::error::Result;
use crate::models::User;
use crate::store::{decode_timestamp, encode_timestamp, Store};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        discord_id: row.get(1)?,
        username: row.get(2)?,
        avatar_url: row.get(3)?,
        created_at: decode_timestamp(&row.get::<_, String>(4)?)?,
        updated_at: decode_timestamp(&row.get::<_, String>(5)?)?,
    })
}

const USER_COLUMNS: &str = "id, discord_id, username, avatar_url, created_at, updated_at";

impl Store {
    /// Insert-or-ignore keyed on the unique `discord_id`; the first write
    /// wins and later profile data never overwrites it.
    pub fn upsert_discord_user(
        &self,
        discord_id: &str,
        username: &str,
        avatar_url: Option<&str>,
    ) -> Result<User> {
        let now = encode_timestamp(Utc::now());
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (id, discord_id, username, avatar_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(discord_id) DO NOTHING",
            params![Self::new_id(), discord_id, username, avatar_url, now],
        )?;
        let user = conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE discord_id = ?1"),
            params![discord_id],
            user_from_row,
        )?;
        Ok(user)
    }

    /// Minimal placeholder record for a user we only know by Discord id.
    pub fn upsert_stub_user(&self, discord_id: &str) -> Result<User> {
        self.upsert_discord_user(discord_id, "Discord User", None)
    }

    pub fn find_user_by_discord_id(&self, discord_id: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE discord_id = ?1"),
                params![discord_id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }
}
