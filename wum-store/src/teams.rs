use crate::error::Result;
use crate::models::{MembershipRole, Team};
use crate::store::{decode_timestamp, encode_timestamp, Store};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        name: row.get(1)?,
        discord_server_id: row.get(2)?,
        created_at: decode_timestamp(&row.get::<_, String>(3)?)?,
    })
}

const TEAM_COLUMNS: &str = "id, name, discord_server_id, created_at";

impl Store {
    pub fn find_team_by_guild(&self, discord_server_id: &str) -> Result<Option<Team>> {
        let conn = self.conn()?;
        let team = conn
            .query_row(
                &format!("SELECT {TEAM_COLUMNS} FROM teams WHERE discord_server_id = ?1"),
                params![discord_server_id],
                team_from_row,
            )
            .optional()?;
        Ok(team)
    }

    /// Insert-or-ignore keyed on the unique server id; first write wins.
    pub fn ensure_team(&self, discord_server_id: &str, name: &str) -> Result<Team> {
        let now = encode_timestamp(Utc::now());
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO teams (id, name, discord_server_id, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(discord_server_id) DO NOTHING",
            params![Self::new_id(), name, discord_server_id, now],
        )?;
        let team = conn.query_row(
            &format!("SELECT {TEAM_COLUMNS} FROM teams WHERE discord_server_id = ?1"),
            params![discord_server_id],
            team_from_row,
        )?;
        Ok(team)
    }

    /// Create the (team, user) membership row if absent; an existing row's
    /// role is never changed here.
    pub fn ensure_membership(
        &self,
        team_id: &str,
        user_id: &str,
        role: MembershipRole,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO team_members (team_id, user_id, role)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(team_id, user_id) DO NOTHING",
            params![team_id, user_id, role],
        )?;
        Ok(())
    }

    pub fn count_teams(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM teams", [], |row| row.get(0))?;
        Ok(count)
    }
}
