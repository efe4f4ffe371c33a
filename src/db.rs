// SQLite persistence: the shared pick log and race results.
//
// The pick log's composite primary key (draft_id, pick_number) and the
// unique (draft_id, driver_id) index are the conditional-append primitive
// the draft engine requires: a commit that loses the race fails on the
// constraint instead of overwriting, even across independent processes.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode};
use tracing::debug;

use crate::draft::{AppendOutcome, DraftError, DraftPick, PickLog};
use crate::results::RaceClassification;
use crate::scoring::RaceScore;

/// SQLite-backed storage for draft picks, race classifications, and
/// per-player race scores.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database at `path` and ensure the schema
    /// exists. Pass `":memory:"` for an ephemeral database in tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS draft_picks (
                draft_id       TEXT NOT NULL,
                pick_number    INTEGER NOT NULL,
                player_id      TEXT NOT NULL,
                driver_id      TEXT NOT NULL,
                driver_name    TEXT NOT NULL,
                start_position INTEGER NOT NULL,
                picked_at      TEXT NOT NULL,
                PRIMARY KEY (draft_id, pick_number),
                UNIQUE (draft_id, driver_id)
            );

            CREATE TABLE IF NOT EXISTS race_classifications (
                race_id TEXT PRIMARY KEY,
                data    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS race_scores (
                race_id     TEXT NOT NULL,
                race_name   TEXT NOT NULL,
                race_number INTEGER NOT NULL,
                player_id   TEXT NOT NULL,
                points      INTEGER NOT NULL,
                PRIMARY KEY (race_id, player_id)
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Conditionally append one pick to a draft's log.
    ///
    /// The insert is plain -- no OR IGNORE -- so a duplicate pick number
    /// or driver trips the table constraints, which is reported as
    /// [`AppendOutcome::Conflict`] with the log unchanged.
    pub fn append_pick(&self, draft_id: &str, pick: &DraftPick) -> Result<AppendOutcome> {
        let conn = self.conn();
        let result = conn.execute(
            "INSERT INTO draft_picks
                (draft_id, pick_number, player_id, driver_id, driver_name, start_position, picked_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                draft_id,
                pick.pick_number,
                pick.player_id,
                pick.driver_id,
                pick.driver_name,
                pick.start_position,
                pick.picked_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(AppendOutcome::Appended),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                debug!(draft_id, pick.pick_number, "append conflict");
                Ok(AppendOutcome::Conflict)
            }
            Err(e) => Err(e).context("failed to append draft pick"),
        }
    }

    /// Load a draft's picks in pick-number order.
    pub fn load_picks(&self, draft_id: &str) -> Result<Vec<DraftPick>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT pick_number, player_id, driver_id, driver_name, start_position, picked_at
                 FROM draft_picks WHERE draft_id = ?1 ORDER BY pick_number",
            )
            .context("failed to prepare load_picks query")?;

        let picks = stmt
            .query_map(params![draft_id], |row| pick_from_row(row))
            .context("failed to query draft picks")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map draft pick rows")?;

        Ok(picks)
    }

    /// Delete and return the highest-numbered pick of a draft, if any.
    ///
    /// A single statement resolves the maximum and deletes it atomically,
    /// so a pick committed concurrently (even from another process) can
    /// never slip between the read and the delete and leave the log
    /// gapped.
    pub fn remove_last_pick(&self, draft_id: &str) -> Result<Option<DraftPick>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "DELETE FROM draft_picks
                 WHERE draft_id = ?1
                   AND pick_number =
                       (SELECT MAX(pick_number) FROM draft_picks WHERE draft_id = ?1)
                 RETURNING pick_number, player_id, driver_id, driver_name, start_position, picked_at",
            )
            .context("failed to prepare remove_last_pick statement")?;

        let mut rows = stmt
            .query_map(params![draft_id], |row| pick_from_row(row))
            .context("failed to delete last pick")?;

        match rows.next() {
            Some(row) => Ok(Some(row.context("failed to map deleted pick row")?)),
            None => Ok(None),
        }
    }

    /// Persist a race classification (overwrites any previous snapshot).
    pub fn save_classification(
        &self,
        race_id: &str,
        classification: &RaceClassification,
    ) -> Result<()> {
        let json = serde_json::to_string(classification)
            .context("failed to serialize classification")?;
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO race_classifications (race_id, data) VALUES (?1, ?2)",
                params![race_id, json],
            )
            .context("failed to save classification")?;
        Ok(())
    }

    /// Load a race's classification, if one has been saved.
    pub fn load_classification(&self, race_id: &str) -> Result<Option<RaceClassification>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT data FROM race_classifications WHERE race_id = ?1")
            .context("failed to prepare classification query")?;

        let mut rows = stmt
            .query_map(params![race_id], |row| row.get::<_, String>(0))
            .context("failed to query classification")?;

        match rows.next() {
            Some(row) => {
                let json = row.context("failed to read classification row")?;
                let classification = serde_json::from_str(&json)
                    .context("failed to deserialize classification")?;
                Ok(Some(classification))
            }
            None => Ok(None),
        }
    }

    /// Record one player's final points for a race. Re-recording
    /// overwrites, so re-finalizing after an edit is safe.
    pub fn record_race_score(&self, score: &RaceScore) -> Result<()> {
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO race_scores
                    (race_id, race_name, race_number, player_id, points)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    score.race_id,
                    score.race_name,
                    score.race_number,
                    score.player_id,
                    score.points,
                ],
            )
            .context("failed to record race score")?;
        Ok(())
    }

    /// All recorded race scores, for the standings rollup.
    pub fn load_race_scores(&self) -> Result<Vec<RaceScore>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT race_id, race_name, race_number, player_id, points
                 FROM race_scores ORDER BY race_number, player_id",
            )
            .context("failed to prepare race_scores query")?;

        let scores = stmt
            .query_map([], |row| {
                Ok(RaceScore {
                    race_id: row.get(0)?,
                    race_name: row.get(1)?,
                    race_number: row.get(2)?,
                    player_id: row.get(3)?,
                    points: row.get(4)?,
                })
            })
            .context("failed to query race scores")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map race score rows")?;

        Ok(scores)
    }
}

/// Map one `draft_picks` row (pick_number, player_id, driver_id,
/// driver_name, start_position, picked_at) to a [`DraftPick`].
fn pick_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DraftPick> {
    let picked_at: String = row.get(5)?;
    let picked_at = DateTime::parse_from_rfc3339(&picked_at)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;
    Ok(DraftPick {
        pick_number: row.get(0)?,
        player_id: row.get(1)?,
        driver_id: row.get(2)?,
        driver_name: row.get(3)?,
        start_position: row.get(4)?,
        picked_at,
    })
}

/// [`PickLog`] view of one draft's rows in the shared database.
pub struct SqlitePickLog {
    db: Arc<Database>,
    draft_id: String,
}

impl SqlitePickLog {
    pub fn new(db: Arc<Database>, draft_id: impl Into<String>) -> Self {
        SqlitePickLog {
            db,
            draft_id: draft_id.into(),
        }
    }
}

impl PickLog for SqlitePickLog {
    fn picks(&self) -> Result<Vec<DraftPick>, DraftError> {
        self.db
            .load_picks(&self.draft_id)
            .map_err(|e| DraftError::Store(e.to_string()))
    }

    fn append(&self, pick: &DraftPick) -> Result<AppendOutcome, DraftError> {
        self.db
            .append_pick(&self.draft_id, pick)
            .map_err(|e| DraftError::Store(e.to_string()))
    }

    fn remove_last(&self) -> Result<Option<DraftPick>, DraftError> {
        self.db
            .remove_last_pick(&self.draft_id)
            .map_err(|e| DraftError::Store(e.to_string()))
    }
}
