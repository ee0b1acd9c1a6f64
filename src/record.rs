// SQLite recording of accepted snapshots.
//
// Optional (off by default). Each snapshot the controller accepts is
// appended with its fetch timestamp, giving a trail to inspect after a
// confusing on-screen sequence. Recording failures are logged by the
// caller and never interrupt polling.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::model::Snapshot;

/// SQLite-backed snapshot recorder.
pub struct Recorder {
    conn: Mutex<Connection>,
}

impl Recorder {
    /// Open (or create) the database at `path` and ensure the schema
    /// exists. Pass `":memory:"` for an ephemeral database in tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open snapshot database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS snapshots (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                game_id    INTEGER NOT NULL,
                inning     INTEGER NOT NULL,
                half       TEXT NOT NULL,
                balls      INTEGER NOT NULL,
                strikes    INTEGER NOT NULL,
                outs       INTEGER NOT NULL,
                payload    TEXT NOT NULL,
                fetched_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE INDEX IF NOT EXISTS idx_snapshots_game_id ON snapshots(game_id);
            ",
        )
        .context("failed to create snapshot schema")?;

        Ok(Recorder {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("recorder mutex poisoned")
    }

    /// Append one accepted snapshot. The full snapshot is stored as JSON
    /// alongside the handful of columns worth querying directly.
    pub fn record_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let payload =
            serde_json::to_string(snapshot).context("failed to serialize snapshot")?;
        self.conn()
            .execute(
                "INSERT INTO snapshots (game_id, inning, half, balls, strikes, outs, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    snapshot.game_id,
                    snapshot.inning,
                    snapshot.half.label(),
                    snapshot.balls,
                    snapshot.strikes,
                    snapshot.outs,
                    payload,
                ],
            )
            .context("failed to record snapshot")?;
        Ok(())
    }

    /// Load the most recent `limit` snapshots for a game, newest first.
    pub fn recent_snapshots(&self, game_id: u64, limit: usize) -> Result<Vec<Snapshot>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT payload FROM snapshots WHERE game_id = ?1
                 ORDER BY id DESC LIMIT ?2",
            )
            .context("failed to prepare recent_snapshots query")?;

        let rows = stmt
            .query_map(params![game_id, limit as i64], |row| {
                row.get::<_, String>(0)
            })
            .context("failed to query snapshots")?;

        let mut snapshots = Vec::new();
        for row in rows {
            let payload = row.context("failed to read snapshot row")?;
            let snapshot: Snapshot = serde_json::from_str(&payload)
                .context("failed to deserialize recorded snapshot")?;
            snapshots.push(snapshot);
        }
        Ok(snapshots)
    }

    /// Number of recorded snapshots for a game.
    pub fn snapshot_count(&self, game_id: u64) -> Result<u64> {
        let count: u64 = self
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM snapshots WHERE game_id = ?1",
                params![game_id],
                |row| row.get(0),
            )
            .context("failed to count snapshots")?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Half, TeamLine};

    fn sample(game_id: u64, inning: u8) -> Snapshot {
        Snapshot {
            game_id,
            status: "In Progress".into(),
            inning,
            half: Half::Bottom,
            balls: 2,
            strikes: 1,
            outs: 1,
            away: TeamLine {
                name: "Detroit Tigers".into(),
                ..TeamLine::default()
            },
            ..Snapshot::default()
        }
    }

    #[test]
    fn record_and_load_round_trip() {
        let rec = Recorder::open(":memory:").unwrap();
        rec.record_snapshot(&sample(7, 3)).unwrap();
        rec.record_snapshot(&sample(7, 4)).unwrap();
        rec.record_snapshot(&sample(8, 1)).unwrap();

        assert_eq!(rec.snapshot_count(7).unwrap(), 2);
        assert_eq!(rec.snapshot_count(8).unwrap(), 1);

        let recent = rec.recent_snapshots(7, 10).unwrap();
        assert_eq!(recent.len(), 2);
        // Newest first.
        assert_eq!(recent[0].inning, 4);
        assert_eq!(recent[1].inning, 3);
        assert_eq!(recent[0].away.name, "Detroit Tigers");
    }

    #[test]
    fn limit_caps_result_size() {
        let rec = Recorder::open(":memory:").unwrap();
        for inning in 1..=5 {
            rec.record_snapshot(&sample(9, inning)).unwrap();
        }
        let recent = rec.recent_snapshots(9, 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].inning, 5);
    }

    #[test]
    fn unknown_game_is_empty() {
        let rec = Recorder::open(":memory:").unwrap();
        assert_eq!(rec.snapshot_count(123).unwrap(), 0);
        assert!(rec.recent_snapshots(123, 5).unwrap().is_empty());
    }
}
