//! SQLite persistence for the cleaned observation table.
//!
//! Two tables (`games` catalog, `player_history` detail rows with derived
//! year/month fields) and three views for querying: latest observation per
//! game, all-time per-game aggregates, and per-game-per-year aggregates.

use anyhow::Result;
use rusqlite::{Connection, params};
use std::path::Path;
use tracing::{info, warn};

use crate::error::Failure;
use crate::month::derive_year_month;
use crate::record::Observation;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS games (
    appid INTEGER PRIMARY KEY,
    game_name TEXT NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS player_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    appid INTEGER,
    month TEXT NOT NULL,
    avg_players REAL NOT NULL,
    peak_players INTEGER NOT NULL,
    year INTEGER,
    month_num INTEGER,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (appid) REFERENCES games (appid)
);

CREATE INDEX IF NOT EXISTS idx_appid ON player_history (appid);
CREATE INDEX IF NOT EXISTS idx_year ON player_history (year);
CREATE INDEX IF NOT EXISTS idx_month ON player_history (month);
CREATE INDEX IF NOT EXISTS idx_avg_players ON player_history (avg_players);

CREATE VIEW IF NOT EXISTS latest_player_data AS
SELECT
    g.game_name,
    g.appid,
    ph.month,
    ph.avg_players,
    ph.peak_players,
    ph.year
FROM games g
JOIN player_history ph ON g.appid = ph.appid
WHERE (ph.year * 12 + ph.month_num) = (
    SELECT MAX(year * 12 + month_num)
    FROM player_history ph2
    WHERE ph2.appid = ph.appid
)
ORDER BY ph.avg_players DESC;

CREATE VIEW IF NOT EXISTS top_games_avg AS
SELECT
    g.game_name,
    g.appid,
    AVG(ph.avg_players) AS avg_avg_players,
    MAX(ph.peak_players) AS max_peak_players,
    COUNT(*) AS months_tracked
FROM games g
JOIN player_history ph ON g.appid = ph.appid
GROUP BY g.appid, g.game_name
ORDER BY avg_avg_players DESC;

CREATE VIEW IF NOT EXISTS yearly_trends AS
SELECT
    g.game_name,
    ph.year,
    AVG(ph.avg_players) AS avg_players_year,
    MAX(ph.peak_players) AS peak_players_year
FROM games g
JOIN player_history ph ON g.appid = ph.appid
WHERE ph.year IS NOT NULL
GROUP BY g.appid, g.game_name, ph.year
ORDER BY g.game_name, ph.year;
";

/// Result of one bulk load.
#[derive(Debug, Default)]
pub struct LoadSummary {
    pub games: usize,
    pub history_rows: usize,
    /// Rows excluded from `player_history` because no calendar month could be
    /// derived from their label. The game itself stays in the catalog.
    pub dropped: Vec<Failure>,
}

/// High-level contents of the store, for the post-load log line.
#[derive(Debug)]
pub struct DbSummary {
    pub games: usize,
    pub history_rows: usize,
    pub year_range: Option<(i32, i32)>,
    /// Top games by latest average players: `(game_name, avg_players)`.
    pub top_games: Vec<(String, f64)>,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Bulk-loads a dataset, replacing any previous contents.
    ///
    /// The games catalog keeps one row per appid (first name wins). History
    /// rows get derived `(year, month_num)` fields; rows whose label does not
    /// derive are dropped and reported in the summary.
    pub fn load_dataset(&mut self, rows: &[Observation]) -> Result<LoadSummary> {
        let mut summary = LoadSummary::default();

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM player_history", [])?;
        tx.execute("DELETE FROM games", [])?;

        {
            let mut insert_game =
                tx.prepare("INSERT OR IGNORE INTO games (appid, game_name) VALUES (?1, ?2)")?;
            let mut insert_row = tx.prepare(
                "INSERT INTO player_history
                     (appid, month, avg_players, peak_players, year, month_num)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;

            for row in rows {
                insert_game.execute(params![row.appid, row.game_name])?;

                match derive_year_month(&row.month) {
                    Some((year, month_num)) => {
                        insert_row.execute(params![
                            row.appid,
                            row.month,
                            row.avg_players,
                            row.peak_players,
                            year,
                            month_num
                        ])?;
                        summary.history_rows += 1;
                    }
                    None => {
                        warn!(appid = row.appid, label = %row.month, "Dropping row with underivable month");
                        summary.dropped.push(Failure::Date {
                            label: row.month.clone(),
                        });
                    }
                }
            }
        }

        tx.commit()?;

        summary.games =
            self.conn
                .query_row("SELECT COUNT(*) FROM games", [], |r| r.get::<_, usize>(0))?;
        info!(
            games = summary.games,
            history_rows = summary.history_rows,
            dropped = summary.dropped.len(),
            "Dataset loaded"
        );
        Ok(summary)
    }

    pub fn summary(&self) -> Result<DbSummary> {
        let games =
            self.conn
                .query_row("SELECT COUNT(*) FROM games", [], |r| r.get::<_, usize>(0))?;
        let history_rows = self
            .conn
            .query_row("SELECT COUNT(*) FROM player_history", [], |r| {
                r.get::<_, usize>(0)
            })?;

        let year_range = self.conn.query_row(
            "SELECT MIN(year), MAX(year) FROM player_history WHERE year IS NOT NULL",
            [],
            |r| {
                let min: Option<i32> = r.get(0)?;
                let max: Option<i32> = r.get(1)?;
                Ok(min.zip(max))
            },
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT game_name, avg_players FROM latest_player_data LIMIT 5")?;
        let top_games = stmt
            .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, f64>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(DbSummary {
            games,
            history_rows,
            year_range,
            top_games,
        })
    }

    #[cfg(test)]
    fn conn(&self) -> &Connection {
        &self.conn
    }
}
