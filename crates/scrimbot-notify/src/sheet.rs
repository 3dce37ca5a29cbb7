// Spreadsheet bookkeeping: booked scrims are added to the scouting sheet and
// results are refreshed once a block is played.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use serde_json::json;
use tracing::debug;

use scrimbot_core::model::Scrim;

const LEDGER_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[async_trait]
pub trait ScrimSheet: Send + Sync {
    /// Record a booking against a known opponent.
    async fn scrim_found(&self, scrim: &Scrim) -> Result<()>;

    /// Refresh results after a scrim block was played.
    async fn update_results(&self) -> Result<()>;

    /// Forget a booking that fell through before it was played.
    async fn scrim_cancelled(&self, scrim: &Scrim) -> Result<()> {
        let _ = scrim;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AppsScriptSheet
// ---------------------------------------------------------------------------

/// Calls the sheet's Apps Script web endpoint.
pub struct AppsScriptSheet {
    http: reqwest::Client,
    script_url: String,
    bearer: Option<String>,
    team_page_base: String,
}

impl AppsScriptSheet {
    pub fn new(
        http: reqwest::Client,
        script_url: impl Into<String>,
        bearer: Option<String>,
        team_page_base: impl Into<String>,
    ) -> Self {
        Self {
            http,
            script_url: script_url.into(),
            bearer: bearer.filter(|b| !b.trim().is_empty()),
            team_page_base: team_page_base.into(),
        }
    }

    async fn call(&self, payload: serde_json::Value) -> Result<()> {
        let mut request = self.http.post(&self.script_url).json(&payload);
        if let Some(bearer) = &self.bearer {
            request = request.bearer_auth(bearer);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("sheet call to {} failed", self.script_url))?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), body = %body, "sheet script responded");
        anyhow::ensure!(status.is_success(), "sheet script returned {status}: {body}");
        Ok(())
    }
}

#[async_trait]
impl ScrimSheet for AppsScriptSheet {
    async fn scrim_found(&self, scrim: &Scrim) -> Result<()> {
        let team = scrim
            .opponent
            .team()
            .context("booking has no known opponent")?;
        let team_url = format!(
            "{}/{}",
            self.team_page_base.trim_end_matches('/'),
            team.number
        );
        self.call(json!({
            "function": "scrimFound",
            "parameters": [
                team.name,
                team_url,
                team.opgg_link,
                scrim.time.format("%m/%d/%Y").to_string(),
                scrim.format.short(),
            ],
            "devMode": true,
        }))
        .await
    }

    async fn update_results(&self) -> Result<()> {
        self.call(json!({"function": "updateScrimResults", "devMode": true}))
            .await
    }
}

// ---------------------------------------------------------------------------
// LedgerSheet
// ---------------------------------------------------------------------------

/// One row of the local scrim ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub start_time: String,
    pub format: String,
    pub opponent: String,
    pub team_number: u64,
    pub status: String,
}

/// Local SQLite ledger of bookings and played blocks.
pub struct LedgerSheet {
    conn: Mutex<Connection>,
}

impl LedgerSheet {
    /// Open (or create) the ledger at `path`. `":memory:"` gives an
    /// ephemeral ledger.
    pub fn open(path: &str) -> Result<Self> {
        let conn =
            Connection::open(path).with_context(|| format!("failed to open ledger at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set ledger pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS scrims (
                start_time  TEXT NOT NULL,
                format      TEXT NOT NULL,
                end_time    TEXT NOT NULL,
                opponent    TEXT NOT NULL,
                team_number INTEGER NOT NULL,
                opgg_link   TEXT NOT NULL DEFAULT '',
                status      TEXT NOT NULL,
                recorded_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (start_time, format)
            );
            ",
        )
        .context("failed to create ledger schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record (or overwrite) the booking for `scrim`'s slot.
    pub fn record_booking(&self, scrim: &Scrim) -> Result<()> {
        let team = scrim.opponent.team();
        let team_number = i64::try_from(team.map_or(0, |t| t.number))
            .context("team number does not fit the ledger")?;
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO scrims
                    (start_time, format, end_time, opponent, team_number, opgg_link, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'booked')",
                params![
                    scrim.time.format(LEDGER_TIME_FORMAT).to_string(),
                    scrim.format.short(),
                    scrim.end_time().format(LEDGER_TIME_FORMAT).to_string(),
                    team.map(|t| t.name.clone()).unwrap_or_default(),
                    team_number,
                    team.map(|t| t.opgg_link.clone()).unwrap_or_default(),
                ],
            )
            .context("failed to record booking")?;
        Ok(())
    }

    /// Mark the booking for `scrim`'s slot as cancelled so it is never
    /// counted as played. Returns the number of rows updated.
    pub fn mark_cancelled(&self, scrim: &Scrim) -> Result<usize> {
        let updated = self
            .conn()
            .execute(
                "UPDATE scrims SET status = 'cancelled'
                 WHERE status = 'booked' AND start_time = ?1 AND format = ?2",
                params![
                    scrim.time.format(LEDGER_TIME_FORMAT).to_string(),
                    scrim.format.short(),
                ],
            )
            .context("failed to mark cancelled booking")?;
        Ok(updated)
    }

    /// Mark every booking that ended by `now` as played. Returns the number
    /// of rows updated.
    pub fn mark_played(&self, now: NaiveDateTime) -> Result<usize> {
        let updated = self
            .conn()
            .execute(
                "UPDATE scrims SET status = 'played'
                 WHERE status = 'booked' AND end_time <= ?1",
                params![now.format(LEDGER_TIME_FORMAT).to_string()],
            )
            .context("failed to mark played scrims")?;
        Ok(updated)
    }

    pub fn entries(&self) -> Result<Vec<LedgerEntry>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT start_time, format, opponent, team_number, status
                 FROM scrims ORDER BY start_time, format",
            )
            .context("failed to prepare ledger query")?;
        let entries = stmt
            .query_map([], |row| {
                Ok(LedgerEntry {
                    start_time: row.get(0)?,
                    format: row.get(1)?,
                    opponent: row.get(2)?,
                    team_number: u64::try_from(row.get::<_, i64>(3)?).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(3, Type::Integer, Box::new(e))
                    })?,
                    status: row.get(4)?,
                })
            })
            .context("failed to query ledger")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map ledger rows")?;
        Ok(entries)
    }
}

#[async_trait]
impl ScrimSheet for LedgerSheet {
    async fn scrim_found(&self, scrim: &Scrim) -> Result<()> {
        self.record_booking(scrim)
    }

    async fn update_results(&self) -> Result<()> {
        let updated = self.mark_played(Local::now().naive_local())?;
        debug!(updated, "ledger results updated");
        Ok(())
    }

    async fn scrim_cancelled(&self, scrim: &Scrim) -> Result<()> {
        let updated = self.mark_cancelled(scrim)?;
        debug!(updated, scrim = %scrim, "ledger booking cancelled");
        Ok(())
    }
}
