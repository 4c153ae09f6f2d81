//! SQLite-backed indent source and trip log.
//!
//! ```text
//! indents    one row per transport request (read side)
//! trip_data  append-only trip summaries (write side)
//! ```

use std::path::Path;

use jiff::civil::DateTime;
use jiff::{Timestamp, Zoned};
use rusqlite::Connection;

use crate::model::{DueWindow, Indent, TripSummary};
use crate::traits::{IndentSource, TripRecorder};

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub type Result<T> = core::result::Result<T, StoreError>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS indents (
    indent           TEXT PRIMARY KEY,
    vehicle_number   TEXT NOT NULL,
    pickup_location  TEXT NOT NULL,
    location         TEXT NOT NULL,
    indent_date      TEXT NOT NULL,
    exit_time        TEXT
);

CREATE TABLE IF NOT EXISTS trip_data (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    indent_id            TEXT NOT NULL,
    vehicle_no           TEXT NOT NULL,
    driver_name          TEXT NOT NULL,
    pickup               TEXT NOT NULL,
    drop_location        TEXT NOT NULL,
    total_drops          INTEGER NOT NULL,
    exit_time            TEXT NOT NULL,
    eta_arrival_time     TEXT NOT NULL,
    actual_arrival_time  TEXT,
    total_distance       REAL NOT NULL,
    duration_hours       REAL NOT NULL,
    customer_details     TEXT NOT NULL DEFAULT '[]',
    pod_url              TEXT,
    created_at           TEXT NOT NULL
);
";

/// Indent store and trip log in a single SQLite database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and ensures the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Inserts or replaces an indent row. `indent_date` is the local
    /// booking time the due-window query filters on.
    pub fn upsert_indent(&self, indent: &Indent, indent_date: DateTime) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO indents
                (indent, vehicle_number, pickup_location, location, indent_date, exit_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                &indent.indent_id,
                &indent.vehicle,
                &indent.pickup,
                indent.drops.join(", "),
                indent_date.to_string(),
                indent.exit_time.map(|t| t.to_string()),
            ],
        )?;
        Ok(())
    }

    /// Lists stored trip summaries for an indent, oldest first.
    pub fn trips_for(&self, indent_id: &str) -> Result<Vec<TripSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT indent_id, vehicle_no, driver_name, pickup, drop_location, total_drops,
                    exit_time, eta_arrival_time, actual_arrival_time, total_distance,
                    duration_hours, pod_url, created_at
             FROM trip_data WHERE indent_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([indent_id], |row| {
            Ok(TripRow {
                indent_id: row.get(0)?,
                vehicle: row.get(1)?,
                driver_name: row.get(2)?,
                pickup: row.get(3)?,
                drop_location: row.get(4)?,
                total_drops: row.get(5)?,
                exit_time: row.get(6)?,
                eta_arrival: row.get(7)?,
                actual_arrival: row.get(8)?,
                total_distance_km: row.get(9)?,
                duration_hours: row.get(10)?,
                pod_url: row.get(11)?,
                created_at: row.get(12)?,
            })
        })?;

        let mut trips = Vec::new();
        for row in rows {
            trips.push(row?.into_summary()?);
        }
        Ok(trips)
    }
}

impl IndentSource for SqliteStore {
    fn fetch_due(&self, window: &DueWindow) -> Result<Vec<Indent>> {
        let mut stmt = self.conn.prepare(
            "SELECT indent, vehicle_number, pickup_location, location, exit_time
             FROM indents
             WHERE date(indent_date) BETWEEN ?1 AND ?2
             ORDER BY indent_date DESC
             LIMIT ?3",
        )?;
        let limit = i64::try_from(window.limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(
            rusqlite::params![window.from.to_string(), window.to.to_string(), limit],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            },
        )?;

        let mut indents = Vec::new();
        for row in rows {
            let (indent_id, vehicle, pickup, drops_raw, exit_time) = row?;
            indents.push(Indent {
                indent_id,
                vehicle,
                pickup,
                drops: Indent::parse_drops(&drops_raw),
                exit_time: exit_time.as_deref().map(parse_timestamp).transpose()?,
            });
        }
        Ok(indents)
    }
}

impl TripRecorder for SqliteStore {
    fn save(&self, summary: &TripSummary) -> Result<()> {
        self.conn.execute(
            "INSERT INTO trip_data (
                indent_id, vehicle_no, driver_name, pickup, drop_location, total_drops,
                exit_time, eta_arrival_time, actual_arrival_time, total_distance,
                duration_hours, pod_url, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            rusqlite::params![
                &summary.indent_id,
                &summary.vehicle,
                &summary.driver_name,
                &summary.pickup,
                &summary.drop_location,
                i64::try_from(summary.total_drops).unwrap_or(i64::MAX),
                summary.exit_time.to_string(),
                summary.eta_arrival.to_string(),
                summary.actual_arrival.map(|t| t.to_string()),
                summary.total_distance_km,
                summary.duration_hours,
                &summary.pod_url,
                summary.created_at.to_string(),
            ],
        )?;
        Ok(())
    }
}

/// Raw `trip_data` columns before timestamp parsing.
struct TripRow {
    indent_id: String,
    vehicle: String,
    driver_name: String,
    pickup: String,
    drop_location: String,
    total_drops: i64,
    exit_time: String,
    eta_arrival: String,
    actual_arrival: Option<String>,
    total_distance_km: f64,
    duration_hours: f64,
    pod_url: Option<String>,
    created_at: String,
}

impl TripRow {
    fn into_summary(self) -> Result<TripSummary> {
        let eta_arrival = self
            .eta_arrival
            .parse::<Zoned>()
            .map_err(|e| StoreError::Corrupt(format!("invalid eta_arrival_time: {e}")))?;
        let total_drops = usize::try_from(self.total_drops)
            .map_err(|e| StoreError::Corrupt(format!("invalid total_drops: {e}")))?;

        Ok(TripSummary {
            indent_id: self.indent_id,
            vehicle: self.vehicle,
            driver_name: self.driver_name,
            pickup: self.pickup,
            drop_location: self.drop_location,
            total_drops,
            exit_time: parse_timestamp(&self.exit_time)?,
            eta_arrival,
            actual_arrival: self.actual_arrival.as_deref().map(parse_timestamp).transpose()?,
            total_distance_km: self.total_distance_km,
            duration_hours: self.duration_hours,
            pod_url: self.pod_url,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<Timestamp> {
    raw.parse::<Timestamp>()
        .map_err(|e| StoreError::Corrupt(format!("invalid timestamp {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;
    use crate::model::AUTO_DRIVER;

    fn indent(id: &str, exit_time: Option<Timestamp>) -> Indent {
        Indent {
            indent_id: id.to_string(),
            vehicle: "MH04XY0001".to_string(),
            pickup: "Bhiwandi Warehouse".to_string(),
            drops: vec!["Thane".to_string(), "Vashi".to_string()],
            exit_time,
        }
    }

    fn window(limit: usize) -> DueWindow {
        DueWindow::ending(date(2026, 3, 2), 2, limit)
    }

    #[test]
    fn test_fetch_due_filters_window_and_orders_newest_first() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.upsert_indent(&indent("old", None), date(2026, 2, 27).at(10, 0, 0, 0)).unwrap();
        store.upsert_indent(&indent("yesterday", None), date(2026, 3, 1).at(9, 0, 0, 0)).unwrap();
        store.upsert_indent(&indent("today", None), date(2026, 3, 2).at(8, 0, 0, 0)).unwrap();
        store.upsert_indent(&indent("future", None), date(2026, 3, 3).at(8, 0, 0, 0)).unwrap();

        let due = store.fetch_due(&window(5)).unwrap();
        let ids: Vec<&str> = due.iter().map(|i| i.indent_id.as_str()).collect();
        assert_eq!(ids, vec!["today", "yesterday"]);
        assert_eq!(due[0].drops, vec!["Thane", "Vashi"]);
    }

    #[test]
    fn test_fetch_due_respects_limit() {
        let store = SqliteStore::open_in_memory().unwrap();
        for hour in 0..8 {
            let id = format!("IND-{hour}");
            store.upsert_indent(&indent(&id, None), date(2026, 3, 2).at(hour, 0, 0, 0)).unwrap();
        }

        let due = store.fetch_due(&window(5)).unwrap();
        assert_eq!(due.len(), 5);
        assert_eq!(due[0].indent_id, "IND-7");
    }

    #[test]
    fn test_exit_time_round_trips() {
        let store = SqliteStore::open_in_memory().unwrap();
        let exit: Timestamp = "2026-03-02T04:00:00Z".parse().unwrap();
        store.upsert_indent(&indent("with-exit", Some(exit)), date(2026, 3, 2).at(8, 0, 0, 0)).unwrap();

        let due = store.fetch_due(&window(5)).unwrap();
        assert_eq!(due[0].exit_time, Some(exit));
    }

    #[test]
    fn test_save_appends_summary() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("trips.sqlite")).unwrap();
        let exit: Timestamp = "2026-03-02T04:00:00Z".parse().unwrap();
        let summary = TripSummary {
            indent_id: "IND-9".to_string(),
            vehicle: "MH04XY0001".to_string(),
            driver_name: AUTO_DRIVER.to_string(),
            pickup: "Bhiwandi Warehouse".to_string(),
            drop_location: "Thane, Vashi".to_string(),
            total_drops: 2,
            exit_time: exit,
            eta_arrival: exit.to_zoned(jiff::tz::TimeZone::get("Asia/Kolkata").unwrap()),
            actual_arrival: None,
            total_distance_km: 42.5,
            duration_hours: 1.06,
            pod_url: None,
            created_at: exit,
        };

        store.save(&summary).unwrap();
        store.save(&summary).unwrap();

        let trips = store.trips_for("IND-9").unwrap();
        assert_eq!(trips.len(), 2, "save never upserts");
        assert_eq!(trips[0], summary);
    }
}
