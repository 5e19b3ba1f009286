// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of ChargeCurve.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use async_trait::async_trait;
use chargecurve_types::{
    ChargeId, ChargeSession, CurveSample, Level, LocationId, NewSession, SampleWrite, VehicleId,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{PurgeCounts, SampleStore, count};
use crate::curve::CurveHistory;
use crate::error::{CurveError, Result};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS charge_sessions (
        vehicle_id         TEXT NOT NULL,
        charge_id          TEXT NOT NULL,
        location_id        TEXT NOT NULL,
        target_level       INTEGER NOT NULL CHECK (target_level BETWEEN 0 AND 100),
        end_level          INTEGER CHECK (end_level BETWEEN 0 AND 100),
        estimated_minutes  INTEGER,
        started_at         TEXT NOT NULL,
        PRIMARY KEY (vehicle_id, charge_id)
    );

    CREATE INDEX IF NOT EXISTS idx_charge_sessions_location
        ON charge_sessions(vehicle_id, location_id);

    CREATE TABLE IF NOT EXISTS curve_samples (
        vehicle_id       TEXT NOT NULL,
        level            INTEGER NOT NULL CHECK (level BETWEEN 0 AND 100),
        charge_id        TEXT NOT NULL,
        duration_secs    INTEGER NOT NULL CHECK (duration_secs >= 0),
        outside_temp_dc  INTEGER,
        energy_used_wh   INTEGER,
        energy_added_wh  INTEGER,
        PRIMARY KEY (vehicle_id, level, charge_id),
        FOREIGN KEY (vehicle_id, charge_id)
            REFERENCES charge_sessions(vehicle_id, charge_id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_curve_samples_session
        ON curve_samples(vehicle_id, charge_id);";

const SESSION_COLUMNS: &str = "vehicle_id, charge_id, location_id, target_level, end_level, estimated_minutes, started_at";

const SAMPLE_COLUMNS: &str = "vehicle_id, charge_id, level, duration_secs, outside_temp_dc, energy_used_wh, energy_added_wh";

/// SQLite-backed sample store.
///
/// A single connection is shared behind a mutex; every call runs on tokio's
/// blocking pool so async callers never stall on disk I/O.
#[derive(Debug, Clone)]
pub struct SqliteSampleStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSampleStore {
    /// Open (or create) the database at `path` and apply the schema
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        debug!("Opened sample store at {}", path.display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock();
            f(&mut conn)
        })
        .await?
    }
}

fn level_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Level> {
    let raw: i64 = row.get(idx)?;
    Level::new(raw).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, raw))
}

fn optional_level_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Level>> {
    let raw: Option<i64> = row.get(idx)?;
    raw.map(|v| Level::new(v).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, v)))
        .transpose()
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<ChargeSession> {
    Ok(ChargeSession {
        vehicle_id: VehicleId::new(row.get::<_, String>(0)?),
        charge_id: ChargeId::new(row.get::<_, String>(1)?),
        location_id: LocationId::new(row.get::<_, String>(2)?),
        target_level: level_column(row, 3)?,
        end_level: optional_level_column(row, 4)?,
        estimated_minutes: row.get(5)?,
        started_at: row.get(6)?,
    })
}

fn sample_from_row(row: &Row<'_>) -> rusqlite::Result<CurveSample> {
    Ok(CurveSample {
        vehicle_id: VehicleId::new(row.get::<_, String>(0)?),
        charge_id: ChargeId::new(row.get::<_, String>(1)?),
        level: level_column(row, 2)?,
        duration_secs: row.get(3)?,
        outside_temp_dc: row.get(4)?,
        energy_used_wh: row.get(5)?,
        energy_added_wh: row.get(6)?,
    })
}

#[async_trait]
impl SampleStore for SqliteSampleStore {
    async fn register_session(&self, session: NewSession) -> Result<ChargeSession> {
        self.with_conn(move |conn| {
            let sql = format!(
                "INSERT INTO charge_sessions (vehicle_id, charge_id, location_id, target_level, started_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(vehicle_id, charge_id) DO UPDATE SET
                    location_id = excluded.location_id,
                    target_level = excluded.target_level
                 RETURNING {SESSION_COLUMNS}"
            );
            let stored = conn.query_row(
                &sql,
                params![
                    session.vehicle_id.as_str(),
                    session.charge_id.as_str(),
                    session.location_id.as_str(),
                    session.target_level.value(),
                    session.started_at,
                ],
                session_from_row,
            )?;
            Ok(stored)
        })
        .await
    }

    async fn finish_session(
        &self,
        vehicle_id: &VehicleId,
        charge_id: &ChargeId,
        end_level: Level,
        estimated_minutes: Option<u32>,
    ) -> Result<ChargeSession> {
        let vehicle_id = vehicle_id.clone();
        let charge_id = charge_id.clone();
        self.with_conn(move |conn| {
            let sql = format!(
                "UPDATE charge_sessions SET end_level = ?3, estimated_minutes = ?4
                 WHERE vehicle_id = ?1 AND charge_id = ?2
                 RETURNING {SESSION_COLUMNS}"
            );
            let session = conn
                .query_row(
                    &sql,
                    params![
                        vehicle_id.as_str(),
                        charge_id.as_str(),
                        end_level.value(),
                        estimated_minutes,
                    ],
                    session_from_row,
                )
                .optional()?;
            session.ok_or(CurveError::UnknownSession {
                vehicle_id,
                charge_id,
            })
        })
        .await
    }

    async fn session(
        &self,
        vehicle_id: &VehicleId,
        charge_id: &ChargeId,
    ) -> Result<Option<ChargeSession>> {
        let vehicle_id = vehicle_id.clone();
        let charge_id = charge_id.clone();
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {SESSION_COLUMNS} FROM charge_sessions WHERE vehicle_id = ?1 AND charge_id = ?2"
            );
            let session = conn
                .query_row(
                    &sql,
                    params![vehicle_id.as_str(), charge_id.as_str()],
                    session_from_row,
                )
                .optional()?;
            Ok(session)
        })
        .await
    }

    async fn upsert_sample(&self, write: SampleWrite) -> Result<CurveSample> {
        self.with_conn(move |conn| {
            // Write lock before the session check so a concurrent purge cannot interleave
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let known: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM charge_sessions WHERE vehicle_id = ?1 AND charge_id = ?2)",
                params![write.vehicle_id.as_str(), write.charge_id.as_str()],
                |row| row.get(0),
            )?;
            if !known {
                return Err(CurveError::UnknownSession {
                    vehicle_id: write.vehicle_id,
                    charge_id: write.charge_id,
                });
            }

            // ?8..?10 flag columns whose stored value must survive the update
            let sql = format!(
                "INSERT INTO curve_samples (vehicle_id, charge_id, level, duration_secs, outside_temp_dc, energy_used_wh, energy_added_wh)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(vehicle_id, level, charge_id) DO UPDATE SET
                    duration_secs = excluded.duration_secs,
                    outside_temp_dc = CASE WHEN ?8 THEN curve_samples.outside_temp_dc ELSE excluded.outside_temp_dc END,
                    energy_used_wh = CASE WHEN ?9 THEN curve_samples.energy_used_wh ELSE excluded.energy_used_wh END,
                    energy_added_wh = CASE WHEN ?10 THEN curve_samples.energy_added_wh ELSE excluded.energy_added_wh END
                 RETURNING {SAMPLE_COLUMNS}"
            );
            let sample = tx.query_row(
                &sql,
                params![
                    write.vehicle_id.as_str(),
                    write.charge_id.as_str(),
                    write.level.value(),
                    write.duration_secs,
                    write.outside_temp_dc.value().copied(),
                    write.energy_used_wh.value().copied(),
                    write.energy_added_wh.value().copied(),
                    write.outside_temp_dc.is_keep(),
                    write.energy_used_wh.is_keep(),
                    write.energy_added_wh.is_keep(),
                ],
                sample_from_row,
            )?;

            tx.commit()?;
            Ok(sample)
        })
        .await
    }

    async fn session_samples(
        &self,
        vehicle_id: &VehicleId,
        charge_id: &ChargeId,
    ) -> Result<Vec<CurveSample>> {
        let vehicle_id = vehicle_id.clone();
        let charge_id = charge_id.clone();
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {SAMPLE_COLUMNS} FROM curve_samples
                 WHERE vehicle_id = ?1 AND charge_id = ?2
                 ORDER BY level ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let samples = stmt
                .query_map(
                    params![vehicle_id.as_str(), charge_id.as_str()],
                    sample_from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(samples)
        })
        .await
    }

    async fn curve_history(
        &self,
        vehicle_id: &VehicleId,
        location_id: &LocationId,
    ) -> Result<CurveHistory> {
        let vehicle_id = vehicle_id.clone();
        let location_id = location_id.clone();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let mut stmt = tx.prepare(
                "SELECT s.level, s.duration_secs
                 FROM curve_samples s
                 JOIN charge_sessions c
                   ON c.vehicle_id = s.vehicle_id AND c.charge_id = s.charge_id
                 WHERE s.vehicle_id = ?1 AND c.location_id = ?2",
            )?;
            let rows = stmt
                .query_map(params![vehicle_id.as_str(), location_id.as_str()], |row| {
                    Ok((level_column(row, 0)?, row.get::<_, u32>(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            drop(stmt);

            let mut history = CurveHistory::from_durations(rows);
            if !history.has_samples() {
                let rate: Option<f64> = tx.query_row(
                    "SELECT AVG(60.0 * estimated_minutes / (target_level - end_level))
                     FROM charge_sessions
                     WHERE vehicle_id = ?1 AND location_id = ?2
                       AND end_level IS NOT NULL
                       AND estimated_minutes IS NOT NULL
                       AND end_level < target_level",
                    params![vehicle_id.as_str(), location_id.as_str()],
                    |row| row.get(0),
                )?;
                history = history.with_session_rate(rate);
            }

            tx.commit()?;
            Ok(history)
        })
        .await
    }

    async fn max_sampled_level(
        &self,
        vehicle_id: &VehicleId,
        charge_id: &ChargeId,
    ) -> Result<Option<Level>> {
        let vehicle_id = vehicle_id.clone();
        let charge_id = charge_id.clone();
        self.with_conn(move |conn| {
            let level = conn.query_row(
                "SELECT MAX(s.level)
                 FROM curve_samples s
                 JOIN charge_sessions c
                   ON c.vehicle_id = s.vehicle_id AND c.charge_id = s.charge_id
                 WHERE s.vehicle_id = ?1
                   AND c.location_id = (
                       SELECT location_id FROM charge_sessions
                       WHERE vehicle_id = ?1 AND charge_id = ?2
                   )",
                params![vehicle_id.as_str(), charge_id.as_str()],
                |row| optional_level_column(row, 0),
            )?;
            Ok(level)
        })
        .await
    }

    async fn purge_vehicle(&self, vehicle_id: &VehicleId) -> Result<PurgeCounts> {
        let vehicle_id = vehicle_id.clone();
        self.with_conn(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let samples = tx.execute(
                "DELETE FROM curve_samples WHERE vehicle_id = ?1",
                params![vehicle_id.as_str()],
            )?;
            let sessions = tx.execute(
                "DELETE FROM charge_sessions WHERE vehicle_id = ?1",
                params![vehicle_id.as_str()],
            )?;
            tx.commit()?;

            Ok(PurgeCounts {
                sessions: count(sessions),
                samples: count(samples),
            })
        })
        .await
    }

    async fn purge_location(&self, location_id: &LocationId) -> Result<PurgeCounts> {
        let location_id = location_id.clone();
        self.with_conn(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let samples = tx.execute(
                "DELETE FROM curve_samples
                 WHERE EXISTS (
                     SELECT 1 FROM charge_sessions c
                     WHERE c.vehicle_id = curve_samples.vehicle_id
                       AND c.charge_id = curve_samples.charge_id
                       AND c.location_id = ?1
                 )",
                params![location_id.as_str()],
            )?;
            let sessions = tx.execute(
                "DELETE FROM charge_sessions WHERE location_id = ?1",
                params![location_id.as_str()],
            )?;
            tx.commit()?;

            Ok(PurgeCounts {
                sessions: count(sessions),
                samples: count(samples),
            })
        })
        .await
    }

    async fn sweep_abandoned_sessions(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.with_conn(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM charge_sessions
                 WHERE end_level IS NULL
                   AND started_at < ?1
                   AND NOT EXISTS (
                       SELECT 1 FROM curve_samples s
                       WHERE s.vehicle_id = charge_sessions.vehicle_id
                         AND s.charge_id = charge_sessions.charge_id
                   )",
                params![cutoff],
            )?;
            Ok(count(deleted))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chargecurve_types::FieldUpdate;
    use chrono::Duration as ChronoDuration;

    fn lvl(v: i64) -> Level {
        Level::new(v).unwrap()
    }

    fn new_session(vehicle: &str, charge: &str, location: &str) -> NewSession {
        NewSession {
            vehicle_id: VehicleId::from(vehicle),
            charge_id: ChargeId::from(charge),
            location_id: LocationId::from(location),
            target_level: lvl(80),
            started_at: Utc::now(),
        }
    }

    fn write(vehicle: &str, charge: &str, level: i64, secs: u32) -> SampleWrite {
        SampleWrite {
            vehicle_id: VehicleId::from(vehicle),
            charge_id: ChargeId::from(charge),
            level: lvl(level),
            duration_secs: secs,
            outside_temp_dc: FieldUpdate::Keep,
            energy_used_wh: FieldUpdate::Keep,
            energy_added_wh: FieldUpdate::Keep,
        }
    }

    #[tokio::test]
    async fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("curves.db");
        let store = SqliteSampleStore::open(&path).unwrap();
        store
            .register_session(new_session("v", "c", "home"))
            .await
            .unwrap();
        assert!(path.exists());

        // Reopening keeps existing rows
        drop(store);
        let reopened = SqliteSampleStore::open(&path).unwrap();
        let session = reopened
            .session(&VehicleId::from("v"), &ChargeId::from("c"))
            .await
            .unwrap();
        assert!(session.is_some());
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let store = SqliteSampleStore::open_in_memory().unwrap();
        store
            .register_session(new_session("v", "c", "home"))
            .await
            .unwrap();

        store.upsert_sample(write("v", "c", 10, 60)).await.unwrap();
        let latest = store.upsert_sample(write("v", "c", 10, 75)).await.unwrap();
        assert_eq!(latest.duration_secs, 75);

        let rows = store
            .session_samples(&VehicleId::from("v"), &ChargeId::from("c"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].duration_secs, 75);
    }

    #[tokio::test]
    async fn test_upsert_tri_state_fields() {
        let store = SqliteSampleStore::open_in_memory().unwrap();
        store
            .register_session(new_session("v", "c", "home"))
            .await
            .unwrap();

        let mut first = write("v", "c", 30, 60);
        first.outside_temp_dc = FieldUpdate::Set(-50);
        first.energy_used_wh = FieldUpdate::Set(800);
        first.energy_added_wh = FieldUpdate::Set(760);
        store.upsert_sample(first).await.unwrap();

        let mut second = write("v", "c", 30, 65);
        second.energy_used_wh = FieldUpdate::Clear;
        second.energy_added_wh = FieldUpdate::Set(770);
        let merged = store.upsert_sample(second).await.unwrap();

        assert_eq!(merged.duration_secs, 65);
        assert_eq!(merged.outside_temp_dc, Some(-50));
        assert_eq!(merged.energy_used_wh, None);
        assert_eq!(merged.energy_added_wh, Some(770));
    }

    #[tokio::test]
    async fn test_upsert_requires_registered_session() {
        let store = SqliteSampleStore::open_in_memory().unwrap();
        let err = store
            .upsert_sample(write("v", "missing", 10, 60))
            .await
            .unwrap_err();
        assert!(matches!(err, CurveError::UnknownSession { .. }));
    }

    #[tokio::test]
    async fn test_curve_history_scoped_to_location() {
        let store = SqliteSampleStore::open_in_memory().unwrap();
        store
            .register_session(new_session("v", "home-1", "home"))
            .await
            .unwrap();
        store
            .register_session(new_session("v", "work-1", "work"))
            .await
            .unwrap();

        for (level, secs) in [(20, 10), (20, 20), (20, 1000)] {
            let charge = format!("home-{secs}");
            store
                .register_session(new_session("v", &charge, "home"))
                .await
                .unwrap();
            store
                .upsert_sample(write("v", &charge, level, secs))
                .await
                .unwrap();
        }
        store
            .upsert_sample(write("v", "work-1", 20, 5))
            .await
            .unwrap();

        let history = store
            .curve_history(&VehicleId::from("v"), &LocationId::from("home"))
            .await
            .unwrap();
        assert_eq!(history.level_medians.len(), 1);
        assert_eq!(history.level_medians[0].seconds, 20.0);
        assert_eq!(history.session_rate_secs, None);
    }

    #[tokio::test]
    async fn test_curve_history_session_rate_fallback() {
        let store = SqliteSampleStore::open_in_memory().unwrap();
        let vehicle = VehicleId::from("v");

        store
            .register_session(new_session("v", "a", "home"))
            .await
            .unwrap();
        store
            .register_session(new_session("v", "b", "home"))
            .await
            .unwrap();
        store
            .register_session(new_session("v", "c", "home"))
            .await
            .unwrap();

        // 80 -> 70 with 30 min left: 180 s/%, 80 -> 60 with 20 min left: 60 s/%
        store
            .finish_session(&vehicle, &ChargeId::from("a"), lvl(70), Some(30))
            .await
            .unwrap();
        store
            .finish_session(&vehicle, &ChargeId::from("b"), lvl(60), Some(20))
            .await
            .unwrap();
        // Reached target, ignored
        store
            .finish_session(&vehicle, &ChargeId::from("c"), lvl(80), Some(10))
            .await
            .unwrap();

        let history = store
            .curve_history(&vehicle, &LocationId::from("home"))
            .await
            .unwrap();
        assert!(!history.has_samples());
        assert_eq!(history.session_rate_secs, Some(120.0));
    }

    #[tokio::test]
    async fn test_finish_unknown_session() {
        let store = SqliteSampleStore::open_in_memory().unwrap();
        let err = store
            .finish_session(&VehicleId::from("v"), &ChargeId::from("x"), lvl(50), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CurveError::UnknownSession { .. }));
    }

    #[tokio::test]
    async fn test_max_sampled_level_per_location() {
        let store = SqliteSampleStore::open_in_memory().unwrap();
        let vehicle = VehicleId::from("v");
        store
            .register_session(new_session("v", "home-1", "home"))
            .await
            .unwrap();
        store
            .register_session(new_session("v", "home-2", "home"))
            .await
            .unwrap();
        store
            .register_session(new_session("v", "work-1", "work"))
            .await
            .unwrap();

        assert_eq!(
            store
                .max_sampled_level(&vehicle, &ChargeId::from("home-2"))
                .await
                .unwrap(),
            None
        );

        store
            .upsert_sample(write("v", "home-1", 45, 60))
            .await
            .unwrap();
        store
            .upsert_sample(write("v", "work-1", 90, 60))
            .await
            .unwrap();

        assert_eq!(
            store
                .max_sampled_level(&vehicle, &ChargeId::from("home-2"))
                .await
                .unwrap(),
            Some(lvl(45))
        );
        assert_eq!(
            store
                .max_sampled_level(&vehicle, &ChargeId::from("unknown"))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_purge_location_cascades() {
        let store = SqliteSampleStore::open_in_memory().unwrap();
        store
            .register_session(new_session("v", "home-1", "home"))
            .await
            .unwrap();
        store
            .register_session(new_session("v", "work-1", "work"))
            .await
            .unwrap();
        store
            .upsert_sample(write("v", "home-1", 10, 60))
            .await
            .unwrap();
        store
            .upsert_sample(write("v", "home-1", 11, 60))
            .await
            .unwrap();
        store
            .upsert_sample(write("v", "work-1", 10, 60))
            .await
            .unwrap();

        let purged = store
            .purge_location(&LocationId::from("home"))
            .await
            .unwrap();
        assert_eq!(
            purged,
            PurgeCounts {
                sessions: 1,
                samples: 2
            }
        );

        let work = store
            .session_samples(&VehicleId::from("v"), &ChargeId::from("work-1"))
            .await
            .unwrap();
        assert_eq!(work.len(), 1);
    }

    #[tokio::test]
    async fn test_purge_vehicle_leaves_other_vehicles() {
        let store = SqliteSampleStore::open_in_memory().unwrap();
        store
            .register_session(new_session("a", "c", "home"))
            .await
            .unwrap();
        store
            .register_session(new_session("b", "c", "home"))
            .await
            .unwrap();
        store.upsert_sample(write("a", "c", 10, 60)).await.unwrap();
        store.upsert_sample(write("b", "c", 10, 60)).await.unwrap();

        let purged = store.purge_vehicle(&VehicleId::from("a")).await.unwrap();
        assert_eq!(purged.samples, 1);
        assert_eq!(purged.sessions, 1);
        assert!(
            store
                .session(&VehicleId::from("b"), &ChargeId::from("c"))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_sweep_only_removes_empty_unfinished_sessions() {
        let store = SqliteSampleStore::open_in_memory().unwrap();
        let old = Utc::now() - ChronoDuration::days(30);

        let mut abandoned = new_session("v", "abandoned", "home");
        abandoned.started_at = old;
        let mut with_samples = new_session("v", "sampled", "home");
        with_samples.started_at = old;
        let mut finished = new_session("v", "finished", "home");
        finished.started_at = old;

        store.register_session(abandoned).await.unwrap();
        store.register_session(with_samples).await.unwrap();
        store.register_session(finished).await.unwrap();
        store
            .register_session(new_session("v", "recent", "home"))
            .await
            .unwrap();
        store
            .upsert_sample(write("v", "sampled", 10, 60))
            .await
            .unwrap();
        store
            .finish_session(&VehicleId::from("v"), &ChargeId::from("finished"), lvl(80), None)
            .await
            .unwrap();

        let swept = store
            .sweep_abandoned_sessions(Utc::now() - ChronoDuration::days(14))
            .await
            .unwrap();
        assert_eq!(swept, 1);
        assert!(
            store
                .session(&VehicleId::from("v"), &ChargeId::from("abandoned"))
                .await
                .unwrap()
                .is_none()
        );
    }
}
