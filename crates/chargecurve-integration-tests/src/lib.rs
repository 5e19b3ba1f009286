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

//! Fixtures shared by the integration tests

use chargecurve_core::{CurveEngine, EstimatorConfig, SqliteSampleStore};
use chargecurve_types::{ChargeId, Level, LocationId, NewSession, SampleReport, VehicleId};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// A file-backed engine that lives as long as its temp directory
#[derive(Debug)]
pub struct TestBed {
    pub dir: TempDir,
    pub engine: CurveEngine<SqliteSampleStore>,
}

impl TestBed {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let engine = open_engine(&db_path(&dir));
        Self { dir, engine }
    }

    pub fn db_path(&self) -> PathBuf {
        db_path(&self.dir)
    }

    /// A second engine on its own connection to the same database file
    pub fn reopen(&self) -> CurveEngine<SqliteSampleStore> {
        open_engine(&self.db_path())
    }
}

impl Default for TestBed {
    fn default() -> Self {
        Self::new()
    }
}

fn db_path(dir: &TempDir) -> PathBuf {
    dir.path().join("data").join("chargecurve.db")
}

pub fn open_engine(path: &std::path::Path) -> CurveEngine<SqliteSampleStore> {
    let store = SqliteSampleStore::open(path).expect("open store");
    CurveEngine::new(Arc::new(store), EstimatorConfig::default())
}

pub fn level(value: i64) -> Level {
    Level::new(value).expect("level in range")
}

pub async fn start_session(
    engine: &CurveEngine<SqliteSampleStore>,
    vehicle: &str,
    charge: &str,
    location: &str,
) {
    start_session_at(engine, vehicle, charge, location, Utc::now()).await;
}

pub async fn start_session_at(
    engine: &CurveEngine<SqliteSampleStore>,
    vehicle: &str,
    charge: &str,
    location: &str,
    started_at: DateTime<Utc>,
) {
    engine
        .register_session(NewSession {
            vehicle_id: VehicleId::from(vehicle),
            charge_id: ChargeId::from(charge),
            location_id: LocationId::from(location),
            target_level: Level::FULL,
            started_at,
        })
        .await
        .expect("register session");
}

pub async fn record(
    engine: &CurveEngine<SqliteSampleStore>,
    vehicle: &str,
    charge: &str,
    level: i64,
    secs: i64,
) {
    engine
        .record_sample(SampleReport::duration(vehicle, charge, level, secs))
        .await
        .expect("record sample");
}
