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
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::{PurgeCounts, SampleStore, count};
use crate::curve::CurveHistory;
use crate::error::{CurveError, Result};
use crate::stats;

type SessionKey = (VehicleId, ChargeId);
type SampleKey = (VehicleId, Level, ChargeId);

#[derive(Debug, Default)]
struct Tables {
    sessions: BTreeMap<SessionKey, ChargeSession>,
    samples: BTreeMap<SampleKey, CurveSample>,
}

impl Tables {
    fn location_of(&self, vehicle_id: &VehicleId, charge_id: &ChargeId) -> Option<&LocationId> {
        self.sessions
            .get(&(vehicle_id.clone(), charge_id.clone()))
            .map(|s| &s.location_id)
    }

    /// Samples of `vehicle_id` whose parent session is at `location_id`
    fn samples_at<'a>(
        &'a self,
        vehicle_id: &'a VehicleId,
        location_id: &'a LocationId,
    ) -> impl Iterator<Item = &'a CurveSample> + 'a {
        self.samples.values().filter(move |s| {
            &s.vehicle_id == vehicle_id
                && self.location_of(&s.vehicle_id, &s.charge_id) == Some(location_id)
        })
    }

    fn remove_sessions(&mut self, doomed: impl Fn(&ChargeSession) -> bool) -> PurgeCounts {
        let before_sessions = self.sessions.len();
        let before_samples = self.samples.len();

        self.sessions.retain(|_, s| !doomed(s));
        let sessions = &self.sessions;
        self.samples
            .retain(|_, s| sessions.contains_key(&(s.vehicle_id.clone(), s.charge_id.clone())));

        PurgeCounts {
            sessions: count(before_sessions - self.sessions.len()),
            samples: count(before_samples - self.samples.len()),
        }
    }
}

/// In-process store with the same semantics as the SQLite one.
///
/// Every operation runs under a single lock, which gives the same per-key
/// atomicity and snapshot reads the database provides.
#[derive(Debug, Default)]
pub struct MemorySampleStore {
    tables: RwLock<Tables>,
}

impl MemorySampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_count(&self) -> usize {
        self.tables.read().samples.len()
    }
}

#[async_trait]
impl SampleStore for MemorySampleStore {
    async fn register_session(&self, session: NewSession) -> Result<ChargeSession> {
        let mut tables = self.tables.write();
        let key = (session.vehicle_id.clone(), session.charge_id.clone());
        let stored = match tables.sessions.get_mut(&key) {
            Some(existing) => {
                existing.location_id = session.location_id;
                existing.target_level = session.target_level;
                existing.clone()
            }
            None => {
                let fresh = session.into_session();
                tables.sessions.insert(key, fresh.clone());
                fresh
            }
        };
        Ok(stored)
    }

    async fn finish_session(
        &self,
        vehicle_id: &VehicleId,
        charge_id: &ChargeId,
        end_level: Level,
        estimated_minutes: Option<u32>,
    ) -> Result<ChargeSession> {
        let mut tables = self.tables.write();
        let session = tables
            .sessions
            .get_mut(&(vehicle_id.clone(), charge_id.clone()))
            .ok_or_else(|| CurveError::UnknownSession {
                vehicle_id: vehicle_id.clone(),
                charge_id: charge_id.clone(),
            })?;
        session.end_level = Some(end_level);
        session.estimated_minutes = estimated_minutes;
        Ok(session.clone())
    }

    async fn session(
        &self,
        vehicle_id: &VehicleId,
        charge_id: &ChargeId,
    ) -> Result<Option<ChargeSession>> {
        let tables = self.tables.read();
        Ok(tables
            .sessions
            .get(&(vehicle_id.clone(), charge_id.clone()))
            .cloned())
    }

    async fn upsert_sample(&self, write: SampleWrite) -> Result<CurveSample> {
        let mut tables = self.tables.write();
        if tables
            .location_of(&write.vehicle_id, &write.charge_id)
            .is_none()
        {
            return Err(CurveError::UnknownSession {
                vehicle_id: write.vehicle_id,
                charge_id: write.charge_id,
            });
        }

        let key = (
            write.vehicle_id.clone(),
            write.level,
            write.charge_id.clone(),
        );
        let merged = write.merge_into(tables.samples.get(&key));
        tables.samples.insert(key, merged.clone());
        Ok(merged)
    }

    async fn session_samples(
        &self,
        vehicle_id: &VehicleId,
        charge_id: &ChargeId,
    ) -> Result<Vec<CurveSample>> {
        let tables = self.tables.read();
        // BTreeMap order puts levels ascending within a vehicle
        Ok(tables
            .samples
            .values()
            .filter(|s| &s.vehicle_id == vehicle_id && &s.charge_id == charge_id)
            .cloned()
            .collect())
    }

    async fn curve_history(
        &self,
        vehicle_id: &VehicleId,
        location_id: &LocationId,
    ) -> Result<CurveHistory> {
        let tables = self.tables.read();
        let history = CurveHistory::from_durations(
            tables
                .samples_at(vehicle_id, location_id)
                .map(|s| (s.level, s.duration_secs)),
        );
        if history.has_samples() {
            return Ok(history);
        }

        let rates: Vec<f64> = tables
            .sessions
            .values()
            .filter(|s| &s.vehicle_id == vehicle_id && &s.location_id == location_id)
            .filter_map(ChargeSession::shortfall_rate_secs)
            .collect();
        Ok(history.with_session_rate(stats::mean(&rates)))
    }

    async fn max_sampled_level(
        &self,
        vehicle_id: &VehicleId,
        charge_id: &ChargeId,
    ) -> Result<Option<Level>> {
        let tables = self.tables.read();
        let Some(location_id) = tables.location_of(vehicle_id, charge_id) else {
            return Ok(None);
        };
        Ok(tables
            .samples_at(vehicle_id, location_id)
            .map(|s| s.level)
            .max())
    }

    async fn purge_vehicle(&self, vehicle_id: &VehicleId) -> Result<PurgeCounts> {
        let mut tables = self.tables.write();
        Ok(tables.remove_sessions(|s| &s.vehicle_id == vehicle_id))
    }

    async fn purge_location(&self, location_id: &LocationId) -> Result<PurgeCounts> {
        let mut tables = self.tables.write();
        Ok(tables.remove_sessions(|s| &s.location_id == location_id))
    }

    async fn sweep_abandoned_sessions(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut tables = self.tables.write();
        let Tables { sessions, samples } = &mut *tables;
        let before = sessions.len();
        sessions.retain(|key, s| {
            let has_samples = samples
                .values()
                .any(|sample| sample.vehicle_id == key.0 && sample.charge_id == key.1);
            s.is_finished() || s.started_at >= cutoff || has_samples
        });
        Ok(count(before - sessions.len()))
    }
}
