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

mod memory;
mod sqlite;

pub use memory::MemorySampleStore;
pub use sqlite::SqliteSampleStore;

use async_trait::async_trait;
use chargecurve_types::{
    ChargeId, ChargeSession, CurveSample, Level, LocationId, NewSession, SampleWrite, VehicleId,
};
use chrono::{DateTime, Utc};

use crate::curve::CurveHistory;
use crate::error::Result;

/// Row count as reported in `PurgeCounts` and sweep results
pub(crate) fn count(rows: usize) -> u64 {
    u64::try_from(rows).unwrap_or(u64::MAX)
}

/// Rows removed by a cascading purge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeCounts {
    pub sessions: u64,
    pub samples: u64,
}

/// Persistence for charge sessions and their per-level samples.
///
/// Implementations must make `upsert_sample` atomic per
/// `(vehicle, level, charge)` key and serve `curve_history` from one
/// consistent snapshot.
#[async_trait]
pub trait SampleStore: Send + Sync {
    /// Insert a session, or update its location and target if it already exists
    async fn register_session(&self, session: NewSession) -> Result<ChargeSession>;

    /// Record how a session concluded
    async fn finish_session(
        &self,
        vehicle_id: &VehicleId,
        charge_id: &ChargeId,
        end_level: Level,
        estimated_minutes: Option<u32>,
    ) -> Result<ChargeSession>;

    async fn session(
        &self,
        vehicle_id: &VehicleId,
        charge_id: &ChargeId,
    ) -> Result<Option<ChargeSession>>;

    /// Insert or merge one sample; last write wins per key
    async fn upsert_sample(&self, write: SampleWrite) -> Result<CurveSample>;

    /// All samples of one session, ascending by level
    async fn session_samples(
        &self,
        vehicle_id: &VehicleId,
        charge_id: &ChargeId,
    ) -> Result<Vec<CurveSample>>;

    /// Per-level medians and fallback inputs for a vehicle at a location
    async fn curve_history(
        &self,
        vehicle_id: &VehicleId,
        location_id: &LocationId,
    ) -> Result<CurveHistory>;

    /// Highest sampled level for the vehicle at the location of `charge_id`
    async fn max_sampled_level(
        &self,
        vehicle_id: &VehicleId,
        charge_id: &ChargeId,
    ) -> Result<Option<Level>>;

    async fn purge_vehicle(&self, vehicle_id: &VehicleId) -> Result<PurgeCounts>;

    async fn purge_location(&self, location_id: &LocationId) -> Result<PurgeCounts>;

    /// Delete unfinished sessions started before `cutoff` that own no samples
    async fn sweep_abandoned_sessions(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}
