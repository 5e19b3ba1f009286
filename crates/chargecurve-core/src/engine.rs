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

//! Entry point used by charge-session workers and the scheduler.
//!
//! Writes go through [`CurveEngine::record_sample`]; reads are
//! [`CurveEngine::estimate_curve`] and [`CurveEngine::best_calibrated_level`].
//! Nothing is cached: every read goes back to the store.

use chargecurve_types::{
    ChargeId, ChargeSession, CurveSample, Level, LocationId, NewSession, SampleReport,
    SampleWrite, VehicleId,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::curve::CurveEstimate;
use crate::error::{CurveError, Result};
use crate::estimator::{self, EstimatorConfig};
use crate::store::SampleStore;

#[derive(Debug)]
pub struct CurveEngine<S> {
    store: Arc<S>,
    config: EstimatorConfig,
}

impl<S> Clone for CurveEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: SampleStore> CurveEngine<S> {
    pub fn new(store: Arc<S>, config: EstimatorConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Register a session so its samples can be tied to a location
    pub async fn register_session(&self, session: NewSession) -> Result<ChargeSession> {
        let stored = self.store.register_session(session).await?;
        info!(
            vehicle_id = %stored.vehicle_id,
            charge_id = %stored.charge_id,
            location_id = %stored.location_id,
            "Registered charge session"
        );
        Ok(stored)
    }

    pub async fn finish_session(
        &self,
        vehicle_id: &VehicleId,
        charge_id: &ChargeId,
        end_level: i64,
        estimated_minutes: Option<u32>,
    ) -> Result<ChargeSession> {
        let end_level = Level::new(end_level).ok_or_else(|| {
            CurveError::InvalidSession(format!("end level {end_level} is outside 0..=100"))
        })?;
        let session = self
            .store
            .finish_session(vehicle_id, charge_id, end_level, estimated_minutes)
            .await?;
        info!(
            vehicle_id = %vehicle_id,
            charge_id = %charge_id,
            end_level = end_level.value(),
            target_level = session.target_level.value(),
            "Finished charge session"
        );
        Ok(session)
    }

    /// Persist one duration observation. Repeated reports for the same
    /// vehicle, session and level overwrite the previous one.
    pub async fn record_sample(&self, report: SampleReport) -> Result<CurveSample> {
        let write = validate(report)?;
        let sample = self.store.upsert_sample(write).await?;
        debug!(
            vehicle_id = %sample.vehicle_id,
            charge_id = %sample.charge_id,
            level = sample.level.value(),
            duration_secs = sample.duration_secs,
            "Recorded curve sample"
        );
        Ok(sample)
    }

    /// Full 0..=100 curve for a vehicle at a location, rebuilt from the store on every call
    pub async fn estimate_curve(
        &self,
        vehicle_id: &VehicleId,
        location_id: &LocationId,
    ) -> Result<CurveEstimate> {
        let history = self.store.curve_history(vehicle_id, location_id).await?;
        let estimate = estimator::estimate(&history, &self.config);
        debug!(
            vehicle_id = %vehicle_id,
            location_id = %location_id,
            measured_levels = history.level_medians.len(),
            source = %estimate.source,
            "Estimated charge curve"
        );
        Ok(estimate)
    }

    /// Highest level with real samples at the location of `charge_id`
    pub async fn best_calibrated_level(
        &self,
        vehicle_id: &VehicleId,
        charge_id: &ChargeId,
    ) -> Result<Option<Level>> {
        self.store.max_sampled_level(vehicle_id, charge_id).await
    }
}

/// Reject out-of-range levels and negative durations before anything is written
pub fn validate(report: SampleReport) -> Result<SampleWrite> {
    let level = Level::new(report.level).ok_or_else(|| {
        CurveError::InvalidSample(format!("level {} is outside 0..=100", report.level))
    })?;
    let duration_secs = u32::try_from(report.duration_secs).map_err(|_| {
        CurveError::InvalidSample(format!(
            "duration {}s must be between 0 and {}",
            report.duration_secs,
            u32::MAX
        ))
    })?;

    Ok(SampleWrite {
        vehicle_id: report.vehicle_id,
        charge_id: report.charge_id,
        level,
        duration_secs,
        outside_temp_dc: report.outside_temp_dc,
        energy_used_wh: report.energy_used_wh,
        energy_added_wh: report.energy_added_wh,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::CurveSource;
    use crate::store::MemorySampleStore;
    use chargecurve_types::{FieldUpdate, LEVEL_COUNT};
    use chrono::Utc;

    fn engine() -> CurveEngine<MemorySampleStore> {
        CurveEngine::new(Arc::new(MemorySampleStore::new()), EstimatorConfig::default())
    }

    async fn start(engine: &CurveEngine<MemorySampleStore>, charge: &str, location: &str) {
        engine
            .register_session(NewSession {
                vehicle_id: VehicleId::from("v"),
                charge_id: ChargeId::from(charge),
                location_id: LocationId::from(location),
                target_level: Level::FULL,
                started_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_level() {
        for level in [-1, 101, 1000] {
            let err = validate(SampleReport::duration("v", "c", level, 60)).unwrap_err();
            assert!(matches!(err, CurveError::InvalidSample(_)), "level {level}");
        }
    }

    #[test]
    fn test_validate_rejects_negative_duration() {
        let err = validate(SampleReport::duration("v", "c", 10, -5)).unwrap_err();
        assert!(matches!(err, CurveError::InvalidSample(_)));
    }

    #[test]
    fn test_validate_accepts_zero_duration() {
        let write = validate(SampleReport::duration("v", "c", 100, 0)).unwrap();
        assert_eq!(write.duration_secs, 0);
        assert_eq!(write.level, Level::FULL);
    }

    #[tokio::test]
    async fn test_invalid_sample_never_reaches_store() {
        let engine = engine();
        start(&engine, "c", "home").await;
        assert!(
            engine
                .record_sample(SampleReport::duration("v", "c", 150, 60))
                .await
                .is_err()
        );
        assert_eq!(engine.store().sample_count(), 0);
    }

    #[tokio::test]
    async fn test_fresh_vehicle_gets_default_curve() {
        let engine = engine();
        let estimate = engine
            .estimate_curve(&VehicleId::from("new"), &LocationId::from("nowhere"))
            .await
            .unwrap();
        assert_eq!(estimate.source, CurveSource::Default);
        assert_eq!(estimate.curve.len(), LEVEL_COUNT);
        assert!(estimate.curve.iter().all(|(_, secs)| secs == 1200.0));
    }

    #[tokio::test]
    async fn test_record_twice_keeps_latest() {
        let engine = engine();
        start(&engine, "c", "home").await;
        engine
            .record_sample(SampleReport::duration("v", "c", 20, 60))
            .await
            .unwrap();
        let latest = engine
            .record_sample(SampleReport::duration("v", "c", 20, 80))
            .await
            .unwrap();

        assert_eq!(latest.duration_secs, 80);
        assert_eq!(engine.store().sample_count(), 1);
    }

    #[tokio::test]
    async fn test_optional_fields_follow_update_intent() {
        let engine = engine();
        start(&engine, "c", "home").await;

        let mut first = SampleReport::duration("v", "c", 20, 60);
        first.outside_temp_dc = FieldUpdate::Set(45);
        first.energy_added_wh = FieldUpdate::Set(600);
        engine.record_sample(first).await.unwrap();

        let mut second = SampleReport::duration("v", "c", 20, 62);
        second.energy_added_wh = FieldUpdate::Clear;
        let merged = engine.record_sample(second).await.unwrap();

        assert_eq!(merged.outside_temp_dc, Some(45));
        assert_eq!(merged.energy_added_wh, None);
    }

    #[tokio::test]
    async fn test_finish_session_validates_level() {
        let engine = engine();
        start(&engine, "c", "home").await;
        let err = engine
            .finish_session(&VehicleId::from("v"), &ChargeId::from("c"), 120, Some(10))
            .await
            .unwrap_err();
        assert!(matches!(err, CurveError::InvalidSession(_)));
    }

    #[tokio::test]
    async fn test_session_rate_fallback_through_engine() {
        let engine = engine();
        start(&engine, "c", "home").await;
        // target 100, stopped at 90 with 40 minutes left: 240 s per percent
        engine
            .finish_session(&VehicleId::from("v"), &ChargeId::from("c"), 90, Some(40))
            .await
            .unwrap();

        let estimate = engine
            .estimate_curve(&VehicleId::from("v"), &LocationId::from("home"))
            .await
            .unwrap();
        assert_eq!(estimate.source, CurveSource::SessionRate);
        assert!(estimate.curve.iter().all(|(_, secs)| secs == 240.0));
    }

    #[tokio::test]
    async fn test_scenario_curve_and_calibration() {
        let engine = engine();
        start(&engine, "c", "home").await;
        for (level, secs) in [(0, 60), (5, 55), (40, 200)] {
            engine
                .record_sample(SampleReport::duration("v", "c", level, secs))
                .await
                .unwrap();
        }

        let estimate = engine
            .estimate_curve(&VehicleId::from("v"), &LocationId::from("home"))
            .await
            .unwrap();
        assert_eq!(estimate.source, CurveSource::Measured);
        for (level, secs) in estimate.curve.iter() {
            let expected = match level.value() {
                0..=4 => 60.0,
                5..=39 => 55.0,
                _ => 200.0,
            };
            assert_eq!(secs, expected, "level {level}");
        }

        let best = engine
            .best_calibrated_level(&VehicleId::from("v"), &ChargeId::from("c"))
            .await
            .unwrap();
        assert_eq!(best, Level::new(40));
    }
}
