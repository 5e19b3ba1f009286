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

//! Periodic cleanup of sessions that never produced any samples.
//!
//! Runs on its own interval against the store and shares nothing with
//! curve estimation.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::store::SampleStore;

fn default_interval_secs() -> u64 {
    3600
}

fn default_abandoned_session_days() -> u32 {
    14
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// How often the sweep runs (seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Unfinished sessions older than this with no samples are removed
    #[serde(default = "default_abandoned_session_days")]
    pub abandoned_session_days: u32,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            abandoned_session_days: default_abandoned_session_days(),
        }
    }
}

#[derive(Debug)]
pub struct MaintenanceTask<S> {
    store: Arc<S>,
    config: MaintenanceConfig,
}

impl<S: SampleStore> MaintenanceTask<S> {
    pub fn new(store: Arc<S>, config: MaintenanceConfig) -> Self {
        Self { store, config }
    }

    /// Oldest start time a session may have before it counts as abandoned.
    ///
    /// `None` when the retention window reaches past the representable range,
    /// in which case no session is old enough.
    pub fn cutoff(&self) -> Option<DateTime<Utc>> {
        let window = TimeDelta::try_days(i64::from(self.config.abandoned_session_days))?;
        Utc::now().checked_sub_signed(window)
    }

    /// One sweep; returns the number of sessions removed
    pub async fn run_once(&self) -> Result<u64> {
        let Some(cutoff) = self.cutoff() else {
            debug!(
                abandoned_session_days = self.config.abandoned_session_days,
                "Retention window exceeds the calendar, nothing to sweep"
            );
            return Ok(0);
        };
        let removed = self.store.sweep_abandoned_sessions(cutoff).await?;
        if removed > 0 {
            info!(removed, %cutoff, "Swept abandoned charge sessions");
        }
        Ok(removed)
    }

    /// Sweep on every tick until `shutdown` is notified. Sweep failures are
    /// logged and retried on the next tick.
    pub async fn run(self, shutdown: Arc<Notify>) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.config.interval_secs));
        info!(
            interval_secs = self.config.interval_secs,
            abandoned_session_days = self.config.abandoned_session_days,
            "Starting maintenance task"
        );

        loop {
            tokio::select! {
                () = shutdown.notified() => {
                    info!("Maintenance task stopping");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.run_once().await {
                        warn!("Maintenance sweep failed: {e}");
                    }
                }
            }
        }
    }
}
