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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ChargeId, LocationId, VehicleId};
use crate::level::Level;

/// One physical charging event at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeSession {
    pub vehicle_id: VehicleId,
    pub charge_id: ChargeId,
    pub location_id: LocationId,

    /// Level the session was asked to reach
    pub target_level: Level,

    /// Level the session actually stopped at (None while charging)
    pub end_level: Option<Level>,

    /// Minutes the session tracker expected the remaining charge to take
    pub estimated_minutes: Option<u32>,

    pub started_at: DateTime<Utc>,
}

impl ChargeSession {
    pub fn is_finished(&self) -> bool {
        self.end_level.is_some()
    }

    /// Seconds-per-percent implied by a session that stopped short of its target.
    ///
    /// `None` unless the session finished below `target_level` with an estimate.
    pub fn shortfall_rate_secs(&self) -> Option<f64> {
        let end = self.end_level?;
        let minutes = self.estimated_minutes?;
        if end >= self.target_level {
            return None;
        }
        let missing = f64::from(self.target_level.value() - end.value());
        Some(60.0 * f64::from(minutes) / missing)
    }
}

/// Registration of a session by the external session tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub vehicle_id: VehicleId,
    pub charge_id: ChargeId,
    pub location_id: LocationId,
    pub target_level: Level,
    pub started_at: DateTime<Utc>,
}

impl NewSession {
    pub fn into_session(self) -> ChargeSession {
        ChargeSession {
            vehicle_id: self.vehicle_id,
            charge_id: self.charge_id,
            location_id: self.location_id,
            target_level: self.target_level,
            end_level: None,
            estimated_minutes: None,
            started_at: self.started_at,
        }
    }
}
