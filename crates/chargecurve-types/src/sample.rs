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

use serde::{Deserialize, Serialize};

use crate::ids::{ChargeId, VehicleId};
use crate::level::Level;

/// Update intent for one optional sample column.
///
/// `Keep` leaves whatever is stored (NULL for a fresh row), `Clear` writes
/// NULL and `Set` writes the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldUpdate<T> {
    Keep,
    Clear,
    Set(T),
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        Self::Keep
    }
}

impl<T> FieldUpdate<T> {
    /// Treats `None` as an explicit clear, never as "keep"
    pub fn replace_with(value: Option<T>) -> Self {
        value.map_or(Self::Clear, Self::Set)
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    /// Value to bind for the write; `None` for both `Keep` and `Clear`
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Set(v) => Some(v),
            Self::Keep | Self::Clear => None,
        }
    }

    /// Merge into the currently stored value
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Keep => current,
            Self::Clear => None,
            Self::Set(v) => Some(v),
        }
    }
}

/// One persisted duration observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveSample {
    pub vehicle_id: VehicleId,
    pub charge_id: ChargeId,
    pub level: Level,

    /// Seconds spent advancing one percent from `level`
    pub duration_secs: u32,

    /// Outside temperature in tenths of a degree Celsius
    pub outside_temp_dc: Option<i32>,

    pub energy_used_wh: Option<i64>,
    pub energy_added_wh: Option<i64>,
}

/// Raw telemetry report from an active charge session, not yet validated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleReport {
    pub vehicle_id: VehicleId,
    pub charge_id: ChargeId,
    pub level: i64,
    pub duration_secs: i64,
    #[serde(default)]
    pub outside_temp_dc: FieldUpdate<i32>,
    #[serde(default)]
    pub energy_used_wh: FieldUpdate<i64>,
    #[serde(default)]
    pub energy_added_wh: FieldUpdate<i64>,
}

impl SampleReport {
    /// Report carrying only a duration; optional columns are left untouched
    pub fn duration(
        vehicle_id: impl Into<VehicleId>,
        charge_id: impl Into<ChargeId>,
        level: i64,
        duration_secs: i64,
    ) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            charge_id: charge_id.into(),
            level,
            duration_secs,
            outside_temp_dc: FieldUpdate::Keep,
            energy_used_wh: FieldUpdate::Keep,
            energy_added_wh: FieldUpdate::Keep,
        }
    }
}

/// A validated upsert for the sample store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleWrite {
    pub vehicle_id: VehicleId,
    pub charge_id: ChargeId,
    pub level: Level,
    pub duration_secs: u32,
    pub outside_temp_dc: FieldUpdate<i32>,
    pub energy_used_wh: FieldUpdate<i64>,
    pub energy_added_wh: FieldUpdate<i64>,
}

impl SampleWrite {
    /// Row that results from applying this write over `existing`
    pub fn merge_into(&self, existing: Option<&CurveSample>) -> CurveSample {
        CurveSample {
            vehicle_id: self.vehicle_id.clone(),
            charge_id: self.charge_id.clone(),
            level: self.level,
            duration_secs: self.duration_secs,
            outside_temp_dc: self
                .outside_temp_dc
                .apply(existing.and_then(|s| s.outside_temp_dc)),
            energy_used_wh: self
                .energy_used_wh
                .apply(existing.and_then(|s| s.energy_used_wh)),
            energy_added_wh: self
                .energy_added_wh
                .apply(existing.and_then(|s| s.energy_added_wh)),
        }
    }
}
