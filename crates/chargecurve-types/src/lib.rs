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

pub mod ids;
pub mod level;
pub mod sample;
pub mod session;

// Re-export common types for convenience
pub use ids::{ChargeId, LocationId, VehicleId};
pub use level::{LEVEL_COUNT, Level, LevelOutOfRange};
pub use sample::{CurveSample, FieldUpdate, SampleReport, SampleWrite};
pub use session::{ChargeSession, NewSession};
