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

//! ChargeCurve estimation engine
//!
//! Learns how long a vehicle takes to charge through each battery percentage
//! at a location and exposes it as a 0..=100 curve for charge scheduling.
//!
//! ## Features
//!
//! - **Sample Store**: SQLite (and in-memory) persistence with per-key upserts
//! - **Curve Estimator**: per-level medians with a three-tier fallback seed
//! - **Calibration**: highest level backed by real samples at a location
//! - **Maintenance**: periodic sweep of abandoned sessions

pub mod curve;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod maintenance;
pub mod stats;
pub mod store;

pub use curve::{ChargeCurve, CurveEstimate, CurveHistory, CurveSource, LevelDuration};
pub use engine::CurveEngine;
pub use error::{CurveError, Result};
pub use estimator::{DEFAULT_SECONDS_PER_PERCENT, EstimatorConfig};
pub use maintenance::{MaintenanceConfig, MaintenanceTask};
pub use store::{MemorySampleStore, PurgeCounts, SampleStore, SqliteSampleStore};
