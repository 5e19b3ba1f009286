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

//! Error types for the curve engine

use chargecurve_types::{ChargeId, VehicleId};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum CurveError {
    /// The store could not be reached or its transaction failed
    #[error("sample store unavailable: {0}")]
    StoreUnavailable(#[source] BoxError),

    #[error("invalid sample: {0}")]
    InvalidSample(String),

    #[error("invalid session update: {0}")]
    InvalidSession(String),

    #[error("unknown charge session {charge_id} for vehicle {vehicle_id}")]
    UnknownSession {
        vehicle_id: VehicleId,
        charge_id: ChargeId,
    },
}

impl From<rusqlite::Error> for CurveError {
    fn from(err: rusqlite::Error) -> Self {
        Self::StoreUnavailable(Box::new(err))
    }
}

impl From<std::io::Error> for CurveError {
    fn from(err: std::io::Error) -> Self {
        Self::StoreUnavailable(Box::new(err))
    }
}

impl From<tokio::task::JoinError> for CurveError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::StoreUnavailable(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, CurveError>;
