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

/// Continuous percentile (linear interpolation between closest ranks).
///
/// `sorted` must be in ascending order. Returns `None` for an empty slice.
pub fn percentile_cont(sorted: &[f64], fraction: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let fraction = fraction.clamp(0.0, 1.0);

    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let (lower, weight) = {
        let rank = fraction * last as f64;
        let lower = rank.floor();
        (lower as usize, rank - lower)
    };

    let low = *sorted.get(lower)?;
    let high = sorted.get(lower + 1).copied().unwrap_or(low);
    Some(low + (high - low) * weight)
}

pub fn median(sorted: &[f64]) -> Option<f64> {
    percentile_cont(sorted, 0.5)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    #[expect(clippy::cast_precision_loss)]
    let count = values.len() as f64;
    Some(values.iter().sum::<f64>() / count)
}
