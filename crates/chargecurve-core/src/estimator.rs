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

//! Curve estimation from historical samples.
//!
//! The curve is seeded from the lowest measured level when samples exist.
//! Otherwise the seed falls back, in order, to the average of all samples,
//! to the rate implied by sessions that stopped short of their target, and
//! finally to a fixed default of 20 minutes per percent.

use serde::{Deserialize, Serialize};

use crate::curve::{ChargeCurve, CurveEstimate, CurveHistory, CurveSource};

/// Seconds per percent used when a vehicle has no history at a location
pub const DEFAULT_SECONDS_PER_PERCENT: f64 = 1200.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Seed for a vehicle/location pair with no samples and no sessions
    #[serde(default = "default_seconds_per_percent")]
    pub default_seconds_per_percent: f64,
}

fn default_seconds_per_percent() -> f64 {
    DEFAULT_SECONDS_PER_PERCENT
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            default_seconds_per_percent: DEFAULT_SECONDS_PER_PERCENT,
        }
    }
}

/// Build the full 0..=100 curve. Never fails; missing data degrades through the fallbacks.
pub fn estimate(history: &CurveHistory, config: &EstimatorConfig) -> CurveEstimate {
    let (seed, source) = seed(history, config);
    CurveEstimate {
        curve: ChargeCurve::from_steps(seed, &history.level_medians),
        source,
    }
}

fn seed(history: &CurveHistory, config: &EstimatorConfig) -> (f64, CurveSource) {
    if let Some(lowest) = history.level_medians.first() {
        return (lowest.seconds, CurveSource::Measured);
    }
    if let Some(average) = history.sample_average_secs {
        return (average, CurveSource::SampleAverage);
    }
    if let Some(rate) = history.session_rate_secs {
        return (rate, CurveSource::SessionRate);
    }
    (config.default_seconds_per_percent, CurveSource::Default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::LevelDuration;
    use chargecurve_types::{LEVEL_COUNT, Level};

    fn lvl(v: i64) -> Level {
        Level::new(v).unwrap()
    }

    #[test]
    fn test_no_history_uses_default() {
        let estimate = estimate(&CurveHistory::default(), &EstimatorConfig::default());
        assert_eq!(estimate.source, CurveSource::Default);
        assert_eq!(estimate.curve.len(), LEVEL_COUNT);
        assert!(estimate.curve.iter().all(|(_, secs)| secs == 1200.0));
    }

    #[test]
    fn test_configured_default() {
        let config = EstimatorConfig {
            default_seconds_per_percent: 300.0,
        };
        let estimate = estimate(&CurveHistory::default(), &config);
        assert_eq!(estimate.curve, ChargeCurve::constant(300.0));
    }

    #[test]
    fn test_sample_average_beats_session_rate() {
        let history = CurveHistory {
            level_medians: vec![],
            sample_average_secs: Some(75.0),
            session_rate_secs: Some(180.0),
        };
        let estimate = estimate(&history, &EstimatorConfig::default());
        assert_eq!(estimate.source, CurveSource::SampleAverage);
        assert_eq!(estimate.curve, ChargeCurve::constant(75.0));
    }

    #[test]
    fn test_session_rate_beats_default() {
        let history = CurveHistory::default().with_session_rate(Some(180.0));
        let estimate = estimate(&history, &EstimatorConfig::default());
        assert_eq!(estimate.source, CurveSource::SessionRate);
        assert_eq!(estimate.curve, ChargeCurve::constant(180.0));
    }

    #[test]
    fn test_measured_levels_ignore_fallbacks() {
        let history = CurveHistory {
            level_medians: vec![
                LevelDuration {
                    level: lvl(10),
                    seconds: 100.0,
                },
                LevelDuration {
                    level: lvl(50),
                    seconds: 300.0,
                },
            ],
            sample_average_secs: Some(200.0),
            session_rate_secs: Some(999.0),
        };
        let estimate = estimate(&history, &EstimatorConfig::default());

        assert_eq!(estimate.source, CurveSource::Measured);
        assert_eq!(estimate.curve.seconds_at(Level::EMPTY), 100.0);
        assert_eq!(estimate.curve.seconds_at(lvl(9)), 100.0);
        assert_eq!(estimate.curve.seconds_at(lvl(49)), 100.0);
        assert_eq!(estimate.curve.seconds_at(lvl(50)), 300.0);
        assert_eq!(estimate.curve.seconds_at(Level::FULL), 300.0);
    }

    #[test]
    fn test_scenario_from_raw_samples() {
        let history = CurveHistory::from_durations([(lvl(0), 60), (lvl(5), 55), (lvl(40), 200)]);
        let curve = estimate(&history, &EstimatorConfig::default()).curve;

        for (level, secs) in curve.iter() {
            let expected = match level.value() {
                0..=4 => 60.0,
                5..=39 => 55.0,
                _ => 200.0,
            };
            assert_eq!(secs, expected, "level {level}");
        }
    }
}
