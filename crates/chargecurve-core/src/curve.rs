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

use chargecurve_types::{LEVEL_COUNT, Level};
use serde::Serialize;
use std::fmt;

use crate::stats;

/// Aggregated duration measured at one level
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelDuration {
    pub level: Level,
    pub seconds: f64,
}

/// Everything the estimator needs to know about one vehicle/location pair,
/// read from the store in a single consistent snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurveHistory {
    /// Median duration per sampled level, ascending by level
    pub level_medians: Vec<LevelDuration>,

    /// Mean duration across every sample regardless of level
    pub sample_average_secs: Option<f64>,

    /// Mean seconds-per-percent implied by sessions that stopped short of target
    pub session_rate_secs: Option<f64>,
}

impl CurveHistory {
    /// Build medians and the overall average from raw `(level, duration)` rows.
    pub fn from_durations(rows: impl IntoIterator<Item = (Level, u32)>) -> Self {
        let mut rows: Vec<(Level, f64)> = rows
            .into_iter()
            .map(|(level, secs)| (level, f64::from(secs)))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));

        let level_medians = rows
            .chunk_by(|a, b| a.0 == b.0)
            .filter_map(|group| {
                let durations: Vec<f64> = group.iter().map(|(_, secs)| *secs).collect();
                let level = group.first()?.0;
                stats::median(&durations).map(|seconds| LevelDuration { level, seconds })
            })
            .collect();

        let all: Vec<f64> = rows.iter().map(|(_, secs)| *secs).collect();

        Self {
            level_medians,
            sample_average_secs: stats::mean(&all),
            session_rate_secs: None,
        }
    }

    #[must_use]
    pub fn with_session_rate(mut self, rate: Option<f64>) -> Self {
        self.session_rate_secs = rate;
        self
    }

    pub fn has_samples(&self) -> bool {
        !self.level_medians.is_empty()
    }
}

/// Expected seconds to advance one percent, for every level 0..=100
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeCurve {
    seconds: Vec<f64>,
}

impl ChargeCurve {
    /// Same duration at every level
    pub fn constant(seconds: f64) -> Self {
        Self {
            seconds: vec![seconds; LEVEL_COUNT],
        }
    }

    /// Right-continuous step function through `steps`.
    ///
    /// `steps` must be ascending by level. Levels below the first step take
    /// `seed`; every later level holds the most recent step at or below it.
    pub fn from_steps(seed: f64, steps: &[LevelDuration]) -> Self {
        let mut pending = steps.iter().peekable();
        let mut current = seed;

        let seconds = Level::all()
            .map(|level| {
                while let Some(step) = pending.next_if(|s| s.level <= level) {
                    current = step.seconds;
                }
                current
            })
            .collect();

        Self { seconds }
    }

    pub fn seconds_at(&self, level: Level) -> f64 {
        self.seconds.get(level.index()).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Level, f64)> + '_ {
        Level::all().zip(self.seconds.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.seconds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seconds.is_empty()
    }

    /// Predicted seconds to charge from `from` up to `to` (0 when `to <= from`)
    pub fn duration_between(&self, from: Level, to: Level) -> f64 {
        self.seconds
            .get(from.index()..to.index())
            .map_or(0.0, |range| range.iter().sum())
    }
}

/// Which input seeded the curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveSource {
    /// Per-level medians from recorded samples
    Measured,
    /// Average of all samples, ignoring level
    SampleAverage,
    /// Derived from sessions that finished below their target
    SessionRate,
    /// No history at all
    Default,
}

impl fmt::Display for CurveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Measured => "measured",
            Self::SampleAverage => "sample average",
            Self::SessionRate => "session rate",
            Self::Default => "default",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveEstimate {
    pub curve: ChargeCurve,
    pub source: CurveSource,
}
