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

use chargecurve_core::{ChargeCurve, CurveEstimate, PurgeCounts};
use chargecurve_types::{CurveSample, Level};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Table};
use std::fmt::Write as _;

/// Formatter for pretty ASCII tables
#[derive(Debug)]
pub struct TableFormatter;

impl TableFormatter {
    /// Curve as a table of level ranges sharing the same duration
    pub fn format_curve(estimate: &CurveEstimate) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            Cell::new("Levels").add_attribute(Attribute::Bold),
            Cell::new("Seconds / %").add_attribute(Attribute::Bold),
            Cell::new("Span").add_attribute(Attribute::Bold),
        ]);

        for (first, last, seconds) in step_ranges(&estimate.curve) {
            let span = estimate.curve.duration_between(first, next_level(last));
            table.add_row(vec![
                Cell::new(format!("{first} - {last}")),
                Cell::new(format!("{seconds:.1}")).set_alignment(CellAlignment::Right),
                Cell::new(format_duration(span)).set_alignment(CellAlignment::Right),
            ]);
        }

        let mut output = table.to_string();
        output.push('\n');
        let _ = writeln!(output, "Source: {}", estimate.source);
        let _ = writeln!(
            output,
            "Empty to full: {}",
            format_duration(estimate.curve.duration_between(Level::EMPTY, Level::FULL))
        );
        output
    }

    pub fn format_samples(samples: &[CurveSample]) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            Cell::new("Level").add_attribute(Attribute::Bold),
            Cell::new("Duration (s)").add_attribute(Attribute::Bold),
            Cell::new("Temp (°C)").add_attribute(Attribute::Bold),
            Cell::new("Used (Wh)").add_attribute(Attribute::Bold),
            Cell::new("Added (Wh)").add_attribute(Attribute::Bold),
        ]);

        for sample in samples {
            table.add_row(vec![
                Cell::new(sample.level),
                Cell::new(sample.duration_secs).set_alignment(CellAlignment::Right),
                Cell::new(
                    sample
                        .outside_temp_dc
                        .map_or_else(|| "-".to_owned(), |t| format!("{:.1}", f64::from(t) / 10.0)),
                ),
                Cell::new(optional(sample.energy_used_wh)),
                Cell::new(optional(sample.energy_added_wh)),
            ]);
        }
        table.to_string()
    }

    pub fn format_purge(scope: &str, counts: PurgeCounts) -> String {
        format!(
            "Purged {scope}: {} sessions, {} samples",
            counts.sessions, counts.samples
        )
    }
}

fn optional(value: Option<i64>) -> String {
    value.map_or_else(|| "-".to_owned(), |v| v.to_string())
}

/// Consecutive levels with identical durations, as `(first, last, seconds)`
fn step_ranges(curve: &ChargeCurve) -> Vec<(Level, Level, f64)> {
    let points: Vec<(Level, f64)> = curve.iter().collect();
    points
        .chunk_by(|a, b| a.1 == b.1)
        .filter_map(|run| {
            let (first, seconds) = *run.first()?;
            let (last, _) = *run.last()?;
            Some((first, last, seconds))
        })
        .collect()
}

fn next_level(level: Level) -> Level {
    Level::new(i64::from(level.value()) + 1).unwrap_or(Level::FULL)
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::integer_division,
    clippy::modulo_arithmetic,
    reason = "durations are non-negative and far below u64::MAX seconds"
)]
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.round().max(0.0) as u64;
    let (hours, minutes, secs) = (total / 3600, total / 60 % 60, total % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m {secs:02}s")
    } else {
        format!("{secs}s")
    }
}
