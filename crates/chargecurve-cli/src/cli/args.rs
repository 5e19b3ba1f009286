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

use chargecurve_types::{FieldUpdate, SampleReport};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chargecurve")]
#[command(version, about = "Learn per-percent charging durations and estimate charge curves")]
#[command(
    long_about = "Records how long a vehicle takes to charge through each battery percentage\n\
    and turns that history into a 0-100% charge curve for a vehicle at a location.\n\
    \nExamples:\n  \
    chargecurve session start --vehicle car-1 --charge c-42 --location home --target 80\n  \
    chargecurve record --vehicle car-1 --charge c-42 --level 35 --duration 95\n  \
    chargecurve curve --vehicle car-1 --location home --from 20 --to 80\n  \
    chargecurve maintain --once"
)]
pub struct Cli {
    /// Config file (defaults to ./chargecurve.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open or close a charge session
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },

    /// Record the time spent at one battery level
    Record(RecordArgs),

    /// Estimate the charge curve of a vehicle at a location
    Curve(CurveArgs),

    /// Highest level with recorded samples at the location of a session
    Calibration(SessionKeyArgs),

    /// Delete stored sessions and samples
    Purge {
        #[command(subcommand)]
        target: PurgeTarget,
    },

    /// Sweep abandoned sessions, once or on the configured interval
    Maintain(MaintainArgs),
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Register a session at a location
    Start(SessionStartArgs),
    /// Mark a session finished with its reached level
    Finish(SessionFinishArgs),
    /// Print a session and its recorded samples
    Show(SessionKeyArgs),
}

#[derive(Args, Debug)]
pub struct SessionStartArgs {
    #[arg(long)]
    pub vehicle: String,

    #[arg(long)]
    pub charge: String,

    #[arg(long)]
    pub location: String,

    /// Target battery level (0-100)
    #[arg(long, default_value_t = 100)]
    pub target: i64,
}

#[derive(Args, Debug)]
pub struct SessionFinishArgs {
    #[arg(long)]
    pub vehicle: String,

    #[arg(long)]
    pub charge: String,

    /// Battery level reached when charging stopped
    #[arg(long, allow_negative_numbers = true)]
    pub end_level: i64,

    /// Minutes the charger still estimated to reach the target
    #[arg(long)]
    pub estimated_minutes: Option<u32>,
}

#[derive(Args, Debug)]
pub struct RecordArgs {
    #[arg(long)]
    pub vehicle: String,

    #[arg(long)]
    pub charge: String,

    /// Battery level the duration was measured at
    #[arg(long, allow_negative_numbers = true)]
    pub level: i64,

    /// Seconds spent at this level
    #[arg(long, allow_negative_numbers = true)]
    pub duration: i64,

    /// Outside temperature in tenths of a degree Celsius
    #[arg(long, allow_negative_numbers = true, conflicts_with = "clear_temp")]
    pub temp: Option<i32>,

    #[arg(long)]
    pub clear_temp: bool,

    /// Energy drawn from the grid in Wh
    #[arg(long, conflicts_with = "clear_energy_used")]
    pub energy_used: Option<i64>,

    #[arg(long)]
    pub clear_energy_used: bool,

    /// Energy stored in the battery in Wh
    #[arg(long, conflicts_with = "clear_energy_added")]
    pub energy_added: Option<i64>,

    #[arg(long)]
    pub clear_energy_added: bool,
}

impl RecordArgs {
    pub fn into_report(self) -> SampleReport {
        SampleReport {
            outside_temp_dc: field_update(self.temp, self.clear_temp),
            energy_used_wh: field_update(self.energy_used, self.clear_energy_used),
            energy_added_wh: field_update(self.energy_added, self.clear_energy_added),
            ..SampleReport::duration(self.vehicle, self.charge, self.level, self.duration)
        }
    }
}

/// A value or its `--clear-*` flag replaces the stored column; neither keeps it
fn field_update<T>(value: Option<T>, clear: bool) -> FieldUpdate<T> {
    if value.is_some() || clear {
        FieldUpdate::replace_with(value)
    } else {
        FieldUpdate::Keep
    }
}

#[derive(Args, Debug)]
pub struct CurveArgs {
    #[arg(long)]
    pub vehicle: String,

    #[arg(long)]
    pub location: String,

    /// Also predict the time to charge from this level...
    #[arg(long, requires = "to")]
    pub from: Option<i64>,

    /// ...up to this level
    #[arg(long, requires = "from")]
    pub to: Option<i64>,

    /// Print the estimate as JSON
    #[arg(long)]
    pub json: bool,
}

/// Identifies one session; shared by `session show` and `calibration`
#[derive(Args, Debug)]
pub struct SessionKeyArgs {
    #[arg(long)]
    pub vehicle: String,

    #[arg(long)]
    pub charge: String,
}

#[derive(Subcommand, Debug)]
pub enum PurgeTarget {
    /// Everything recorded for a vehicle
    Vehicle { id: String },
    /// Everything recorded at a location
    Location { id: String },
}

#[derive(Args, Debug)]
pub struct MaintainArgs {
    /// Run a single sweep and exit
    #[arg(long)]
    pub once: bool,
}
