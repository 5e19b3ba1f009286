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

//! ChargeCurve command-line entry point
//!
//! Opens the SQLite store named in the config and runs one command against it.

mod cli;
mod commands;
mod config;

use anyhow::{Context, Result};
use chargecurve_core::SqliteSampleStore;
use clap::Parser;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::commands::App;
use crate::config::CurveConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new("chargecurve=info,chargecurve_core=info"))?,
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CurveConfig::load(cli.config.as_deref())?;
    debug!(database = %config.database.path, "Loaded configuration");

    let store = SqliteSampleStore::open(&config.database.path)
        .with_context(|| format!("Failed to open database {}", config.database.path))?;
    let app = App::new(Arc::new(store), &config);

    let output = app.execute(cli.command).await?;
    println!("{output}");
    Ok(())
}
