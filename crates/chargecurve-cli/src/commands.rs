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

use anyhow::{Context, Result, bail};
use chargecurve_core::{
    CurveEngine, CurveEstimate, MaintenanceConfig, MaintenanceTask, SampleStore,
};
use chargecurve_types::{ChargeId, Level, LocationId, NewSession, VehicleId};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::cli::{
    Commands, CurveArgs, MaintainArgs, PurgeTarget, SessionCommand, SessionFinishArgs,
    SessionKeyArgs, SessionStartArgs, TableFormatter, format_duration,
};
use crate::config::CurveConfig;

#[derive(Serialize)]
struct CurveReport<'a> {
    #[serde(flatten)]
    estimate: &'a CurveEstimate,
    #[serde(skip_serializing_if = "Option::is_none")]
    predicted_secs: Option<f64>,
}

fn parse_level(value: i64, what: &str) -> Result<Level> {
    Level::new(value).with_context(|| format!("{what} {value} is outside 0..=100"))
}

/// Notify `shutdown` once `signal` fires. A listener that fails to install
/// leaves the task running instead of stopping it straight away.
async fn forward_shutdown<F>(signal: F, shutdown: Arc<Notify>)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            info!("Shutdown signal received");
            shutdown.notify_one();
        }
        Err(e) => warn!("Cannot listen for Ctrl-C, maintenance runs until killed: {e}"),
    }
}

/// Executes one parsed command and returns what should be printed
#[derive(Debug)]
pub struct App<S> {
    engine: CurveEngine<S>,
    maintenance: MaintenanceConfig,
}

impl<S: SampleStore + 'static> App<S> {
    pub fn new(store: Arc<S>, config: &CurveConfig) -> Self {
        Self {
            engine: CurveEngine::new(store, config.estimator.clone()),
            maintenance: config.maintenance.clone(),
        }
    }

    pub async fn execute(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Session { action } => match action {
                SessionCommand::Start(args) => self.start_session(args).await,
                SessionCommand::Finish(args) => self.finish_session(args).await,
                SessionCommand::Show(args) => self.show_session(args).await,
            },
            Commands::Record(args) => {
                let sample = self.engine.record_sample(args.into_report()).await?;
                Ok(format!(
                    "Recorded {} at {}: {}s",
                    sample.charge_id, sample.level, sample.duration_secs
                ))
            }
            Commands::Curve(args) => self.curve(args).await,
            Commands::Calibration(args) => {
                let best = self
                    .engine
                    .best_calibrated_level(&VehicleId::new(args.vehicle), &ChargeId::new(args.charge))
                    .await?;
                Ok(match best {
                    Some(level) => format!("Best calibrated level: {level}"),
                    None => "No samples recorded at this session's location".to_owned(),
                })
            }
            Commands::Purge { target } => self.purge(target).await,
            Commands::Maintain(args) => self.maintain(args).await,
        }
    }

    async fn start_session(&self, args: SessionStartArgs) -> Result<String> {
        let session = self
            .engine
            .register_session(NewSession {
                vehicle_id: VehicleId::new(args.vehicle),
                charge_id: ChargeId::new(args.charge),
                location_id: LocationId::new(args.location),
                target_level: parse_level(args.target, "target level")?,
                started_at: chrono::Utc::now(),
            })
            .await?;
        Ok(format!(
            "Session {} for {} at {} (target {})",
            session.charge_id, session.vehicle_id, session.location_id, session.target_level
        ))
    }

    async fn finish_session(&self, args: SessionFinishArgs) -> Result<String> {
        let session = self
            .engine
            .finish_session(
                &VehicleId::new(args.vehicle),
                &ChargeId::new(args.charge),
                args.end_level,
                args.estimated_minutes,
            )
            .await?;
        let end = session
            .end_level
            .map_or_else(|| "-".to_owned(), |l| l.to_string());
        Ok(format!(
            "Session {} finished at {end} (target {})",
            session.charge_id, session.target_level
        ))
    }

    async fn show_session(&self, args: SessionKeyArgs) -> Result<String> {
        let vehicle_id = VehicleId::new(args.vehicle);
        let charge_id = ChargeId::new(args.charge);
        let store = self.engine.store();

        let Some(session) = store.session(&vehicle_id, &charge_id).await? else {
            bail!("No session {charge_id} for vehicle {vehicle_id}");
        };
        let samples = store.session_samples(&vehicle_id, &charge_id).await?;

        let mut output = format!(
            "Session {} for {} at {}\nStarted: {}\nTarget: {}\n",
            session.charge_id,
            session.vehicle_id,
            session.location_id,
            session.started_at.to_rfc3339(),
            session.target_level,
        );
        if let Some(end) = session.end_level {
            output.push_str(&format!("Ended at: {end}\n"));
        }
        if let Some(rate) = session.shortfall_rate_secs() {
            output.push_str(&format!("Shortfall rate: {rate:.1} s/%\n"));
        }
        output.push_str(&TableFormatter::format_samples(&samples));
        Ok(output)
    }

    async fn curve(&self, args: CurveArgs) -> Result<String> {
        let estimate = self
            .engine
            .estimate_curve(&VehicleId::new(args.vehicle), &LocationId::new(args.location))
            .await?;

        let predicted_secs = if let (Some(from), Some(to)) = (args.from, args.to) {
            let from = parse_level(from, "from level")?;
            let to = parse_level(to, "to level")?;
            Some(estimate.curve.duration_between(from, to))
        } else {
            None
        };

        if args.json {
            let report = CurveReport {
                estimate: &estimate,
                predicted_secs,
            };
            return serde_json::to_string_pretty(&report).context("Failed to serialize curve");
        }

        let mut output = TableFormatter::format_curve(&estimate);
        if let Some(secs) = predicted_secs {
            output.push_str(&format!("Predicted: {}\n", format_duration(secs)));
        }
        Ok(output)
    }

    async fn purge(&self, target: PurgeTarget) -> Result<String> {
        let store = self.engine.store();
        let (scope, counts) = match target {
            PurgeTarget::Vehicle { id } => {
                let counts = store.purge_vehicle(&VehicleId::new(id.as_str())).await?;
                (format!("vehicle {id}"), counts)
            }
            PurgeTarget::Location { id } => {
                let counts = store.purge_location(&LocationId::new(id.as_str())).await?;
                (format!("location {id}"), counts)
            }
        };
        info!(%scope, sessions = counts.sessions, samples = counts.samples, "Purged history");
        Ok(TableFormatter::format_purge(&scope, counts))
    }

    async fn maintain(&self, args: MaintainArgs) -> Result<String> {
        let task = MaintenanceTask::new(Arc::clone(self.engine.store()), self.maintenance.clone());
        if args.once {
            let removed = task.run_once().await?;
            return Ok(format!("Swept {removed} abandoned sessions"));
        }

        let shutdown = Arc::new(Notify::new());
        tokio::spawn(forward_shutdown(tokio::signal::ctrl_c(), Arc::clone(&shutdown)));

        task.run(shutdown).await;
        Ok("Maintenance stopped".to_owned())
    }
}
