//! CLI for the adsched download scheduling core.

mod commands;

use adsched_core::config::SchedConfig;
use adsched_core::scheduler::SchedulePriority;
use anyhow::Result;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand, ValueEnum};

use commands::{run_config, run_forecast, run_observe, run_plan};

/// Top-level CLI for adsched.
#[derive(Debug, Parser)]
#[command(name = "adsched")]
#[command(about = "adsched: bandwidth-aware download scheduling", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Scheduling priority accepted by `plan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlanPriority {
    Immediate,
    OffPeak,
    BestEffort,
}

impl From<PlanPriority> for SchedulePriority {
    fn from(p: PlanPriority) -> Self {
        match p {
            PlanPriority::Immediate => SchedulePriority::Immediate,
            PlanPriority::OffPeak => SchedulePriority::OffPeak,
            PlanPriority::BestEffort => SchedulePriority::BestEffort,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Sample network throughput and print each sample.
    Observe {
        /// How long to observe, in seconds.
        #[arg(long, default_value = "10", value_name = "N")]
        secs: u64,
    },

    /// Print hourly bandwidth predictions (observes first, then saves history).
    Forecast {
        /// Number of hourly predictions to print.
        #[arg(long, default_value = "24", value_name = "H")]
        hours: u32,
        /// Seconds to observe before predicting.
        #[arg(long, default_value = "5", value_name = "S")]
        warmup: u64,
    },

    /// Show when a download submitted now would be scheduled.
    Plan {
        #[arg(value_enum)]
        priority: PlanPriority,
        /// Minimum acceptable bandwidth in bytes/sec (best-effort only).
        #[arg(long, default_value = "0", value_name = "B")]
        min_bps: u64,
        /// Plan as if submitted at this local time (e.g. 2024-06-03T14:00:00).
        #[arg(long, value_name = "DATETIME")]
        at: Option<NaiveDateTime>,
    },

    /// Show the config file path and effective values.
    Config,
}

impl Cli {
    pub async fn run(self, cfg: &SchedConfig) -> Result<()> {
        match self.command {
            CliCommand::Observe { secs } => run_observe(cfg, secs).await?,
            CliCommand::Forecast { hours, warmup } => run_forecast(cfg, hours, warmup).await?,
            CliCommand::Plan {
                priority,
                min_bps,
                at,
            } => run_plan(cfg, priority.into(), min_bps, at)?,
            CliCommand::Config => run_config(cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
