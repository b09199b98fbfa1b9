//! CLI parse tests.

use super::{Cli, CliCommand, PlanPriority};
use crate::cli::commands::format_rate;
use adsched_core::scheduler::SchedulePriority;
use chrono::NaiveDate;
use clap::Parser;

fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

#[test]
fn cli_parse_observe_defaults() {
    match parse(&["adsched", "observe"]) {
        CliCommand::Observe { secs } => assert_eq!(secs, 10),
        _ => panic!("expected Observe"),
    }
}

#[test]
fn cli_parse_observe_secs() {
    match parse(&["adsched", "observe", "--secs", "3"]) {
        CliCommand::Observe { secs } => assert_eq!(secs, 3),
        _ => panic!("expected Observe"),
    }
}

#[test]
fn cli_parse_forecast() {
    match parse(&["adsched", "forecast", "--hours", "6", "--warmup", "0"]) {
        CliCommand::Forecast { hours, warmup } => {
            assert_eq!(hours, 6);
            assert_eq!(warmup, 0);
        }
        _ => panic!("expected Forecast"),
    }
}

#[test]
fn cli_parse_plan_priorities() {
    for (arg, expected) in [
        ("immediate", PlanPriority::Immediate),
        ("off-peak", PlanPriority::OffPeak),
        ("best-effort", PlanPriority::BestEffort),
    ] {
        match parse(&["adsched", "plan", arg]) {
            CliCommand::Plan {
                priority,
                min_bps,
                at,
            } => {
                assert_eq!(priority, expected);
                assert_eq!(min_bps, 0);
                assert!(at.is_none());
            }
            _ => panic!("expected Plan"),
        }
    }
}

#[test]
fn cli_parse_plan_min_bps() {
    match parse(&["adsched", "plan", "best-effort", "--min-bps", "500000"]) {
        CliCommand::Plan { priority, min_bps, .. } => {
            assert_eq!(SchedulePriority::from(priority), SchedulePriority::BestEffort);
            assert_eq!(min_bps, 500_000);
        }
        _ => panic!("expected Plan"),
    }
}

#[test]
fn cli_parse_plan_at() {
    match parse(&["adsched", "plan", "off-peak", "--at", "2024-06-03T14:30:00"]) {
        CliCommand::Plan { at, .. } => {
            let expected = NaiveDate::from_ymd_opt(2024, 6, 3)
                .unwrap()
                .and_hms_opt(14, 30, 0)
                .unwrap();
            assert_eq!(at, Some(expected));
        }
        _ => panic!("expected Plan"),
    }
}

#[test]
fn cli_rejects_malformed_plan_time() {
    assert!(Cli::try_parse_from(["adsched", "plan", "immediate", "--at", "tomorrow"]).is_err());
}

#[test]
fn cli_rejects_unknown_priority() {
    assert!(Cli::try_parse_from(["adsched", "plan", "whenever"]).is_err());
}

#[test]
fn cli_parse_config() {
    assert!(matches!(parse(&["adsched", "config"]), CliCommand::Config));
}

#[test]
fn rate_formatting() {
    assert_eq!(format_rate(512.0), "512 B/s");
    assert_eq!(format_rate(1536.0), "1.5 KB/s");
    assert_eq!(format_rate(10.0 * 1024.0 * 1024.0), "10.0 MB/s");
    assert_eq!(format_rate(-3.0), "0 B/s");
}
