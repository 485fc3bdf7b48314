#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `carstate` command-line front end: schema dump, variant listing and
//! JSON-lines replay through the normalizer.

mod cli;
mod error_fmt;
mod replay;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use carstate_core::{
    BuildError, CarState, NormalizerCfg, SessionConfig, SessionSchema, VehicleVariant,
};
use carstate_traits::{Clock, MonotonicClock};
use clap::Parser;
use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = run(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn run(cli: Cli) -> Result<()> {
    color_eyre::install()?;

    if let Commands::Variants = cli.cmd {
        init_tracing(cli.json, &cli.log_level, &carstate_config::Logging::default())?;
        return print_variants(&mut io::stdout().lock(), cli.json);
    }

    let cfg = carstate_config::load_file(&cli.config)?;
    cfg.validate()
        .map_err(|e| BuildError::RejectedConfig(format!("{e:#}")))?;
    init_tracing(cli.json, &cli.log_level, &cfg.logging)?;

    let session = SessionConfig::try_from(&cfg.vehicle)?;
    let control = NormalizerCfg::from(&cfg.control);
    let mut car = CarState::builder()
        .with_session(session)
        .with_control(control)
        .build()?;
    tracing::info!(
        variant = %car.profile().variant(),
        gas_interceptor = session.gas_interceptor_enabled,
        blind_spot_monitor = session.blind_spot_monitor_enabled,
        rate_hz = cfg.control.rate_hz,
        "session configured"
    );

    match cli.cmd {
        Commands::Schema => print_schema(&mut io::stdout().lock(), &car.schema(), cli.json),
        Commands::Replay {
            input,
            realtime,
            limit,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            {
                let flag = shutdown.clone();
                ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                    .wrap_err("install Ctrl-C handler")?;
            }
            let reader = open_input(&input)?;
            let clock = MonotonicClock::new();
            let pacing: Option<&dyn Clock> = realtime.then_some(&clock as &dyn Clock);
            let outcome = replay::run_replay(
                &mut car,
                reader,
                &mut io::stdout().lock(),
                pacing,
                limit,
                &shutdown,
            )?;
            tracing::info!(
                cycles = outcome.cycles,
                interrupted = outcome.interrupted,
                lockout = car.low_speed_lockout(),
                "replay finished"
            );
            Ok(())
        }
        Commands::Variants => Ok(()),
    }
}

fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let f = File::open(path).wrap_err_with(|| format!("open replay input {}", path.display()))?;
    Ok(Box::new(BufReader::new(f)))
}

/// Console logs go to stderr so stdout stays machine-readable.
fn init_tracing(json: bool, level: &str, logging: &carstate_config::Logging) -> Result<()> {
    let level = logging.level.as_deref().unwrap_or(level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if json {
        layers.push(fmt::layer().json().with_writer(io::stderr).boxed());
    } else {
        layers.push(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .boxed(),
        );
    }

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file}"))?;
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        );
    }

    // A second init (e.g. in tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init();
    Ok(())
}

fn print_schema<W: Write>(out: &mut W, schema: &SessionSchema, json: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, schema)?;
        writeln!(out)?;
        return Ok(());
    }
    for (bus, s) in [("pt", &schema.pt), ("cam", &schema.cam)] {
        writeln!(out, "[{bus}] signals ({})", s.signals.len())?;
        for r in &s.signals {
            let mux = r.mux.map_or_else(|| "-".to_string(), |m| m.to_string());
            writeln!(out, "  {:<24} {:<28} {mux}", r.message, r.signal)?;
        }
        writeln!(out, "[{bus}] checks ({})", s.checks.len())?;
        for c in &s.checks {
            writeln!(out, "  {:<24} {} Hz", c.message, c.rate_hz)?;
        }
    }
    Ok(())
}

fn print_variants<W: Write>(out: &mut W, json: bool) -> Result<()> {
    if json {
        let rows: Vec<serde_json::Value> = VehicleVariant::ALL
            .iter()
            .map(|v| {
                let d = v.descriptor();
                serde_json::json!({
                    "name": d.name,
                    "second_gen_assist": d.second_gen_assist,
                    "secondary_angle_sensor": d.secondary_angle_sensor,
                    "legacy": d.legacy,
                    "no_stop_timer": d.no_stop_timer,
                })
            })
            .collect();
        serde_json::to_writer_pretty(&mut *out, &rows)?;
        writeln!(out)?;
        return Ok(());
    }
    writeln!(
        out,
        "{:<20} {:>8} {:>10} {:>7} {:>13}",
        "variant", "tss2", "secondary", "legacy", "no_stop_timer"
    )?;
    for v in VehicleVariant::ALL {
        let d = v.descriptor();
        writeln!(
            out,
            "{:<20} {:>8} {:>10} {:>7} {:>13}",
            d.name, d.second_gen_assist, d.secondary_angle_sensor, d.legacy, d.no_stop_timer
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_table_lists_every_variant() {
        let mut buf = Vec::new();
        print_variants(&mut buf, false).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), VehicleVariant::ALL.len() + 1);
        assert!(text.contains("corolla_2010"));
    }

    #[test]
    fn schema_table_marks_unmultiplexed_signals() {
        let profile = SessionConfig::new(VehicleVariant::CorollaTss2).into();
        let schema = carstate_core::build_schema(&profile);
        let mut buf = Vec::new();
        print_schema(&mut buf, &schema, false).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let acc = text.lines().find(|l| l.contains("ACC_TYPE")).unwrap();
        assert!(acc.trim_end().ends_with('-'));
    }
}
