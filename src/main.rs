//! Coil gun main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  WordReader<I2cDevice>   SysfsOutput ×2   MonotonicClock     │
//! │  (RegisterPort)          (DigitalOutput)  (Clock)            │
//! │  LogEventSink (EventSink)                                    │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │        CoilGunSession: charge → fire → discharge       │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exit status is 0 after a complete run and 1 for usage, configuration or
//! transport errors.  Both control lines are low by the time the process
//! exits, whichever way it exits short of being killed.

#![deny(unused_must_use)]

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use coilgun::adapters::hardware;
use coilgun::adapters::log_sink::{self, LogEventSink};
use coilgun::cli::Cli;
use coilgun::config::CoilGunConfig;

fn main() -> ExitCode {
    // ── 1. Command line + config ──────────────────────────────
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help lands here too and, like any usage error, exits 1.
            let _ = e.print();
            return ExitCode::from(1);
        }
    };
    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("coilgun: {e}");
            return ExitCode::from(1);
        }
    };

    // ── 2. Logging ────────────────────────────────────────────
    if let Err(e) = log_sink::init(config.log_level) {
        eprintln!("coilgun: {e:#}");
        return ExitCode::from(1);
    }

    // ── 3. Run ────────────────────────────────────────────────
    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(config: &CoilGunConfig) -> Result<()> {
    info!("coilgun v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Charge duration {}ms, level {}",
        config.charge.duration_ms, config.charge.level
    );
    info!(
        "Fire pre-delay {}ms, duration {}ms, post-delay {}ms",
        config.fire.predelay_ms, config.fire.duration_ms, config.fire.postdelay_ms
    );
    info!(
        "Discharge duration {}ms, level {}",
        config.discharge.duration_ms, config.discharge.level
    );

    let mut session = hardware::open_session(config).context("hardware setup failed")?;
    let mut sink = LogEventSink::new();

    // On error the session is dropped on the way out, forcing both lines low.
    let report = session
        .run(&config.run_plan(), &mut sink)
        .context("run aborted")?;

    info!(
        "Summary: charge {:?} in {}ms, discharge {:?} in {}ms",
        report.charge.outcome,
        report.charge.elapsed.as_millis(),
        report.discharge.outcome,
        report.discharge.elapsed.as_millis()
    );

    session
        .shutdown(&mut sink)
        .context("could not force outputs low at shutdown")?;
    Ok(())
}
