//! Log output: subscriber setup and the log-based event sink adapter.
//!
//! [`init`] routes the `log` facade to stderr through a `tracing-subscriber`
//! fmt layer.  [`LogEventSink`] implements [`EventSink`] by writing session
//! events to that facade.  Transitions the operator cares about (charging,
//! stop charging, fire, discharged) are `info`; the per-phase start/done
//! records carry observed vs target levels.

use log::{LevelFilter, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter as SubscriberLevel;

use crate::app::events::SessionEvent;
use crate::app::ports::EventSink;
use crate::control::{PhaseOutcome, PhaseReport};

/// Install the process-wide logger at `level`.  A `RUST_LOG` directive in
/// the environment takes precedence.
pub fn init(level: LevelFilter) -> anyhow::Result<()> {
    let default = match level {
        LevelFilter::Off => SubscriberLevel::OFF,
        LevelFilter::Error => SubscriberLevel::ERROR,
        LevelFilter::Warn => SubscriberLevel::WARN,
        LevelFilter::Info => SubscriberLevel::INFO,
        LevelFilter::Debug => SubscriberLevel::DEBUG,
        LevelFilter::Trace => SubscriberLevel::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("cannot install logger: {e}"))
}

/// Adapter that logs every [`SessionEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn last_level(report: &PhaseReport) -> String {
    report
        .last_level
        .map_or_else(|| "-".to_string(), |l| l.to_string())
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::ChargeStarted { target, deadline } => {
                info!("CHARGE | start | target={} deadline={}", target, deadline);
            }
            SessionEvent::Charging { level, target } => {
                info!("CHARGE | charging | level={} target={}", level, target);
            }
            SessionEvent::StopCharging { level, target } => {
                info!("CHARGE | stop charging | level={} target={}", level, target);
            }
            SessionEvent::ChargeDone(r) => {
                info!(
                    "CHARGE | done | {:?} | polls={} level={} activations={} elapsed={}ms",
                    r.outcome,
                    r.polls,
                    last_level(r),
                    r.activations,
                    r.elapsed.as_millis()
                );
            }
            SessionEvent::FireStarted {
                pre_delay,
                pulse,
                post_delay,
            } => {
                info!(
                    "FIRE | start | pre={}ms pulse={}ms post={}ms",
                    pre_delay.as_millis(),
                    pulse.as_millis(),
                    post_delay.as_millis()
                );
            }
            SessionEvent::PulseOn => info!("FIRE | pulse on"),
            SessionEvent::PulseOff => info!("FIRE | pulse off"),
            SessionEvent::FireDone => info!("FIRE | done"),
            SessionEvent::DischargeStarted { target, deadline } => {
                info!("DISCHARGE | start | target={} deadline={}", target, deadline);
            }
            SessionEvent::Discharging { level, target } => {
                info!("DISCHARGE | discharging | level={} target={}", level, target);
            }
            SessionEvent::Discharged { level, target } => {
                info!("DISCHARGE | discharged | level={} target={}", level, target);
            }
            SessionEvent::DischargeDone(r) => {
                // A bank still above the floor when time ran out is worth a warning.
                if r.outcome == PhaseOutcome::DeadlineElapsed {
                    warn!(
                        "DISCHARGE | deadline elapsed before floor | polls={} level={} elapsed={}ms",
                        r.polls,
                        last_level(r),
                        r.elapsed.as_millis()
                    );
                } else {
                    info!(
                        "DISCHARGE | done | polls={} level={} elapsed={}ms",
                        r.polls,
                        last_level(r),
                        r.elapsed.as_millis()
                    );
                }
            }
            SessionEvent::SafeState => info!("SAFE | outputs low"),
        }
    }
}
