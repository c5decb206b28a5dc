//! Charge phase: bang-bang control of the charge-enable line.
//!
//! Every poll reads the charge-level register and compares it with the
//! target.  Below target the line is driven high, at or above it the line is
//! driven low.  The 1 ms poll is fast relative to the bank's charge curve, so
//! no hysteresis or PID is needed; the register read is the feedback.
//!
//! ## Exit rules
//!
//! - **No deadline**: the first poll at or above target ends the phase.
//! - **Deadline**: reaching target only turns the line off; the loop keeps
//!   polling (maintain mode) and re-charges on sag until the deadline.
//!
//! The line is forced low after the loop on every path.

use std::time::Duration;

use log::{debug, info};

use crate::app::events::SessionEvent;
use crate::app::ports::{
    ChargeLevel, Clock, DigitalOutput, EventSink, RegisterCommand, RegisterPort,
};
use crate::error::TransportError;

use super::{DEFAULT_POLL_INTERVAL, Deadline, OutputGuard, PhaseOutcome, PhaseReport};

/// Parameters of one charge phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeController {
    pub target: ChargeLevel,
    pub deadline: Deadline,
    pub poll_interval: Duration,
}

impl ChargeController {
    pub fn new(target: ChargeLevel, deadline: Deadline) -> Self {
        Self {
            target,
            deadline,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run the phase to completion or deadline.
    ///
    /// A register or line error aborts immediately; the charge line is still
    /// dropped low (best effort) before the error propagates.
    pub fn run<R, P, C>(
        &self,
        register: &mut R,
        command: RegisterCommand,
        output: &mut P,
        clock: &mut C,
        sink: &mut impl EventSink,
    ) -> Result<PhaseReport, TransportError>
    where
        R: RegisterPort,
        P: DigitalOutput,
        C: Clock,
    {
        sink.emit(&SessionEvent::ChargeStarted {
            target: self.target,
            deadline: self.deadline,
        });
        info!("Preparing for charge: target {}, deadline {}", self.target, self.deadline);

        let started = clock.now();
        let mut line = OutputGuard::new(output);
        let mut charging = false;
        let mut polls: u32 = 0;
        let mut activations: u32 = 0;
        let mut last_level = None;

        let outcome = loop {
            if self.deadline.expired(clock.now().saturating_sub(started)) {
                break PhaseOutcome::DeadlineElapsed;
            }

            let level = register.read_word(command)?;
            polls = polls.saturating_add(1);
            last_level = Some(level);
            debug!("charge poll {polls}: level {level}, target {}", self.target);

            if level >= self.target {
                if charging {
                    sink.emit(&SessionEvent::StopCharging {
                        level,
                        target: self.target,
                    });
                }
                charging = false;
                if !self.deadline.is_bounded() {
                    break PhaseOutcome::Reached;
                }
                line.set_low()?;
            } else {
                if !charging {
                    activations = activations.saturating_add(1);
                    sink.emit(&SessionEvent::Charging {
                        level,
                        target: self.target,
                    });
                }
                charging = true;
                line.set_high()?;
            }

            clock.sleep(self.poll_interval);
        };

        line.release()?;

        let report = PhaseReport {
            outcome,
            polls,
            last_level,
            activations,
            elapsed: clock.now().saturating_sub(started),
        };
        info!(
            "Charge done: {:?} after {} polls in {}ms",
            report.outcome,
            report.polls,
            report.elapsed.as_millis()
        );
        sink.emit(&SessionEvent::ChargeDone(report));
        Ok(report)
    }
}
