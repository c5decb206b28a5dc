//! Discharge phase: bleed the bank through the discharge line until the
//! charge level is at or below a safe floor.
//!
//! Unlike charging there is no maintain mode: the first poll at or below the
//! target ends the phase, deadline or not.

use std::time::Duration;

use log::{debug, info};

use crate::app::events::SessionEvent;
use crate::app::ports::{
    ChargeLevel, Clock, DigitalOutput, EventSink, RegisterCommand, RegisterPort,
};
use crate::error::TransportError;

use super::{DEFAULT_POLL_INTERVAL, Deadline, OutputGuard, PhaseOutcome, PhaseReport};

/// Parameters of one discharge phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DischargeController {
    /// Level considered "empty".
    pub target: ChargeLevel,
    pub deadline: Deadline,
    pub poll_interval: Duration,
}

impl DischargeController {
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

    /// Run the phase until the level floor or the deadline.  The discharge
    /// line is low when this returns, `Ok` or `Err`.
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
        sink.emit(&SessionEvent::DischargeStarted {
            target: self.target,
            deadline: self.deadline,
        });
        info!("Preparing for discharge: target {}, deadline {}", self.target, self.deadline);

        let started = clock.now();
        let mut line = OutputGuard::new(output);
        let mut discharging = false;
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
            debug!("discharge poll {polls}: level {level}, target {}", self.target);

            if level <= self.target {
                sink.emit(&SessionEvent::Discharged {
                    level,
                    target: self.target,
                });
                break PhaseOutcome::Reached;
            }

            if !discharging {
                activations = activations.saturating_add(1);
                sink.emit(&SessionEvent::Discharging {
                    level,
                    target: self.target,
                });
            }
            discharging = true;
            line.set_high()?;

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
            "Discharge done: {:?} after {} polls in {}ms",
            report.outcome,
            report.polls,
            report.elapsed.as_millis()
        );
        sink.emit(&SessionEvent::DischargeDone(report));
        Ok(report)
    }
}
