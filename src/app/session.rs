//! Session orchestrator: the hexagonal core.
//!
//! [`CoilGunSession`] exclusively owns the register transport, both control
//! lines and the clock.  It lends them to the phase controllers one phase at
//! a time and guarantees the de-energised state at both ends of its life:
//!
//! - construction drives both lines low before anything else can happen;
//! - a failed phase drops both lines low before the error is returned;
//! - `Drop` drives both lines low again, best effort.
//!
//! ```text
//!  RegisterPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                   │        CoilGunSession        │
//! DigitalOutput ◀── │ charge → fire → discharge    │
//!         Clock ◀── └──────────────────────────────┘
//! ```

use log::{info, warn};

use crate::control::PhaseReport;
use crate::control::charge::ChargeController;
use crate::control::discharge::DischargeController;
use crate::control::fire::FireSequencer;
use crate::error::TransportError;

use super::events::SessionEvent;
use super::ports::{Clock, DigitalOutput, EventSink, RegisterCommands, RegisterPort};

/// Parameters of one full charge → fire → discharge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPlan {
    pub charge: ChargeController,
    pub fire: FireSequencer,
    pub discharge: DischargeController,
}

/// What the two polling phases observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub charge: PhaseReport,
    pub discharge: PhaseReport,
}

pub struct CoilGunSession<R, P, C>
where
    P: DigitalOutput,
{
    register: R,
    commands: RegisterCommands,
    charge_line: P,
    discharge_line: P,
    clock: C,
}

impl<R, P, C> CoilGunSession<R, P, C>
where
    R: RegisterPort,
    P: DigitalOutput,
    C: Clock,
{
    /// Take ownership of already-opened transports and force both lines low.
    pub fn new(
        register: R,
        commands: RegisterCommands,
        charge_line: P,
        discharge_line: P,
        clock: C,
    ) -> Result<Self, TransportError> {
        let mut session = Self {
            register,
            commands,
            charge_line,
            discharge_line,
            clock,
        };
        session.force_low()?;
        info!(
            "Session ready: charge-level cmd {}, discharge-current cmd {}",
            commands.charge_level, commands.discharge_current
        );
        Ok(session)
    }

    pub fn commands(&self) -> RegisterCommands {
        self.commands
    }

    // ── Phases ────────────────────────────────────────────────

    pub fn charge(
        &mut self,
        controller: &ChargeController,
        sink: &mut impl EventSink,
    ) -> Result<PhaseReport, TransportError> {
        controller.run(
            &mut self.register,
            self.commands.charge_level,
            &mut self.charge_line,
            &mut self.clock,
            sink,
        )
    }

    pub fn fire(
        &mut self,
        sequencer: &FireSequencer,
        sink: &mut impl EventSink,
    ) -> Result<(), TransportError> {
        sequencer.run(
            &mut self.charge_line,
            &mut self.discharge_line,
            &mut self.clock,
            sink,
        )
    }

    pub fn discharge(
        &mut self,
        controller: &DischargeController,
        sink: &mut impl EventSink,
    ) -> Result<PhaseReport, TransportError> {
        controller.run(
            &mut self.register,
            self.commands.charge_level,
            &mut self.discharge_line,
            &mut self.clock,
            sink,
        )
    }

    /// Charge, fire, discharge, strictly in order.  The first error skips
    /// the remaining phases; both lines are forced low before it returns.
    pub fn run(
        &mut self,
        plan: &RunPlan,
        sink: &mut impl EventSink,
    ) -> Result<RunReport, TransportError> {
        let result = self.run_phases(plan, sink);
        if result.is_err() {
            if let Err(e) = self.force_low() {
                warn!("failed to force outputs low after phase error: {e}");
            }
        }
        result
    }

    fn run_phases(
        &mut self,
        plan: &RunPlan,
        sink: &mut impl EventSink,
    ) -> Result<RunReport, TransportError> {
        let charge = self.charge(&plan.charge, sink)?;
        self.fire(&plan.fire, sink)?;
        let discharge = self.discharge(&plan.discharge, sink)?;
        Ok(RunReport { charge, discharge })
    }

    /// Explicit, reported teardown.  `Drop` repeats the writes afterwards,
    /// which is harmless.
    pub fn shutdown(mut self, sink: &mut impl EventSink) -> Result<(), TransportError> {
        self.force_low()?;
        sink.emit(&SessionEvent::SafeState);
        Ok(())
    }
}

impl<R, P, C> CoilGunSession<R, P, C>
where
    P: DigitalOutput,
{
    /// Drive both lines low.  The discharge line is attempted even when the
    /// charge line write fails; the first error is returned.  Idempotent.
    pub fn force_low(&mut self) -> Result<(), TransportError> {
        let charge = self.charge_line.set_low();
        let discharge = self.discharge_line.set_low();
        charge.and(discharge)
    }
}

impl<R, P, C> Drop for CoilGunSession<R, P, C>
where
    P: DigitalOutput,
{
    fn drop(&mut self) {
        if let Err(e) = self.force_low() {
            warn!("teardown could not force outputs low: {e}");
        }
    }
}
