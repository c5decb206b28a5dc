//! Outbound session events.
//!
//! The [`CoilGunSession`](super::session::CoilGunSession) and the phase
//! controllers emit these through the [`EventSink`](super::ports::EventSink)
//! port.  They are the operator-facing record of a run: phase starts,
//! charging/stop-charging transitions, the fire pulse, and the discharged
//! confirmation.

use std::time::Duration;

use crate::control::{Deadline, PhaseReport};

use super::ports::ChargeLevel;

/// Structured events emitted by the control core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The charge phase is about to poll.
    ChargeStarted { target: ChargeLevel, deadline: Deadline },
    /// Level below target; the charge output went high.
    Charging { level: ChargeLevel, target: ChargeLevel },
    /// Level reached target after charging; the charge output went low.
    StopCharging { level: ChargeLevel, target: ChargeLevel },
    /// The charge phase returned.
    ChargeDone(PhaseReport),

    /// The fire pulse is about to start.
    FireStarted {
        pre_delay: Duration,
        pulse: Duration,
        post_delay: Duration,
    },
    /// The discharge output went high for the pulse.
    PulseOn,
    /// The pulse ended and both outputs are low.
    PulseOff,
    /// The post-delay elapsed.
    FireDone,

    /// The discharge phase is about to poll.
    DischargeStarted { target: ChargeLevel, deadline: Deadline },
    /// Level above target; the discharge output went high.
    Discharging { level: ChargeLevel, target: ChargeLevel },
    /// Level at or below target.
    Discharged { level: ChargeLevel, target: ChargeLevel },
    /// The discharge phase returned.
    DischargeDone(PhaseReport),

    /// Shutdown drove both outputs low.
    SafeState,
}
