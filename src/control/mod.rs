//! Charge, fire and discharge phase logic.
//!
//! Each phase borrows the lines and register it needs from the
//! [`CoilGunSession`](crate::app::session::CoilGunSession) for exactly one
//! run and hands them back with the driven line low, whatever the exit path.

pub mod charge;
pub mod discharge;
pub mod fire;

use std::time::Duration;

use log::warn;

use crate::app::ports::{ChargeLevel, DigitalOutput};
use crate::error::TransportError;

/// Delay between register polls in the charge and discharge loops.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

// ---------------------------------------------------------------------------
// Deadline
// ---------------------------------------------------------------------------

/// Wall-clock cutoff for a polling phase, measured from phase start on the
/// session clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Poll until the level condition holds.
    Unbounded,
    /// Stop polling once this much time has elapsed.
    After(Duration),
}

impl Deadline {
    /// `0` means "no deadline", anything else is a hard cutoff.
    pub fn from_millis(ms: u32) -> Self {
        if ms == 0 {
            Self::Unbounded
        } else {
            Self::After(Duration::from_millis(u64::from(ms)))
        }
    }

    pub fn is_bounded(&self) -> bool {
        matches!(self, Self::After(_))
    }

    /// True once `elapsed` has reached the cutoff.  Never true when unbounded.
    pub fn expired(&self, elapsed: Duration) -> bool {
        match self {
            Self::Unbounded => false,
            Self::After(limit) => elapsed >= *limit,
        }
    }
}

impl std::fmt::Display for Deadline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unbounded => write!(f, "none"),
            Self::After(d) => write!(f, "{}ms", d.as_millis()),
        }
    }
}

// ---------------------------------------------------------------------------
// Phase results
// ---------------------------------------------------------------------------

/// Why a polling phase returned.  Running out of time is a normal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// A poll observed the terminal level condition.
    Reached,
    /// The deadline elapsed first (or, for a bounded charge, the maintain
    /// window ran out).
    DeadlineElapsed,
}

/// Summary of one charge or discharge phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseReport {
    pub outcome: PhaseOutcome,
    /// Register reads performed.
    pub polls: u32,
    /// Last level read, `None` if the deadline expired before the first poll.
    pub last_level: Option<ChargeLevel>,
    /// Number of off→on transitions of the driven output.
    pub activations: u32,
    /// Clock time spent inside the phase.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Output guard
// ---------------------------------------------------------------------------

/// Holds a control line for the duration of a phase and drives it low when
/// dropped, so an early `?` return never leaves the line energised.
///
/// The normal exit path calls [`release`](Self::release), which performs the
/// same write but reports its error to the caller.
pub(crate) struct OutputGuard<'a, P: DigitalOutput> {
    pin: &'a mut P,
    armed: bool,
}

impl<'a, P: DigitalOutput> OutputGuard<'a, P> {
    pub(crate) fn new(pin: &'a mut P) -> Self {
        Self { pin, armed: true }
    }

    pub(crate) fn set_high(&mut self) -> Result<(), TransportError> {
        self.pin.set_high()
    }

    pub(crate) fn set_low(&mut self) -> Result<(), TransportError> {
        self.pin.set_low()
    }

    /// Drive the line low and disarm the drop handler.
    pub(crate) fn release(mut self) -> Result<(), TransportError> {
        self.armed = false;
        self.pin.set_low()
    }
}

impl<P: DigitalOutput> Drop for OutputGuard<'_, P> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.pin.set_low() {
                warn!("failed to drop output low while unwinding: {e}");
            }
        }
    }
}
