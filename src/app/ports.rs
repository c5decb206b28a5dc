//! Port traits: the boundary between the control logic and the hardware.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ CoilGunSession (domain)
//! ```
//!
//! Driven adapters (i2c register reader, sysfs GPIO lines, the monotonic
//! clock, log sink) implement these traits.  The
//! [`CoilGunSession`](super::session::CoilGunSession) consumes them via
//! generics, so the charge/fire/discharge logic never touches a file
//! descriptor directly and runs under a simulated clock in tests.

use std::time::Duration;

use embedded_hal::digital::OutputPin;

use crate::error::TransportError;

/// Unsigned sample from the charge-level register.  No unit; only ever
/// compared against caller thresholds.
pub type ChargeLevel = u16;

/// Opcode selecting which register the controller board returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterCommand(pub u8);

impl std::fmt::Display for RegisterCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// The command pair a session is bound to.
///
/// `discharge_current` is carried as configuration; the control loops only
/// ever read `charge_level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterCommands {
    pub charge_level: RegisterCommand,
    pub discharge_current: RegisterCommand,
}

// ───────────────────────────────────────────────────────────────
// Register port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Word-level register access.  One call is one bus round trip; no retry.
pub trait RegisterPort {
    fn read_word(&mut self, command: RegisterCommand) -> Result<ChargeLevel, TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Digital output port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// A write-only control line that reports failures as [`TransportError`].
///
/// Blanket-implemented for every `embedded_hal` output pin with that error
/// type, so the sysfs driver and test doubles plug in the same way.
pub trait DigitalOutput: OutputPin<Error = TransportError> {}

impl<T: OutputPin<Error = TransportError>> DigitalOutput for T {}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source plus the blocking delay used by the polling loops
/// and fire holds.
pub trait Clock {
    /// Time since an arbitrary fixed origin.  Never goes backwards.
    fn now(&self) -> Duration;

    /// Block the control thread for `duration`.
    fn sleep(&mut self, duration: Duration);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The session emits [`SessionEvent`](super::events::SessionEvent)s through
/// this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::SessionEvent);
}
