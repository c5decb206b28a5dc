//! Application core: the charge/fire/discharge session, zero direct I/O.
//!
//! All interaction with hardware happens through the **port traits** defined
//! in [`ports`], keeping this layer fully testable with a simulated clock,
//! a scripted register and recording output lines.

pub mod events;
pub mod ports;
pub mod session;
