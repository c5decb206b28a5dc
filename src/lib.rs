//! Coil gun controller library.
//!
//! Charges a capacitor bank to a target level read over I2C, fires one
//! timed pulse on the discharge line, then bleeds the bank down, keeping
//! both GPIO control lines low on every exit path.  The control logic
//! ([`app`], [`control`]) only sees port traits; the Linux transports live
//! in [`drivers`] and are wired together in [`adapters`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
