//! Unified error types for the coil gun controller.
//!
//! Transport failures (I2C bus, GPIO lines) and configuration failures are
//! kept apart so the binary can tell "the hardware refused" from "the
//! operator asked for something impossible".  Deadline expiry is not an
//! error at all; it is reported through
//! [`PhaseOutcome`](crate::control::PhaseOutcome).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Which kind of transfer a [`TransportError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOp {
    Read,
    Write,
    Transaction,
}

impl std::fmt::Display for TransferOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::Transaction => write!(f, "transaction"),
        }
    }
}

/// Failure at the bus or GPIO boundary.  Every variant names the device path
/// so a fatal error tells the operator which wire to look at.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The device node or sysfs attribute could not be opened.
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The `I2C_SLAVE` ioctl rejected the address.
    #[error("cannot select i2c slave device {address:#04x} on {path}: {source}")]
    Bind {
        path: PathBuf,
        address: u16,
        #[source]
        source: io::Error,
    },

    /// A read, write or combined transfer failed in the kernel.
    #[error("i2c/gpio {op} failed on {path}: {source}")]
    Io {
        op: TransferOp,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The kernel moved fewer bytes than requested.
    #[error("short {op} on {path}: {actual} of {expected} bytes")]
    ShortTransfer {
        op: TransferOp,
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    /// The output line was already released.
    #[error("{path} is closed")]
    Closed { path: PathBuf },
}

impl embedded_hal::digital::Error for TransportError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

impl embedded_hal::i2c::Error for TransportError {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        match self {
            Self::ShortTransfer { .. } => embedded_hal::i2c::ErrorKind::Bus,
            _ => embedded_hal::i2c::ErrorKind::Other,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field failed range validation.
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// The config file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config file is not valid TOML for [`CoilGunConfig`](crate::config::CoilGunConfig).
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
