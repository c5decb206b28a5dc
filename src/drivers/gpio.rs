//! Sysfs GPIO output line.
//!
//! Drives `{root}/gpio{N}/value` by writing the ASCII level (`"0\n"` or
//! `"1\n"`).  The line must already be exported and configured as an output;
//! this driver only writes the value attribute.  There is no read-back.
//!
//! Implements [`embedded_hal::digital::OutputPin`] so the control logic
//! only sees the generic trait.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::{FileExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use embedded_hal::digital::{ErrorType, OutputPin};
use log::{debug, trace};

use crate::error::{TransferOp, TransportError};

/// `{root}/gpio{line}/value`
pub fn line_path(root: &Path, line: u32) -> PathBuf {
    root.join(format!("gpio{line}")).join("value")
}

#[derive(Debug)]
pub struct SysfsOutput {
    file: Option<File>,
    path: PathBuf,
}

impl SysfsOutput {
    pub fn open(root: &Path, line: u32) -> Result<Self, TransportError> {
        let path = line_path(root, line);
        let file = OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(&path)
            .map_err(|source| TransportError::Open {
                path: path.clone(),
                source,
            })?;
        debug!("gpio: opened {}", path.display());
        Ok(Self {
            file: Some(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Release the descriptor.  Idempotent; the level last written stays on
    /// the line, so callers drive it low first.
    pub fn close(&mut self) {
        if self.file.take().is_some() {
            debug!("gpio: closed {}", self.path.display());
        }
    }

    fn write_level(&mut self, high: bool) -> Result<(), TransportError> {
        let text: &[u8] = if high { b"1\n" } else { b"0\n" };
        let Some(file) = self.file.as_ref() else {
            return Err(TransportError::Closed {
                path: self.path.clone(),
            });
        };
        let written = file.write_at(text, 0).map_err(|source| TransportError::Io {
            op: TransferOp::Write,
            path: self.path.clone(),
            source,
        })?;
        if written != text.len() {
            return Err(TransportError::ShortTransfer {
                op: TransferOp::Write,
                path: self.path.clone(),
                expected: text.len(),
                actual: written,
            });
        }
        trace!("gpio: {} <- {}", self.path.display(), u8::from(high));
        Ok(())
    }
}

impl ErrorType for SysfsOutput {
    type Error = TransportError;
}

impl OutputPin for SysfsOutput {
    fn set_low(&mut self) -> Result<(), TransportError> {
        self.write_level(false)
    }

    fn set_high(&mut self) -> Result<(), TransportError> {
        self.write_level(true)
    }
}
