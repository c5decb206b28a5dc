//! Linux i2c-dev bus driver.
//!
//! [`I2cBus`] owns the `/dev/i2c-N` descriptor; [`I2cBus::bind`] selects the
//! slave with the `I2C_SLAVE` ioctl and yields an [`I2cDevice`], which
//! implements [`embedded_hal::i2c::I2c`]:
//!
//! - a single read or write operation is a plain `read(2)` / `write(2)` on
//!   the bound descriptor and must move exactly the requested byte count;
//! - a multi-operation transaction goes to the kernel in one `I2C_RDWR`
//!   ioctl, so the operations are joined by repeated starts.
//!
//! The descriptor is closed exactly once, when the device is dropped.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use embedded_hal::i2c::{ErrorType, I2c, Operation, SevenBitAddress};
use log::debug;

use crate::error::{TransferOp, TransportError};

// <linux/i2c-dev.h>, <linux/i2c.h>
const I2C_SLAVE: u32 = 0x0703;
const I2C_RDWR: u32 = 0x0707;
const I2C_M_RD: u16 = 0x0001;
const I2C_RDWR_IOCTL_MAX_MSGS: usize = 42;

/// Highest 7-bit slave address.
pub const MAX_SEVEN_BIT_ADDRESS: SevenBitAddress = 0x7f;

#[repr(C)]
struct I2cMsg {
    addr: u16,
    flags: u16,
    len: u16,
    buf: *mut u8,
}

#[repr(C)]
struct I2cRdwrIoctlData {
    msgs: *mut I2cMsg,
    nmsgs: u32,
}

/// `{root}/i2c-{bus}`
pub fn bus_path(root: &Path, bus: u32) -> PathBuf {
    root.join(format!("i2c-{bus}"))
}

// ───────────────────────────────────────────────────────────────
// Bus handle
// ───────────────────────────────────────────────────────────────

/// An open i2c-dev character device, not yet bound to a slave.
#[derive(Debug)]
pub struct I2cBus {
    file: File,
    path: PathBuf,
}

impl I2cBus {
    pub fn open(root: &Path, bus: u32) -> Result<Self, TransportError> {
        let path = bus_path(root, bus);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(&path)
            .map_err(|source| TransportError::Open {
                path: path.clone(),
                source,
            })?;
        debug!("i2c: opened {}", path.display());
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Select `address` as the target of subsequent plain reads and writes.
    pub fn bind(self, address: SevenBitAddress) -> Result<I2cDevice, TransportError> {
        let mut device = I2cDevice {
            bus: self,
            address,
        };
        device.select(address)?;
        Ok(device)
    }
}

// ───────────────────────────────────────────────────────────────
// Bound device
// ───────────────────────────────────────────────────────────────

/// An i2c-dev descriptor with a selected slave address.
#[derive(Debug)]
pub struct I2cDevice {
    bus: I2cBus,
    address: SevenBitAddress,
}

impl I2cDevice {
    pub fn address(&self) -> SevenBitAddress {
        self.address
    }

    pub fn path(&self) -> &Path {
        &self.bus.path
    }

    fn select(&mut self, address: SevenBitAddress) -> Result<(), TransportError> {
        if address > MAX_SEVEN_BIT_ADDRESS {
            return Err(TransportError::Bind {
                path: self.bus.path.clone(),
                address: u16::from(address),
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a 7-bit address"),
            });
        }
        // SAFETY: the descriptor is open for the lifetime of `self.bus.file`;
        // I2C_SLAVE takes the address by value and touches no user memory.
        let rc = unsafe {
            libc::ioctl(
                self.bus.file.as_raw_fd(),
                I2C_SLAVE as _,
                libc::c_ulong::from(address),
            )
        };
        if rc < 0 {
            return Err(TransportError::Bind {
                path: self.bus.path.clone(),
                address: u16::from(address),
                source: io::Error::last_os_error(),
            });
        }
        self.address = address;
        debug!("i2c: {} bound to {:#04x}", self.bus.path.display(), address);
        Ok(())
    }

    fn write_once(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let written = self.bus.file.write(bytes).map_err(|source| TransportError::Io {
            op: TransferOp::Write,
            path: self.bus.path.clone(),
            source,
        })?;
        self.expect_len(TransferOp::Write, bytes.len(), written)
    }

    fn read_once(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        let read = self.bus.file.read(buf).map_err(|source| TransportError::Io {
            op: TransferOp::Read,
            path: self.bus.path.clone(),
            source,
        })?;
        self.expect_len(TransferOp::Read, buf.len(), read)
    }

    fn expect_len(&self, op: TransferOp, expected: usize, actual: usize) -> Result<(), TransportError> {
        if actual == expected {
            Ok(())
        } else {
            Err(TransportError::ShortTransfer {
                op,
                path: self.bus.path.clone(),
                expected,
                actual,
            })
        }
    }

    fn transaction_error(&self, source: io::Error) -> TransportError {
        TransportError::Io {
            op: TransferOp::Transaction,
            path: self.bus.path.clone(),
            source,
        }
    }

    fn combined(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), TransportError> {
        if operations.len() > I2C_RDWR_IOCTL_MAX_MSGS {
            return Err(self.transaction_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                "too many messages for one I2C_RDWR",
            )));
        }

        let mut msgs = Vec::with_capacity(operations.len());
        for op in operations.iter_mut() {
            let (flags, len, buf) = match op {
                Operation::Read(buf) => (I2C_M_RD, buf.len(), buf.as_mut_ptr()),
                // The kernel only reads from write buffers.
                Operation::Write(bytes) => (0, bytes.len(), bytes.as_ptr().cast_mut()),
            };
            let len = u16::try_from(len).map_err(|_| {
                self.transaction_error(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "message longer than 65535 bytes",
                ))
            })?;
            msgs.push(I2cMsg {
                addr: u16::from(address),
                flags,
                len,
                buf,
            });
        }

        let mut data = I2cRdwrIoctlData {
            msgs: msgs.as_mut_ptr(),
            nmsgs: msgs.len() as u32,
        };
        // SAFETY: every `buf` points into a slice borrowed from `operations`
        // for the duration of this call, with `len` matching the slice, and
        // `data.msgs` points at `msgs`, which outlives the ioctl.
        let rc = unsafe { libc::ioctl(self.bus.file.as_raw_fd(), I2C_RDWR as _, &raw mut data) };
        if rc < 0 {
            return Err(self.transaction_error(io::Error::last_os_error()));
        }
        self.expect_len(TransferOp::Transaction, msgs.len(), rc as usize)
    }
}

impl ErrorType for I2cDevice {
    type Error = TransportError;
}

impl I2c<SevenBitAddress> for I2cDevice {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != self.address {
            self.select(address)?;
        }
        match operations.len() {
            0 => Ok(()),
            1 => match &mut operations[0] {
                Operation::Write(bytes) => self.write_once(bytes),
                Operation::Read(buf) => self.read_once(buf),
            },
            _ => self.combined(address, operations),
        }
    }
}
