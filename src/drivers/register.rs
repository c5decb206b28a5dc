//! Word-register reader for the power controller's charge-level readout.
//!
//! The controller answers a one-byte command with a little-endian 16-bit
//! word.  Two access patterns reach the same register and are selected at
//! configuration time:
//!
//! | Strategy | Bus traffic                                    |
//! |----------|------------------------------------------------|
//! | `raw`    | `S addr W cmd P` then `S addr R lo hi P`       |
//! | `block`  | `S addr W cmd Sr addr R lo hi P` (SMBus word)  |
//!
//! Both go through [`embedded_hal::i2c::I2c`], so any bus implementation,
//! including test doubles, plugs in.

use clap::ValueEnum;
use embedded_hal::i2c::{I2c, SevenBitAddress};
use serde::{Deserialize, Serialize};

use crate::app::ports::{ChargeLevel, RegisterCommand, RegisterPort};
use crate::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReadStrategy {
    /// Separate command write and two-byte read.
    #[default]
    Raw,
    /// One combined write-read transfer ("read word at address").
    Block,
}

pub struct WordReader<I> {
    bus: I,
    address: SevenBitAddress,
    strategy: ReadStrategy,
}

impl<I> WordReader<I> {
    pub fn new(bus: I, address: SevenBitAddress, strategy: ReadStrategy) -> Self {
        Self {
            bus,
            address,
            strategy,
        }
    }

    pub fn strategy(&self) -> ReadStrategy {
        self.strategy
    }

    pub fn into_inner(self) -> I {
        self.bus
    }
}

impl<I> RegisterPort for WordReader<I>
where
    I: I2c,
    I::Error: Into<TransportError>,
{
    fn read_word(&mut self, command: RegisterCommand) -> Result<ChargeLevel, TransportError> {
        let mut word = [0u8; 2];
        match self.strategy {
            ReadStrategy::Raw => {
                self.bus
                    .write(self.address, &[command.0])
                    .map_err(Into::<TransportError>::into)?;
                self.bus.read(self.address, &mut word).map_err(Into::<TransportError>::into)?;
            }
            ReadStrategy::Block => {
                self.bus
                    .write_read(self.address, &[command.0], &mut word)
                    .map_err(Into::<TransportError>::into)?;
            }
        }
        Ok(u16::from_le_bytes(word))
    }
}
