//! Hardware adapter: assembles a session over the real Linux transports.
//!
//! This is the only module that opens device nodes.  Opening order is bus,
//! charge line, discharge line; the first failure aborts before anything is
//! energised, and whatever was already opened is closed on the way out.

use log::info;

use crate::app::session::CoilGunSession;
use crate::config::CoilGunConfig;
use crate::drivers::gpio::SysfsOutput;
use crate::drivers::i2c::{I2cBus, I2cDevice};
use crate::drivers::register::WordReader;
use crate::error::TransportError;

use super::time::MonotonicClock;

/// A session wired to `/dev/i2c-N` and sysfs GPIO.
pub type HardwareSession = CoilGunSession<WordReader<I2cDevice>, SysfsOutput, MonotonicClock>;

pub fn open_session(config: &CoilGunConfig) -> Result<HardwareSession, TransportError> {
    let bus = I2cBus::open(&config.bus.dev_root, config.bus.i2c_bus)?;
    let device = bus.bind(config.bus.i2c_device)?;
    info!(
        "Power controller at {:#04x} on {} ({:?} reads)",
        device.address(),
        device.path().display(),
        config.bus.read_strategy
    );
    let register = WordReader::new(device, config.bus.i2c_device, config.bus.read_strategy);

    let charge = SysfsOutput::open(&config.gpio.root, config.gpio.charge)?;
    let discharge = SysfsOutput::open(&config.gpio.root, config.gpio.discharge)?;
    info!(
        "Control lines: charge {}, discharge {}",
        charge.path().display(),
        discharge.path().display()
    );

    CoilGunSession::new(
        register,
        config.commands(),
        charge,
        discharge,
        MonotonicClock::new(),
    )
}
