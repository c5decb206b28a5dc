//! Run configuration.
//!
//! Every tunable of a charge → fire → discharge run.  Values come from, in
//! increasing priority: [`CoilGunConfig::default`], an optional TOML file,
//! then command-line flags (see [`crate::cli`]).  The result is checked by
//! [`CoilGunConfig::validate`] before any hardware is opened.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::app::ports::{ChargeLevel, RegisterCommand, RegisterCommands};
use crate::app::session::RunPlan;
use crate::control::Deadline;
use crate::control::charge::ChargeController;
use crate::control::discharge::DischargeController;
use crate::control::fire::FireSequencer;
use crate::drivers::i2c::MAX_SEVEN_BIT_ADDRESS;
use crate::drivers::register::ReadStrategy;
use crate::error::ConfigError;

/// Complete run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoilGunConfig {
    pub bus: BusConfig,
    pub gpio: GpioConfig,
    pub charge: ChargeConfig,
    pub fire: FireConfig,
    pub discharge: DischargeConfig,
    /// Delay between register polls (milliseconds)
    pub poll_interval_ms: u32,
    /// Log verbosity; `RUST_LOG` overrides it.
    pub log_level: LevelFilter,
}

/// Power controller on the I2C bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BusConfig {
    /// Bus number N of `/dev/i2c-N`
    pub i2c_bus: u32,
    /// 7-bit slave address
    pub i2c_device: u8,
    /// Command returning the charge level
    pub charge_level_cmd: u8,
    /// Command returning the discharge current (carried, not polled)
    pub discharge_current_cmd: u8,
    pub read_strategy: ReadStrategy,
    /// Directory holding the i2c-dev nodes
    pub dev_root: PathBuf,
}

/// Sysfs GPIO control lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GpioConfig {
    /// Charge-enable line number
    pub charge: u32,
    /// Discharge-enable line number
    pub discharge: u32,
    /// Directory holding the exported `gpioN/` entries
    pub root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChargeConfig {
    /// Charge window (milliseconds); 0 waits for the target level
    pub duration_ms: u32,
    /// Target charge level
    pub level: ChargeLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FireConfig {
    pub predelay_ms: u32,
    pub duration_ms: u32,
    pub postdelay_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DischargeConfig {
    /// Discharge window (milliseconds); 0 waits for the floor level
    pub duration_ms: u32,
    /// Level considered discharged
    pub level: ChargeLevel,
}

impl Default for CoilGunConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            gpio: GpioConfig::default(),
            charge: ChargeConfig::default(),
            fire: FireConfig::default(),
            discharge: DischargeConfig::default(),
            poll_interval_ms: 1,
            log_level: LevelFilter::Info,
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            i2c_bus: 2,
            i2c_device: 0x48,
            charge_level_cmd: 0x25,
            discharge_current_cmd: 0x24,
            read_strategy: ReadStrategy::Raw,
            dev_root: PathBuf::from("/dev"),
        }
    }
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            charge: 0,
            discharge: 0,
            root: PathBuf::from("/sys/class/gpio"),
        }
    }
}

impl Default for ChargeConfig {
    fn default() -> Self {
        Self {
            duration_ms: 0,
            level: 0x10,
        }
    }
}

impl Default for FireConfig {
    fn default() -> Self {
        Self {
            predelay_ms: 10,
            duration_ms: 10,
            postdelay_ms: 100,
        }
    }
}

impl Default for DischargeConfig {
    fn default() -> Self {
        Self {
            duration_ms: 0,
            level: 0,
        }
    }
}

impl CoilGunConfig {
    /// Defaults overlaid with the TOML file at `path`.  Missing keys keep
    /// their defaults; unknown keys are an error.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject values that cannot describe a safe run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bus.i2c_device > MAX_SEVEN_BIT_ADDRESS {
            return Err(ConfigError::Invalid {
                field: "msp-i2c-device",
                reason: format!(
                    "{:#04x} is not a 7-bit address (max {:#04x})",
                    self.bus.i2c_device, MAX_SEVEN_BIT_ADDRESS
                ),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "poll-interval",
                reason: "must be at least 1 ms".into(),
            });
        }
        if self.gpio.charge == self.gpio.discharge {
            return Err(ConfigError::Invalid {
                field: "gpio-charge/gpio-discharge",
                reason: format!(
                    "charge and discharge must be different lines (both are {})",
                    self.gpio.charge
                ),
            });
        }
        Ok(())
    }

    pub fn commands(&self) -> RegisterCommands {
        RegisterCommands {
            charge_level: RegisterCommand(self.bus.charge_level_cmd),
            discharge_current: RegisterCommand(self.bus.discharge_current_cmd),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.poll_interval_ms))
    }

    /// Phase parameters for [`CoilGunSession::run`](crate::app::session::CoilGunSession::run).
    pub fn run_plan(&self) -> RunPlan {
        let poll = self.poll_interval();
        RunPlan {
            charge: ChargeController::new(
                self.charge.level,
                Deadline::from_millis(self.charge.duration_ms),
            )
            .with_poll_interval(poll),
            fire: FireSequencer::from_millis(
                self.fire.predelay_ms,
                self.fire.duration_ms,
                self.fire.postdelay_ms,
            ),
            discharge: DischargeController::new(
                self.discharge.level,
                Deadline::from_millis(self.discharge.duration_ms),
            )
            .with_poll_interval(poll),
        }
    }
}
