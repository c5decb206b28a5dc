//! Command-line surface.
//!
//! Every flag is optional and overrides the matching key of the
//! [`CoilGunConfig`] (defaults, or the `--config` TOML file).  Numbers are
//! base-10; anything that does not parse is rejected by clap with a message
//! naming the flag.

use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use crate::config::CoilGunConfig;
use crate::drivers::register::ReadStrategy;
use crate::error::ConfigError;

fn parse_level(s: &str) -> Result<LevelFilter, String> {
    s.parse()
        .map_err(|_| format!("expected off, error, warn, info, debug or trace, got {s:?}"))
}

#[derive(Debug, Default, Parser)]
#[command(
    name = "coilgun",
    version,
    about = "Charge the coil gun capacitor bank, fire one pulse, then bleed it down"
)]
pub struct Cli {
    /// TOML file with base settings; flags override it
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// I2C bus number of the power controller (/dev/i2c-N)
    #[arg(long, value_name = "N")]
    pub msp_i2c_bus: Option<u32>,
    /// 7-bit slave address of the power controller
    #[arg(long, value_name = "ADDR")]
    pub msp_i2c_device: Option<u8>,
    /// Register command returning the charge level
    #[arg(long, value_name = "CMD")]
    pub msp_i2c_charge_level: Option<u8>,
    /// Register command returning the discharge current
    #[arg(long, value_name = "CMD")]
    pub msp_i2c_discharge_current: Option<u8>,
    /// How charge-level words are read from the bus
    #[arg(long, value_enum, value_name = "STRATEGY")]
    pub read_strategy: Option<ReadStrategy>,
    /// Directory holding the i2c-N device nodes
    #[arg(long, value_name = "DIR")]
    pub i2c_dev_root: Option<PathBuf>,

    /// GPIO line driving the charger enable
    #[arg(long, value_name = "LINE")]
    pub gpio_charge: Option<u32>,
    /// GPIO line driving the discharge switch
    #[arg(long, value_name = "LINE")]
    pub gpio_discharge: Option<u32>,
    /// Directory holding the exported gpioN entries
    #[arg(long, value_name = "DIR")]
    pub gpio_root: Option<PathBuf>,

    /// Charge window in ms (0 = until the level is reached)
    #[arg(long, value_name = "MS")]
    pub charge_duration: Option<u32>,
    /// Target charge level
    #[arg(long, value_name = "LEVEL")]
    pub charge_level: Option<u16>,
    /// Hold before the fire pulse, ms
    #[arg(long, value_name = "MS")]
    pub fire_predelay: Option<u32>,
    /// Fire pulse length, ms
    #[arg(long, value_name = "MS")]
    pub fire_duration: Option<u32>,
    /// Hold after the fire pulse, ms
    #[arg(long, value_name = "MS")]
    pub fire_postdelay: Option<u32>,
    /// Discharge window in ms (0 = until the floor is reached)
    #[arg(long, value_name = "MS")]
    pub discharge_duration: Option<u32>,
    /// Level considered discharged
    #[arg(long, value_name = "LEVEL")]
    pub discharge_level: Option<u16>,

    /// Register poll interval, ms
    #[arg(long, value_name = "MS")]
    pub poll_interval: Option<u32>,
    /// Log verbosity (RUST_LOG overrides)
    #[arg(long, value_name = "LEVEL", value_parser = parse_level)]
    pub log_level: Option<LevelFilter>,
}

impl Cli {
    /// Defaults ← `--config` file ← flags, then validated.
    pub fn load_config(&self) -> Result<CoilGunConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => CoilGunConfig::from_file(path)?,
            None => CoilGunConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Overlay every flag that was given onto `config`.
    pub fn apply(&self, config: &mut CoilGunConfig) {
        fn set<T: Clone>(slot: &mut T, flag: Option<&T>) {
            if let Some(v) = flag {
                *slot = v.clone();
            }
        }

        set(&mut config.bus.i2c_bus, self.msp_i2c_bus.as_ref());
        set(&mut config.bus.i2c_device, self.msp_i2c_device.as_ref());
        set(&mut config.bus.charge_level_cmd, self.msp_i2c_charge_level.as_ref());
        set(
            &mut config.bus.discharge_current_cmd,
            self.msp_i2c_discharge_current.as_ref(),
        );
        set(&mut config.bus.read_strategy, self.read_strategy.as_ref());
        set(&mut config.bus.dev_root, self.i2c_dev_root.as_ref());

        set(&mut config.gpio.charge, self.gpio_charge.as_ref());
        set(&mut config.gpio.discharge, self.gpio_discharge.as_ref());
        set(&mut config.gpio.root, self.gpio_root.as_ref());

        set(&mut config.charge.duration_ms, self.charge_duration.as_ref());
        set(&mut config.charge.level, self.charge_level.as_ref());
        set(&mut config.fire.predelay_ms, self.fire_predelay.as_ref());
        set(&mut config.fire.duration_ms, self.fire_duration.as_ref());
        set(&mut config.fire.postdelay_ms, self.fire_postdelay.as_ref());
        set(&mut config.discharge.duration_ms, self.discharge_duration.as_ref());
        set(&mut config.discharge.level, self.discharge_level.as_ref());

        set(&mut config.poll_interval_ms, self.poll_interval.as_ref());
        set(&mut config.log_level, self.log_level.as_ref());
    }
}
