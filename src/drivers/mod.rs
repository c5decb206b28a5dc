//! Linux transport drivers: i2c-dev bus, word-register reader, sysfs GPIO.

pub mod gpio;
pub mod i2c;
pub mod register;
