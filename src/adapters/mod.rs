//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements              | Connects to                    |
//! |------------|-------------------------|--------------------------------|
//! | `hardware` | session assembly        | i2c-dev bus, sysfs GPIO lines  |
//! | `log_sink` | EventSink               | `log` facade (stderr)          |
//! | `time`     | Clock                   | `std::time::Instant`, sleep    |

pub mod hardware;
pub mod log_sink;
pub mod time;
