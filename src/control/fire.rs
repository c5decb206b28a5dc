//! Fire sequencer: one timed pulse on the discharge line.
//!
//! Open loop, no sensor feedback:
//!
//! ```text
//! charge  ──┐0
//!           └──────────────────────────────────0─────────
//! discharge        ┌──── pulse ────┐
//!          ────────┘1              └0────────────────────
//!           │ pre  │               │     post     │
//! ```
//!
//! Any failed write aborts the sequence on the spot.  After a failed write
//! the line state is unknown, so nothing further is driven high; the
//! discharge line is dropped low best effort and the session teardown
//! repeats that.

use std::time::Duration;

use log::info;

use crate::app::events::SessionEvent;
use crate::app::ports::{Clock, DigitalOutput, EventSink};
use crate::error::TransportError;

use super::OutputGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireSequencer {
    pub pre_delay: Duration,
    pub pulse: Duration,
    pub post_delay: Duration,
}

impl FireSequencer {
    pub fn new(pre_delay: Duration, pulse: Duration, post_delay: Duration) -> Self {
        Self {
            pre_delay,
            pulse,
            post_delay,
        }
    }

    pub fn from_millis(pre_delay_ms: u32, pulse_ms: u32, post_delay_ms: u32) -> Self {
        let ms = |v: u32| Duration::from_millis(u64::from(v));
        Self::new(ms(pre_delay_ms), ms(pulse_ms), ms(post_delay_ms))
    }

    pub fn run<P, C>(
        &self,
        charge: &mut P,
        discharge: &mut P,
        clock: &mut C,
        sink: &mut impl EventSink,
    ) -> Result<(), TransportError>
    where
        P: DigitalOutput,
        C: Clock,
    {
        sink.emit(&SessionEvent::FireStarted {
            pre_delay: self.pre_delay,
            pulse: self.pulse,
            post_delay: self.post_delay,
        });

        charge.set_low()?;
        clock.sleep(self.pre_delay);

        let mut line = OutputGuard::new(discharge);
        line.set_high()?;
        info!("Fire: pulse {}ms", self.pulse.as_millis());
        sink.emit(&SessionEvent::PulseOn);
        clock.sleep(self.pulse);
        line.release()?;
        charge.set_low()?;
        sink.emit(&SessionEvent::PulseOff);

        clock.sleep(self.post_delay);
        sink.emit(&SessionEvent::FireDone);
        Ok(())
    }
}
