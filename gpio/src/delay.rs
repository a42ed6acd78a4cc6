//! Blocking delays.
//!
//! The ST7920 never tells us when it is done with a command, so everything the driver knows about
//! timing goes through a [Delay]. Swap in [SimulatedDelay](crate::mock::SimulatedDelay) to run the
//! driver without actually sleeping.

use std::fmt::Debug;
use std::thread::sleep;
use std::time::Duration;

pub trait Delay: Debug {
    /// Blocks for at least `us` microseconds.
    fn delay_us(&mut self, us: u32);

    /// Blocks for at least `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }

    /// Blocks for at least the given duration.
    fn delay(&mut self, duration: Duration) {
        self.delay_us(duration.as_micros().min(u32::MAX as u128) as u32);
    }
}

/// [Delay] backed by [std::thread::sleep].
///
/// The scheduler may oversleep, never undersleep, which is the only direction the display cares
/// about. A full refresh takes noticeably longer than the sum of the settle times because of this.
#[derive(Debug, Default, Copy, Clone)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay_us(&mut self, us: u32) {
        sleep(Duration::from_micros(us as u64));
    }
}
