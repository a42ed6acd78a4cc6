//! Unidirectional synchronous serial buses.
//!
//! The ST7920 serial interface is write-only from our side: SCLK goes to the E pin, data goes to
//! the R/W pin (called SID in serial mode), and there is nothing to read back. See [RawSpiBus] for
//! the hardware controller and [SoftSerialBus] for the bit-banged fallback.

mod raw;
mod soft;

use std::fmt::Debug;
use crate::GpioResult;
pub use raw::*;
pub use soft::*;

/// A write-only serial bus that shifts out one byte at a time, MSB first.
///
/// Only one sender may use the bus; implementations take `&mut self` everywhere and don't lock.
pub trait SerialBus: Debug {
    /// Starts shifting out the given byte. Returns before the transfer is necessarily done.
    fn start_transfer(&mut self, byte: u8) -> GpioResult<()>;

    /// Checks whether the last started transfer has finished.
    fn is_ready(&mut self) -> GpioResult<bool>;

    /// Sends a single byte and busy-waits until the bus reports it as done.
    ///
    /// There is no timeout, so a bus that never finishes will hang here.
    fn send(&mut self, byte: u8) -> GpioResult<()> {
        self.start_transfer(byte)?;
        while !self.is_ready()? {
            std::hint::spin_loop();
        }
        Ok(())
    }
}
