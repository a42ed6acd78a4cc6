use std::thread::sleep;
use std::time::Duration;
use log::trace;
use crate::{GpioOutput, GpioResult};
use crate::spi::SerialBus;

/// Bit-banged [SerialBus] over two plain GPIO outputs.
///
/// Mirrors SPI mode 3: the clock idles high, SID is changed while the clock is low, and the
/// module samples it on the rising edge. Each clock phase is held for `half_period`.
///
/// The transfer is finished by the time [SerialBus::start_transfer] returns, so the bus is
/// always ready.
#[derive(Debug)]
pub struct SoftSerialBus<'a> {
    pin_sclk: &'a dyn GpioOutput,
    pin_sid: &'a dyn GpioOutput,
    half_period: Duration,
}

impl<'a> SoftSerialBus<'a> {
    /// Creates a new bit-banged bus and parks the clock line high.
    ///
    /// # Parameters
    ///
    /// - `pin_sclk`: Output wired to the E pin of the module.
    /// - `pin_sid`: Output wired to the R/W pin of the module.
    pub fn new(pin_sclk: &'a dyn GpioOutput, pin_sid: &'a dyn GpioOutput) -> GpioResult<Self> {
        pin_sclk.write(true)?;
        Ok(SoftSerialBus {
            pin_sclk,
            pin_sid,
            half_period: Duration::from_micros(1),
        })
    }

    pub fn with_half_period(mut self, half_period: Duration) -> Self {
        self.half_period = half_period;
        self
    }

    fn hold(&self) {
        if !self.half_period.is_zero() {
            sleep(self.half_period);
        }
    }
}

impl SerialBus for SoftSerialBus<'_> {
    fn start_transfer(&mut self, byte: u8) -> GpioResult<()> {
        trace!("Shifting out: {:08b}", byte);

        for bit in (0..8).rev() {
            self.pin_sclk.write(false)?;
            self.pin_sid.write(byte >> bit & 1 != 0)?;
            self.hold();
            self.pin_sclk.write(true)?;
            self.hold();
        }

        Ok(())
    }

    fn is_ready(&mut self) -> GpioResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockOutput;

    #[test]
    fn shifts_msb_first_with_clock_idle_high() {
        let sclk = MockOutput::new("SCLK");
        let sid = MockOutput::new("SID");

        {
            let mut bus = SoftSerialBus::new(&sclk, &sid).unwrap().with_half_period(Duration::ZERO);
            bus.send(0b1010_0011).unwrap();
        }

        assert_eq!(sid.history(), vec![true, false, true, false, false, false, true, true]);

        let clock = sclk.history();
        assert_eq!(clock.len(), 1 + 8 * 2);
        assert!(clock[0]);
        assert!(clock[1..].chunks(2).all(|edge| edge == [false, true]));
        assert_eq!(sclk.level(), Some(true));
    }
}
