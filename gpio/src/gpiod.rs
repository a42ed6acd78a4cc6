//! GPIO driver on top of the Linux GPIO character device, using the gpiod library.
//!
//! Slower than [RawGpioDriver](crate::raw::RawGpioDriver), but works without `/dev/gpiomem`
//! and on boards other than the Raspberry Pi. Good enough for the reset line; bit-banging the
//! serial bus through it is slow but works.
use crate::{GpioDriver, GpioError, GpioOutput, GpioPin, GpioResult};
use log::trace;
use bitvec::vec::BitVec;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::AtomicU8;

/// GpiodDriver is a GPIO driver that uses the gpiod library to manage GPIO pins.
pub struct GpiodDriver {
    chip: gpiod::Chip,
    used_pins: BitVec<AtomicU8>,
}

impl GpiodDriver {
    pub fn new(chip: gpiod::Chip) -> Self {
        let n = chip.num_lines() as usize;
        Self {
            chip,
            used_pins: BitVec::repeat(false, n),
        }
    }

    /// Opens the given GPIO chip, like `/dev/gpiochip0`.
    pub fn open(path: &str) -> GpioResult<Self> {
        Ok(Self::new(gpiod::Chip::new(path)?))
    }
}

impl Debug for GpiodDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodDriver({})", self.chip.name())
    }
}

impl GpioDriver for GpiodDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.chip.num_lines() as usize)
    }

    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>> {
        if index >= self.count()? {
            return Err(GpioError::InvalidArgument);
        }

        if self.used_pins[index] {
            return Err(GpioError::AlreadyInUse);
        }

        self.used_pins.set_aliased(index, true);

        Ok(Box::new(GpiodPin {
            driver: self,
            pin_index: index,
        }))
    }
}

struct GpiodPin<'a> {
    driver: &'a GpiodDriver,
    pin_index: usize,
}

impl GpiodPin<'_> {
    const CONSUMER: &'static str = env!("CARGO_PKG_NAME");
}

impl Debug for GpiodPin<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}]", self.driver, self.pin_index)
    }
}

impl GpioPin for GpiodPin<'_> {
    fn as_output(&mut self) -> GpioResult<Box<dyn GpioOutput + '_>> {
        let line = self.driver.chip.request_lines(
            gpiod::Options::output([self.pin_index as u32])
                .consumer(Self::CONSUMER),
        )?;
        Ok(Box::new(GpiodOutput { pin: self, line }))
    }
}

impl Drop for GpiodPin<'_> {
    fn drop(&mut self) {
        self.driver.used_pins.set_aliased(self.pin_index, false);
    }
}

struct GpiodOutput<'a> {
    pin: &'a GpiodPin<'a>,
    line: gpiod::Lines<gpiod::Output>,
}

impl Debug for GpiodOutput<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}][output]", self.pin.driver, self.pin.pin_index)
    }
}

impl GpioOutput for GpiodOutput<'_> {
    fn write(&self, value: bool) -> GpioResult<()> {
        trace!("Line {}: {}", self.pin.pin_index, value);
        self.line.set_values([value])?;
        Ok(())
    }
}
