use crate::{GpioDriver, GpioError, GpioOutput, GpioPin, GpioResult};
use bitvec::vec::BitVec;
use log::debug;
use memmap2::{MmapOptions, MmapRaw};
use std::fmt::{Debug, Formatter};
use std::fs::OpenOptions;
use std::sync::atomic::AtomicU8;

/// GPIO driver poking the BCM GPIO registers directly through a memory map.
///
/// `/dev/gpiomem` is enough for plain pin access; `/dev/mem` (root) is needed only if the same
/// process also maps other peripherals, like [RawSpiBus](crate::spi::RawSpiBus).
pub struct RawGpioDriver {
    mmap: MmapRaw,
    used_pins: BitVec<AtomicU8>,
}

impl RawGpioDriver {
    // #[cfg(target_pointer_width = "64")]
    // const GPIO_BASE: u32 = 0xFE200000;
    const GPIO_BASE: u32 = 0x3F200000;

    const PIN_COUNT: usize = 58;

    /// `GPFSEL` value for an input pin.
    pub const FUNCTION_INPUT: u8 = 0b000;
    /// `GPFSEL` value for an output pin.
    pub const FUNCTION_OUTPUT: u8 = 0b001;
    /// `GPFSEL` value for alternate function 0, which routes SPI0 to GPIO 7–11.
    pub const FUNCTION_ALT0: u8 = 0b100;

    /// SPI0 MOSI, wired to the SID (R/W) pin of the module.
    pub const SPI0_MOSI: usize = 10;
    /// SPI0 SCLK, wired to the E pin of the module.
    pub const SPI0_SCLK: usize = 11;

    fn create(path: &str) -> GpioResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)?;

        // gpiomem maps the GPIO block at offset 0, mem needs the physical address
        let offset = if path.ends_with("gpiomem") { 0 } else { Self::GPIO_BASE as u64 };

        let mmap = MmapOptions::new()
            .offset(offset)
            .len(4096)
            .map_raw(&file)?;

        Ok(RawGpioDriver {
            mmap,
            used_pins: BitVec::repeat(false, Self::PIN_COUNT),
        })
    }

    pub fn new_gpiomem() -> GpioResult<Self> {
        Self::create("/dev/gpiomem")
    }

    pub fn new_mem() -> GpioResult<Self> {
        Self::create("/dev/mem")
    }

    /// Word offset of `GPSET0`, `GPCLR0` is three words further.
    const GPSET0: usize = 0x1C / 4;
    const GPCLR0: usize = 0x28 / 4;

    /// Word offset and bit shift of the three `GPFSELn` bits of a pin.
    fn function_slot(pin_index: usize) -> (usize, usize) {
        (pin_index / 10, (pin_index % 10) * 3)
    }

    /// Word offset and value to write to set or clear a pin. Writing zeros is a no-op on these
    /// registers, so no read-modify-write is needed.
    fn level_slot(pin_index: usize, high: bool) -> (usize, u32) {
        let base = if high { Self::GPSET0 } else { Self::GPCLR0 };
        (base + pin_index / 32, 1 << (pin_index % 32))
    }

    /// Replaces the function bits at `shift`, leaving the other nine pins of the word alone.
    fn with_function(register_value: u32, shift: usize, function: u8) -> u32 {
        (register_value & !(0b111 << shift)) | ((function as u32) << shift)
    }

    pub fn raw_set_pin_function(&self, pin_index: usize, function: u8) -> GpioResult<()> {
        if function > 0b111 || pin_index >= Self::PIN_COUNT {
            return Err(GpioError::InvalidArgument);
        }

        let (offset, shift) = Self::function_slot(pin_index);
        let register_ptr = unsafe { (self.mmap.as_mut_ptr() as *mut u32).add(offset) };
        unsafe {
            let register_value = register_ptr.read_volatile();
            register_ptr.write_volatile(Self::with_function(register_value, shift, function));
        }

        Ok(())
    }

    /// Hands GPIO 10 and 11 over to the SPI0 controller and marks them as used, so they can't be
    /// requested as plain pins afterwards.
    pub fn claim_spi0(&self) -> GpioResult<()> {
        for index in [Self::SPI0_MOSI, Self::SPI0_SCLK] {
            if self.used_pins[index] {
                return Err(GpioError::AlreadyInUse);
            }
        }

        for index in [Self::SPI0_MOSI, Self::SPI0_SCLK] {
            self.used_pins.set_aliased(index, true);
            self.raw_set_pin_function(index, Self::FUNCTION_ALT0)?;
        }

        debug!("GPIO {} and {} switched to SPI0.", Self::SPI0_MOSI, Self::SPI0_SCLK);
        Ok(())
    }

    pub(crate) fn raw_set_pin_output(&self, pin_index: usize, high: bool) -> GpioResult<()> {
        if pin_index >= Self::PIN_COUNT {
            return Err(GpioError::InvalidArgument);
        }

        let (offset, value) = Self::level_slot(pin_index, high);
        unsafe { (self.mmap.as_mut_ptr() as *mut u32).add(offset).write_volatile(value) };

        Ok(())
    }

    /// Parks a freshly claimed pin as an input until it is turned into an output.
    pub(crate) fn raw_reset(&self, pin_index: usize) -> GpioResult<()> {
        self.raw_set_pin_function(pin_index, Self::FUNCTION_INPUT)
    }
}

impl Debug for RawGpioDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawGpioDriver({:?})", self.mmap.as_ptr().addr())
    }
}

impl GpioDriver for RawGpioDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(Self::PIN_COUNT)
    }

    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>> {
        if index >= self.count()? {
            return Err(GpioError::InvalidArgument);
        }

        if self.used_pins[index] {
            return Err(GpioError::AlreadyInUse);
        }

        self.used_pins.set_aliased(index, true);
        self.raw_reset(index)?;

        Ok(Box::new(RawGpioPin {
            driver: self,
            pin_index: index,
        }))
    }
}

struct RawGpioPin<'a> {
    driver: &'a RawGpioDriver,
    pin_index: usize,
}

impl Debug for RawGpioPin<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}]", self.driver, self.pin_index)
    }
}

impl GpioPin for RawGpioPin<'_> {
    fn as_output(&mut self) -> GpioResult<Box<dyn GpioOutput + '_>> {
        self.driver.raw_set_pin_function(self.pin_index, RawGpioDriver::FUNCTION_OUTPUT)?;
        Ok(Box::new(RawGpioOutput { pin: self }))
    }
}

impl Drop for RawGpioPin<'_> {
    fn drop(&mut self) {
        self.driver.used_pins.set_aliased(self.pin_index, false);
    }
}

struct RawGpioOutput<'a> {
    pin: &'a RawGpioPin<'a>,
}

impl Debug for RawGpioOutput<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[output]", self.pin)
    }
}

impl GpioOutput for RawGpioOutput<'_> {
    fn write(&self, value: bool) -> GpioResult<()> {
        self.pin.driver.raw_set_pin_output(self.pin.pin_index, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_slots_pack_ten_pins_per_word() {
        assert_eq!(RawGpioDriver::function_slot(0), (0, 0));
        assert_eq!(RawGpioDriver::function_slot(9), (0, 27));
        assert_eq!(RawGpioDriver::function_slot(10), (1, 0));
        assert_eq!(RawGpioDriver::function_slot(25), (2, 15));
    }

    #[test]
    fn with_function_touches_only_its_three_bits() {
        let word = 0xFFFF_FFFF;
        let cleared = RawGpioDriver::with_function(word, 3, RawGpioDriver::FUNCTION_INPUT);
        assert_eq!(cleared, !(0b111 << 3));

        // GPIO 10 and 11 to ALT0
        let word = RawGpioDriver::with_function(0, 0, RawGpioDriver::FUNCTION_ALT0);
        let word = RawGpioDriver::with_function(word, 3, RawGpioDriver::FUNCTION_ALT0);
        assert_eq!(word, 0b100_100);

        let word = RawGpioDriver::with_function(word, 0, RawGpioDriver::FUNCTION_OUTPUT);
        assert_eq!(word, 0b100_001);
    }

    #[test]
    fn level_slots_pick_set_or_clear_bank() {
        assert_eq!(RawGpioDriver::level_slot(25, true), (7, 1 << 25));
        assert_eq!(RawGpioDriver::level_slot(25, false), (10, 1 << 25));
        assert_eq!(RawGpioDriver::level_slot(33, true), (8, 1 << 1));
        assert_eq!(RawGpioDriver::level_slot(57, false), (11, 1 << 25));
    }
}
