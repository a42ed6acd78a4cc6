use std::fmt::{Debug, Formatter};
use std::fs::OpenOptions;
use log::debug;
use memmap2::{MmapOptions, MmapRaw};
use crate::GpioResult;
use crate::spi::SerialBus;

/// Raw SPI0 driver for the Raspberry Pi, writing the controller registers through `/dev/mem`.
///
/// Requires root. GPIO 10 (MOSI) and 11 (SCLK) have to be switched to their SPI function first,
/// either by [RawGpioDriver::claim_spi0](crate::raw::RawGpioDriver::claim_spi0) or by the
/// `spi0` device tree overlay.
///
/// # Registers
///
/// Only three of the SPI0 registers are touched:
/// - `CS` (`0x00`): control and status. `CPOL` and `CPHA` select mode 3, `CLEAR` flushes both
///   FIFOs, `TA` starts the transfer phase, and `DONE` is the completion flag that
///   [SerialBus::is_ready] polls. `RXD` tells whether anything is left in the receive FIFO.
/// - `FIFO` (`0x04`): writing pushes a byte out, reading pops whatever was clocked in on MISO.
///   MISO isn't connected, but the FIFO still fills up, so it gets drained after each byte.
/// - `CLK` (`0x08`): core clock divisor.
pub struct RawSpiBus {
    mmap: MmapRaw,
}

impl RawSpiBus {
    // #[cfg(target_pointer_width = "64")]
    // pub const SPI0_BASE: u32 = 0xFE204000;
    /// The base address of the SPI0 registers in the Raspberry Pi memory map.
    pub const SPI0_BASE: u32 = 0x3F204000;

    const REG_CS: usize = 0x00 / 4;
    const REG_FIFO: usize = 0x04 / 4;
    const REG_CLK: usize = 0x08 / 4;

    const CS_CPHA: u32 = 1 << 2;
    const CS_CPOL: u32 = 1 << 3;
    const CS_CLEAR: u32 = 0b11 << 4;
    const CS_TA: u32 = 1 << 7;
    const CS_DONE: u32 = 1 << 16;
    const CS_RXD: u32 = 1 << 17;

    /// 250 MHz core clock / 256 ≈ 1 MHz. The module is specified up to about 2.5 MHz at 5 V but
    /// gets unreliable well below that with long wires.
    pub const DEFAULT_DIVISOR: u16 = 256;

    fn create(path: &str, divisor: u16) -> GpioResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)?;

        let mmap = MmapOptions::new()
            .offset(Self::SPI0_BASE as u64)
            .len(0x18)
            .map_raw(&file)?;

        let bus = RawSpiBus { mmap };
        bus.write_register(Self::REG_CLK, divisor as u32);
        // Mode 3: clock idles high, data sampled on the trailing edge
        bus.write_register(Self::REG_CS, Self::CS_CPOL | Self::CS_CPHA | Self::CS_CLEAR);

        debug!("SPI0 configured with divisor {}.", divisor);

        Ok(bus)
    }

    /// Creates a new `RawSpiBus` using `/dev/mem` with the [default divisor](Self::DEFAULT_DIVISOR).
    pub fn new_mem() -> GpioResult<Self> {
        Self::create("/dev/mem", Self::DEFAULT_DIVISOR)
    }

    /// Creates a new `RawSpiBus` using `/dev/mem` with a custom clock divisor.
    pub fn with_divisor(divisor: u16) -> GpioResult<Self> {
        Self::create("/dev/mem", divisor)
    }

    fn read_register(&self, register: usize) -> u32 {
        let mmap = self.mmap.as_ptr() as *const u32;
        unsafe { mmap.add(register).read_volatile() }
    }

    fn write_register(&self, register: usize, value: u32) {
        let mmap = self.mmap.as_mut_ptr() as *mut u32;
        unsafe { mmap.add(register).write_volatile(value) };
    }

    fn drain_rx(&self) {
        while self.read_register(Self::REG_CS) & Self::CS_RXD != 0 {
            let _ = self.read_register(Self::REG_FIFO);
        }
    }
}

impl Debug for RawSpiBus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawSpiBus({:?})", self.mmap.as_ptr().addr())
    }
}

impl SerialBus for RawSpiBus {
    fn start_transfer(&mut self, byte: u8) -> GpioResult<()> {
        let cs = self.read_register(Self::REG_CS);
        if cs & Self::CS_TA == 0 {
            self.write_register(Self::REG_CS, cs | Self::CS_TA);
        }
        self.write_register(Self::REG_FIFO, byte as u32);
        Ok(())
    }

    fn is_ready(&mut self) -> GpioResult<bool> {
        if self.read_register(Self::REG_CS) & Self::CS_DONE == 0 {
            return Ok(false);
        }
        self.drain_rx();
        Ok(true)
    }
}

impl Drop for RawSpiBus {
    fn drop(&mut self) {
        let cs = self.read_register(Self::REG_CS);
        self.write_register(Self::REG_CS, cs & !Self::CS_TA);
    }
}
