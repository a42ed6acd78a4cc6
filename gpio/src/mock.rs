//! Software stand-ins for the hardware, for tests and for running without a display attached.
//!
//! None of these sleep or touch any device. [RecordingBus] and [SimulatedDelay] are enough to
//! drive [SerialST7920Driver](crate::lcd::st7920::driver::SerialST7920Driver) end to end and
//! inspect everything it sent.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt::{Debug, Formatter};
use std::sync::atomic::AtomicU8;
use std::time::Duration;
use bitvec::vec::BitVec;
use log::trace;
use crate::adc::AnalogInput;
use crate::delay::Delay;
use crate::lcd::st7920::Frame;
use crate::spi::SerialBus;
use crate::{GpioDriver, GpioError, GpioOutput, GpioPin, GpioResult};

/// [SerialBus] that keeps every byte it is given.
#[derive(Debug, Default, Clone)]
pub struct RecordingBus {
    bytes: Vec<u8>,
    busy_polls: usize,
    remaining: usize,
    polls: usize,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the bus report busy `polls` times after every started transfer, like a slow
    /// controller would.
    pub fn with_busy_polls(mut self, polls: usize) -> Self {
        self.busy_polls = polls;
        self
    }

    /// Every byte sent so far, in order.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// How many times [SerialBus::is_ready] was called.
    pub fn polls(&self) -> usize {
        self.polls
    }

    /// Decodes the recorded bytes back into frames.
    ///
    /// Returns `None` if the stream isn't a whole number of valid frames.
    pub fn frames(&self) -> Option<Vec<Frame>> {
        if self.bytes.len() % 3 != 0 {
            return None;
        }
        self.bytes
            .chunks_exact(3)
            .map(|chunk| Frame::decode([chunk[0], chunk[1], chunk[2]]))
            .collect()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.polls = 0;
        self.remaining = 0;
    }
}

impl SerialBus for RecordingBus {
    fn start_transfer(&mut self, byte: u8) -> GpioResult<()> {
        self.bytes.push(byte);
        self.remaining = self.busy_polls;
        Ok(())
    }

    fn is_ready(&mut self) -> GpioResult<bool> {
        self.polls += 1;
        if self.remaining > 0 {
            self.remaining -= 1;
            return Ok(false);
        }
        Ok(true)
    }
}

/// [Delay] that only adds up how long it was asked to wait.
#[derive(Debug, Default, Copy, Clone)]
pub struct SimulatedDelay {
    elapsed_us: u64,
}

impl SimulatedDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total time waited so far.
    pub fn elapsed(&self) -> Duration {
        Duration::from_micros(self.elapsed_us)
    }
}

impl Delay for SimulatedDelay {
    fn delay_us(&mut self, us: u32) {
        self.elapsed_us += us as u64;
    }
}

/// Standalone [GpioOutput] that remembers every level written to it.
pub struct MockOutput {
    name: String,
    history: RefCell<Vec<bool>>,
}

impl MockOutput {
    pub fn new(name: &str) -> Self {
        MockOutput {
            name: name.to_string(),
            history: RefCell::new(Vec::new()),
        }
    }

    /// Every level written so far, oldest first.
    pub fn history(&self) -> Vec<bool> {
        self.history.borrow().clone()
    }

    /// The last level written, if any.
    pub fn level(&self) -> Option<bool> {
        self.history.borrow().last().copied()
    }
}

impl Debug for MockOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockOutput({})", self.name)
    }
}

impl GpioOutput for MockOutput {
    fn write(&self, value: bool) -> GpioResult<()> {
        trace!("{}: {}", self.name, value);
        self.history.borrow_mut().push(value);
        Ok(())
    }
}

/// In-memory [GpioDriver]. Outputs write into a level table that [MockGpioDriver::level] reads back.
pub struct MockGpioDriver {
    used_pins: BitVec<AtomicU8>,
    levels: BitVec<AtomicU8>,
}

impl MockGpioDriver {
    pub fn new(pin_count: usize) -> Self {
        MockGpioDriver {
            used_pins: BitVec::repeat(false, pin_count),
            levels: BitVec::repeat(false, pin_count),
        }
    }

    /// Gets the physical level of the pin.
    pub fn level(&self, index: usize) -> GpioResult<bool> {
        self.levels.get(index).map(|bit| *bit).ok_or(GpioError::InvalidArgument)
    }

    fn set_level(&self, index: usize, level: bool) -> GpioResult<()> {
        if index >= self.levels.len() {
            return Err(GpioError::InvalidArgument);
        }
        self.levels.set_aliased(index, level);
        Ok(())
    }
}

impl Debug for MockGpioDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockGpioDriver({})", self.levels.len())
    }
}

impl GpioDriver for MockGpioDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.levels.len())
    }

    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>> {
        if index >= self.count()? {
            return Err(GpioError::InvalidArgument);
        }

        if self.used_pins[index] {
            return Err(GpioError::AlreadyInUse);
        }

        self.used_pins.set_aliased(index, true);

        Ok(Box::new(MockPin {
            driver: self,
            pin_index: index,
        }))
    }
}

struct MockPin<'a> {
    driver: &'a MockGpioDriver,
    pin_index: usize,
}

impl Debug for MockPin<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}]", self.driver, self.pin_index)
    }
}

impl GpioPin for MockPin<'_> {
    fn as_output(&mut self) -> GpioResult<Box<dyn GpioOutput + '_>> {
        Ok(Box::new(MockPinOutput { pin: self }))
    }
}

impl Drop for MockPin<'_> {
    fn drop(&mut self) {
        self.driver.used_pins.set_aliased(self.pin_index, false);
    }
}

struct MockPinOutput<'a> {
    pin: &'a MockPin<'a>,
}

impl Debug for MockPinOutput<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[output]", self.pin)
    }
}

impl GpioOutput for MockPinOutput<'_> {
    fn write(&self, value: bool) -> GpioResult<()> {
        trace!("{:?}: {}", self.pin, value);
        self.pin.driver.set_level(self.pin.pin_index, value)
    }
}

/// [AnalogInput] that plays back scripted readings per channel.
///
/// Each read takes the next reading; the last one repeats forever. Reading a channel with no
/// script fails with `GpioError::InvalidArgument`.
#[derive(Debug, Default)]
pub struct MockAnalogInput {
    scripts: RefCell<HashMap<usize, VecDeque<u16>>>,
}

impl MockAnalogInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_readings(self, channel: usize, readings: impl IntoIterator<Item = u16>) -> Self {
        self.scripts.borrow_mut().insert(channel, readings.into_iter().collect());
        self
    }
}

impl AnalogInput for MockAnalogInput {
    fn read_channel(&self, channel: usize) -> GpioResult<u16> {
        let mut scripts = self.scripts.borrow_mut();
        let script = scripts.get_mut(&channel).ok_or(GpioError::InvalidArgument)?;
        let reading = if script.len() > 1 { script.pop_front() } else { script.front().copied() };
        reading.ok_or(GpioError::InvalidArgument)
    }
}
