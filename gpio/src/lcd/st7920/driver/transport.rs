use std::time::Duration;
use log::trace;
use crate::GpioResult;
use crate::delay::Delay;
use crate::lcd::st7920::{Frame, FrameKind};
use crate::spi::SerialBus;

/// Pushes [Frame]s onto a [SerialBus] and holds the line quiet afterwards.
///
/// The serial interface can't read the busy flag, so the only way to know the controller is done
/// is to wait long enough for the slowest command of the kind just sent. The regular instructions
/// take 72 µs, data writes take 40 µs. Anything slower (the clear command) needs an extra
/// [Self::wait] by the caller.
#[derive(Debug)]
pub struct Transport<'a> {
    bus: &'a mut dyn SerialBus,
    delay: &'a mut dyn Delay,
}

impl<'a> Transport<'a> {
    /// Settle time after an instruction frame.
    pub const INSTRUCTION_SETTLE: Duration = Duration::from_micros(72);
    /// Settle time after a data frame.
    pub const DATA_SETTLE: Duration = Duration::from_micros(40);

    pub fn new(bus: &'a mut dyn SerialBus, delay: &'a mut dyn Delay) -> Self {
        Transport { bus, delay }
    }

    pub fn send_instruction(&mut self, instruction: u8) -> GpioResult<()> {
        self.send_frame(Frame::instruction(instruction))
    }

    pub fn send_data(&mut self, data: u8) -> GpioResult<()> {
        self.send_frame(Frame::data(data))
    }

    /// Sends the three bytes of the frame, waiting for each to leave the bus, then settles.
    pub fn send_frame(&mut self, frame: Frame) -> GpioResult<()> {
        trace!("Sending data: {:08b}, RS: {}", frame.value, frame.kind.rs());

        for byte in frame.encode() {
            self.bus.send(byte)?;
        }

        self.delay.delay(match frame.kind {
            FrameKind::Instruction => Self::INSTRUCTION_SETTLE,
            FrameKind::Data => Self::DATA_SETTLE,
        });

        Ok(())
    }

    pub fn wait(&mut self, duration: Duration) {
        self.delay.delay(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{RecordingBus, SimulatedDelay};

    #[test]
    fn instruction_is_three_bytes_then_settle() {
        let mut bus = RecordingBus::new();
        let mut delay = SimulatedDelay::new();

        Transport::new(&mut bus, &mut delay).send_instruction(0x36).unwrap();

        assert_eq!(bus.bytes(), &[0xF8, 0x30, 0x60]);
        assert_eq!(delay.elapsed(), Transport::INSTRUCTION_SETTLE);
    }

    #[test]
    fn data_settles_for_less() {
        let mut bus = RecordingBus::new();
        let mut delay = SimulatedDelay::new();

        Transport::new(&mut bus, &mut delay).send_data(b'A').unwrap();

        assert_eq!(bus.bytes(), &[0xFA, 0x40, 0x10]);
        assert_eq!(delay.elapsed(), Transport::DATA_SETTLE);
    }

    #[test]
    fn waits_for_a_slow_bus() {
        let mut bus = RecordingBus::new().with_busy_polls(3);
        let mut delay = SimulatedDelay::new();

        Transport::new(&mut bus, &mut delay).send_data(0x00).unwrap();

        assert_eq!(bus.bytes().len(), 3);
        assert_eq!(bus.polls(), 3 * 4);
    }
}
