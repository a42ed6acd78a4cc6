use std::time::Duration;
use log::{debug, warn};
use crate::{GpioOutput, GpioResult};
use crate::delay::Delay;
use crate::graphics::Framebuffer;
use crate::lcd::st7920::driver::{CursorDirection, DeviceMode, ST7920Driver, Transport};
use crate::spi::SerialBus;

/// Driver for the ST7920 over its serial interface.
///
/// Owns everything that makes up the display state: the bus (through [Transport]), the reset
/// line, the [Framebuffer] and the [DeviceMode]. Use one per display and don't share the bus.
#[derive(Debug)]
pub struct SerialST7920Driver<'a> {
    pin_reset: Option<&'a dyn GpioOutput>,
    transport: Transport<'a>,
    framebuffer: Framebuffer,
    mode: DeviceMode,
}

impl<'a> SerialST7920Driver<'a> {
    /// How long the reset line is held low.
    pub const RESET_LOW: Duration = Duration::from_millis(1);
    /// How long to wait after releasing the reset line before the first command.
    pub const RESET_HIGH: Duration = Duration::from_millis(10);

    /// Creates a new driver. Nothing is sent until [ST7920Driver::reset].
    ///
    /// # Parameters
    ///
    /// - `pin_reset`: Optional output wired to RST. Written as raw levels: `false` pulls the line
    ///   low and resets the controller, so the pin **must be left at active high**. Without it,
    ///   the display has to come out of power-on reset by itself, which some modules don't do
    ///   reliably.
    /// - `bus`: The serial bus the module's E and R/W pins are connected to.
    /// - `delay`: Used for every settle time.
    pub fn new(
        pin_reset: Option<&'a dyn GpioOutput>,
        bus: &'a mut dyn SerialBus,
        delay: &'a mut dyn Delay,
    ) -> Self {
        SerialST7920Driver {
            pin_reset,
            transport: Transport::new(bus, delay),
            framebuffer: Framebuffer::new(),
            mode: DeviceMode::Uninitialized,
        }
    }
}

impl ST7920Driver for SerialST7920Driver<'_> {
    /// Resets the display into text mode.
    ///
    /// The reset line is pulled low for 1 ms and then released for 10 ms; the module is picky
    /// about this and won't come up with shorter pulses. Then:
    /// - basic function set, sent twice since the first command after reset is sometimes lost,
    /// - display on, cursor and blinking off,
    /// - clear, with its 2 ms hold,
    /// - entry mode: cursor moves right, no shift.
    fn reset(&mut self) -> GpioResult<()> {
        debug!("Resetting display...");

        if let Some(pin_reset) = self.pin_reset {
            pin_reset.write(false)?;
            self.transport.wait(Self::RESET_LOW);
            pin_reset.write(true)?;
        }
        self.transport.wait(Self::RESET_HIGH);

        self.function_set(false, false)?;
        self.function_set(false, false)?;
        self.display_control(true, false, false)?;
        self.clear_display()?;
        self.entry_mode(CursorDirection::Right, false)?;

        self.mode = DeviceMode::Text;
        debug!("Display in text mode.");
        Ok(())
    }

    /// Sets `RE` first and `G` in a separate command; the controller ignores `G` if both change
    /// at once.
    fn enter_graphics(&mut self) -> GpioResult<()> {
        if self.mode != DeviceMode::Text {
            warn!("Entering graphics mode from {:?} mode.", self.mode);
        }

        self.function_set(true, false)?;
        self.function_set(true, true)?;

        self.mode = DeviceMode::Graphics;
        debug!("Display in graphics mode.");
        Ok(())
    }

    fn mode(&self) -> DeviceMode {
        self.mode
    }

    fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    fn framebuffer_mut(&mut self) -> &mut Framebuffer {
        &mut self.framebuffer
    }

    fn send_command(&mut self, command: u8) -> GpioResult<()> {
        self.transport.send_instruction(command)
    }

    fn send_data(&mut self, data: u8) -> GpioResult<()> {
        self.transport.send_data(data)
    }

    fn wait(&mut self, duration: Duration) {
        self.transport.wait(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::RasterExt;
    use crate::lcd::st7920::Frame;
    use crate::mock::{MockOutput, RecordingBus, SimulatedDelay};

    fn instructions(values: &[u8]) -> Vec<Frame> {
        values.iter().map(|&v| Frame::instruction(v)).collect()
    }

    #[test]
    fn reset_sequence() {
        let pin_reset = MockOutput::new("RST");
        let mut bus = RecordingBus::new();
        let mut delay = SimulatedDelay::new();

        let mode = {
            let mut lcd = SerialST7920Driver::new(Some(&pin_reset as &dyn GpioOutput), &mut bus, &mut delay);
            assert_eq!(lcd.mode(), DeviceMode::Uninitialized);
            lcd.reset().unwrap();
            lcd.mode()
        };

        assert_eq!(mode, DeviceMode::Text);
        assert_eq!(pin_reset.history(), vec![false, true]);
        assert_eq!(bus.frames().unwrap(), instructions(&[0x30, 0x30, 0x0C, 0x01, 0x06]));

        let settle = Transport::INSTRUCTION_SETTLE * 5;
        let holds = SerialST7920Driver::RESET_LOW + SerialST7920Driver::RESET_HIGH + crate::lcd::st7920::driver::CLEAR_HOLD;
        assert_eq!(delay.elapsed(), settle + holds);
    }

    #[test]
    fn reset_without_reset_pin_still_initializes() {
        let mut bus = RecordingBus::new();
        let mut delay = SimulatedDelay::new();

        SerialST7920Driver::new(None, &mut bus, &mut delay).reset().unwrap();

        assert_eq!(bus.frames().unwrap(), instructions(&[0x30, 0x30, 0x0C, 0x01, 0x06]));
    }

    #[test]
    fn enter_graphics_sets_re_then_g() {
        let mut bus = RecordingBus::new();
        let mut delay = SimulatedDelay::new();

        let mode = {
            let mut lcd = SerialST7920Driver::new(None, &mut bus, &mut delay);
            lcd.reset().unwrap();
            lcd.enter_graphics().unwrap();
            lcd.mode()
        };

        assert_eq!(mode, DeviceMode::Graphics);
        let frames = bus.frames().unwrap();
        assert_eq!(&frames[frames.len() - 2..], &instructions(&[0x34, 0x36])[..]);
    }

    #[test]
    fn set_cursor_sends_one_instruction() {
        let mut bus = RecordingBus::new();
        let mut delay = SimulatedDelay::new();

        {
            let mut lcd = SerialST7920Driver::new(None, &mut bus, &mut delay);
            lcd.reset().unwrap();
            lcd.set_cursor(2, 0).unwrap();
            lcd.set_cursor(1, 0).unwrap();
            lcd.set_cursor(3, 0).unwrap();
            lcd.set_cursor(0, 5).unwrap();
        }

        let frames = bus.frames().unwrap();
        assert_eq!(&frames[5..], &instructions(&[0x88, 0x90, 0x98, 0x85])[..]);
    }

    #[test]
    fn send_string_streams_data_frames() {
        let mut bus = RecordingBus::new();
        let mut delay = SimulatedDelay::new();

        SerialST7920Driver::new(None, &mut bus, &mut delay).send_string(b"Hi!").unwrap();

        assert_eq!(
            bus.frames().unwrap(),
            vec![Frame::data(b'H'), Frame::data(b'i'), Frame::data(b'!')],
        );
    }

    #[test]
    fn print_replaces_non_ascii() {
        let mut bus = RecordingBus::new();
        let mut delay = SimulatedDelay::new();

        SerialST7920Driver::new(None, &mut bus, &mut delay).print("a°").unwrap();

        assert_eq!(bus.frames().unwrap(), vec![Frame::data(b'a'), Frame::data(b'?')]);
    }

    #[test]
    fn refresh_of_full_buffer() {
        let mut bus = RecordingBus::new();
        let mut delay = SimulatedDelay::new();

        {
            let mut lcd = SerialST7920Driver::new(None, &mut bus, &mut delay);
            for y in 0..64 {
                for x in 0..128 {
                    lcd.framebuffer_mut().set(x, y);
                }
            }
            lcd.refresh().unwrap();
        }

        let frames = bus.frames().unwrap();
        assert_eq!(frames.len(), 1152);

        for (row, chunk) in frames.chunks(18).enumerate() {
            let bank = if row < 32 { 0x80 } else { 0x88 };
            assert_eq!(chunk[0], Frame::instruction(0x80 | (row as u8 & 0x1F)));
            assert_eq!(chunk[1], Frame::instruction(bank));
            assert!(chunk[2..].iter().all(|&f| f == Frame::data(0xFF)));
        }
    }

    #[test]
    fn refresh_sends_rows_in_order() {
        let mut bus = RecordingBus::new();
        let mut delay = SimulatedDelay::new();

        {
            let mut lcd = SerialST7920Driver::new(None, &mut bus, &mut delay);
            lcd.reset().unwrap();
            lcd.enter_graphics().unwrap();
            lcd.framebuffer_mut().line(0, 40, 16, 40);
            lcd.framebuffer_mut().set(127, 63);
            lcd.refresh().unwrap();
        }

        // 5 frames of reset, 2 of entering graphics
        let frames = bus.frames().unwrap();
        let frames = &frames[7..];
        assert_eq!(frames.len(), 1152);

        let row_40 = &frames[40 * 18..41 * 18];
        assert_eq!(row_40[0], Frame::instruction(0x80 | 8));
        assert_eq!(row_40[1], Frame::instruction(0x88));
        assert_eq!(row_40[2], Frame::data(0xFF));
        assert_eq!(row_40[3], Frame::data(0xFF));
        assert_eq!(row_40[4], Frame::data(0x00));

        assert_eq!(frames[frames.len() - 1], Frame::data(0x01));
        assert_eq!(frames[frames.len() - 2], Frame::data(0x00));
    }

    #[test]
    fn clear_display_holds_for_clear() {
        let mut bus = RecordingBus::new();
        let mut delay = SimulatedDelay::new();

        SerialST7920Driver::new(None, &mut bus, &mut delay).clear_display().unwrap();

        assert_eq!(bus.frames().unwrap(), instructions(&[0x01]));
        assert_eq!(delay.elapsed(), Transport::INSTRUCTION_SETTLE + crate::lcd::st7920::driver::CLEAR_HOLD);
    }

    #[test]
    fn gdram_address_is_validated() {
        let mut bus = RecordingBus::new();
        let mut delay = SimulatedDelay::new();

        let mut lcd = SerialST7920Driver::new(None, &mut bus, &mut delay);
        assert_eq!(lcd.set_gdram_address(64, 0), Err(crate::GpioError::InvalidArgument));
        assert_eq!(lcd.set_gdram_address(0, 16), Err(crate::GpioError::InvalidArgument));
    }
}
