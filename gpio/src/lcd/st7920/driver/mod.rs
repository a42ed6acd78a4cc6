//! ST7920 driver interface.
//!
//! See [ST7920Driver] for the instruction set and the higher-level operations built on it, and
//! [SerialST7920Driver] for the implementation over a [SerialBus](crate::spi::SerialBus).

mod serial;
mod transport;

use std::fmt::Debug;
use std::time::Duration;
use log::warn;
use crate::graphics::Framebuffer;
use crate::{GpioError, GpioResult};
pub use serial::*;
pub use transport::*;

/// The mode the display was last put into.
///
/// The controller has no way to report this, so the driver tracks it on its own. Nothing stops
/// a caller from calling an operation in the wrong mode: the bytes go out anyway and the display
/// interprets them however it currently sees fit. The driver only logs a warning.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum DeviceMode {
    /// Nothing has been sent since the driver was created.
    #[default]
    Uninitialized,
    /// Basic instruction set, characters from the built-in font.
    Text,
    /// Extended instruction set with graphics display on.
    Graphics,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing data.
    Left,
    /// Moves the cursor to the right after writing data.
    Right,
}

/// How long the controller needs to clear DDRAM. The datasheet says 1.6 ms.
pub const CLEAR_HOLD: Duration = Duration::from_millis(2);

/// Computes the DDRAM address command for the given text line (0–3) and column.
///
/// The four lines don't start where the datasheet says. Line 1 starts at `0x90` and line 2 at
/// `0x88`, because each of lines 2 and 3 is really the right half of lines 0 and 1. So bit 0 of
/// the line selects `0x10` and bit 1 selects `0x08`.
///
/// One column is one 16-bit DDRAM cell, which holds two half-width characters.
pub fn cursor_address(line: u8, col: u8) -> u8 {
    let mut address = 0x80u8.wrapping_add(col);
    if line & 1 != 0 {
        address |= 0x10;
    }
    if line & 2 != 0 {
        address |= 0x08;
    }
    address
}

/// The `ST7920Driver` trait defines the interface for ST7920 LCD controller drivers.
///
/// The provided methods encode the instruction set on top of three primitives the implementation
/// supplies: [Self::send_command], [Self::send_data] and [Self::wait].
///
/// # Instruction sets
///
/// The controller has a basic and an extended instruction set, switched by the `RE` bit of the
/// function set command. Text mode uses the basic set. Graphics mode sets `RE` and then the
/// graphics display bit `G`; the two can't be changed in the same command. Several opcodes mean
/// different things depending on `RE`: `1xxxxxxx` is a DDRAM address in the basic set but a GDRAM
/// address in the extended one.
///
/// Going back from graphics to text is done with a full [Self::reset].
pub trait ST7920Driver: Debug {
    /// Pulses the reset line and brings the controller into text mode with a clear display.
    /// See [SerialST7920Driver::reset] for the sequence.
    fn reset(&mut self) -> GpioResult<()>;

    /// Switches from text mode to graphics mode.
    fn enter_graphics(&mut self) -> GpioResult<()>;

    /// The mode the driver last put the display into.
    fn mode(&self) -> DeviceMode;

    /// The pixel buffer [Self::refresh] sends to the display.
    fn framebuffer(&self) -> &Framebuffer;

    fn framebuffer_mut(&mut self) -> &mut Framebuffer;

    /// Clears the text display and moves the cursor home, then waits for the controller to finish.
    ///
    /// Command: `00000001`, basic set.
    fn clear_display(&mut self) -> GpioResult<()> {
        self.send_command(0b00000001)?;
        self.wait(CLEAR_HOLD);
        Ok(())
    }

    /// Moves the cursor to the start of line 0 without clearing anything.
    ///
    /// Command: `0000001?`, basic set.
    fn return_home(&mut self) -> GpioResult<()> {
        self.send_command(0b00000010)
    }

    /// Sets which way the cursor moves after each character, and whether the display shifts.
    ///
    /// Command: `000001IS`, basic set.
    /// `I` is `1` for right cursor direction, `0` for left cursor direction.
    /// `S` is `1` for display shift, `0` for no display shift.
    fn entry_mode(&mut self, cursor_direction: CursorDirection, shift: bool) -> GpioResult<()> {
        let mut command = 0b00000100;
        if cursor_direction == CursorDirection::Right {
            command |= 0b00000010;
        }
        if shift {
            command |= 0b00000001;
        }
        self.send_command(command)
    }

    /// Turns the display on or off, and controls the cursor and its blinking.
    ///
    /// Command: `00001DCB`, basic set.
    fn display_control(&mut self, display_on: bool, cursor_on: bool, blink_on: bool) -> GpioResult<()> {
        let mut command = 0b00001000;
        if display_on {
            command |= 0b00000100;
        }
        if cursor_on {
            command |= 0b00000010;
        }
        if blink_on {
            command |= 0b00000001;
        }
        self.send_command(command)
    }

    /// Function set. Always selects the 8-bit interface, which is the only one the serial mode has.
    ///
    /// Command: `0011?RG?`.
    /// `R` is `1` for the extended instruction set.
    /// `G` is `1` to turn the graphics display on; only valid with `R` already set.
    fn function_set(&mut self, extended: bool, graphics: bool) -> GpioResult<()> {
        let mut command = 0b00110000;
        if extended {
            command |= 0b00000100;
        }
        if graphics {
            command |= 0b00000010;
        }
        self.send_command(command)
    }

    /// Sets the DDRAM address, which is where the next character goes.
    ///
    /// Command: `10AAAAAA`, basic set.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the address does not fit in 6 bits.
    fn set_ddram_address(&mut self, address: u8) -> GpioResult<()> {
        if address > 0b00111111 {
            return Err(GpioError::InvalidArgument);
        }
        self.send_command(0b10000000 | address)
    }

    /// Sets the GDRAM address, which is where the next data byte goes. Takes two commands,
    /// vertical first.
    ///
    /// The GDRAM is laid out as 32 rows of 256 pixels: the bottom half of the screen is the right
    /// half of each row. Horizontal addresses 0–7 are the top half, 8–15 the bottom half, each
    /// step being 16 pixels. The address auto-increments horizontally after every 2 bytes.
    ///
    /// Commands: `10VVVVVV`, `1000HHHH`, extended set.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the vertical address is over 63 or the horizontal one over 15.
    fn set_gdram_address(&mut self, vertical: u8, horizontal: u8) -> GpioResult<()> {
        if vertical > 0b00111111 || horizontal > 0b00001111 {
            return Err(GpioError::InvalidArgument);
        }
        self.send_command(0b10000000 | vertical)?;
        self.send_command(0b10000000 | horizontal)
    }

    /// Moves the text cursor to the given line (0–3) and column. See [cursor_address] for the
    /// addressing quirk.
    fn set_cursor(&mut self, line: u8, col: u8) -> GpioResult<()> {
        if self.mode() != DeviceMode::Text {
            warn!("Setting cursor while in {:?} mode.", self.mode());
        }
        self.send_command(cursor_address(line, col))
    }

    /// Sends raw bytes as display data, one frame each. There's no terminator; the slice length
    /// is all there is.
    fn send_string(&mut self, bytes: &[u8]) -> GpioResult<()> {
        for &byte in bytes {
            self.send_data(byte)?;
        }
        Ok(())
    }

    /// Prints a string at the cursor. Non-ASCII characters are sent as `?`.
    fn print(&mut self, s: &str) -> GpioResult<()> {
        for c in s.chars() {
            if c.is_ascii() {
                self.send_data(c as u8)?;
            } else {
                warn!("Non-ASCII character: {}", c);
                self.send_data(b'?')?;
            }
        }
        Ok(())
    }

    /// Paints the whole framebuffer onto the display. Expects graphics mode.
    ///
    /// For each of the 64 rows, selects the row (`row & 0x1F`) and the bank (horizontal address
    /// 0 for the top half, 8 for the bottom), then streams the row's 16 bytes. That is
    /// 64 × (2 + 16) = 1152 frames, which at the settle times alone adds up to about 50 ms.
    ///
    /// Not meant to be interrupted: the controller's address counter is left somewhere in the
    /// middle until the loop completes.
    fn refresh(&mut self) -> GpioResult<()> {
        if self.mode() != DeviceMode::Graphics {
            warn!("Refreshing while in {:?} mode.", self.mode());
        }

        for y in 0..Framebuffer::HEIGHT {
            let row = *self.framebuffer().row(y);
            let bank = if y < 32 { 0 } else { 8 };
            self.set_gdram_address(y as u8 & 0x1F, bank)?;
            self.send_string(&row)?;
        }

        Ok(())
    }

    // Low-level commands
    // Implemented by the driver; everything above goes through them.

    /// Sends an instruction frame and waits for it to settle.
    fn send_command(&mut self, command: u8) -> GpioResult<()>;

    /// Sends a data frame and waits for it to settle.
    fn send_data(&mut self, data: u8) -> GpioResult<()>;

    /// Blocks for an extra `duration`, for commands that take longer than a regular frame.
    fn wait(&mut self, duration: Duration);
}
