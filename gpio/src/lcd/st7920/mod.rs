//! ST7920 LCD module, driven over its serial interface.
//!
//! The ST7920 is the controller behind the common blue/green 128x64 "12864" modules. It has two
//! personalities: a text mode with a built-in font (4 lines of 16 half-width characters), and a
//! graphics mode where the whole GDRAM is one bitmap. The serial interface is write-only: there
//! is no busy flag to read, so every frame is followed by a fixed settle delay instead.
//!
//! See [driver::ST7920Driver] for the instruction set, [driver::SerialST7920Driver] for the driver
//! owning the bus and the [Framebuffer](crate::graphics::Framebuffer), and [Frame] for the wire
//! format.
//!
//! # Wiring
//!
//! | Module | Board                         |
//! |--------|-------------------------------|
//! | E      | SCLK (GPIO 11 for SPI0)       |
//! | R/W    | MOSI (GPIO 10 for SPI0) / SID |
//! | RS     | VCC (chip select, always on)  |
//! | PSB    | GND (serial mode)             |
//! | RST    | any GPIO                      |
//!
//! # Sources
//!
//! - Sitronix, [“ST7920 Chinese Fonts built in LCD controller/driver,”](https://www.crystalfontz.com/controllers/Sitronix/ST7920/)
//!   V4.0, 2008.

pub mod driver;
mod frame;

pub use frame::*;
