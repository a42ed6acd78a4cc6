//! Userspace driver for 128x64 ST7920-based LCD modules (12864ZB and friends) wired to the
//! serial interface, plus the GPIO, bus and analog input plumbing it needs on a Linux board.
//!
//! The interesting part lives in [lcd::st7920]; [graphics] holds the software framebuffer
//! and the rasterizer that draws into it.

pub mod adc;
pub mod delay;
pub mod gpiod;
pub mod graphics;
pub mod lcd;
pub mod mock;
pub mod raw;
pub mod spi;

use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("pin already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("not supported with this setup")]
    NotSupported,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("error: {0}")]
    Other(String),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

pub trait GpioDriver: Debug {
    /// Gets the amount of GPIO pins available.
    fn count(&self) -> GpioResult<usize>;

    /// Gets the GPIO pin at the given index.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the index is out of range.
    /// - `GpioError::AlreadyInUse` if the pin was requested before and not dropped yet.
    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>>;
}

/// A claimed pin. The display only ever drives its pins, so outputs are all there is.
pub trait GpioPin: Debug {
    /// Sets the GPIO pin function to output, allowing writing its state.
    fn as_output(&mut self) -> GpioResult<Box<dyn GpioOutput + '_>>;
}

pub trait GpioOutput: Debug {
    /// Writes the state of the GPIO pin.
    fn write(&self, value: bool) -> GpioResult<()>;
}
