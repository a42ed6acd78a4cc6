//! Analog inputs.
//!
//! The demo hardware has a resistor-ladder joystick and a piezo knock sensor on two channels of
//! an external ADC. Readings are normalized to 10 bits, `0..=1023`.

mod direction;
mod sysfs;

use std::fmt::Debug;
use crate::GpioResult;
pub use direction::*;
pub use sysfs::*;

/// The largest reading [AnalogInput::read_channel] returns.
pub const ANALOG_MAX: u16 = 1023;

pub trait AnalogInput: Debug {
    /// Samples the given channel.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the channel doesn't exist.
    fn read_channel(&self, channel: usize) -> GpioResult<u16>;
}
