use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use log::{debug, trace};
use crate::adc::{ANALOG_MAX, AnalogInput};
use crate::{GpioError, GpioResult};

/// [AnalogInput] reading an ADC through the Linux industrial I/O subsystem.
///
/// Each channel is a file like `/sys/bus/iio/devices/iio:device0/in_voltage4_raw` holding the raw
/// sample as decimal text. The kernel driver must already be bound, e.g. with the `mcp3008`
/// overlay on a Raspberry Pi.
#[derive(Debug)]
pub struct SysfsAnalogInput {
    device: PathBuf,
    resolution_bits: u8,
}

impl SysfsAnalogInput {
    pub const IIO_DEVICES: &'static str = "/sys/bus/iio/devices";

    /// Opens IIO device `index` whose samples are `resolution_bits` wide.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the resolution is 0 or over 16 bits.
    /// - `GpioError::Io` if the device doesn't exist.
    pub fn new(index: usize, resolution_bits: u8) -> GpioResult<Self> {
        Self::with_path(format!("{}/iio:device{}", Self::IIO_DEVICES, index), resolution_bits)
    }

    /// Same as [Self::new], but with the device directory given directly.
    pub fn with_path(device: impl Into<PathBuf>, resolution_bits: u8) -> GpioResult<Self> {
        if resolution_bits == 0 || resolution_bits > 16 {
            return Err(GpioError::InvalidArgument);
        }

        let device = device.into();
        if !device.is_dir() {
            return Err(GpioError::Io(ErrorKind::NotFound));
        }

        debug!("Using IIO device {} ({} bits)", device.display(), resolution_bits);
        Ok(SysfsAnalogInput { device, resolution_bits })
    }

    /// Brings a raw sample to 10 bits and clamps it.
    fn normalize(&self, raw: u64) -> u16 {
        let scaled = if self.resolution_bits >= 10 {
            raw >> (self.resolution_bits - 10)
        } else {
            raw << (10 - self.resolution_bits)
        };
        scaled.min(ANALOG_MAX as u64) as u16
    }
}

impl AnalogInput for SysfsAnalogInput {
    fn read_channel(&self, channel: usize) -> GpioResult<u16> {
        let path = self.device.join(format!("in_voltage{}_raw", channel));
        let text = fs::read_to_string(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => GpioError::InvalidArgument,
            kind => GpioError::Io(kind),
        })?;

        let raw: i64 = text
            .trim()
            .parse()
            .map_err(|_| GpioError::Other(format!("parsing {} failed", path.display())))?;
        let value = self.normalize(raw.clamp(0, u32::MAX as i64) as u64);

        trace!("ADC channel {}: {} -> {}", channel, raw, value);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;

    /// Fake IIO device directory, removed on drop so failing asserts don't leave it behind.
    struct TempDevice(PathBuf);

    impl TempDevice {
        fn path(name: &str) -> PathBuf {
            temp_dir().join(format!("lcd12864-iio-{}-{}", name, std::process::id()))
        }

        fn new(name: &str, channels: &[(usize, &str)]) -> Self {
            let dir = Self::path(name);
            fs::create_dir_all(&dir).unwrap();
            for (channel, text) in channels {
                fs::write(dir.join(format!("in_voltage{}_raw", channel)), text).unwrap();
            }
            TempDevice(dir)
        }
    }

    impl Drop for TempDevice {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn reads_ten_bit_samples_as_is() {
        let dev = TempDevice::new("ten", &[(4, "512\n")]);
        let adc = SysfsAnalogInput::with_path(&dev.0, 10).unwrap();
        assert_eq!(adc.read_channel(4), Ok(512));
        assert_eq!(adc.read_channel(5), Err(GpioError::InvalidArgument));
    }

    #[test]
    fn rescales_and_clamps() {
        let dev = TempDevice::new("twelve", &[(0, "4095"), (1, "-3"), (2, "nonsense")]);
        let adc = SysfsAnalogInput::with_path(&dev.0, 12).unwrap();
        assert_eq!(adc.read_channel(0), Ok(1023));
        assert_eq!(adc.read_channel(1), Ok(0));
        assert!(matches!(adc.read_channel(2), Err(GpioError::Other(_))));
    }

    #[test]
    fn low_resolution_is_scaled_up() {
        let dev = TempDevice::new("eight", &[(0, "255")]);
        let adc = SysfsAnalogInput::with_path(&dev.0, 8).unwrap();
        assert_eq!(adc.read_channel(0), Ok(1020));
    }

    #[test]
    fn device_dir_is_removed_after_failed_assert() {
        let result = std::panic::catch_unwind(|| {
            let dev = TempDevice::new("unwind", &[(0, "7")]);
            let adc = SysfsAnalogInput::with_path(&dev.0, 10).unwrap();
            assert_eq!(adc.read_channel(0), Ok(8));
        });

        assert!(result.is_err());
        assert!(!TempDevice::path("unwind").exists());
    }

    #[test]
    fn rejects_bad_resolution() {
        assert_eq!(SysfsAnalogInput::with_path(temp_dir(), 0).unwrap_err(), GpioError::InvalidArgument);
        assert_eq!(SysfsAnalogInput::with_path(temp_dir(), 17).unwrap_err(), GpioError::InvalidArgument);
    }
}
