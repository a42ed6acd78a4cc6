use std::str::FromStr;
use dotenv::var;
use thiserror::Error;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum EnvError {
    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Which [GpioDriver](lcd12864_gpio::GpioDriver) to open.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GpioBackend {
    /// Memory-mapped registers through `/dev/mem`.
    #[default]
    Raw,
    /// The Linux GPIO character device.
    Gpiod,
    /// No hardware at all.
    Mock,
}

impl FromStr for GpioBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(GpioBackend::Raw),
            "gpiod" => Ok(GpioBackend::Gpiod),
            "mock" => Ok(GpioBackend::Mock),
            _ => Err(()),
        }
    }
}

/// Which [SerialBus](lcd12864_gpio::spi::SerialBus) the display hangs off.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum BusBackend {
    /// The SPI0 controller.
    #[default]
    Spi,
    /// Bit-banged over two GPIO pins.
    Soft,
    /// Records the bytes and throws them away.
    Mock,
}

impl FromStr for BusBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spi" => Ok(BusBackend::Spi),
            "soft" => Ok(BusBackend::Soft),
            "mock" => Ok(BusBackend::Mock),
            _ => Err(()),
        }
    }
}

/// Hardware wiring, read from the environment (and `.env`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Wiring {
    pub gpio: GpioBackend,
    pub bus: BusBackend,
    pub gpio_chip: String,
    /// RST of the module. Without it, the module has to come out of reset on power-up.
    pub pin_reset: Option<usize>,
    /// E of the module, for the bit-banged bus.
    pub pin_sclk: usize,
    /// R/W of the module, for the bit-banged bus.
    pub pin_sid: usize,
    pub iio_device: usize,
}

impl Wiring {
    pub fn from_env() -> Result<Self, EnvError> {
        Self::from_lookup(|name| var(name).ok())
    }

    /// Reads the wiring through `lookup`, which returns the value of a variable if it is set.
    pub fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, EnvError> {
        Ok(Wiring {
            gpio: parse_or(&lookup, "LCD12864_GPIO", GpioBackend::default())?,
            bus: parse_or(&lookup, "LCD12864_BUS", BusBackend::default())?,
            gpio_chip: lookup("LCD12864_GPIO_CHIP").unwrap_or_else(|| "/dev/gpiochip0".to_string()),
            pin_reset: parse_optional(&lookup, "LCD12864_PIN_RST")?,
            pin_sclk: parse_or(&lookup, "LCD12864_PIN_SCLK", 11)?,
            pin_sid: parse_or(&lookup, "LCD12864_PIN_SID", 10)?,
            iio_device: parse_or(&lookup, "LCD12864_IIO_DEVICE", 0)?,
        })
    }
}

fn parse_optional<T: FromStr>(
    lookup: &impl Fn(&'static str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, EnvError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| EnvError::Invalid { name, value }),
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&'static str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, EnvError> {
    Ok(parse_optional(lookup, name)?.unwrap_or(default))
}

/// Pads or cuts `text` to exactly one line of the text screen.
pub fn fit_line(text: &str) -> String {
    format!("{:<width$.width$}", text, width = crate::app::TEXT_COLUMNS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn wiring(vars: &[(&'static str, &str)]) -> Result<Wiring, EnvError> {
        let vars: HashMap<_, _> = vars.iter().map(|&(k, v)| (k, v.to_string())).collect();
        Wiring::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_to_spi_on_raw_gpio() {
        let wiring = wiring(&[]).unwrap();
        assert_eq!(wiring.gpio, GpioBackend::Raw);
        assert_eq!(wiring.bus, BusBackend::Spi);
        assert_eq!(wiring.pin_reset, None);
        assert_eq!((wiring.pin_sclk, wiring.pin_sid), (11, 10));
    }

    #[test]
    fn reads_backends_and_pins() {
        let wiring = wiring(&[
            ("LCD12864_GPIO", "Mock"),
            ("LCD12864_BUS", "soft"),
            ("LCD12864_PIN_RST", "25"),
            ("LCD12864_PIN_SCLK", " 5 "),
        ])
        .unwrap();
        assert_eq!(wiring.gpio, GpioBackend::Mock);
        assert_eq!(wiring.bus, BusBackend::Soft);
        assert_eq!(wiring.pin_reset, Some(25));
        assert_eq!(wiring.pin_sclk, 5);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            wiring(&[("LCD12864_BUS", "i2c")]),
            Err(EnvError::Invalid { name: "LCD12864_BUS", value: "i2c".to_string() }),
        );
        assert!(wiring(&[("LCD12864_PIN_RST", "-1")]).is_err());
    }

    #[test]
    fn fit_line_pads_and_truncates() {
        assert_eq!(fit_line("Button:  512"), "Button:  512    ");
        assert_eq!(fit_line("0123456789abcdefXYZ"), "0123456789abcdef");
    }
}
