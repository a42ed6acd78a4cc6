use std::env::var_os;
use std::ffi::OsStr;
use std::path::PathBuf;
use serde::{Serialize, Deserialize};

/// What the app shows.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Demo {
    /// Horizontal bands, 4 rows each, alternating left and right half-bytes.
    #[default]
    Checker,
    /// Concentric circles growing from the centre.
    Ripples,
    /// Lines from the centre, rotating.
    Starburst,
    /// An analog clock face showing local time.
    Clock,
    /// Text mode: joystick reading, direction log and knock reading.
    Joystick,
    /// No display output, knock sensor hits go to the log.
    Knock,
}

impl Demo {
    /// Whether the demo reads the analog inputs.
    pub fn needs_analog(self) -> bool {
        matches!(self, Demo::Joystick | Demo::Knock)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(default)]
pub struct Config {
    pub demo: Demo,
    /// Time between frames of the graphics demos and updates of the joystick screen.
    pub refresh_interval_ms: u32,
    /// Stops after this many frames. Runs forever if not set.
    pub frames: Option<u64>,
    /// ADC channel of the joystick resistor ladder.
    pub joystick_channel: usize,
    /// ADC channel of the knock sensor.
    pub knock_channel: usize,
    /// Width of the raw ADC samples, rescaled to 10 bits on read.
    pub adc_resolution_bits: u8,
}

impl Config {
    fn path() -> PathBuf {
        let config_str = var_os("CONFIG_FILE");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("config.json"));
        PathBuf::from(config_str)
    }

    pub fn try_load() -> Option<Self> {
        let config_path = Self::path();
        if config_path.exists() {
            let file = std::fs::File::open(config_path).ok()?;
            let reader = std::io::BufReader::new(file);
            serde_json::from_reader(reader).ok()
        } else {
            None
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        let file = std::fs::File::create(Self::path())?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            demo: Demo::default(),
            refresh_interval_ms: 100,
            frames: None,
            joystick_channel: 4,
            knock_channel: 5,
            adc_resolution_bits: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config = serde_json::from_str(r#"{ "demo": "ripples", "frames": 3 }"#).unwrap();
        assert_eq!(config.demo, Demo::Ripples);
        assert_eq!(config.frames, Some(3));
        assert_eq!(config.refresh_interval_ms, 100);
        assert_eq!(config.knock_channel, 5);
    }

    #[test]
    fn oversized_refresh_interval_is_rejected() {
        let result = serde_json::from_str::<Config>(r#"{ "refresh_interval_ms": 5000000000 }"#);
        assert!(result.is_err());

        let config: Config = serde_json::from_str(r#"{ "refresh_interval_ms": 4294967295 }"#).unwrap();
        assert_eq!(config.refresh_interval_ms, u32::MAX);
    }

    #[test]
    fn default_survives_json() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains(r#""demo":"checker""#));
        assert_eq!(serde_json::from_str::<Config>(&json).unwrap(), Config::default());
    }
}
