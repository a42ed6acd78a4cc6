mod app;
mod config;
mod utils;

use dotenv::dotenv;
use log::{debug, info, warn};
use lcd12864_gpio::adc::{AnalogInput, SysfsAnalogInput};
use lcd12864_gpio::delay::{Delay, ThreadDelay};
use lcd12864_gpio::gpiod::GpiodDriver;
use lcd12864_gpio::lcd::st7920::driver::SerialST7920Driver;
use lcd12864_gpio::mock::{MockAnalogInput, MockGpioDriver, RecordingBus, SimulatedDelay};
use lcd12864_gpio::raw::RawGpioDriver;
use lcd12864_gpio::spi::{RawSpiBus, SerialBus, SoftSerialBus};
use lcd12864_gpio::{GpioDriver, GpioOutput};
use crate::app::App;
use crate::config::Config;
use crate::utils::{BusBackend, GpioBackend, Wiring};

/// Joystick sweep played back when there is no ADC: idle, left, down, right, up, idle.
const MOCK_JOYSTICK: [u16; 6] = [1023, 40, 505, 680, 765, 1023];

fn open_gpio(wiring: &Wiring) -> eyre::Result<Box<dyn GpioDriver>> {
    Ok(match wiring.gpio {
        GpioBackend::Raw => {
            let gpio = RawGpioDriver::new_mem()?;
            if wiring.bus == BusBackend::Spi {
                gpio.claim_spi0()?;
            }
            Box::new(gpio)
        }
        GpioBackend::Gpiod => {
            if wiring.bus == BusBackend::Spi {
                warn!("Using SPI0 without the raw GPIO backend; GPIO 10 and 11 must already be in ALT0.");
            }
            Box::new(GpiodDriver::open(&wiring.gpio_chip)?)
        }
        GpioBackend::Mock => Box::new(MockGpioDriver::new(58)),
    })
}

fn open_analog(wiring: &Wiring, config: &Config) -> eyre::Result<Option<Box<dyn AnalogInput>>> {
    if !config.demo.needs_analog() {
        return Ok(None);
    }

    Ok(Some(match wiring.gpio {
        GpioBackend::Mock => Box::new(
            MockAnalogInput::new()
                .with_readings(config.joystick_channel, MOCK_JOYSTICK)
                .with_readings(config.knock_channel, [0, 0, 0, 42, 0]),
        ),
        _ => Box::new(SysfsAnalogInput::new(wiring.iio_device, config.adc_resolution_bits)?),
    }))
}

/// Builds the display on top of `bus` and runs the app.
fn run(
    config: Config,
    bus: &mut dyn SerialBus,
    pin_reset: Option<&dyn GpioOutput>,
    analog: Option<&dyn AnalogInput>,
    simulated: bool,
) -> eyre::Result<()> {
    let mut thread_delay = ThreadDelay;
    let mut simulated_delay = SimulatedDelay::new();
    let mut pace = ThreadDelay;

    let delay: &mut dyn Delay = if simulated { &mut simulated_delay } else { &mut thread_delay };
    let mut lcd = SerialST7920Driver::new(pin_reset, bus, delay);
    debug!("{:?} initialized.", lcd);

    App::new(config, &mut lcd, analog, &mut pace).run()?;

    if simulated {
        info!("Simulated {:?} of display settle time.", simulated_delay.elapsed());
    }
    Ok(())
}

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    info!("LCD12864 starting...");

    let wiring = Wiring::from_env()?;
    info!("Wiring: {:?}", wiring);

    debug!("Trying to load config...");
    let config = if let Some(config) = Config::try_load() {
        info!("Config loaded.");
        config
    } else {
        info!("Config not found. Using default");
        let config = Config::default();
        config.save()?;
        info!("Default config saved.");
        config
    };
    debug!("{:?}", config);

    debug!("Initializing GPIO driver...");
    let gpio = open_gpio(&wiring)?;
    debug!("{:?} initialized.", gpio);

    let mut reset_pin = match wiring.pin_reset {
        Some(index) => Some(gpio.get_pin(index)?),
        None => {
            warn!("No reset pin configured; relying on power-on reset.");
            None
        }
    };
    let reset_out = match reset_pin.as_mut() {
        Some(pin) => Some(pin.as_output()?),
        None => None,
    };

    let analog = open_analog(&wiring, &config)?;
    let simulated = wiring.bus == BusBackend::Mock;

    match wiring.bus {
        BusBackend::Spi => {
            let mut bus = RawSpiBus::new_mem()?;
            run(config, &mut bus, reset_out.as_deref(), analog.as_deref(), simulated)?;
        }
        BusBackend::Soft => {
            let mut sclk_pin = gpio.get_pin(wiring.pin_sclk)?;
            let mut sid_pin = gpio.get_pin(wiring.pin_sid)?;
            let sclk_out = sclk_pin.as_output()?;
            let sid_out = sid_pin.as_output()?;
            let mut bus = SoftSerialBus::new(&*sclk_out, &*sid_out)?;
            run(config, &mut bus, reset_out.as_deref(), analog.as_deref(), simulated)?;
        }
        BusBackend::Mock => {
            let mut bus = RecordingBus::new();
            run(config, &mut bus, reset_out.as_deref(), analog.as_deref(), simulated)?;
            info!("Recorded {} bytes.", bus.bytes().len());
        }
    }

    info!("Done.");
    Ok(())
}
