use lcd12864_gpio::delay::ThreadDelay;
use lcd12864_gpio::graphics::{Framebuffer, RasterExt};
use lcd12864_gpio::lcd::st7920::driver::{SerialST7920Driver, ST7920Driver};
use lcd12864_gpio::raw::RawGpioDriver;
use lcd12864_gpio::spi::RawSpiBus;
use lcd12864_gpio::GpioDriver;
use dotenv::dotenv;
use log::{debug, info};
use std::thread::sleep;
use std::time::Duration;
use sysinfo::System;

/// Border, both diagonals and a circle in the middle.
fn draw_test_card(fb: &mut Framebuffer) {
    fb.clear();
    fb.line(0, 0, 127, 0);
    fb.line(127, 0, 127, 63);
    fb.line(127, 63, 0, 63);
    fb.line(0, 63, 0, 0);
    fb.set(127, 63);

    fb.line(0, 0, 127, 63);
    fb.line(0, 63, 127, 0);
    fb.circle(64, 32, 20);
}

fn draw_checker(fb: &mut Framebuffer) {
    for y in 0..Framebuffer::HEIGHT {
        fb.row_mut(y).fill(if y & 4 != 0 { 0xF0 } else { 0x0F });
    }
}

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    const UNKNOWN_STR: &str = "???";

    info!(
        "Hello, {}!",
        System::name().as_deref().unwrap_or(UNKNOWN_STR)
    );
    info!(
        "System ver {} kernel ver {}",
        System::long_os_version().as_deref().unwrap_or(UNKNOWN_STR),
        System::kernel_version().as_deref().unwrap_or(UNKNOWN_STR),
    );
    info!(
        "Hostname {}",
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR)
    );
    info!("Architecture {}", System::cpu_arch());

    // SPI0 needs /dev/mem anyway
    let gpio = RawGpioDriver::new_mem()?;
    gpio.claim_spi0()?;

    let mut pin_rst = gpio.get_pin(25)?;
    let pin_rst_out = pin_rst.as_output()?;

    let mut bus = RawSpiBus::new_mem()?;
    let mut delay = ThreadDelay;

    let mut driver = SerialST7920Driver::new(Some(&*pin_rst_out), &mut bus, &mut delay);
    driver.reset()?;
    debug!("{:?} ready.", driver);

    // Lines should come out in order 0 1 2 3 even though their addresses don't.
    for line in 0..4 {
        driver.set_cursor(line, 0)?;
        driver.print(&format!("Line {} ........", line))?;
    }
    sleep(Duration::from_secs(3));

    driver.enter_graphics()?;

    let mut frame = 0u32;
    loop {
        if frame % 20 < 10 {
            draw_test_card(driver.framebuffer_mut());
        } else {
            draw_checker(driver.framebuffer_mut());
        }
        driver.refresh()?;

        sleep(Duration::from_millis(100));
        frame = frame.wrapping_add(1);
    }
}
