//! The demos and the state they keep between frames.

use std::f32::consts::TAU;
use log::{debug, info, warn};
use std::fmt::Display;
use time::{OffsetDateTime, UtcOffset};
use lcd12864_gpio::adc::{AnalogInput, Direction};
use lcd12864_gpio::delay::Delay;
use lcd12864_gpio::graphics::{Framebuffer, RasterExt};
use lcd12864_gpio::lcd::st7920::driver::ST7920Driver;
use lcd12864_gpio::{GpioError, GpioResult};
use crate::config::{Config, Demo};
use crate::utils::fit_line;

/// Characters per line of the text screen.
pub const TEXT_COLUMNS: usize = 16;

/// Readings at or below this are noise from the knock sensor.
pub const KNOCK_THRESHOLD: u16 = 10;
/// How long the knock relay waits after a quiet reading.
pub const KNOCK_IDLE_MS: u32 = 50;

/// The last few joystick directions, as shown on line 1 of the joystick screen.
///
/// Holding a direction adds it once. Releasing adds nothing, but lets the same direction be
/// added again. When the line is full, the next direction wipes it first.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DirectionLog {
    glyphs: [u8; TEXT_COLUMNS],
    next: usize,
    last: Option<Direction>,
}

impl DirectionLog {
    pub fn new() -> Self {
        DirectionLog {
            glyphs: [b' '; TEXT_COLUMNS],
            next: TEXT_COLUMNS,
            last: None,
        }
    }

    /// Records the current direction. Returns whether the log changed and has to be redrawn.
    pub fn push(&mut self, direction: Option<Direction>) -> bool {
        if direction == self.last {
            return false;
        }
        self.last = direction;

        let Some(direction) = direction else {
            return false;
        };

        if self.next >= TEXT_COLUMNS {
            self.glyphs = [b' '; TEXT_COLUMNS];
            self.next = 0;
        }

        self.glyphs[self.next] = direction.glyph();
        self.next += 1;
        true
    }

    pub fn glyphs(&self) -> &[u8; TEXT_COLUMNS] {
        &self.glyphs
    }
}

impl Default for DirectionLog {
    fn default() -> Self {
        Self::new()
    }
}

/// A reading from the knock sensor that was over the threshold.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Knock {
    /// Quiet readings since the previous knock.
    pub missed: u32,
    pub reading: u16,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct KnockRelay {
    missed: u32,
}

impl KnockRelay {
    /// Feeds one reading. Returns the knock if the reading is over [KNOCK_THRESHOLD].
    pub fn poll(&mut self, reading: u16) -> Option<Knock> {
        if reading > KNOCK_THRESHOLD {
            let knock = Knock { missed: self.missed, reading };
            self.missed = 0;
            Some(knock)
        } else {
            self.missed += 1;
            None
        }
    }
}

/// Fills the framebuffer with horizontal bands 4 rows tall, alternating `0x0F` and `0xF0`
/// bytes.
pub fn draw_checker(fb: &mut Framebuffer) {
    for y in 0..Framebuffer::HEIGHT {
        let byte = if y & 4 != 0 { 0xF0 } else { 0x0F };
        fb.row_mut(y).fill(byte);
    }
}

/// Concentric circles 8 pixels apart, moving outwards by 2 pixels every frame.
pub fn draw_ripples(fb: &mut Framebuffer, frame: u64) {
    let offset = (frame % 4) as u8 * 2;
    for ring in 0..5u8 {
        fb.circle(64, 32, ring * 8 + offset);
    }
}

/// Gets the point `length` pixels from the centre of the screen, `turns` of a full turn
/// clockwise from 12 o'clock.
fn polar(turns: f32, length: f32) -> (u8, u8) {
    let angle = turns * TAU;
    let x = 64.0 + length * angle.sin();
    let y = 32.0 - length * angle.cos();
    (x.round() as u8, y.round() as u8)
}

/// Twelve spokes from the centre, turning a little every frame.
pub fn draw_starburst(fb: &mut Framebuffer, frame: u64) {
    const SPOKES: u64 = 12;
    for spoke in 0..SPOKES {
        let turns = (spoke * 16 + frame % 16) as f32 / (SPOKES * 16) as f32;
        let (x, y) = polar(turns, 30.0);
        fb.line(64, 32, x, y);
    }
}

/// A clock face with hour ticks and three hands.
pub fn draw_clock(fb: &mut Framebuffer, hour: u8, minute: u8, second: u8) {
    fb.circle(64, 32, 30);
    for tick in 0..12 {
        let turns = tick as f32 / 12.0;
        let (x0, y0) = polar(turns, 26.0);
        let (x1, y1) = polar(turns, 30.0);
        fb.line(x0, y0, x1, y1);
    }

    let seconds = second as f32;
    let minutes = minute as f32 + seconds / 60.0;
    let hours = (hour % 12) as f32 + minutes / 60.0;

    for (turns, length) in [(hours / 12.0, 14.0), (minutes / 60.0, 22.0), (seconds / 60.0, 27.0)] {
        let (x, y) = polar(turns, length);
        fb.line(64, 32, x, y);
    }
}

/// Offset the clock face shows time in. Looked up once per run, falling back to UTC.
fn clock_offset(lookup: Result<UtcOffset, impl Display>) -> UtcOffset {
    lookup.unwrap_or_else(|e| {
        warn!("Local time offset unavailable ({}), using UTC.", e);
        UtcOffset::UTC
    })
}

/// The main app state struct.
pub struct App<'a> {
    config: Config,
    lcd: &'a mut dyn ST7920Driver,
    /// Needed by the joystick and knock demos only.
    analog: Option<&'a dyn AnalogInput>,
    /// Paces frames. Separate from the driver's own delay, which only covers settle times.
    pace: &'a mut dyn Delay,
}

impl<'a> App<'a> {
    pub fn new(
        config: Config,
        lcd: &'a mut dyn ST7920Driver,
        analog: Option<&'a dyn AnalogInput>,
        pace: &'a mut dyn Delay,
    ) -> App<'a> {
        App { config, lcd, analog, pace }
    }

    fn keep_going(&self, frame: u64) -> bool {
        self.config.frames.is_none_or(|limit| frame < limit)
    }

    fn analog(&self) -> GpioResult<&'a dyn AnalogInput> {
        self.analog.ok_or(GpioError::NotSupported)
    }

    /// Runs the configured demo until the frame limit, or forever.
    pub fn run(&mut self) -> GpioResult<()> {
        info!("Running {:?} demo.", self.config.demo);
        match self.config.demo {
            Demo::Joystick => self.run_joystick(),
            Demo::Knock => self.run_knock(),
            demo => self.run_graphics(demo),
        }
    }

    fn run_graphics(&mut self, demo: Demo) -> GpioResult<()> {
        self.lcd.reset()?;
        self.lcd.enter_graphics()?;

        let offset = match demo {
            Demo::Clock => Some(clock_offset(UtcOffset::current_local_offset())),
            _ => None,
        };

        let mut frame = 0;
        while self.keep_going(frame) {
            let now = offset.map(|offset| OffsetDateTime::now_utc().to_offset(offset));

            let fb = self.lcd.framebuffer_mut();
            fb.clear();
            match (demo, now) {
                (Demo::Ripples, _) => draw_ripples(fb, frame),
                (Demo::Starburst, _) => draw_starburst(fb, frame),
                (Demo::Clock, Some(now)) => draw_clock(fb, now.hour(), now.minute(), now.second()),
                _ => draw_checker(fb),
            }
            self.lcd.refresh()?;

            self.pace.delay_ms(self.config.refresh_interval_ms);
            frame += 1;
        }

        debug!("Graphics demo done after {} frames.", frame);
        Ok(())
    }

    fn print_line(&mut self, line: u8, text: &str) -> GpioResult<()> {
        self.lcd.set_cursor(line, 0)?;
        self.lcd.print(&fit_line(text))
    }

    fn run_joystick(&mut self) -> GpioResult<()> {
        let analog = self.analog()?;
        self.lcd.reset()?;

        let mut log = DirectionLog::new();
        let mut frame = 0;
        while self.keep_going(frame) {
            let button = analog.read_channel(self.config.joystick_channel)?;
            let knock = analog.read_channel(self.config.knock_channel)?;

            self.print_line(0, &format!("Button: {:4}", button))?;
            if log.push(Direction::from_reading(button)) {
                self.lcd.set_cursor(1, 0)?;
                self.lcd.send_string(log.glyphs())?;
            }
            self.print_line(2, &format!("Knock:  {:4}", knock))?;

            self.pace.delay_ms(self.config.refresh_interval_ms);
            frame += 1;
        }

        Ok(())
    }

    fn run_knock(&mut self) -> GpioResult<()> {
        let analog = self.analog()?;

        let mut relay = KnockRelay::default();
        let mut poll = 0;
        while self.keep_going(poll) {
            let reading = analog.read_channel(self.config.knock_channel)?;
            match relay.poll(reading) {
                Some(knock) => info!("{}: {}", knock.missed, knock.reading),
                None => self.pace.delay_ms(KNOCK_IDLE_MS),
            }
            poll += 1;
        }

        Ok(())
    }
}
