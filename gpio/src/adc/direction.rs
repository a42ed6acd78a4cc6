/// A joystick direction, decoded from the voltage of a resistor ladder.
///
/// Each button pulls the channel to a different level. The windows below were measured on the
/// demo board and leave gaps between them, so a reading caught mid-transition decodes as no
/// press instead of the wrong direction.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Decodes a 10-bit reading. `None` means no button is pressed.
    pub fn from_reading(reading: u16) -> Option<Direction> {
        match reading {
            0..100 => Some(Direction::Left),
            491..520 => Some(Direction::Down),
            671..690 => Some(Direction::Right),
            756..775 => Some(Direction::Up),
            _ => None,
        }
    }

    /// Gets the arrow glyph for this direction in the controller's built-in font.
    pub fn glyph(self) -> u8 {
        match self {
            Direction::Up => 0x18,
            Direction::Down => 0x19,
            Direction::Right => 0x1A,
            Direction::Left => 0x1B,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_bounds_are_exclusive() {
        assert_eq!(Direction::from_reading(99), Some(Direction::Left));
        assert_eq!(Direction::from_reading(100), None);
        assert_eq!(Direction::from_reading(490), None);
        assert_eq!(Direction::from_reading(491), Some(Direction::Down));
        assert_eq!(Direction::from_reading(519), Some(Direction::Down));
        assert_eq!(Direction::from_reading(520), None);
        assert_eq!(Direction::from_reading(670), None);
        assert_eq!(Direction::from_reading(680), Some(Direction::Right));
        assert_eq!(Direction::from_reading(690), None);
        assert_eq!(Direction::from_reading(755), None);
        assert_eq!(Direction::from_reading(760), Some(Direction::Up));
        assert_eq!(Direction::from_reading(775), None);
    }

    #[test]
    fn released_reads_high() {
        assert_eq!(Direction::from_reading(1023), None);
        assert_eq!(Direction::from_reading(600), None);
    }

    #[test]
    fn glyphs_are_font_arrows() {
        assert_eq!(Direction::Left.glyph(), 0x1B);
        assert_eq!(Direction::Down.glyph(), 0x19);
        assert_eq!(Direction::Right.glyph(), 0x1A);
        assert_eq!(Direction::Up.glyph(), 0x18);
    }
}
