//! Software framebuffer for the 128x64 display, and the drawing primitives on top of it.

mod ext;

pub use ext::*;

/// A 128x64 monochrome bitmap, one bit per pixel.
///
/// Laid out as 64 rows of 16 bytes. Each byte holds 8 horizontally adjacent pixels with the
/// leftmost one in the most significant bit, which is exactly the order the GDRAM expects, so
/// [refresh](crate::lcd::st7920::driver::ST7920Driver::refresh) can stream rows as they are.
#[derive(Clone, Eq, PartialEq)]
pub struct Framebuffer {
    rows: [[u8; Framebuffer::STRIDE]; Framebuffer::HEIGHT],
}

impl Framebuffer {
    pub const WIDTH: usize = 128;
    pub const HEIGHT: usize = 64;
    /// Bytes per row.
    pub const STRIDE: usize = Self::WIDTH / 8;
    /// Total size in bytes.
    pub const SIZE: usize = Self::STRIDE * Self::HEIGHT;

    /// Creates an empty framebuffer.
    pub fn new() -> Self {
        Framebuffer { rows: [[0; Self::STRIDE]; Self::HEIGHT] }
    }

    /// Gets the row, the byte within the row, and the bit mask of a pixel. Flattened, the byte
    /// is at `y * 16 + (x >> 3)`.
    ///
    /// `x` is masked to the row, so an `x` of 128 or more lands back inside the same row rather
    /// than spilling into the next one.
    #[inline]
    fn locate(x: u8, y: u8) -> (usize, usize, u8) {
        let column = ((x & 0x78) >> 3) as usize;
        let mask = 0x80 >> (x & 7);
        (y as usize, column, mask)
    }

    /// Sets the pixel at (`x`, `y`). Never clears anything.
    ///
    /// This is the fast path for inner loops, so the coordinates aren't checked: `x` must be below
    /// 128 and `y` below 64. Out of range `x` draws somewhere in the same row, out of range `y`
    /// panics on the index. Use [Self::set_checked] when the coordinates can leave the screen.
    #[inline]
    pub fn set(&mut self, x: u8, y: u8) {
        debug_assert!((x as usize) < Self::WIDTH && (y as usize) < Self::HEIGHT, "pixel ({x}, {y}) off screen");
        let (row, column, mask) = Self::locate(x, y);
        self.rows[row][column] |= mask;
    }

    /// Sets the pixel at (`x`, `y`) if it is on the screen; does nothing otherwise.
    pub fn set_checked(&mut self, x: i32, y: i32) {
        if x < 0 || x >= Self::WIDTH as i32 || y < 0 || y >= Self::HEIGHT as i32 {
            return;
        }
        self.set(x as u8, y as u8);
    }

    /// Reads the pixel at (`x`, `y`). Off-screen pixels read as unset.
    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || x >= Self::WIDTH as i32 || y < 0 || y >= Self::HEIGHT as i32 {
            return false;
        }
        let (row, column, mask) = Self::locate(x as u8, y as u8);
        self.rows[row][column] & mask != 0
    }

    /// Clears every pixel.
    pub fn clear(&mut self) {
        self.rows = [[0; Self::STRIDE]; Self::HEIGHT];
    }

    /// Gets all 1024 bytes, row after row.
    pub fn as_bytes(&self) -> &[u8] {
        self.rows.as_flattened()
    }

    /// Gets the 16 bytes of row `y`.
    ///
    /// # Panics
    /// If `y` is 64 or more.
    pub fn row(&self, y: usize) -> &[u8; Self::STRIDE] {
        &self.rows[y]
    }

    /// Gets the 16 bytes of row `y` for writing whole bytes at a time.
    ///
    /// # Panics
    /// If `y` is 64 or more.
    pub fn row_mut(&mut self, y: usize) -> &mut [u8; Self::STRIDE] {
        &mut self.rows[y]
    }

    /// Counts the pixels that are set.
    pub fn count_set(&self) -> u32 {
        self.as_bytes().iter().map(|byte| byte.count_ones()).sum()
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Framebuffer({}x{}, {} set)", Self::WIDTH, Self::HEIGHT, self.count_set())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn set_uses_msb_first_layout() {
        let mut fb = Framebuffer::new();
        fb.set(0, 0);
        fb.set(9, 0);
        fb.set(127, 63);

        assert_eq!(fb.as_bytes()[0], 0b10000000);
        assert_eq!(fb.as_bytes()[1], 0b01000000);
        assert_eq!(fb.as_bytes()[1023], 0b00000001);
        assert_eq!(fb.count_set(), 3);
    }

    #[test]
    fn set_never_clears() {
        let mut fb = Framebuffer::new();
        fb.row_mut(5).fill(0xFF);
        fb.set(3, 5);
        assert_eq!(fb.row(5), &[0xFF; 16]);
    }

    #[test]
    fn row_matches_layout() {
        let mut fb = Framebuffer::new();
        fb.set(8, 2);
        assert_eq!(fb.row(2)[1], 0x80);
        assert_eq!(fb.row(1), &[0; 16]);
    }

    #[test]
    fn set_checked_ignores_edges() {
        let mut fb = Framebuffer::new();
        for (x, y) in [(-1, 0), (0, -1), (128, 0), (0, 64), (i32::MIN, i32::MAX)] {
            fb.set_checked(x, y);
        }
        assert_eq!(fb.count_set(), 0);

        fb.set_checked(127, 63);
        assert!(fb.get(127, 63));
    }

    proptest! {
        #[test]
        fn set_touches_exactly_one_bit(x in 0u8..128, y in 0u8..64) {
            let mut fb = Framebuffer::new();
            fb.set(x, y);

            let index = y as usize * 16 + (x >> 3) as usize;
            let mask = 0x80u8 >> (x & 7);
            for (i, &byte) in fb.as_bytes().iter().enumerate() {
                if i == index {
                    prop_assert_eq!(byte, mask);
                } else {
                    prop_assert_eq!(byte, 0);
                }
            }
            prop_assert!(fb.get(x as i32, y as i32));
        }

        #[test]
        fn clear_always_empties(pixels in prop::collection::vec((0u8..128, 0u8..64), 0..200)) {
            let mut fb = Framebuffer::new();
            for (x, y) in pixels {
                fb.set(x, y);
            }
            fb.clear();
            prop_assert_eq!(fb.as_bytes(), &[0u8; 1024]);
        }

        #[test]
        fn set_checked_off_screen_is_noop(
            x in prop_oneof![i32::MIN..0, 128..i32::MAX],
            y in -100i32..200,
        ) {
            let mut fb = Framebuffer::new();
            fb.set(10, 10);
            let before = fb.clone();
            fb.set_checked(x, y);
            prop_assert_eq!(fb, before);
        }

        #[test]
        fn set_checked_off_screen_rows_are_noop(
            x in -100i32..300,
            y in prop_oneof![i32::MIN..0, 64..i32::MAX],
        ) {
            let mut fb = Framebuffer::new();
            fb.set_checked(x, y);
            prop_assert_eq!(fb.count_set(), 0);
        }
    }
}
