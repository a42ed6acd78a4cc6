use std::mem::swap;
use crate::graphics::Framebuffer;

/// Shapes drawn out of single pixels.
///
/// Drawing only ever sets pixels, so shapes overlay whatever is already in the buffer.
pub trait RasterExt {
    /// Draws a line from (`x0`, `y0`) towards (`x1`, `y1`) using Bresenham's algorithm.
    ///
    /// The last pixel along the major axis is not drawn, so a line whose endpoints are equal
    /// draws nothing. Both endpoints must be on the screen.
    fn line(&mut self, x0: u8, y0: u8, x1: u8, y1: u8);

    /// Draws a circle outline with the midpoint algorithm. Parts that fall off the screen are
    /// clipped.
    fn circle(&mut self, cx: u8, cy: u8, radius: u8);
}

impl RasterExt for Framebuffer {
    fn line(&mut self, mut x0: u8, mut y0: u8, mut x1: u8, mut y1: u8) {
        let steep = y1.abs_diff(y0) > x1.abs_diff(x0);
        if steep {
            swap(&mut x0, &mut y0);
            swap(&mut x1, &mut y1);
        }
        if x0 > x1 {
            swap(&mut x0, &mut x1);
            swap(&mut y0, &mut y1);
        }

        let delta_x = (x1 - x0) as i32;
        let delta_y = y1.abs_diff(y0) as i32;
        let mut error = delta_x >> 1;
        let step: i32 = if y0 < y1 { 1 } else { -1 };
        let mut y = y0 as i32;

        for x in x0..x1 {
            if steep {
                self.set(y as u8, x);
            } else {
                self.set(x, y as u8);
            }
            error -= delta_y;
            if error < 0 {
                y += step;
                error += delta_x;
            }
        }
    }

    fn circle(&mut self, cx: u8, cy: u8, radius: u8) {
        let (cx, cy) = (cx as i32, cy as i32);
        let mut error = -(radius as i32);
        let mut x = radius as i32;
        let mut y = 0;

        while x > y {
            plot8(self, cx, cy, x, y);
            error += y;
            y += 1;
            error += y;
            if error >= 0 {
                error -= x;
                x -= 1;
                error -= x;
            }
        }
        plot4(self, cx, cy, x, y);
    }
}

fn plot4(fb: &mut Framebuffer, cx: i32, cy: i32, x: i32, y: i32) {
    fb.set_checked(cx + x, cy + y);
    fb.set_checked(cx - x, cy + y);
    fb.set_checked(cx + x, cy - y);
    fb.set_checked(cx - x, cy - y);
}

fn plot8(fb: &mut Framebuffer, cx: i32, cy: i32, x: i32, y: i32) {
    plot4(fb, cx, cy, x, y);
    plot4(fb, cx, cy, y, x);
}
