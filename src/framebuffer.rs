use crate::display::Display;
use std::io;

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;

/// sprite rows are read most-significant bit first
const SPRITE_MSB: u8 = 0x80;
const SPRITE_WIDTH: usize = 8;

/// The machine's view of the screen: a 64x32 grid of on/off pixels, plus a
/// dirty flag so the (slow) host redraw happens at most once per tick.
pub struct Framebuffer {
    pixels: [[bool; WIDTH]; HEIGHT],
    dirty: bool,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Framebuffer {
            pixels: [[false; WIDTH]; HEIGHT],
            dirty: false,
        }
    }
}

impl Framebuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// blank every pixel
    pub fn clear(&mut self) {
        self.pixels = [[false; WIDTH]; HEIGHT];
        self.dirty = true;
    }

    /// XOR one pixel on; returns true if it was already set (and so has just
    /// been turned off)
    pub fn set_pixel(&mut self, row: usize, col: usize) -> bool {
        let px = &mut self.pixels[row][col];
        let collided = *px;
        *px = !*px;
        self.dirty = true;
        collided
    }

    /// Blit `sprite` with its top-left corner at (`x`, `y`). The origin wraps
    /// round the screen, but the rest of the sprite is clipped at the edges.
    /// Returns true if any pixel was switched off.
    pub fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let x = x as usize % WIDTH;
        let y = y as usize % HEIGHT;

        let mut collided = false;
        for (dy, byte) in sprite.iter().enumerate() {
            let row = y + dy;
            if row >= HEIGHT {
                break;
            }
            for dx in 0..SPRITE_WIDTH {
                let col = x + dx;
                if col >= WIDTH {
                    break;
                }
                if byte & (SPRITE_MSB >> dx) != 0 {
                    collided |= self.set_pixel(row, col);
                }
            }
        }
        collided
    }

    pub fn is_set(&self, row: usize, col: usize) -> bool {
        self.pixels[row][col]
    }

    pub fn row(&self, row: usize) -> &[bool; WIDTH] {
        &self.pixels[row]
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Push the bitmap out to `display` if anything changed since the last
    /// flush. Returns whether a redraw happened.
    pub fn flush(&mut self, display: &mut dyn Display) -> io::Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        for (row, cells) in self.pixels.iter().enumerate() {
            for (col, set) in cells.iter().enumerate() {
                display.draw_cell(row, col, *set)?;
            }
        }
        display.flush()?;
        self.dirty = false;
        Ok(true)
    }
}
