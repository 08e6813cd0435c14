use crate::error::Chip8Error;
use log::{info, warn};
use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;

// NB. addresses are u16 as per the chip-8; every index into RAM is reduced
//     modulo its size, so no address can ever fall off the end

/// how much RAM we have
pub const MEMORY_SIZE: usize = 4096;

/// where programs are conventionally loaded
pub const DEFAULT_LOAD_ADDR: u16 = 0x0200;

/// where the font glyphs live
pub const FONT_ADDR: u16 = 0x0000;

/// bytes per font glyph
pub const GLYPH_STRIDE: u16 = 5;

/// how deep subroutines may nest. unusually shallow, but programs written for
/// this machine rely on it
pub const STACK_SIZE: usize = 5;

/// Represents byte-addressed RAM
pub trait MemoryMap {
    /// read a byte; the address wraps
    fn read_byte(&self, addr: u16) -> u8;

    /// write a byte; the address wraps
    fn write_byte(&mut self, addr: u16, value: u8);

    /// get a big-endian two-byte word, each half wrapping independently
    fn get_word(&self, addr: u16) -> u16 {
        let hi = self.read_byte(addr) as u16;
        let lo = self.read_byte(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// write a chunk of bytes into "RAM"; the address wraps
    fn write(&mut self, data: &[u8], addr: u16) {
        for (offset, byte) in data.iter().enumerate() {
            self.write_byte(addr.wrapping_add(offset as u16), *byte);
        }
    }
}

/// 4K of flat RAM with the font baked in at the bottom
pub struct Chip8Memory {
    bytes: Box<[u8; MEMORY_SIZE]>,
}

impl MemoryMap for Chip8Memory {
    fn read_byte(&self, addr: u16) -> u8 {
        self.bytes[addr as usize % MEMORY_SIZE]
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        self.bytes[addr as usize % MEMORY_SIZE] = value;
    }
}

impl Chip8Memory {
    /// zeroed RAM, with fonts loaded at FONT_ADDR
    pub fn new() -> Result<Self, Chip8Error> {
        let mut m = Chip8Memory {
            bytes: Box::new([0u8; MEMORY_SIZE]),
        };
        m.load_fonts(FONT_ADDR)?;
        Ok(m)
    }

    /// copy the font table to `addr`; the table has to fit before the end of
    /// RAM, it is never wrapped
    pub fn load_fonts(&mut self, addr: u16) -> Result<(), Chip8Error> {
        let a = addr as usize;
        if a + CHIP8_FONT.len() > MEMORY_SIZE {
            return Err(Chip8Error::LoadFonts(addr));
        }
        self.bytes[a..a + CHIP8_FONT.len()].copy_from_slice(&CHIP8_FONT);
        Ok(())
    }

    /// read as much of `reader` as fits between `addr` and the end of RAM.
    /// short programs are fine; anything past the end is dropped
    pub fn load_program(
        &mut self,
        reader: &mut impl io::Read,
        addr: u16,
    ) -> Result<usize, Chip8Error> {
        let a = addr as usize % MEMORY_SIZE;
        let room = MEMORY_SIZE - a;

        let mut buf = Vec::with_capacity(room);
        io::Read::take(&mut *reader, room as u64)
            .read_to_end(&mut buf)
            .map_err(Chip8Error::ReadRom)?;
        self.write(&buf, a as u16);

        if buf.len() == room {
            let mut probe = [0u8; 1];
            if matches!(reader.read(&mut probe), Ok(n) if n > 0) {
                warn!("program does not fit from {:#05x}; truncated to {} bytes", a, room);
            }
        }
        Ok(buf.len())
    }

    /// open a ROM file and load it at `addr`, returning how many bytes landed
    pub fn load_rom(&mut self, path: &Path, addr: u16) -> Result<usize, Chip8Error> {
        let mut f = File::open(path).map_err(|source| Chip8Error::OpenRom {
            path: path.to_path_buf(),
            source,
        })?;
        let n = self.load_program(&mut f, addr)?;
        info!("loaded {} bytes from {} at {:#05x}", n, path.display(), addr);
        Ok(n)
    }

    /// r/o view of a region, for inspection; does not wrap
    #[cfg(test)]
    pub fn get_ro_slice(&self, addr: u16, len: usize) -> &[u8] {
        let a = addr as usize;
        &self.bytes[a..(a + len)]
    }
}

/// Return addresses for nested subroutine calls. Running out of room in
/// either direction is fatal.
#[derive(Debug, Default)]
pub struct CallStack {
    frames: [u16; STACK_SIZE],
    depth: usize,
}

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, addr: u16) -> Result<(), Chip8Error> {
        if self.depth >= STACK_SIZE {
            return Err(Chip8Error::StackOverflow);
        }
        self.frames[self.depth] = addr;
        self.depth += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, Chip8Error> {
        if self.depth == 0 {
            return Err(Chip8Error::StackUnderflow);
        }
        self.depth -= 1;
        Ok(self.frames[self.depth])
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// the five rows of the glyph for hex digit `digit`
pub fn glyph(digit: u8) -> &'static [u8] {
    let start = (digit & 0x0f) as usize * GLYPH_STRIDE as usize;
    &CHIP8_FONT[start..start + GLYPH_STRIDE as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingReader;

    impl io::Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "bad sector"))
        }
    }

    #[test]
    fn test_memory_zeroed() -> Result<(), Chip8Error> {
        let m = Chip8Memory::new()?;
        // NB. memory is zeroed from 0x50 because before that we bake in the font
        assert_eq!(m.bytes[0x50..], [0u8; 0xfb0]);
        Ok(())
    }

    #[test]
    fn test_fonts_at_bottom() -> Result<(), Chip8Error> {
        let m = Chip8Memory::new()?;
        assert_eq!(m.get_ro_slice(0, 5), &[0xF0, 0x90, 0x90, 0x90, 0xF0]);
        assert_eq!(m.get_ro_slice(5 * 5, 5), glyph(5));
        assert_eq!(m.get_ro_slice(75, 5), &[0xF0, 0x80, 0xF0, 0x80, 0x80]);
        Ok(())
    }

    #[test]
    fn test_fonts_must_fit() -> Result<(), Chip8Error> {
        let mut m = Chip8Memory::new()?;
        assert!(m.load_fonts(4016).is_ok());
        let err = m.load_fonts(4017).unwrap_err();
        assert!(matches!(err, Chip8Error::LoadFonts(4017)));
        Ok(())
    }

    #[test]
    fn test_addresses_wrap() -> Result<(), Chip8Error> {
        let mut m = Chip8Memory::new()?;
        m.write_byte(0x1005, 0xab);
        assert_eq!(m.read_byte(0x0005), 0xab);
        m.write_byte(0x0fff, 0x12);
        m.write_byte(0x0000, 0x34);
        assert_eq!(m.get_word(0x0fff), 0x1234);
        Ok(())
    }

    #[test]
    fn test_write_slice_ok() -> Result<(), Chip8Error> {
        let mut dst = Chip8Memory::new()?;
        let src: &[u8] = &[0, 1, 2, 3, 4, 5, 6, 7];
        dst.write(src, 0x208);
        assert_eq!(
            dst.get_ro_slice(0x200, 16),
            &[0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7]
        );
        Ok(())
    }

    #[test]
    fn test_write_wraps_at_end_of_ram() -> Result<(), Chip8Error> {
        let mut dst = Chip8Memory::new()?;
        dst.write(&[1, 2, 3, 4], 0x0ffe);
        assert_eq!(dst.get_ro_slice(0x0ffe, 2), &[1, 2]);
        assert_eq!(dst.get_ro_slice(0, 2), &[3, 4]);
        Ok(())
    }

    #[test]
    fn test_program_load_ok() -> Result<(), Chip8Error> {
        let mut dst = Chip8Memory::new()?;
        let mut prog: &[u8] = &[0x00, 0xe0]; // clear screen
        let n = dst.load_program(&mut prog, DEFAULT_LOAD_ADDR)?;
        assert_eq!(n, 2);
        assert_eq!(dst.get_ro_slice(0x200, 2), &[0x00, 0xe0]);
        Ok(())
    }

    #[test]
    fn test_program_load_truncates() -> Result<(), Chip8Error> {
        let mut dst = Chip8Memory::new()?;
        let mut prog: &[u8] = &[0xaa; 8];
        let n = dst.load_program(&mut prog, 4092)?;
        assert_eq!(n, 4);
        assert_eq!(dst.get_ro_slice(4092, 4), &[0xaa; 4]);
        // nothing wrapped round onto the font
        assert_eq!(dst.read_byte(0), 0xF0);
        Ok(())
    }

    #[test]
    fn test_program_read_fault() -> Result<(), Chip8Error> {
        let mut dst = Chip8Memory::new()?;
        let err = dst.load_program(&mut FailingReader, DEFAULT_LOAD_ADDR).unwrap_err();
        assert!(matches!(err, Chip8Error::ReadRom(_)));
        Ok(())
    }

    #[test]
    fn test_missing_rom() -> Result<(), Chip8Error> {
        let mut dst = Chip8Memory::new()?;
        let err = dst
            .load_rom(Path::new("/definitely/not/here.ch8"), DEFAULT_LOAD_ADDR)
            .unwrap_err();
        assert!(matches!(err, Chip8Error::OpenRom { .. }));
        Ok(())
    }

    #[test]
    fn test_stack_bounds() {
        let mut s = CallStack::new();
        for addr in 0..STACK_SIZE as u16 {
            s.push(0x200 + addr * 2).unwrap();
        }
        assert!(matches!(s.push(0x300), Err(Chip8Error::StackOverflow)));
        assert_eq!(s.depth(), 5);
        assert_eq!(s.pop().unwrap(), 0x208);
        for _ in 0..4 {
            s.pop().unwrap();
        }
        assert!(matches!(s.pop(), Err(Chip8Error::StackUnderflow)));
    }
}
