use crate::error::Chip8Error;
use crate::input::Keymap;
use crate::memory::{DEFAULT_LOAD_ADDR, MEMORY_SIZE};
use std::path::PathBuf;

/// instructions executed per 60Hz tick unless told otherwise
pub const DEFAULT_INSTRUCTIONS_PER_TICK: u32 = 11;

/// Everything needed to start a run, already checked. Built before any
/// machine state exists, so bad options never get as far as the terminal.
#[derive(Debug, Clone)]
pub struct Config {
    pub load_address: u16,
    pub keymap: Keymap,
    pub seed: Option<u64>,
    pub instructions_per_tick: u32,
    pub rom: PathBuf,
}

impl Config {
    pub fn new(
        load_address: u64,
        keymap: Option<&str>,
        seed: Option<u64>,
        instructions_per_tick: i64,
        rom: PathBuf,
    ) -> Result<Config, Chip8Error> {
        if load_address >= MEMORY_SIZE as u64 {
            return Err(Chip8Error::InvalidLoadAddress(load_address as usize));
        }
        let keymap = match keymap {
            Some(k) => k.parse()?,
            None => Keymap::default(),
        };
        if instructions_per_tick <= 0 || instructions_per_tick > u32::MAX as i64 {
            return Err(Chip8Error::InvalidSpeed);
        }
        Ok(Config {
            load_address: load_address as u16,
            keymap,
            seed,
            instructions_per_tick: instructions_per_tick as u32,
            rom,
        })
    }

    /// defaults for everything but the ROM
    pub fn for_rom(rom: PathBuf) -> Config {
        Config {
            load_address: DEFAULT_LOAD_ADDR,
            keymap: Keymap::default(),
            seed: None,
            instructions_per_tick: DEFAULT_INSTRUCTIONS_PER_TICK,
            rom,
        }
    }
}
