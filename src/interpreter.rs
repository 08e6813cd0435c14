//! # interpreter
//!
//! The machine proper: 4K of RAM, sixteen 8-bit registers (VF doubling as the
//! carry/borrow/collision flag), a 12-bit-ish index register, a five-deep
//! call stack, two 60Hz countdown timers and the framebuffer.
//!
//! Everything is owned by one `Chip8Interpreter`; the environment drives it a
//! tick at a time:
//!
//!  1. `key_event()` with whatever the keyboard said this tick, which also
//!     releases a pending wait-for-key
//!  2. `step()` as many times as the speed setting allows
//!  3. `decay_timers()`
//!
//! Faults (bad opcode, stack over/underflow) come back as errors and end the
//! run; there's no attempt to carry on from a broken state.
use crate::error::Chip8Error;
use crate::framebuffer::Framebuffer;
use crate::input::KeyPress;
use crate::instruction::{Instruction, Reg};
use crate::memory::{self, CallStack, Chip8Memory, MemoryMap};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io;
use std::path::Path;

/// the flag register
const VF: Reg = 0xf;

/// `add to index` reports overflow past this
const INDEX_LIMIT: u16 = 0x0fff;

pub struct Chip8Interpreter {
    memory: Chip8Memory,
    stack: CallStack,
    program_counter: u16,
    i: u16,
    v: [u8; 16],
    delay_timer: u8,
    sound_timer: u8,
    framebuffer: Framebuffer,
    rng: StdRng,
    /// the key seen on the most recent poll
    pressed: KeyPress,
    /// register waiting for a key, when stalled on Fx0A
    awaiting_key: Option<Reg>,
}

impl Chip8Interpreter {
    /// a fresh machine with fonts loaded, about to run from `load_addr`.
    /// with no seed, the random generator is seeded from the OS
    pub fn new(load_addr: u16, seed: Option<u64>) -> Result<Chip8Interpreter, Chip8Error> {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Ok(Chip8Interpreter {
            memory: Chip8Memory::new()?,
            stack: CallStack::new(),
            program_counter: load_addr,
            i: 0x0000,
            v: [0; 16],
            delay_timer: 0x00,
            sound_timer: 0x00,
            framebuffer: Framebuffer::new(),
            rng,
            pressed: KeyPress::NoKey,
            awaiting_key: None,
        })
    }

    /// load a chip8 program at the current program counter
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, Chip8Error> {
        self.memory.load_program(reader, self.program_counter)
    }

    /// load a chip8 program from a file at the current program counter
    pub fn load_rom(&mut self, path: &Path) -> Result<usize, Chip8Error> {
        self.memory.load_rom(path, self.program_counter)
    }

    /// Tell the machine what was pressed this tick. If we're stalled on a
    /// wait-for-key and this is a real key, it lands in the waiting register
    /// and execution moves past the wait.
    pub fn key_event(&mut self, key: KeyPress) {
        self.pressed = key;
        if let (Some(x), KeyPress::Hex(k)) = (self.awaiting_key, key) {
            debug!("key {:X} satisfies wait on V{:X}", k, x);
            self.v[x] = k;
            self.awaiting_key = None;
            self.program_counter = self.program_counter.wrapping_add(2);
        }
    }

    /// true while stalled on Fx0A
    pub fn is_waiting_for_key(&self) -> bool {
        self.awaiting_key.is_some()
    }

    /// run up to `budget` instructions, stopping early if one of them stalls
    /// on the keyboard
    pub fn run_batch(&mut self, budget: u32) -> Result<(), Chip8Error> {
        for _ in 0..budget {
            self.step()?;
            if self.awaiting_key.is_some() {
                break;
            }
        }
        Ok(())
    }

    /// count both timers down by one, stopping at zero
    pub fn decay_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// read the two bytes at pc and move past them
    fn fetch(&mut self) -> u16 {
        let opcode = self.memory.get_word(self.program_counter);
        self.program_counter = self.program_counter.wrapping_add(2);
        opcode
    }

    /// fetch, decode and execute one instruction
    pub fn step(&mut self) -> Result<(), Chip8Error> {
        let addr = self.program_counter;
        let opcode = self.fetch();
        let inst = Instruction::decode(opcode)?;
        trace!("{:#05x}: {:04x} {}", addr, opcode, inst);
        self.execute(inst)
    }

    fn skip_if(&mut self, cond: bool) {
        if cond {
            self.program_counter = self.program_counter.wrapping_add(2);
        }
    }

    fn key_is(&self, value: u8) -> bool {
        self.pressed == KeyPress::Hex(value)
    }

    fn execute(&mut self, inst: Instruction) -> Result<(), Chip8Error> {
        use Instruction::*;
        match inst {
            ClearScreen => self.framebuffer.clear(),
            Return => {
                self.program_counter = self.stack.pop()?;
                debug!("return to {:#05x}", self.program_counter);
            }
            Jump(addr) => self.program_counter = addr,
            Call(addr) => {
                self.stack.push(self.program_counter)?;
                debug!("call {:#05x} (depth {})", addr, self.stack.depth());
                self.program_counter = addr;
            }
            SkipEqImm(x, kk) => self.skip_if(self.v[x] == kk),
            SkipNeImm(x, kk) => self.skip_if(self.v[x] != kk),
            SkipEqReg(x, y) => self.skip_if(self.v[x] == self.v[y]),
            SkipNeReg(x, y) => self.skip_if(self.v[x] != self.v[y]),
            LoadImm(x, kk) => self.v[x] = kk,
            AddImm(x, kk) => self.v[x] = self.v[x].wrapping_add(kk),
            Copy(x, y) => self.v[x] = self.v[y],
            Or(x, y) => self.v[x] |= self.v[y],
            And(x, y) => self.v[x] &= self.v[y],
            Xor(x, y) => self.v[x] ^= self.v[y],
            Add(x, y) => {
                let (sum, carry) = self.v[x].overflowing_add(self.v[y]);
                self.v[x] = sum;
                self.v[VF] = carry as u8;
            }
            Sub(x, y) => {
                let (vx, vy) = (self.v[x], self.v[y]);
                self.v[x] = vx.wrapping_sub(vy);
                self.v[VF] = (vx > vy) as u8;
            }
            SubReverse(x, y) => {
                let (vx, vy) = (self.v[x], self.v[y]);
                self.v[x] = vy.wrapping_sub(vx);
                self.v[VF] = (vy > vx) as u8;
            }
            ShiftRight(x) => {
                let vx = self.v[x];
                self.v[x] = vx >> 1;
                self.v[VF] = vx & 0x01;
            }
            ShiftLeft(x) => {
                let vx = self.v[x];
                self.v[x] = vx << 1;
                self.v[VF] = (vx & 0x80) >> 7;
            }
            LoadIndex(addr) => self.i = addr,
            JumpOffset(addr) => self.program_counter = addr + self.v[0] as u16,
            Random(x, kk) => self.v[x] = self.rng.gen::<u8>() & kk,
            Draw(x, y, n) => self.draw(x, y, n),
            SkipKeyPressed(x) => self.skip_if(self.key_is(self.v[x])),
            SkipKeyNotPressed(x) => self.skip_if(!self.key_is(self.v[x])),
            ReadDelay(x) => self.v[x] = self.delay_timer,
            SetDelay(x) => self.delay_timer = self.v[x],
            SetSound(x) => self.sound_timer = self.v[x],
            WaitKey(x) => {
                // park pc on this instruction until key_event() releases it
                self.program_counter = self.program_counter.wrapping_sub(2);
                if self.awaiting_key.is_none() {
                    debug!("waiting for key into V{:X}", x);
                }
                self.awaiting_key = Some(x);
            }
            AddIndex(x) => {
                let sum = self.i.wrapping_add(self.v[x] as u16);
                self.i = sum;
                self.v[VF] = (sum > INDEX_LIMIT) as u8;
            }
            FontChar(x) => {
                self.i = memory::FONT_ADDR + self.v[x] as u16 * memory::GLYPH_STRIDE
            }
            StoreBcd(x) => {
                let vx = self.v[x];
                self.memory.write_byte(self.i, vx / 100);
                self.memory.write_byte(self.i.wrapping_add(1), vx / 10 % 10);
                self.memory.write_byte(self.i.wrapping_add(2), vx % 10);
            }
            DumpRegisters(x) => {
                for r in 0..=x {
                    self.memory.write_byte(self.i.wrapping_add(r as u16), self.v[r]);
                }
            }
            LoadRegisters(x) => {
                for r in 0..=x {
                    self.v[r] = self.memory.read_byte(self.i.wrapping_add(r as u16));
                }
            }
        }
        Ok(())
    }

    /// Dxyn: xor an n-row sprite from I onto the screen at (Vx, Vy). VF ends
    /// up 1 iff some lit pixel was turned off
    fn draw(&mut self, x: Reg, y: Reg, n: u8) {
        // n is a nibble, so at most 15 rows
        let mut rows = [0u8; 15];
        let sprite = &mut rows[..n as usize];
        for (row, byte) in sprite.iter_mut().enumerate() {
            *byte = self.memory.read_byte(self.i.wrapping_add(row as u16));
        }
        let collided = self.framebuffer.draw_sprite(self.v[x], self.v[y], sprite);
        self.v[VF] = collided as u8;
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn framebuffer_mut(&mut self) -> &mut Framebuffer {
        &mut self.framebuffer
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn register(&self, x: Reg) -> u8 {
        self.v[x]
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn memory(&self) -> &Chip8Memory {
        &self.memory
    }
}
