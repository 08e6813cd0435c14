//! A CHIP-8 virtual machine that runs in a terminal.
//!
//! ## Design
//!
//! * a logical 60Hz clock, independent of how fast the host is
//! * a fixed batch of instructions per tick; then sleep out the rest of it
//! * abstract display so can plug alternatives; TUI in-console by default
//! * abstract keyboard, same reason (and so tests can script key presses)
//! * every fault is fatal: the loop stops, the terminal is restored, and the
//!   error is reported
//!
//! Model
//!
//! Environment
//!  |-- display, input, keymap, governor
//!  |-- interpreter
//!  |    |-- memory (fonts at 0x000, program at the load address)
//!  |    |-- registers, index, call stack, timers
//!  |    `-- framebuffer (bitmap + dirty flag)
//!  `-- main loop, once per tick:
//!       |-- key = keymap.translate(input.poll_key())
//!       |-- interpreter.key_event(key)      // may release a wait-for-key
//!       |-- interpreter.run_batch(speed)
//!       |-- interpreter.decay_timers()
//!       |-- governor.end_tick()             // sleep out the remainder
//!       `-- framebuffer.flush(display)      // only if dirty
//!
//! The sound timer counts down like the delay timer, but nothing beeps.
pub mod config;
pub mod display;
pub mod environment;
pub mod error;
pub mod framebuffer;
pub mod governor;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod memory;

pub use error::Chip8Error;
