use crate::config::Config;
use crate::display::Display;
use crate::error::Chip8Error;
use crate::governor::Governor;
use crate::input::{Input, KeyPress, Keymap};
use crate::interpreter::Chip8Interpreter;
use log::{debug, info};

/// Sets everything up and runs the main loop. Once per tick:
///
///  * poll the keyboard (never blocks)
///  * hand the key to the interpreter, releasing any wait-for-key
///  * run the tick's instruction budget
///  * count the timers down
///  * sleep out the rest of the tick
///  * redraw, if anything changed
///
/// Escape ends the loop after the tick it was seen in.
pub struct Environment<D: Display, I: Input> {
    interpreter: Chip8Interpreter,
    display: D,
    input: I,
    keymap: Keymap,
    governor: Governor,
    instructions_per_tick: u32,
}

impl<D: Display, I: Input> Environment<D, I> {
    pub fn new(
        interpreter: Chip8Interpreter,
        display: D,
        input: I,
        keymap: Keymap,
        instructions_per_tick: u32,
    ) -> Self {
        Environment {
            interpreter,
            display,
            input,
            keymap,
            governor: Governor::new(),
            instructions_per_tick,
        }
    }

    /// build a machine from `config` with its ROM loaded
    pub fn from_config(config: &Config, display: D, input: I) -> Result<Self, Chip8Error> {
        debug!("{:?}", config);
        let mut interpreter = Chip8Interpreter::new(config.load_address, config.seed)?;
        interpreter.load_rom(&config.rom)?;
        Ok(Self::new(
            interpreter,
            display,
            input,
            config.keymap.clone(),
            config.instructions_per_tick,
        ))
    }

    pub fn with_governor(mut self, governor: Governor) -> Self {
        self.governor = governor;
        self
    }

    /// run until the quit key, or the first fault
    pub fn run(&mut self) -> Result<(), Chip8Error> {
        info!(
            "running at {} instructions per tick",
            self.instructions_per_tick
        );
        self.display.clear()?;
        while self.tick()? != KeyPress::Quit {}
        info!(
            "quit after {} ticks ({} overran)",
            self.governor.ticks(),
            self.governor.overruns()
        );
        Ok(())
    }

    /// one pass of the main loop; returns what the keyboard said
    pub fn tick(&mut self) -> Result<KeyPress, Chip8Error> {
        let key = self.keymap.translate(self.input.poll_key()?);
        self.interpreter.key_event(key);

        self.governor.begin_tick();
        self.interpreter.run_batch(self.instructions_per_tick)?;
        self.interpreter.decay_timers();
        self.governor.end_tick();

        self.interpreter.framebuffer_mut().flush(&mut self.display)?;
        Ok(key)
    }

    pub fn interpreter(&self) -> &Chip8Interpreter {
        &self.interpreter
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn governor(&self) -> &Governor {
        &self.governor
    }
}
