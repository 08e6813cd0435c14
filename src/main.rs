use clap::Parser;
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

use chip8_tty::config::{Config, DEFAULT_INSTRUCTIONS_PER_TICK};
use chip8_tty::display::MonoTermDisplay;
use chip8_tty::environment::Environment;
use chip8_tty::framebuffer::{HEIGHT, WIDTH};
use chip8_tty::input::StdinInput;
use chip8_tty::memory::DEFAULT_LOAD_ADDR;
use chip8_tty::Chip8Error;

/// Run a CHIP-8 program in the terminal. Escape quits.
#[derive(Parser, Debug)]
#[command(name = "chip8-tty", version, about, long_about = None)]
struct Args {
    /// address to load the program at
    #[arg(short = 'a', long = "address", default_value_t = DEFAULT_LOAD_ADDR as u64)]
    address: u64,

    /// 16 keys standing for hex digits 0 to f, in order
    #[arg(short, long)]
    keymap: Option<String>,

    /// seed for the random number instruction
    #[arg(short = 'r', long)]
    seed: Option<u64>,

    /// instructions executed per 60Hz tick
    #[arg(short, long, default_value_t = DEFAULT_INSTRUCTIONS_PER_TICK as i64, allow_negative_numbers = true)]
    speed: i64,

    /// the program to run
    rom: PathBuf,
}

fn run(config: &Config) -> Result<(), Chip8Error> {
    // the display restores the terminal when it goes out of scope, which
    // happens before main gets to report any error
    let display = MonoTermDisplay::new(WIDTH, HEIGHT)?;
    let mut env = Environment::from_config(config, display, StdinInput::new())?;
    env.run()
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let config = match Config::new(
        args.address,
        args.keymap.as_deref(),
        args.seed,
        args.speed,
        args.rom,
    ) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:?} fault: {:?}", e.kind(), e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
