use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop the machine. None of these are recoverable: the
/// main loop bails out and the terminal is restored before reporting.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("invalid load address {0}")]
    InvalidLoadAddress(usize),

    #[error("invalid keymap: {0}")]
    InvalidKeymap(String),

    #[error("invalid instructions per tick")]
    InvalidSpeed,

    #[error("could not open rom {}: {source}", path.display())]
    OpenRom {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not read rom: {0}")]
    ReadRom(#[source] io::Error),

    #[error("could not load fonts at {0:#05x}")]
    LoadFonts(u16),

    #[error("stack overflow")]
    StackOverflow,

    #[error("stack underflow")]
    StackUnderflow,

    #[error("invalid instruction {0:#06x}")]
    InvalidInstruction(u16),

    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}

/// coarse grouping of faults, mostly useful for tests and log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Validation,
    Io,
    Capacity,
    Decode,
    Terminal,
}

impl Chip8Error {
    pub fn kind(&self) -> FaultKind {
        match self {
            Chip8Error::InvalidLoadAddress(_)
            | Chip8Error::InvalidKeymap(_)
            | Chip8Error::InvalidSpeed => FaultKind::Validation,
            Chip8Error::OpenRom { .. } | Chip8Error::ReadRom(_) => FaultKind::Io,
            Chip8Error::LoadFonts(_) | Chip8Error::StackOverflow | Chip8Error::StackUnderflow => {
                FaultKind::Capacity
            }
            Chip8Error::InvalidInstruction(_) => FaultKind::Decode,
            Chip8Error::Terminal(_) => FaultKind::Terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(Chip8Error::StackOverflow.to_string(), "stack overflow");
        assert_eq!(
            Chip8Error::InvalidInstruction(0x0123).to_string(),
            "invalid instruction 0x0123"
        );
        assert_eq!(
            Chip8Error::LoadFonts(0xfc0).to_string(),
            "could not load fonts at 0xfc0"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Chip8Error::InvalidSpeed.kind(), FaultKind::Validation);
        assert_eq!(Chip8Error::StackUnderflow.kind(), FaultKind::Capacity);
        assert_eq!(Chip8Error::InvalidInstruction(0).kind(), FaultKind::Decode);
        let e = Chip8Error::ReadRom(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(e.kind(), FaultKind::Io);
    }
}
