use crate::error::Chip8Error;
use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use log::{debug, warn};
use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::str::FromStr;
use std::time::Duration;

/// the default layout, using the left-hand side of a qwerty keyboard. the
/// position in the array is the hex key it stands for
const CHIP8_CONVENTIONAL_KEYMAP: [char; 16] = [
    'x', // 0
    '1', // 1
    '2', // 2
    '3', // 3
    'q', // 4
    'w', // 5
    'e', // 6
    'a', // 7
    's', // 8
    'd', // 9
    'z', // a
    'c', // b
    '4', // c
    'r', // d
    'f', // e
    'v', // f
];

/// a key event as the host reports it, before mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKey {
    Escape,
    Char(char),
    Other,
}

/// what one poll of the keyboard means to the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPress {
    /// stop the emulator
    Quit,
    /// nothing pressed, or nothing we recognise
    NoKey,
    /// one of the sixteen hex keys
    Hex(u8),
}

/// Sixteen distinct host characters; index = hex digit. Matching ignores case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap([char; 16]);

impl Default for Keymap {
    fn default() -> Self {
        Keymap(CHIP8_CONVENTIONAL_KEYMAP)
    }
}

impl FromStr for Keymap {
    type Err = Chip8Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().map(fold_case).collect();
        let keys: [char; 16] = chars.try_into().map_err(|chars: Vec<char>| {
            Chip8Error::InvalidKeymap(format!("expected 16 keys, got {}", chars.len()))
        })?;
        for (i, key) in keys.iter().enumerate() {
            if keys[..i].contains(key) {
                return Err(Chip8Error::InvalidKeymap(format!("{:?} appears twice", key)));
            }
        }
        Ok(Keymap(keys))
    }
}

impl fmt::Display for Keymap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|c| write!(f, "{}", c))
    }
}

impl Keymap {
    /// which hex key `c` stands for, if any
    pub fn lookup(&self, c: char) -> Option<u8> {
        let c = fold_case(c);
        self.0.iter().position(|k| *k == c).map(|i| i as u8)
    }

    pub fn translate(&self, key: Option<RawKey>) -> KeyPress {
        match key {
            Some(RawKey::Escape) => KeyPress::Quit,
            Some(RawKey::Char(c)) => match self.lookup(c) {
                Some(hex) => KeyPress::Hex(hex),
                None => {
                    warn!("can't map {:?} to a CHIP-8 key", c);
                    KeyPress::NoKey
                }
            },
            Some(RawKey::Other) | None => KeyPress::NoKey,
        }
    }
}

// one char in, one char out, so folding never changes how many keys there are
fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// reads keypresses
pub trait Input {
    /// take at most one pending key event without blocking
    fn poll_key(&mut self) -> Result<Option<RawKey>, io::Error>;
}

/// simple implementation of Input, using the terminal via crossterm. expects
/// the terminal to already be in raw mode
pub struct StdinInput;

impl StdinInput {
    pub fn new() -> Self {
        StdinInput
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

impl Input for StdinInput {
    fn poll_key(&mut self) -> Result<Option<RawKey>, io::Error> {
        if !poll(Duration::from_millis(0))? {
            return Ok(None);
        }
        match read()? {
            Event::Key(evt) => Ok(Some(raw_key(evt))),
            other => {
                debug!("ignoring terminal event {:?}", other);
                Ok(None)
            }
        }
    }
}

/// what a terminal key event means before mapping. ctrl and alt chords are
/// never keypad presses, even when the base key is mapped
fn raw_key(evt: KeyEvent) -> RawKey {
    if evt.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return RawKey::Other;
    }
    match evt.code {
        KeyCode::Esc => RawKey::Escape,
        KeyCode::Char(c) => RawKey::Char(c),
        _ => RawKey::Other,
    }
}

/// dummy Input implementation for testing; plays back a script of polls, then
/// reports nothing forever
pub struct DummyInput {
    script: VecDeque<Option<RawKey>>,
}

impl DummyInput {
    pub fn new(script: &[Option<RawKey>]) -> Self {
        DummyInput {
            script: script.iter().copied().collect(),
        }
    }
}

impl Input for DummyInput {
    fn poll_key(&mut self) -> Result<Option<RawKey>, io::Error> {
        Ok(self.script.pop_front().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let k = Keymap::default();
        assert_eq!(k.lookup('x'), Some(0x0));
        assert_eq!(k.lookup('1'), Some(0x1));
        assert_eq!(k.lookup('4'), Some(0xc));
        assert_eq!(k.lookup('v'), Some(0xf));
        assert_eq!(k.lookup('p'), None);
        assert_eq!(k.to_string(), "x123qweasdzc4rfv");
    }

    #[test]
    fn test_lookup_ignores_case() -> Result<(), Chip8Error> {
        let k: Keymap = "0123456789ABCDEF".parse()?;
        assert_eq!(k.lookup('a'), Some(0xa));
        assert_eq!(k.lookup('F'), Some(0xf));
        assert_eq!(k.translate(Some(RawKey::Char('B'))), KeyPress::Hex(0xb));
        Ok(())
    }

    #[test]
    fn test_keymap_length() {
        let err = "abc".parse::<Keymap>().unwrap_err();
        assert!(matches!(err, Chip8Error::InvalidKeymap(_)));
        assert!("0123456789abcdefg".parse::<Keymap>().is_err());
    }

    #[test]
    fn test_keymap_distinct() {
        assert!("0123456789abcdea".parse::<Keymap>().is_err());
        // duplicates only differing in case still clash
        assert!("0123456789abcdeA".parse::<Keymap>().is_err());
    }

    #[test]
    fn test_keymap_counts_chars_before_folding() -> Result<(), Chip8Error> {
        // 'İ' lower-cases to two chars; only the first is kept, as in lookup
        let k: Keymap = "İ123qweasdzc4rfv".parse()?;
        assert_eq!(k.lookup('İ'), Some(0x0));
        assert_eq!(k.lookup('i'), Some(0x0));
        assert_eq!(k.lookup('1'), Some(0x1));
        Ok(())
    }

    #[test]
    fn test_raw_key_drops_chords() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let alt_x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT);
        assert_eq!(raw_key(ctrl_c), RawKey::Other);
        assert_eq!(raw_key(alt_x), RawKey::Other);
        assert_eq!(Keymap::default().translate(Some(raw_key(ctrl_c))), KeyPress::NoKey);

        let c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        assert_eq!(raw_key(c), RawKey::Char('c'));
        let shifted = KeyEvent::new(KeyCode::Char('C'), KeyModifiers::SHIFT);
        assert_eq!(raw_key(shifted), RawKey::Char('C'));
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(raw_key(esc), RawKey::Escape);
        let f1 = KeyEvent::new(KeyCode::F(1), KeyModifiers::NONE);
        assert_eq!(raw_key(f1), RawKey::Other);
    }

    #[test]
    fn test_translate() {
        let k = Keymap::default();
        assert_eq!(k.translate(Some(RawKey::Escape)), KeyPress::Quit);
        assert_eq!(k.translate(None), KeyPress::NoKey);
        assert_eq!(k.translate(Some(RawKey::Other)), KeyPress::NoKey);
        assert_eq!(k.translate(Some(RawKey::Char('#'))), KeyPress::NoKey);
        assert_eq!(k.translate(Some(RawKey::Char('W'))), KeyPress::Hex(0x5));
    }

    #[test]
    fn test_dummy_input_script() -> Result<(), io::Error> {
        let mut i = DummyInput::new(&[Some(RawKey::Char('q')), None, Some(RawKey::Escape)]);
        assert_eq!(i.poll_key()?, Some(RawKey::Char('q')));
        assert_eq!(i.poll_key()?, None);
        assert_eq!(i.poll_key()?, Some(RawKey::Escape));
        assert_eq!(i.poll_key()?, None);
        Ok(())
    }
}
