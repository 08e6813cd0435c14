//! # instruction
//!
//! Decoding of the 16-bit opcodes into a tagged representation. Fields are
//! pulled out once here, so the executor never looks at raw bits.
//!
//! Naming in the mnemonics below: `x`/`y` are register nibbles, `nnn` a
//! 12-bit address, `kk` an 8-bit immediate and `n` a 4-bit immediate.
use crate::error::Chip8Error;
use std::fmt;

/// register index, always 0..=15
pub type Reg = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    ClearScreen,
    /// 00EE
    Return,
    /// 1nnn
    Jump(u16),
    /// 2nnn
    Call(u16),
    /// 3xkk
    SkipEqImm(Reg, u8),
    /// 4xkk
    SkipNeImm(Reg, u8),
    /// 5xy0
    SkipEqReg(Reg, Reg),
    /// 6xkk
    LoadImm(Reg, u8),
    /// 7xkk, no carry
    AddImm(Reg, u8),
    /// 8xy0
    Copy(Reg, Reg),
    /// 8xy1
    Or(Reg, Reg),
    /// 8xy2
    And(Reg, Reg),
    /// 8xy3
    Xor(Reg, Reg),
    /// 8xy4
    Add(Reg, Reg),
    /// 8xy5
    Sub(Reg, Reg),
    /// 8xy6
    ShiftRight(Reg),
    /// 8xy7
    SubReverse(Reg, Reg),
    /// 8xyE
    ShiftLeft(Reg),
    /// 9xy0
    SkipNeReg(Reg, Reg),
    /// Annn
    LoadIndex(u16),
    /// Bnnn
    JumpOffset(u16),
    /// Cxkk
    Random(Reg, u8),
    /// Dxyn
    Draw(Reg, Reg, u8),
    /// Ex9E
    SkipKeyPressed(Reg),
    /// ExA1
    SkipKeyNotPressed(Reg),
    /// Fx07
    ReadDelay(Reg),
    /// Fx0A
    WaitKey(Reg),
    /// Fx15
    SetDelay(Reg),
    /// Fx18
    SetSound(Reg),
    /// Fx1E
    AddIndex(Reg),
    /// Fx29
    FontChar(Reg),
    /// Fx33
    StoreBcd(Reg),
    /// Fx55
    DumpRegisters(Reg),
    /// Fx65
    LoadRegisters(Reg),
}

impl Instruction {
    /// Decode one opcode. Anything outside the base instruction set is an
    /// error; there is no such thing as a no-op for unknown values.
    pub fn decode(opcode: u16) -> Result<Instruction, Chip8Error> {
        let family = (opcode >> 12) & 0x0f;
        let x = ((opcode >> 8) & 0x0f) as Reg;
        let y = ((opcode >> 4) & 0x0f) as Reg;
        let n = (opcode & 0x0f) as u8;
        let kk = (opcode & 0xff) as u8;
        let nnn = opcode & 0x0fff;

        use Instruction::*;
        let inst = match (family, n) {
            _ if opcode == 0x00e0 => ClearScreen,
            _ if opcode == 0x00ee => Return,
            (0x1, _) => Jump(nnn),
            (0x2, _) => Call(nnn),
            (0x3, _) => SkipEqImm(x, kk),
            (0x4, _) => SkipNeImm(x, kk),
            (0x5, 0x0) => SkipEqReg(x, y),
            (0x6, _) => LoadImm(x, kk),
            (0x7, _) => AddImm(x, kk),
            (0x8, 0x0) => Copy(x, y),
            (0x8, 0x1) => Or(x, y),
            (0x8, 0x2) => And(x, y),
            (0x8, 0x3) => Xor(x, y),
            (0x8, 0x4) => Add(x, y),
            (0x8, 0x5) => Sub(x, y),
            (0x8, 0x6) => ShiftRight(x),
            (0x8, 0x7) => SubReverse(x, y),
            (0x8, 0xe) => ShiftLeft(x),
            (0x9, 0x0) => SkipNeReg(x, y),
            (0xa, _) => LoadIndex(nnn),
            (0xb, _) => JumpOffset(nnn),
            (0xc, _) => Random(x, kk),
            (0xd, _) => Draw(x, y, n),
            (0xe, _) if kk == 0x9e => SkipKeyPressed(x),
            (0xe, _) if kk == 0xa1 => SkipKeyNotPressed(x),
            (0xf, _) => match kk {
                0x07 => ReadDelay(x),
                0x0a => WaitKey(x),
                0x15 => SetDelay(x),
                0x18 => SetSound(x),
                0x1e => AddIndex(x),
                0x29 => FontChar(x),
                0x33 => StoreBcd(x),
                0x55 => DumpRegisters(x),
                0x65 => LoadRegisters(x),
                _ => return Err(Chip8Error::InvalidInstruction(opcode)),
            },
            _ => return Err(Chip8Error::InvalidInstruction(opcode)),
        };
        Ok(inst)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            ClearScreen => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump(a) => write!(f, "JP {:#05x}", a),
            Call(a) => write!(f, "CALL {:#05x}", a),
            SkipEqImm(x, kk) => write!(f, "SE V{:X}, {:#04x}", x, kk),
            SkipNeImm(x, kk) => write!(f, "SNE V{:X}, {:#04x}", x, kk),
            SkipEqReg(x, y) => write!(f, "SE V{:X}, V{:X}", x, y),
            LoadImm(x, kk) => write!(f, "LD V{:X}, {:#04x}", x, kk),
            AddImm(x, kk) => write!(f, "ADD V{:X}, {:#04x}", x, kk),
            Copy(x, y) => write!(f, "LD V{:X}, V{:X}", x, y),
            Or(x, y) => write!(f, "OR V{:X}, V{:X}", x, y),
            And(x, y) => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor(x, y) => write!(f, "XOR V{:X}, V{:X}", x, y),
            Add(x, y) => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub(x, y) => write!(f, "SUB V{:X}, V{:X}", x, y),
            ShiftRight(x) => write!(f, "SHR V{:X}", x),
            SubReverse(x, y) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            ShiftLeft(x) => write!(f, "SHL V{:X}", x),
            SkipNeReg(x, y) => write!(f, "SNE V{:X}, V{:X}", x, y),
            LoadIndex(a) => write!(f, "LD I, {:#05x}", a),
            JumpOffset(a) => write!(f, "JP V0, {:#05x}", a),
            Random(x, kk) => write!(f, "RND V{:X}, {:#04x}", x, kk),
            Draw(x, y, n) => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            SkipKeyPressed(x) => write!(f, "SKP V{:X}", x),
            SkipKeyNotPressed(x) => write!(f, "SKNP V{:X}", x),
            ReadDelay(x) => write!(f, "LD V{:X}, DT", x),
            WaitKey(x) => write!(f, "LD V{:X}, K", x),
            SetDelay(x) => write!(f, "LD DT, V{:X}", x),
            SetSound(x) => write!(f, "LD ST, V{:X}", x),
            AddIndex(x) => write!(f, "ADD I, V{:X}", x),
            FontChar(x) => write!(f, "LD F, V{:X}", x),
            StoreBcd(x) => write!(f, "LD B, V{:X}", x),
            DumpRegisters(x) => write!(f, "LD [I], V{:X}", x),
            LoadRegisters(x) => write!(f, "LD V{:X}, [I]", x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Instruction::*;

    #[test]
    fn test_decode_fields() -> Result<(), Chip8Error> {
        assert_eq!(Instruction::decode(0x00e0)?, ClearScreen);
        assert_eq!(Instruction::decode(0x00ee)?, Return);
        assert_eq!(Instruction::decode(0x1a5f)?, Jump(0xa5f));
        assert_eq!(Instruction::decode(0x2123)?, Call(0x123));
        assert_eq!(Instruction::decode(0x3c42)?, SkipEqImm(0xc, 0x42));
        assert_eq!(Instruction::decode(0x5ab0)?, SkipEqReg(0xa, 0xb));
        assert_eq!(Instruction::decode(0x8124)?, Add(1, 2));
        assert_eq!(Instruction::decode(0x834e)?, ShiftLeft(3));
        assert_eq!(Instruction::decode(0xb300)?, JumpOffset(0x300));
        assert_eq!(Instruction::decode(0xd01f)?, Draw(0, 1, 0xf));
        assert_eq!(Instruction::decode(0xe59e)?, SkipKeyPressed(5));
        assert_eq!(Instruction::decode(0xe6a1)?, SkipKeyNotPressed(6));
        assert_eq!(Instruction::decode(0xf70a)?, WaitKey(7));
        assert_eq!(Instruction::decode(0xff65)?, LoadRegisters(0xf));
        Ok(())
    }

    #[test]
    fn test_decode_rejects_unknown() {
        for opcode in [
            0x0000, 0x0123, 0x00ef, 0x5121, 0x8008, 0x800f, 0x9001, 0xe000, 0xe09f, 0xf000,
            0xf0ff, 0xf066,
        ] {
            match Instruction::decode(opcode) {
                Err(Chip8Error::InvalidInstruction(op)) => assert_eq!(op, opcode),
                other => panic!("{:#06x} decoded as {:?}", opcode, other),
            }
        }
    }

    #[test]
    fn test_every_opcode_either_decodes_or_faults() {
        let known = (0..=u16::MAX)
            .filter(|op| Instruction::decode(*op).is_ok())
            .count();
        // 0x1..0x4, 0x6, 0x7, 0xa..0xd are whole families (10 * 4096), then
        // 5xy0 / 9xy0 (2 * 256), 8xyN (9 * 256), Ex (2 * 16), Fx (9 * 16) and
        // the two fixed 00Ex opcodes
        assert_eq!(known, 10 * 4096 + 2 * 256 + 9 * 256 + 2 * 16 + 9 * 16 + 2);
    }

    #[test]
    fn test_disassembly() -> Result<(), Chip8Error> {
        assert_eq!(Instruction::decode(0x00e0)?.to_string(), "CLS");
        assert_eq!(Instruction::decode(0x6305)?.to_string(), "LD V3, 0x05");
        assert_eq!(Instruction::decode(0xd015)?.to_string(), "DRW V0, V1, 5");
        assert_eq!(Instruction::decode(0xa2f0)?.to_string(), "LD I, 0x2f0");
        assert_eq!(Instruction::decode(0xfa33)?.to_string(), "LD B, VA");
        Ok(())
    }
}
