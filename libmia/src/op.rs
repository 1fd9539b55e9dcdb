use num::FromPrimitive as _;
use num_derive::{FromPrimitive, ToPrimitive};
use strum::EnumString;

use crate::word::{Word, WordExt};

/// Register-and-memory instructions: the full addressing-mode table applies.
#[allow(clippy::upper_case_acronyms)]
#[derive(FromPrimitive, ToPrimitive, EnumString, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegMemOp {
    LOAD = 0x0,
    STORE = 0x1,
    ADD = 0x2,
    SUB = 0x3,
    AND = 0x4,
    CMP = 0x9,
}

/// Shift instructions: the address field holds the shift count.
#[allow(clippy::upper_case_acronyms)]
#[derive(FromPrimitive, ToPrimitive, EnumString, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    LSR = 0x5,
}

/// Control-flow instructions: the address field holds a PC-relative
/// displacement to a label.
#[allow(clippy::upper_case_acronyms)]
#[derive(FromPrimitive, ToPrimitive, EnumString, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchOp {
    BRA = 0x6,
    BNE = 0x7,
    BGE = 0xA,
    BEQ = 0xB,
}

pub const HALT: u8 = 0x8;

#[derive(FromPrimitive, ToPrimitive, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    Direct = 0b00,
    Immediate = 0b01,
    Indirect = 0b10,
    Indexed = 0b11,
}

/// A decoded instruction word. Immediate operand words are not part of this;
/// they follow the instruction word raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    RegMem {
        op: RegMemOp,
        reg: u8,
        mode: AddressMode,
        addr: u8,
    },
    Shift {
        op: ShiftOp,
        reg: u8,
        count: u8,
    },
    Branch {
        op: BranchOp,
        disp: u8,
    },
    Halt,
}

impl Op {
    pub fn from_word(word: Word) -> Option<Self> {
        let opcode = word.opcode();
        if let Some(op) = RegMemOp::from_u8(opcode) {
            let mode = AddressMode::from_u8(word.mode_bits())?;
            return Some(Op::RegMem {
                op,
                reg: word.reg(),
                mode,
                addr: word.addr(),
            });
        }
        if let Some(op) = ShiftOp::from_u8(opcode) {
            return Some(Op::Shift {
                op,
                reg: word.reg(),
                count: word.addr(),
            });
        }
        if let Some(op) = BranchOp::from_u8(opcode) {
            return Some(Op::Branch {
                op,
                disp: word.addr(),
            });
        }
        (opcode == HALT).then_some(Op::Halt)
    }

    pub fn opcode(&self) -> u8 {
        match self {
            Op::RegMem { op, .. } => *op as u8,
            Op::Shift { op, .. } => *op as u8,
            Op::Branch { op, .. } => *op as u8,
            Op::Halt => HALT,
        }
    }
}
