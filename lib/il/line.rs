use crate::translator::MachineInstruction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a group exists in a block.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum LineKind {
    /// The lowering of the machine instruction itself.
    Instruction,
    /// A synthesized program counter update for the instruction.
    ProgramCounterUpdate,
    /// A synthesized fallthrough to the next instruction.
    Fallthrough,
}

/// The machine instruction a group originates from.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Line {
    address: u64,
    length: usize,
    kind: LineKind,
}

impl Line {
    pub fn new(address: u64, length: usize, kind: LineKind) -> Line {
        Line {
            address,
            length,
            kind,
        }
    }

    pub fn instruction<I: MachineInstruction>(instruction: &I) -> Line {
        Line::new(
            instruction.address(),
            instruction.length(),
            LineKind::Instruction,
        )
    }

    /// The same instruction, marked as the origin of a synthesized group.
    pub fn synthesized(&self, kind: LineKind) -> Line {
        Line::new(self.address, self.length, kind)
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn kind(&self) -> LineKind {
        self.kind
    }

    /// Address of the instruction following this one.
    pub fn next_address(&self) -> u64 {
        self.address.wrapping_add(self.length as u64)
    }

    /// Returns true if `address` falls inside this instruction's bytes.
    pub fn contains(&self, address: u64) -> bool {
        self.address <= address && address < self.next_address()
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            LineKind::Instruction => write!(f, "0x{:X}", self.address),
            LineKind::ProgramCounterUpdate => write!(f, "0x{:X} (pc)", self.address),
            LineKind::Fallthrough => write!(f, "0x{:X} (fallthrough)", self.address),
        }
    }
}
