//! Translator for `tiny`, a small 32-bit register machine.
//!
//! `tiny` has eight general purpose registers `r0` to `r7`, a stack pointer
//! `sp` and a program counter `pc`. Every instruction is four bytes long.
//! Instructions are handed over already decoded, as `TinyInstruction`.

use crate::il::*;
use crate::translator::{InstructionTranslation, MachineInstruction, Translator};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod semantics;

/// The length in bytes of every `tiny` instruction.
pub const INSTRUCTION_LENGTH: usize = 4;

/// The operation of a `tiny` instruction. Registers are numbered `0..8`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Opcode {
    /// `dst = src`
    Mov { dst: u8, src: u8 },
    /// `dst = imm`
    Movi { dst: u8, imm: u32 },
    /// `dst = lhs + rhs`
    Add { dst: u8, lhs: u8, rhs: u8 },
    /// `dst = [base + offset]`
    Load { dst: u8, base: u8, offset: u32 },
    /// `[base + offset] = src`
    Store { base: u8, offset: u32, src: u8 },
    /// Swap the two low bytes of a register.
    Xchgb { reg: u8 },
    Jmp { target: u64 },
    /// Jump to `target` if `reg` is not zero.
    Jnz { reg: u8, target: u64 },
    /// Jump to the address held in `reg`.
    Jr { reg: u8 },
    /// Pop the return address from the stack and jump to it.
    Ret,
    /// Clear `reg` if it is not zero.
    Clrnz { reg: u8 },
    Nop,
}

/// A decoded `tiny` instruction.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TinyInstruction {
    address: u64,
    opcode: Opcode,
}

impl TinyInstruction {
    pub fn new(address: u64, opcode: Opcode) -> TinyInstruction {
        TinyInstruction { address, opcode }
    }

    pub fn opcode(&self) -> &Opcode {
        &self.opcode
    }

    pub fn mov(address: u64, dst: u8, src: u8) -> TinyInstruction {
        TinyInstruction::new(address, Opcode::Mov { dst, src })
    }

    pub fn movi(address: u64, dst: u8, imm: u32) -> TinyInstruction {
        TinyInstruction::new(address, Opcode::Movi { dst, imm })
    }

    pub fn add(address: u64, dst: u8, lhs: u8, rhs: u8) -> TinyInstruction {
        TinyInstruction::new(address, Opcode::Add { dst, lhs, rhs })
    }

    pub fn load(address: u64, dst: u8, base: u8, offset: u32) -> TinyInstruction {
        TinyInstruction::new(address, Opcode::Load { dst, base, offset })
    }

    pub fn store(address: u64, base: u8, offset: u32, src: u8) -> TinyInstruction {
        TinyInstruction::new(address, Opcode::Store { base, offset, src })
    }

    pub fn xchgb(address: u64, reg: u8) -> TinyInstruction {
        TinyInstruction::new(address, Opcode::Xchgb { reg })
    }

    pub fn jmp(address: u64, target: u64) -> TinyInstruction {
        TinyInstruction::new(address, Opcode::Jmp { target })
    }

    pub fn jnz(address: u64, reg: u8, target: u64) -> TinyInstruction {
        TinyInstruction::new(address, Opcode::Jnz { reg, target })
    }

    pub fn jr(address: u64, reg: u8) -> TinyInstruction {
        TinyInstruction::new(address, Opcode::Jr { reg })
    }

    pub fn ret(address: u64) -> TinyInstruction {
        TinyInstruction::new(address, Opcode::Ret)
    }

    pub fn clrnz(address: u64, reg: u8) -> TinyInstruction {
        TinyInstruction::new(address, Opcode::Clrnz { reg })
    }

    pub fn nop(address: u64) -> TinyInstruction {
        TinyInstruction::new(address, Opcode::Nop)
    }
}

impl MachineInstruction for TinyInstruction {
    fn address(&self) -> u64 {
        self.address
    }

    fn length(&self) -> usize {
        INSTRUCTION_LENGTH
    }
}

impl fmt::Display for TinyInstruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:X}: ", self.address)?;
        match self.opcode {
            Opcode::Mov { dst, src } => write!(f, "mov r{}, r{}", dst, src),
            Opcode::Movi { dst, imm } => write!(f, "movi r{}, 0x{:X}", dst, imm),
            Opcode::Add { dst, lhs, rhs } => write!(f, "add r{}, r{}, r{}", dst, lhs, rhs),
            Opcode::Load { dst, base, offset } => {
                write!(f, "load r{}, [r{} + 0x{:X}]", dst, base, offset)
            }
            Opcode::Store { base, offset, src } => {
                write!(f, "store [r{} + 0x{:X}], r{}", base, offset, src)
            }
            Opcode::Xchgb { reg } => write!(f, "xchgb r{}", reg),
            Opcode::Jmp { target } => write!(f, "jmp 0x{:X}", target),
            Opcode::Jnz { reg, target } => write!(f, "jnz r{}, 0x{:X}", reg, target),
            Opcode::Jr { reg } => write!(f, "jr r{}", reg),
            Opcode::Ret => write!(f, "ret"),
            Opcode::Clrnz { reg } => write!(f, "clrnz r{}", reg),
            Opcode::Nop => write!(f, "nop"),
        }
    }
}

/// The `tiny` translator.
#[derive(Clone, Debug, Default)]
pub struct Tiny;

impl Tiny {
    pub fn new() -> Tiny {
        Tiny
    }
}

impl Translator for Tiny {
    type Instruction = TinyInstruction;

    fn program_counter(&self) -> Identifier {
        semantics::pc()
    }

    fn stack_pointer(&self) -> Identifier {
        semantics::sp()
    }

    fn irdst(&self) -> Identifier {
        semantics::irdst()
    }

    fn translate_instruction(
        &self,
        instruction: &TinyInstruction,
        symbol_pool: &mut SymbolPool,
    ) -> Result<InstructionTranslation, Error> {
        let translation = match *instruction.opcode() {
            Opcode::Mov { dst, src } => semantics::mov(instruction, dst, src)?,
            Opcode::Movi { dst, imm } => semantics::movi(instruction, dst, imm)?,
            Opcode::Add { dst, lhs, rhs } => semantics::add(instruction, dst, lhs, rhs)?,
            Opcode::Load { dst, base, offset } => {
                semantics::load(instruction, dst, base, offset)?
            }
            Opcode::Store { base, offset, src } => {
                semantics::store(instruction, base, offset, src)?
            }
            Opcode::Xchgb { reg } => semantics::xchgb(instruction, reg)?,
            Opcode::Jmp { target } => semantics::jmp(symbol_pool, target),
            Opcode::Jnz { reg, target } => semantics::jnz(instruction, symbol_pool, reg, target)?,
            Opcode::Jr { reg } => semantics::jr(instruction, reg)?,
            Opcode::Ret => semantics::ret()?,
            Opcode::Clrnz { reg } => semantics::clrnz(instruction, symbol_pool, reg)?,
            Opcode::Nop => InstructionTranslation::default(),
        };
        Ok(translation)
    }
}
