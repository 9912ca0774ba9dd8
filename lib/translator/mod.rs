//! Lowering of machine instructions to the IL.
//!
//! A `Translator` lowers one decoded instruction at a time. It does not build
//! blocks itself: `il::Program::add_block` drives it over the instructions of
//! a machine basic block, and handles program counter updates, fallthrough
//! destinations and canonicalization.
//!
//! A single instruction may lower not only to a group of assignments in the
//! current block, but also to extra IL blocks, for instructions with internal
//! control flow. See `InstructionTranslation`.
//!
//! Decoding bytes into instructions is left to the caller. The `tiny`
//! architecture shows a complete, if small, translator.

use crate::il::*;
use crate::Error;

mod instruction_translation;
mod options;
pub mod tiny;

pub use self::instruction_translation::InstructionTranslation;
pub use self::options::{Options, OptionsBuilder};

/// A decoded machine instruction.
pub trait MachineInstruction {
    /// The address of the first byte of this instruction.
    fn address(&self) -> u64;

    /// The length of this instruction in bytes.
    fn length(&self) -> usize;

    /// The address of the instruction which follows this one.
    fn next_address(&self) -> u64 {
        self.address().wrapping_add(self.length() as u64)
    }
}

/// A generic translation trait, implemented by various architectures.
pub trait Translator {
    type Instruction: MachineInstruction;

    /// The program counter of this architecture.
    fn program_counter(&self) -> Identifier;

    /// The stack pointer of this architecture.
    fn stack_pointer(&self) -> Identifier;

    /// The pseudo-register holding the destination of every block.
    fn irdst(&self) -> Identifier {
        Identifier::new("IRDst", self.program_counter().bits())
    }

    /// Lower one instruction.
    ///
    /// Labels for branch targets, and for any extra blocks, come from
    /// `symbol_pool`.
    fn translate_instruction(
        &self,
        instruction: &Self::Instruction,
        symbol_pool: &mut SymbolPool,
    ) -> Result<InstructionTranslation, Error>;
}
