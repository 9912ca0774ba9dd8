use crate::il::*;

/// The result of lowering one machine instruction.
///
/// # Instructions lowered to more than one block
///
/// Most instructions lower to a single group of assignments, appended to the
/// block under construction. Some need internal control flow, and lower to
/// extra, fully formed blocks as well. The block under construction is closed
/// after such an instruction, and the next instruction starts a new one.
#[derive(Clone, Debug, Default)]
pub struct InstructionTranslation {
    /// The semantics of the instruction in the current block.
    group: InstructionGroup,
    /// Blocks created for the internal control flow of the instruction.
    extra_blocks: Vec<Block>,
}

impl InstructionTranslation {
    /// Create a new `InstructionTranslation`.
    ///
    /// # Parameters
    /// * `group` - The assignments of the instruction in the current block.
    /// * `extra_blocks` - Extra blocks created for this instruction.
    pub fn new(group: InstructionGroup, extra_blocks: Vec<Block>) -> InstructionTranslation {
        InstructionTranslation {
            group,
            extra_blocks,
        }
    }

    /// A translation with no extra blocks.
    pub fn group(group: InstructionGroup) -> InstructionTranslation {
        InstructionTranslation::new(group, Vec::new())
    }

    pub fn instruction_group(&self) -> &InstructionGroup {
        &self.group
    }

    pub fn extra_blocks(&self) -> &[Block] {
        &self.extra_blocks
    }

    /// Returns true if this instruction splits the block under construction.
    pub fn splits_block(&self) -> bool {
        !self.extra_blocks.is_empty()
    }

    /// Consume this translation, returning the group and the extra blocks.
    pub fn into_parts(self) -> (InstructionGroup, Vec<Block>) {
        (self.group, self.extra_blocks)
    }
}
