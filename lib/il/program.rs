//! A `Program` owns the IR blocks of one analysis session.

use crate::analysis::{def_use, simplify_assignment, BlockDefUse};
use crate::il::*;
use crate::transformation::merge_multi_affect;
use crate::translator::{MachineInstruction, Options, Translator};
use crate::Error;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// What happened to the blocks produced by one call to `Program::add_block`.
#[derive(Debug, Default)]
pub struct BlockAssembly {
    blocks: Vec<Label>,
    rejected: Vec<(Label, Error)>,
}

impl BlockAssembly {
    /// Labels of the blocks which were inserted, in production order.
    pub fn blocks(&self) -> &[Label] {
        &self.blocks
    }

    /// Blocks which were left out, with the reason.
    pub fn rejected(&self) -> &[(Label, Error)] {
        &self.rejected
    }
}

/// The IR container.
///
/// Holds every block keyed by label, the symbol pool the labels come from,
/// and the special registers of the architecture. The control flow graph is
/// built on first request and forgotten whenever a block is inserted or
/// rewritten.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Program {
    symbol_pool: SymbolPool,
    blocks: BTreeMap<Label, Block>,
    program_counter: Identifier,
    stack_pointer: Identifier,
    irdst: Identifier,
    #[serde(skip)]
    graph: Option<ControlFlowGraph>,
}

impl Program {
    pub fn new(program_counter: Identifier, stack_pointer: Identifier, irdst: Identifier) -> Program {
        Program {
            symbol_pool: SymbolPool::new(),
            blocks: BTreeMap::new(),
            program_counter,
            stack_pointer,
            irdst,
            graph: None,
        }
    }

    /// Create an empty `Program` for the registers of `translator`.
    pub fn for_translator<T: Translator>(translator: &T) -> Program {
        Program::new(
            translator.program_counter(),
            translator.stack_pointer(),
            translator.irdst(),
        )
    }

    pub fn program_counter(&self) -> &Identifier {
        &self.program_counter
    }

    pub fn stack_pointer(&self) -> &Identifier {
        &self.stack_pointer
    }

    pub fn irdst(&self) -> &Identifier {
        &self.irdst
    }

    pub fn symbol_pool(&self) -> &SymbolPool {
        &self.symbol_pool
    }

    pub fn symbol_pool_mut(&mut self) -> &mut SymbolPool {
        &mut self.symbol_pool
    }

    fn invalidate(&mut self) {
        if self.graph.take().is_some() {
            debug!("control flow graph invalidated");
        }
    }

    /// Lower a machine basic block and insert the resulting IR blocks.
    ///
    /// Every instruction is lowered by `translator`. A new block starts at
    /// the first instruction, and after every instruction which lowers to
    /// extra blocks. Blocks which never assign `IRDst` fall through to the
    /// instruction following the last one of `instructions`.
    ///
    /// # Errors
    /// Translation errors and `Error::MultipleDestinations` abort the call,
    /// and nothing is inserted. Blocks whose partial writes cannot be merged
    /// are skipped and reported in the returned `BlockAssembly`.
    pub fn add_block<T: Translator>(
        &mut self,
        translator: &T,
        instructions: &[T::Instruction],
        options: &Options,
    ) -> Result<BlockAssembly, Error> {
        let last = match instructions.last() {
            Some(instruction) => Line::instruction(instruction),
            None => return Ok(BlockAssembly::default()),
        };
        let pc_bits = self.program_counter.bits();

        let mut produced: Vec<Block> = Vec::new();
        let mut current: Option<usize> = None;

        for instruction in instructions {
            let index = match current {
                Some(index) => index,
                None => {
                    let label = self.symbol_pool.label_for_offset(instruction.address());
                    produced.push(Block::new(label, self.irdst.clone()));
                    produced.len() - 1
                }
            };
            current = Some(index);

            let line = Line::instruction(instruction);
            let (group, extra_blocks) = translator
                .translate_instruction(instruction, &mut self.symbol_pool)?
                .into_parts();

            if options.generate_pc_updates() {
                let mut update = InstructionGroup::new();
                update.assign(
                    self.program_counter.clone().into(),
                    expr_int(instruction.address(), pc_bits),
                );
                produced[index].push(update, line.synthesized(LineKind::ProgramCounterUpdate));
            }

            produced[index].push(group, line);

            if !extra_blocks.is_empty() {
                for mut block in extra_blocks {
                    block.set_lines(line);
                    produced.push(block);
                }
                current = None;
            }
        }

        let next = self.symbol_pool.label_for_offset(last.next_address());
        for block in produced.iter_mut() {
            if block.destination()?.is_some() {
                continue;
            }
            let mut fallthrough = InstructionGroup::new();
            fallthrough.assign(self.irdst.clone().into(), expr_label(next, pc_bits));
            let line = block.lines().last().copied().unwrap_or(last);
            block.push(fallthrough, line.synthesized(LineKind::Fallthrough));
        }

        let mut assembly = BlockAssembly::default();
        let mut accepted = Vec::with_capacity(produced.len());

        'blocks: for mut block in produced {
            for index in 0..block.groups().len() {
                match merge_multi_affect(&block.groups()[index]) {
                    Ok(group) => block.replace_group(index, group)?,
                    Err(error @ Error::MalformedPartialWrite { .. }) => {
                        let address = block.lines().get(index).map(Line::address).unwrap_or(0);
                        warn!(
                            "skipping block {}: instruction at 0x{:X}: {}",
                            block.label(),
                            address,
                            error
                        );
                        assembly.rejected.push((block.label(), error));
                        continue 'blocks;
                    }
                    Err(error) => return Err(error),
                }
            }
            accepted.push(block);
        }

        for block in accepted {
            assembly.blocks.push(block.label());
            self.blocks.insert(block.label(), block);
        }
        self.invalidate();

        debug!(
            "0x{:X}: {} instruction(s) lowered to {} block(s), {} rejected",
            instructions[0].address(),
            instructions.len(),
            assembly.blocks.len(),
            assembly.rejected.len()
        );

        Ok(assembly)
    }

    /// Lower a single instruction as its own basic block.
    pub fn add_instruction<T: Translator>(
        &mut self,
        translator: &T,
        instruction: &T::Instruction,
        options: &Options,
    ) -> Result<BlockAssembly, Error> {
        self.add_block(translator, std::slice::from_ref(instruction), options)
    }

    /// Insert a block, replacing any block with the same label.
    pub fn insert_block(&mut self, block: Block) -> Option<Block> {
        self.invalidate();
        self.blocks.insert(block.label(), block)
    }

    pub fn block(&self, label: Label) -> Option<&Block> {
        self.blocks.get(&label)
    }

    pub fn blocks(&self) -> &BTreeMap<Label, Block> {
        &self.blocks
    }

    /// Every block with a group lowered from the instruction covering
    /// `address`.
    pub fn blocks_at_address(&self, address: u64) -> Vec<&Block> {
        self.blocks
            .values()
            .filter(|block| block.lines().iter().any(|line| line.contains(address)))
            .collect()
    }

    /// The label named by a label or integer expression.
    ///
    /// Integers are code addresses, and get a label on demand.
    pub fn label_for(&mut self, expression: &Expression) -> Result<Label, Error> {
        match *expression {
            Expression::Label(label, _) => Ok(label),
            Expression::Integer(ref integer) => {
                Ok(self.symbol_pool.label_for_offset(integer.address()?))
            }
            _ => Err(format!("{} does not name a label", expression).into()),
        }
    }

    /// The block named by a label or integer expression, if stored.
    pub fn block_for(&mut self, expression: &Expression) -> Result<Option<&Block>, Error> {
        let label = self.label_for(expression)?;
        Ok(self.blocks.get(&label))
    }

    /// Simplify both sides of every assignment of every block.
    pub fn simplify_blocks(&mut self) {
        for block in self.blocks.values_mut() {
            block.map_assignments(simplify_assignment);
        }
        self.invalidate();
    }

    /// Substitute sub-expressions across the assignments of one block.
    pub fn replace_expression(
        &mut self,
        label: Label,
        replacements: &BTreeMap<Expression, Expression>,
    ) -> Result<(), Error> {
        let block = self
            .blocks
            .get_mut(&label)
            .ok_or_else(|| format!("No block for {}", label))?;
        block.replace(replacements);
        self.invalidate();
        Ok(())
    }

    /// Every identifier read or written by any block.
    pub fn identifiers(&self) -> BTreeSet<Identifier> {
        let mut identifiers = BTreeSet::new();
        for block in self.blocks.values() {
            for assignment in block.groups().iter().flat_map(|group| group.iter()) {
                identifiers.extend(assignment.identifiers_read().into_iter().cloned());
                identifiers.extend(assignment.identifiers_written().into_iter().cloned());
            }
        }
        identifiers
    }

    /// Def/use facts for every block, tracking `registers`.
    pub fn def_use(&self, registers: &BTreeSet<Identifier>) -> BTreeMap<Label, BlockDefUse> {
        self.blocks
            .iter()
            .map(|(label, block)| (*label, def_use(block, registers)))
            .collect()
    }

    /// The control flow graph of the stored blocks, built if needed.
    pub fn control_flow_graph(&mut self) -> Result<&ControlFlowGraph, Error> {
        let graph = match self.graph.take() {
            Some(graph) => graph,
            None => {
                let graph = ControlFlowGraph::build(&self.blocks, &mut self.symbol_pool)?;
                debug!(
                    "control flow graph built: {} node(s), {} edge(s)",
                    graph.nodes().len(),
                    graph.edges().len()
                );
                graph
            }
        };
        let graph: &ControlFlowGraph = self.graph.insert(graph);
        Ok(graph)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for block in self.blocks.values() {
            writeln!(f, "{}", block)?;
        }
        Ok(())
    }
}
