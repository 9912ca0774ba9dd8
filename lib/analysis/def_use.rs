//! Per-group read, write and definition facts.
//!
//! These are the inputs of a reaching definitions analysis. Nothing here
//! iterates: the reach and kill tables are allocated empty, ready for a
//! fixed point solver to fill in.

use crate::il::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The assignment at `group` of block `label`.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct DefinitionSite {
    label: Label,
    group: usize,
    assignment: Assignment,
}

impl DefinitionSite {
    pub fn new(label: Label, group: usize, assignment: Assignment) -> DefinitionSite {
        DefinitionSite {
            label,
            group,
            assignment,
        }
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn group(&self) -> usize {
        self.group
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }
}

/// Definition sites for each register.
pub type Definitions = BTreeMap<Identifier, BTreeSet<DefinitionSite>>;

/// The def/use facts of one block, indexed by group.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BlockDefUse {
    label: Label,
    reads: Vec<BTreeSet<Identifier>>,
    writes: Vec<BTreeSet<Identifier>>,
    definitions: Vec<Definitions>,
    current_reach: Vec<Definitions>,
    previous_reach: Vec<Definitions>,
    current_kill: Vec<Definitions>,
    previous_kill: Vec<Definitions>,
}

impl BlockDefUse {
    pub fn label(&self) -> Label {
        self.label
    }

    /// Number of groups covered.
    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    /// Identifiers read by group `index`.
    pub fn reads(&self, index: usize) -> Option<&BTreeSet<Identifier>> {
        self.reads.get(index)
    }

    /// Identifiers written by group `index`.
    pub fn writes(&self, index: usize) -> Option<&BTreeSet<Identifier>> {
        self.writes.get(index)
    }

    /// Where group `index` defines each register.
    pub fn definitions(&self, index: usize) -> Option<&Definitions> {
        self.definitions.get(index)
    }

    pub fn current_reach(&self) -> &[Definitions] {
        &self.current_reach
    }

    pub fn current_reach_mut(&mut self) -> &mut [Definitions] {
        &mut self.current_reach
    }

    pub fn previous_reach(&self) -> &[Definitions] {
        &self.previous_reach
    }

    pub fn previous_reach_mut(&mut self) -> &mut [Definitions] {
        &mut self.previous_reach
    }

    pub fn current_kill(&self) -> &[Definitions] {
        &self.current_kill
    }

    pub fn current_kill_mut(&mut self) -> &mut [Definitions] {
        &mut self.current_kill
    }

    pub fn previous_kill(&self) -> &[Definitions] {
        &self.previous_kill
    }

    pub fn previous_kill_mut(&mut self) -> &mut [Definitions] {
        &mut self.previous_kill
    }
}

fn empty_definitions(registers: &BTreeSet<Identifier>) -> Definitions {
    registers
        .iter()
        .map(|register| (register.clone(), BTreeSet::new()))
        .collect()
}

/// Compute def/use facts for every group of `block`.
///
/// `registers` are the identifiers tracked by the reach and kill tables.
/// Every table starts with an empty entry for each of them.
pub fn def_use(block: &Block, registers: &BTreeSet<Identifier>) -> BlockDefUse {
    let groups = block.groups().len();
    let empty = empty_definitions(registers);

    let mut facts = BlockDefUse {
        label: block.label(),
        reads: Vec::with_capacity(groups),
        writes: Vec::with_capacity(groups),
        definitions: Vec::with_capacity(groups),
        current_reach: vec![empty.clone(); groups],
        previous_reach: vec![empty.clone(); groups],
        current_kill: vec![empty.clone(); groups],
        previous_kill: vec![empty.clone(); groups],
    };

    for (index, group) in block.groups().iter().enumerate() {
        let mut reads = BTreeSet::new();
        let mut writes = BTreeSet::new();
        let mut definitions = empty.clone();

        for assignment in group {
            reads.extend(assignment.identifiers_read().into_iter().cloned());
            for written in assignment.identifiers_written() {
                writes.insert(written.clone());
                definitions
                    .entry(written.clone())
                    .or_default()
                    .insert(DefinitionSite::new(block.label(), index, assignment.clone()));
            }
        }

        facts.reads.push(reads);
        facts.writes.push(writes);
        facts.definitions.push(definitions);
    }

    facts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(groups: Vec<Vec<Assignment>>) -> Block {
        let mut block = Block::new(Label::new(3), id("IRDst", 32));
        for (index, assignments) in groups.into_iter().enumerate() {
            block.push(
                InstructionGroup::from(assignments),
                Line::new(index as u64 * 4, 4, LineKind::Instruction),
            );
        }
        block
    }

    #[test]
    fn store_reads_its_address() {
        let store = Assignment::new(
            Expression::memory(
                Expression::add(expr_id("R", 32), expr_int(4, 32)).unwrap(),
                32,
            ),
            Expression::add(expr_id("S", 32), expr_id("T", 32)).unwrap(),
        );
        let block = block(vec![vec![store]]);

        let facts = def_use(&block, &BTreeSet::new());

        let reads = facts.reads(0).unwrap();
        assert!(reads.contains(&id("R", 32)));
        assert!(reads.contains(&id("S", 32)));
        assert!(reads.contains(&id("T", 32)));
        assert!(facts.writes(0).unwrap().is_empty());
        assert!(facts.definitions(0).unwrap().is_empty());
    }

    #[test]
    fn definition_sites_are_recorded() {
        let load = Assignment::new(
            expr_id("r0", 32),
            Expression::memory(expr_id("sp", 32), 32),
        );
        let block = block(vec![
            vec![Assignment::new(expr_id("r1", 32), expr_int(1, 32))],
            vec![load.clone()],
        ]);
        let registers = BTreeSet::from([id("r0", 32), id("r1", 32), id("sp", 32)]);

        let facts = def_use(&block, &registers);

        assert_eq!(facts.len(), 2);
        assert_eq!(facts.label(), Label::new(3));
        assert!(facts.reads(1).unwrap().contains(&id("sp", 32)));
        assert_eq!(
            facts.writes(1).unwrap(),
            &BTreeSet::from([id("r0", 32)])
        );

        let sites = &facts.definitions(1).unwrap()[&id("r0", 32)];
        assert_eq!(
            sites,
            &BTreeSet::from([DefinitionSite::new(Label::new(3), 1, load)])
        );
        assert!(facts.definitions(1).unwrap()[&id("r1", 32)].is_empty());
    }

    #[test]
    fn reach_and_kill_are_seeded_empty() {
        let block = block(vec![
            vec![Assignment::new(expr_id("r0", 32), expr_int(1, 32))],
            vec![Assignment::new(expr_id("r1", 32), expr_id("r0", 32))],
        ]);
        let registers = BTreeSet::from([id("r0", 32), id("r1", 32)]);

        let facts = def_use(&block, &registers);

        for table in [
            facts.current_reach(),
            facts.previous_reach(),
            facts.current_kill(),
            facts.previous_kill(),
        ] {
            assert_eq!(table.len(), 2);
            for definitions in table {
                assert_eq!(definitions.len(), 2);
                assert!(definitions.values().all(|sites| sites.is_empty()));
            }
        }
    }
}
