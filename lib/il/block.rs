use crate::il::*;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt;

/// An IR block: the lowering of one machine basic block.
///
/// A finished block holds exactly one assignment to its `IRDst` identifier.
/// The source of that assignment, the block's destination, describes every
/// successor of the block.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Block {
    /// The label of the block.
    label: Label,
    /// The pseudo-register holding the next instruction pointer.
    irdst: Identifier,
    /// One group per lowered machine instruction.
    groups: Vec<InstructionGroup>,
    /// The origin of each group, parallel to `groups`.
    lines: Vec<Line>,
    /// Index of the group assigning `irdst`. Cleared whenever groups change.
    #[serde(skip)]
    destination_index: OnceCell<Option<usize>>,
}

impl Block {
    pub fn new(label: Label, irdst: Identifier) -> Block {
        Block {
            label,
            irdst,
            groups: Vec::new(),
            lines: Vec::new(),
            destination_index: OnceCell::new(),
        }
    }

    /// Returns the label of this block
    pub fn label(&self) -> Label {
        self.label
    }

    pub fn irdst(&self) -> &Identifier {
        &self.irdst
    }

    pub fn groups(&self) -> &[InstructionGroup] {
        &self.groups
    }

    /// Mutable access to the groups. Forgets the cached destination.
    pub fn groups_mut(&mut self) -> &mut Vec<InstructionGroup> {
        self.destination_index.take();
        &mut self.groups
    }

    pub fn group(&self, index: usize) -> Option<&InstructionGroup> {
        self.groups.get(index)
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Tag every group of this block with the same origin.
    pub fn set_lines(&mut self, line: Line) {
        self.lines = vec![line; self.groups.len()];
    }

    /// Appends a group to the end of this block.
    pub fn push(&mut self, group: InstructionGroup, line: Line) {
        self.destination_index.take();
        self.groups.push(group);
        self.lines.push(line);
    }

    /// Replace the group at `index`.
    pub fn replace_group(&mut self, index: usize, group: InstructionGroup) -> Result<(), Error> {
        if index >= self.groups.len() {
            return Err(format!("Block {} has no group {}", self.label, index).into());
        }
        self.destination_index.take();
        self.groups[index] = group;
        Ok(())
    }

    fn find_destination(&self) -> Result<Option<usize>, Error> {
        let mut found = None;
        for (index, group) in self.groups.iter().enumerate() {
            for assignment in group {
                if assignment.assigns(&self.irdst) {
                    if found.is_some() {
                        return Err(Error::MultipleDestinations(self.label));
                    }
                    found = Some(index);
                }
            }
        }
        Ok(found)
    }

    /// Index of the group which assigns `IRDst`, if any.
    pub fn destination_index(&self) -> Result<Option<usize>, Error> {
        if let Some(index) = self.destination_index.get() {
            return Ok(*index);
        }
        let index = self.find_destination()?;
        let _ = self.destination_index.set(index);
        Ok(index)
    }

    /// The source of this block's `IRDst` assignment.
    ///
    /// Returns `None` while the block has no destination yet.
    ///
    /// # Errors
    /// `Error::MultipleDestinations` if `IRDst` is assigned more than once.
    pub fn destination(&self) -> Result<Option<&Expression>, Error> {
        Ok(self
            .destination_index()?
            .and_then(|index| self.groups[index].assignment_to(&self.irdst))
            .map(|assignment| assignment.src()))
    }

    /// Replace the source of the existing `IRDst` assignment.
    ///
    /// # Errors
    /// `Error::MissingDestination` if there is no assignment to rewrite.
    pub fn set_destination(&mut self, destination: Expression) -> Result<(), Error> {
        let index = self
            .destination_index()?
            .ok_or(Error::MissingDestination(self.label))?;
        let irdst = self.irdst.clone();
        let group = &mut self.groups[index];
        for assignment in group.assignments_mut().iter_mut() {
            if assignment.assigns(&irdst) {
                *assignment = Assignment::new(assignment.dst().clone(), destination);
                return Ok(());
            }
        }
        Err(Error::MissingDestination(self.label))
    }

    /// Rewrite every assignment of this block through `f`.
    pub fn map_assignments<F>(&mut self, mut f: F)
    where
        F: FnMut(&Assignment) -> Assignment,
    {
        for group in self.groups_mut().iter_mut() {
            let rewritten: Vec<Assignment> = group.iter().map(&mut f).collect();
            *group = InstructionGroup::from(rewritten);
        }
    }

    /// Substitute sub-expressions in every assignment of this block.
    pub fn replace(&mut self, replacements: &BTreeMap<Expression, Expression>) {
        self.map_assignments(|assignment| assignment.replace(replacements));
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "[ Block: {} ]", self.label)?;
        for (group, line) in self.groups.iter().zip(self.lines.iter()) {
            writeln!(f, "{}", line)?;
            write!(f, "{}", group)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn irdst() -> Identifier {
        Identifier::new("IRDst", 32)
    }

    fn line(address: u64) -> Line {
        Line::new(address, 4, LineKind::Instruction)
    }

    fn group(assignments: Vec<Assignment>) -> InstructionGroup {
        InstructionGroup::from(assignments)
    }

    #[test]
    fn destination_is_found_and_cached() {
        let mut block = Block::new(Label::new(0), irdst());
        block.push(
            group(vec![Assignment::new(expr_id("r0", 32), expr_int(1, 32))]),
            line(0),
        );
        assert_eq!(block.destination().unwrap(), None);
        assert_eq!(block.destination_index().unwrap(), None);

        block.push(
            group(vec![Assignment::new(
                irdst().into(),
                expr_label(Label::new(1), 32),
            )]),
            line(4),
        );
        assert_eq!(
            block.destination().unwrap(),
            Some(&expr_label(Label::new(1), 32))
        );
        assert_eq!(block.destination_index().unwrap(), Some(1));
    }

    #[test]
    fn multiple_destinations_fail() {
        let mut block = Block::new(Label::new(0), irdst());
        block.push(
            group(vec![Assignment::new(
                irdst().into(),
                expr_label(Label::new(1), 32),
            )]),
            line(0),
        );
        block.push(
            group(vec![Assignment::new(
                irdst().into(),
                expr_label(Label::new(2), 32),
            )]),
            line(4),
        );
        assert!(matches!(
            block.destination(),
            Err(Error::MultipleDestinations(_))
        ));
    }

    #[test]
    fn set_destination_rewrites_in_place() {
        let mut block = Block::new(Label::new(0), irdst());
        block.push(
            group(vec![
                Assignment::new(expr_id("r0", 32), expr_int(1, 32)),
                Assignment::new(irdst().into(), expr_label(Label::new(1), 32)),
            ]),
            line(0),
        );

        block.set_destination(expr_int(0x40, 32)).unwrap();

        assert_eq!(block.destination().unwrap(), Some(&expr_int(0x40, 32)));
        assert_eq!(block.groups()[0].len(), 2);
        assert_eq!(
            block.groups()[0].assignments()[0],
            Assignment::new(expr_id("r0", 32), expr_int(1, 32))
        );
    }

    #[test]
    fn set_destination_never_creates() {
        let mut block = Block::new(Label::new(0), irdst());
        block.push(
            group(vec![Assignment::new(expr_id("r0", 32), expr_int(1, 32))]),
            line(0),
        );
        assert!(matches!(
            block.set_destination(expr_int(0, 32)),
            Err(Error::MissingDestination(_))
        ));
    }

    #[test]
    fn mutation_forgets_cached_destination() {
        let mut block = Block::new(Label::new(0), irdst());
        block.push(
            group(vec![Assignment::new(
                irdst().into(),
                expr_label(Label::new(1), 32),
            )]),
            line(0),
        );
        assert!(block.destination().unwrap().is_some());

        block.groups_mut().clear();
        assert_eq!(block.destination().unwrap(), None);
    }
}
