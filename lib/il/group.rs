use crate::il::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::slice;

/// The assignments produced by lowering one machine instruction.
///
/// Assignments in a group are simultaneous: every source reads the state as
/// it was before the group.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct InstructionGroup {
    assignments: Vec<Assignment>,
}

impl InstructionGroup {
    pub fn new() -> InstructionGroup {
        InstructionGroup::default()
    }

    /// Adds an assignment to the end of this group.
    pub fn assign(&mut self, dst: Expression, src: Expression) {
        self.assignments.push(Assignment::new(dst, src));
    }

    pub fn push(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn assignments_mut(&mut self) -> &mut Vec<Assignment> {
        &mut self.assignments
    }

    pub fn iter(&self) -> slice::Iter<Assignment> {
        self.assignments.iter()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// The first assignment whose destination is exactly `identifier`.
    pub fn assignment_to(&self, identifier: &Identifier) -> Option<&Assignment> {
        self.assignments
            .iter()
            .find(|assignment| assignment.assigns(identifier))
    }
}

impl From<Vec<Assignment>> for InstructionGroup {
    fn from(assignments: Vec<Assignment>) -> InstructionGroup {
        InstructionGroup { assignments }
    }
}

impl<'g> IntoIterator for &'g InstructionGroup {
    type Item = &'g Assignment;
    type IntoIter = slice::Iter<'g, Assignment>;

    fn into_iter(self) -> Self::IntoIter {
        self.assignments.iter()
    }
}

impl fmt::Display for InstructionGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for assignment in &self.assignments {
            writeln!(f, "\t{}", assignment)?;
        }
        Ok(())
    }
}
