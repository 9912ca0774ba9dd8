use crate::il::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// `dst := src`
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Assignment {
    dst: Expression,
    src: Expression,
}

impl Assignment {
    pub fn new(dst: Expression, src: Expression) -> Assignment {
        Assignment { dst, src }
    }

    pub fn dst(&self) -> &Expression {
        &self.dst
    }

    pub fn src(&self) -> &Expression {
        &self.src
    }

    /// Returns true if this assignment writes exactly `identifier`.
    pub fn assigns(&self, identifier: &Identifier) -> bool {
        match self.dst {
            Expression::Identifier(ref dst) => dst == identifier,
            _ => false,
        }
    }

    /// Identifiers written by this assignment.
    ///
    /// A memory destination writes no identifier, even though its address
    /// may mention several.
    pub fn identifiers_written(&self) -> Vec<&Identifier> {
        fn written(dst: &Expression) -> Vec<&Identifier> {
            match *dst {
                Expression::Identifier(ref identifier) => vec![identifier],
                Expression::Slice(ref base, _, _) => written(base),
                _ => Vec::new(),
            }
        }
        written(&self.dst)
    }

    /// Identifiers read by this assignment.
    ///
    /// This includes identifiers in the address of a memory destination:
    /// computing the address is a read.
    pub fn identifiers_read(&self) -> Vec<&Identifier> {
        let mut read = self.src.collect_identifiers();
        if let Expression::Memory(ref address, _) = self.dst {
            read.append(&mut address.collect_identifiers());
        }
        read
    }

    /// The parts of a `Compose` source which actually change the destination.
    ///
    /// A part `dst[a:b]` placed at `a..b` only restates the old value and is
    /// left out. Returns `None` when the source is not a `Compose`.
    pub fn modified_slices(&self) -> Option<Vec<ComposePart>> {
        let parts = match self.src {
            Expression::Compose(ref parts) => parts,
            _ => return None,
        };
        Some(
            parts
                .iter()
                .filter(|(expression, start, end)| match *expression {
                    Expression::Slice(ref base, slice_start, slice_end) => {
                        **base != self.dst || slice_start != *start || slice_end != *end
                    }
                    _ => true,
                })
                .cloned()
                .collect(),
        )
    }

    /// Substitute sub-expressions on both sides of this assignment.
    pub fn replace(&self, replacements: &BTreeMap<Expression, Expression>) -> Assignment {
        Assignment::new(self.dst.replace(replacements), self.src.replace(replacements))
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} = {}", self.dst, self.src)
    }
}
