//! Block-local resolution of destinations into successor descriptors.
//!
//! A block's destination is often symbolic: a register set earlier in the
//! block, or a conditional choosing between two such registers. Trackback
//! walks the block's groups backwards, substituting the last value assigned
//! to each register until only terminal descriptors remain.

use crate::il::*;
use crate::Error;
use log::trace;
use std::collections::BTreeSet;

/// Drain `todo`, moving terminal descriptors into `done`.
///
/// Conditionals are split into both arms and classified again. Identifiers
/// need the block's assignments to go any further, and are returned.
pub fn classify(
    mut todo: BTreeSet<Expression>,
    done: &mut BTreeSet<Expression>,
) -> BTreeSet<Identifier> {
    let mut out = BTreeSet::new();

    while let Some(expression) = todo.pop_first() {
        match expression {
            Expression::Conditional(_, then, else_) => {
                todo.insert(*then);
                todo.insert(*else_);
            }
            Expression::Identifier(identifier) => {
                out.insert(identifier);
            }
            Expression::Label(..) | Expression::Integer(_) | Expression::Memory(..) => {
                done.insert(expression);
            }
            // Nothing more can be learned without evaluating it.
            _ => {
                done.insert(expression);
            }
        }
    }

    out
}

/// Resolve the destination of `block` into the set of its successor
/// descriptors.
///
/// A block without a destination has no successors. Registers which are
/// never assigned before the destination is read are returned as
/// `Expression::Identifier`: their value comes from outside the block.
pub fn resolve_destinations(block: &Block) -> Result<BTreeSet<Expression>, Error> {
    let mut done = BTreeSet::new();

    let index = match block.destination_index()? {
        Some(index) => index,
        None => return Ok(done),
    };
    let destination = match block.destination()? {
        Some(destination) => destination.clone(),
        None => return Ok(done),
    };

    let mut todo: BTreeSet<Expression> = BTreeSet::new();
    todo.insert(destination);

    // The destination group reads the state before itself, so the walk
    // starts with the group just above it.
    for (group_index, group) in block.groups()[..index].iter().enumerate().rev() {
        if todo.is_empty() {
            break;
        }

        let out = classify(todo, &mut done);
        let mut follow = BTreeSet::new();

        for identifier in out {
            match group.assignment_to(&identifier) {
                Some(assignment) => {
                    trace!(
                        "{} group {}: {} = {}",
                        block.label(),
                        group_index,
                        identifier,
                        assignment.src()
                    );
                    follow.insert(assignment.src().clone());
                }
                None => {
                    follow.insert(Expression::Identifier(identifier));
                }
            }
        }

        todo = follow;
    }

    let out = classify(todo, &mut done);
    done.extend(out.into_iter().map(Expression::Identifier));

    Ok(done)
}

/// What a resolved descriptor says about a successor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Successor<'e> {
    /// A known label.
    Label(Label),
    /// An absolute code address, which still needs a label.
    Address(u64),
    /// The successor is loaded from memory.
    Memory(&'e Expression),
    /// The successor is held in a register set outside the block.
    External(&'e Identifier),
    /// Anything else, including integers too wide to be addresses.
    Other(&'e Expression),
}

impl<'e> Successor<'e> {
    pub fn classify(descriptor: &'e Expression) -> Successor<'e> {
        match *descriptor {
            Expression::Label(label, _) => Successor::Label(label),
            Expression::Integer(ref integer) => match integer.address() {
                Ok(address) => Successor::Address(address),
                Err(_) => Successor::Other(descriptor),
            },
            Expression::Memory(..) => Successor::Memory(descriptor),
            Expression::Identifier(ref identifier) => Successor::External(identifier),
            _ => Successor::Other(descriptor),
        }
    }

    /// Returns true if the successor is known statically.
    pub fn is_static(&self) -> bool {
        matches!(*self, Successor::Label(_) | Successor::Address(_))
    }
}
