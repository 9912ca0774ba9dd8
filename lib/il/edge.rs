//! An `Edge` links two blocks in a `ControlFlowGraph`.
//!
//! Edges are derived from block destinations. The `BranchKind` of an edge
//! records which arm of a conditional destination the edge came from.

use crate::graph;
use crate::il::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an edge relates to its head block's destination.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum BranchKind {
    /// The tail is the `then` arm of a conditional destination.
    Taken,
    /// The tail is the `else` arm of a conditional destination.
    NotTaken,
    Unconditional,
}

impl BranchKind {
    /// Classify the edge to `tail` given the head block's destination.
    ///
    /// Integer arms name the block at that address in `symbol_pool`. The
    /// `then` arm is checked first, so a conditional with the same target on
    /// both arms yields `Taken`.
    pub fn classify(
        destination: Option<&Expression>,
        tail: Label,
        symbol_pool: &SymbolPool,
    ) -> BranchKind {
        let targets = |arm: &Expression| {
            let target = match *arm {
                Expression::Label(label, _) => Some(label),
                Expression::Integer(ref integer) => integer
                    .value_u64()
                    .and_then(|address| symbol_pool.label_by_offset(address)),
                _ => None,
            };
            target == Some(tail)
        };

        match destination {
            Some(Expression::Conditional(_, then, else_)) => {
                if targets(then.as_ref()) {
                    BranchKind::Taken
                } else if targets(else_.as_ref()) {
                    BranchKind::NotTaken
                } else {
                    BranchKind::Unconditional
                }
            }
            _ => BranchKind::Unconditional,
        }
    }

    /// The color conventionally used to draw this kind of edge.
    pub fn color(&self) -> &'static str {
        match *self {
            BranchKind::Taken => "limegreen",
            BranchKind::NotTaken => "red",
            BranchKind::Unconditional => "blue",
        }
    }
}

impl fmt::Display for BranchKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            BranchKind::Taken => write!(f, "taken"),
            BranchKind::NotTaken => write!(f, "not-taken"),
            BranchKind::Unconditional => write!(f, "unconditional"),
        }
    }
}

/// Edge between IL blocks
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Edge {
    head: Label,
    tail: Label,
    kind: BranchKind,
}

impl Edge {
    pub(crate) fn new(head: Label, tail: Label, kind: BranchKind) -> Edge {
        Edge { head, tail, kind }
    }

    /// Retrieve the label of the head block for this `Edge`.
    pub fn head(&self) -> Label {
        self.head
    }

    /// Retrieve the label of the tail block for this `Edge`.
    pub fn tail(&self) -> Label {
        self.tail
    }

    pub fn kind(&self) -> BranchKind {
        self.kind
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}->{}) {}", self.head, self.tail, self.kind)
    }
}

impl graph::Edge for Edge {
    fn head(&self) -> Label {
        self.head
    }
    fn tail(&self) -> Label {
        self.tail
    }
}
