//! rtlflow: a register-transfer IR for binary analysis.
//!
//! Machine instructions are lowered by a [`translator::Translator`] into
//! groups of simultaneous assignments over symbolic expressions. Groups are
//! collected into IR blocks, one per machine basic block, and every block
//! carries exactly one assignment to the `IRDst` pseudo-register describing
//! its successors.
//!
//! The pieces fit together like this:
//!
//! * [`il`] holds the expression algebra, IR blocks, the symbol pool, the
//! control flow graph, and [`il::Program`], the container which drives block
//! assembly.
//! * [`transformation`] canonicalizes partial-register writes so every group
//! assigns each destination at most once.
//! * [`analysis`] resolves block destinations into successors (trackback),
//! seeds def/use facts for reaching definitions, and simplifies expressions.
//! * [`graph`] is the directed graph underneath the control flow graph.
//!
//! ```
//! use rtlflow::il;
//! use rtlflow::translator::{tiny, Options};
//!
//! let translator = tiny::Tiny::new();
//! let mut program = il::Program::for_translator(&translator);
//! let instructions = vec![
//!     tiny::TinyInstruction::movi(0x1000, 0, 7),
//!     tiny::TinyInstruction::jnz(0x1004, 0, 0x2000),
//! ];
//! program
//!     .add_block(&translator, &instructions, &Options::default())
//!     .unwrap();
//! let graph = program.control_flow_graph().unwrap();
//! assert_eq!(graph.edges().len(), 2);
//! ```

use thiserror::Error;

pub mod analysis;
pub mod graph;
pub mod il;
#[cfg(test)]
mod tests;
pub mod transformation;
pub mod translator;

use crate::il::Label;

/// Errors raised while building or querying the IR.
///
/// All of these describe structural defects in the input or a broken usage
/// contract. None are transient.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Block {0} assigns IRDst more than once")]
    MultipleDestinations(Label),
    #[error("Block {0} has no IRDst assignment to replace")]
    MissingDestination(Label),
    #[error("Malformed partial write to {destination}: {reason}")]
    MalformedPartialWrite { destination: String, reason: String },
    #[error("Sort error, invalid bitness between expressions")]
    Sort,
    #[error("Integer too wide to be used as an address")]
    TooManyAddressBits,
    #[error("Graph vertex not found: {0}")]
    GraphVertexNotFound(Label),
    #[error("Graph edge not found: {0} -> {1}")]
    GraphEdgeNotFound(Label, Label),
    #[error("Unhandled instruction: {0}")]
    UnhandledInstruction(String),
    #[error("{0}")]
    Custom(String),
}

impl From<&str> for Error {
    fn from(s: &str) -> Error {
        Error::Custom(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}
