//! The rtlflow intermediate language.
//!
//! # An Introduction
//!
//! The IL is a register-transfer language. Each machine instruction lowers to
//! one `InstructionGroup`, a set of simultaneous `Assignment`s of the form
//! `dst = src`. Every source in a group reads the state as it was before the
//! group, so a group can swap two registers without a temporary.
//!
//! ## Expressions
//!
//! `Expression` is a closed set of terms:
//!
//! * Terminals: `Identifier`, `Integer`, `Label`.
//! * Memory: `Memory(address, bits)`.
//! * Ternary: `Conditional(cond, then, else)`.
//! * Bit fields: `Slice(base, start, end)` and `Compose(parts)`.
//! * Arithmetic: `Operation(operator, lhs, rhs)`.
//!
//! Creating an expression over operands of differing bitness is a `Sort`
//! error. This is checked by the constructors which take more than one
//! operand.
//!
//! ## `Block`
//!
//! A `Block` is the lowering of one machine basic block, an ordered list of
//! groups. Each group carries a `Line` saying which machine instruction it
//! came from. Exactly one assignment in a finished block writes the `IRDst`
//! pseudo-register. Its source is the block's destination, and describes
//! every successor of the block. A destination is usually a `Label`, or a
//! `Conditional` choosing between two labels, but may be any expression.
//!
//! ## `Label` and `SymbolPool`
//!
//! Labels are interned ids. The `SymbolPool` hands them out and remembers the
//! name and offset behind each one.
//!
//! ## `ControlFlowGraph`
//!
//! The graph is derived from the blocks, never edited directly. A `Program`
//! builds it on demand by resolving each block's destination, and throws it
//! away whenever a block changes.
//!
//! ## `Program`
//!
//! A `Program` owns the blocks of an analysis session, the symbol pool, and
//! the architecture's special registers. `Program::add_block` is the way
//! machine instructions enter the IL.

mod assignment;
mod block;
mod control_flow_graph;
mod edge;
mod expression;
mod group;
mod identifier;
mod integer;
mod label;
mod line;
mod program;
mod symbol_pool;

pub use self::assignment::*;
pub use self::block::*;
pub use self::control_flow_graph::*;
pub use self::edge::*;
pub use self::expression::*;
pub use self::group::*;
pub use self::identifier::*;
pub use self::integer::*;
pub use self::label::*;
pub use self::line::*;
pub use self::program::*;
pub use self::symbol_pool::*;

/// A convenience function to create a new identifier.
pub fn id<S>(name: S, bits: usize) -> Identifier
where
    S: Into<String>,
{
    Identifier::new(name, bits)
}

/// A convenience function to create a new identifier expression.
///
/// This is the preferred way to create an `Expression::Identifier`.
pub fn expr_id<S>(name: S, bits: usize) -> Expression
where
    S: Into<String>,
{
    Expression::identifier(Identifier::new(name, bits))
}

/// A convenience function to create a new integer expression.
///
/// This is the preferred way to create an `Expression::Integer`.
pub fn expr_int(value: u64, bits: usize) -> Expression {
    Expression::integer(Integer::new(value, bits))
}

/// A convenience function to create a new label expression.
pub fn expr_label(label: Label, bits: usize) -> Expression {
    Expression::label(label, bits)
}
