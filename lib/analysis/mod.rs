//! Static analyses over the IL.
//!
//! None of these iterate to a fixed point. Trackback is block-local, and
//! def/use only seeds the tables a reaching definitions solver works on.

mod def_use;
mod simplification;
mod trackback;

pub use self::def_use::{def_use, BlockDefUse, DefinitionSite, Definitions};
pub use self::simplification::{simplify_assignment, simplify_expression};
pub use self::trackback::{classify, resolve_destinations, Successor};
