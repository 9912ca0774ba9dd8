//! A `Label` names a location in the program.
//!
//! Labels are opaque ids handed out by a `SymbolPool`. The pool knows the
//! name and, when there is one, the offset behind each label.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An interned label.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Label(usize);

impl Label {
    /// Create a label from a raw id.
    ///
    /// Labels should normally come from a `SymbolPool`. This exists for
    /// graphs and tests which only need distinct ids.
    pub fn new(id: usize) -> Label {
        Label(id)
    }

    /// The raw id of this label.
    pub fn id(&self) -> usize {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "lbl{}", self.0)
    }
}
