use crate::il::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named register of fixed width.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Identifier {
    name: String,
    bits: usize,
}

impl Identifier {
    pub fn new<S>(name: S, bits: usize) -> Identifier
    where
        S: Into<String>,
    {
        Identifier {
            name: name.into(),
            bits,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bits(&self) -> usize {
        self.bits
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<Identifier> for Expression {
    fn from(identifier: Identifier) -> Expression {
        Expression::identifier(identifier)
    }
}
