//! An `Integer` holds a literal value of fixed width.

use crate::il::*;
use crate::Error;
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An integer literal.
///
/// The value is always masked to `bits`.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Integer {
    value: BigUint,
    bits: usize,
}

impl Integer {
    /// Create a new `Integer` with the given value and bitness.
    pub fn new(value: u64, bits: usize) -> Integer {
        Integer::from_biguint(BigUint::from(value), bits)
    }

    /// Create a new `Integer` from a `BigUint`, truncating to `bits`.
    pub fn from_biguint(value: BigUint, bits: usize) -> Integer {
        Integer {
            value: mask(value, bits),
            bits,
        }
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }

    /// Get the value of this `Integer` as a `u64`, if it fits.
    pub fn value_u64(&self) -> Option<u64> {
        self.value.to_u64()
    }

    /// Get the value as an address, failing when it does not fit in 64 bits.
    pub fn address(&self) -> Result<u64, Error> {
        self.value_u64().ok_or(Error::TooManyAddressBits)
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Extract bits `[start, end)` of this integer.
    pub fn slice(&self, start: usize, end: usize) -> Integer {
        Integer::from_biguint(&self.value >> start, end - start)
    }
}

/// Truncate `value` to its low `bits` bits.
pub(crate) fn mask(value: BigUint, bits: usize) -> BigUint {
    value & ((BigUint::one() << bits) - BigUint::one())
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:X}:{}", self.value, self.bits)
    }
}

impl From<Integer> for Expression {
    fn from(integer: Integer) -> Expression {
        Expression::integer(integer)
    }
}
