use crate::il::*;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A binary operator for `Expression::Operation`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match *self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::And => "&",
            Operator::Or => "|",
            Operator::Xor => "^",
            Operator::Shl => "<<",
            Operator::Shr => ">>",
        };
        write!(f, "{}", symbol)
    }
}

/// One part of a `Compose`: bits `[start, end)` of the composed value come
/// from the expression.
pub type ComposePart = (Expression, usize, usize);

/// An IR expression.
///
/// Expressions are immutable trees. Rewrites build new trees.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Expression {
    Identifier(Identifier),
    Integer(Integer),
    /// A label used as a value, with the width of a code address.
    Label(Label, usize),
    /// A memory cell of the given width at an address.
    Memory(Box<Expression>, usize),
    /// `cond ? then : else`
    Conditional(Box<Expression>, Box<Expression>, Box<Expression>),
    /// Bits `[start, end)` of an expression.
    Slice(Box<Expression>, usize, usize),
    /// Disjoint parts which together tile the composed width.
    Compose(Vec<ComposePart>),
    Operation(Operator, Box<Expression>, Box<Expression>),
}

impl Expression {
    /// Return the bit-sort of this expression.
    pub fn bits(&self) -> usize {
        match *self {
            Expression::Identifier(ref identifier) => identifier.bits(),
            Expression::Integer(ref integer) => integer.bits(),
            Expression::Label(_, bits) | Expression::Memory(_, bits) => bits,
            Expression::Conditional(_, ref then, _) => then.bits(),
            Expression::Slice(_, start, end) => end - start,
            Expression::Compose(ref parts) => parts.iter().map(|part| part.2).max().unwrap_or(0),
            Expression::Operation(_, ref lhs, _) => lhs.bits(),
        }
    }

    /// Ensures the bits of both lhs and rhs are the same.
    fn ensure_sort(lhs: &Expression, rhs: &Expression) -> Result<(), Error> {
        if lhs.bits() != rhs.bits() || lhs.bits() == 0 {
            Err(Error::Sort)
        } else {
            Ok(())
        }
    }

    pub fn identifier(identifier: Identifier) -> Expression {
        Expression::Identifier(identifier)
    }

    pub fn integer(integer: Integer) -> Expression {
        Expression::Integer(integer)
    }

    pub fn label(label: Label, bits: usize) -> Expression {
        Expression::Label(label, bits)
    }

    pub fn memory(address: Expression, bits: usize) -> Expression {
        Expression::Memory(Box::new(address), bits)
    }

    /// Create a conditional expression.
    /// # Error
    /// The two branches have different sorts.
    pub fn conditional(
        condition: Expression,
        then: Expression,
        else_: Expression,
    ) -> Result<Expression, Error> {
        Expression::ensure_sort(&then, &else_)?;
        Ok(Expression::Conditional(
            Box::new(condition),
            Box::new(then),
            Box::new(else_),
        ))
    }

    /// Create a slice of bits `[start, end)`.
    /// # Error
    /// The interval is empty or does not fit in `base`.
    pub fn slice(base: Expression, start: usize, end: usize) -> Result<Expression, Error> {
        if start >= end || end > base.bits() {
            return Err(Error::Sort);
        }
        Ok(Expression::Slice(Box::new(base), start, end))
    }

    /// Create a compose expression.
    /// # Error
    /// A part's width disagrees with its interval, or the parts do not tile
    /// `[0, width)` in order.
    pub fn compose(parts: Vec<ComposePart>) -> Result<Expression, Error> {
        let mut next = 0;
        for (expression, start, end) in &parts {
            if *start != next || *end <= *start || expression.bits() != end - start {
                return Err(Error::Sort);
            }
            next = *end;
        }
        if parts.is_empty() {
            return Err(Error::Sort);
        }
        Ok(Expression::Compose(parts))
    }

    /// Create a binary operation.
    /// # Error
    /// The sort of the lhs and the rhs are not the same.
    pub fn operation(
        operator: Operator,
        lhs: Expression,
        rhs: Expression,
    ) -> Result<Expression, Error> {
        Expression::ensure_sort(&lhs, &rhs)?;
        Ok(Expression::Operation(operator, Box::new(lhs), Box::new(rhs)))
    }

    pub fn add(lhs: Expression, rhs: Expression) -> Result<Expression, Error> {
        Expression::operation(Operator::Add, lhs, rhs)
    }

    pub fn sub(lhs: Expression, rhs: Expression) -> Result<Expression, Error> {
        Expression::operation(Operator::Sub, lhs, rhs)
    }

    pub fn and(lhs: Expression, rhs: Expression) -> Result<Expression, Error> {
        Expression::operation(Operator::And, lhs, rhs)
    }

    /// Returns the label if this expression is label-valued.
    pub fn get_label(&self) -> Option<Label> {
        match *self {
            Expression::Label(label, _) => Some(label),
            _ => None,
        }
    }

    pub fn is_label(&self) -> bool {
        self.get_label().is_some()
    }

    /// Returns all identifiers used in the expression, in tree order.
    pub fn collect_identifiers(&self) -> Vec<&Identifier> {
        let mut identifiers = Vec::new();
        self.walk_identifiers(&mut identifiers);
        identifiers
    }

    fn walk_identifiers<'e>(&'e self, identifiers: &mut Vec<&'e Identifier>) {
        match *self {
            Expression::Identifier(ref identifier) => identifiers.push(identifier),
            Expression::Integer(_) | Expression::Label(..) => {}
            Expression::Memory(ref address, _) => address.walk_identifiers(identifiers),
            Expression::Conditional(ref condition, ref then, ref else_) => {
                condition.walk_identifiers(identifiers);
                then.walk_identifiers(identifiers);
                else_.walk_identifiers(identifiers);
            }
            Expression::Slice(ref base, _, _) => base.walk_identifiers(identifiers),
            Expression::Compose(ref parts) => parts
                .iter()
                .for_each(|part| part.0.walk_identifiers(identifiers)),
            Expression::Operation(_, ref lhs, ref rhs) => {
                lhs.walk_identifiers(identifiers);
                rhs.walk_identifiers(identifiers);
            }
        }
    }

    /// Substitute sub-expressions found in `replacements`.
    ///
    /// Matching is top-down: once a sub-expression is replaced, the
    /// replacement is not searched again.
    pub fn replace(&self, replacements: &BTreeMap<Expression, Expression>) -> Expression {
        if let Some(replacement) = replacements.get(self) {
            return replacement.clone();
        }
        match *self {
            Expression::Identifier(_) | Expression::Integer(_) | Expression::Label(..) => {
                self.clone()
            }
            Expression::Memory(ref address, bits) => {
                Expression::Memory(Box::new(address.replace(replacements)), bits)
            }
            Expression::Conditional(ref condition, ref then, ref else_) => {
                Expression::Conditional(
                    Box::new(condition.replace(replacements)),
                    Box::new(then.replace(replacements)),
                    Box::new(else_.replace(replacements)),
                )
            }
            Expression::Slice(ref base, start, end) => {
                Expression::Slice(Box::new(base.replace(replacements)), start, end)
            }
            Expression::Compose(ref parts) => Expression::Compose(
                parts
                    .iter()
                    .map(|(expression, start, end)| {
                        (expression.replace(replacements), *start, *end)
                    })
                    .collect(),
            ),
            Expression::Operation(operator, ref lhs, ref rhs) => Expression::Operation(
                operator,
                Box::new(lhs.replace(replacements)),
                Box::new(rhs.replace(replacements)),
            ),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Expression::Identifier(ref identifier) => identifier.fmt(f),
            Expression::Integer(ref integer) => integer.fmt(f),
            Expression::Label(label, _) => label.fmt(f),
            Expression::Memory(ref address, bits) => write!(f, "@{}[{}]", bits, address),
            Expression::Conditional(ref condition, ref then, ref else_) => {
                write!(f, "({} ? {} : {})", condition, then, else_)
            }
            Expression::Slice(ref base, start, end) => write!(f, "{}[{}:{}]", base, start, end),
            Expression::Compose(ref parts) => {
                let parts = parts
                    .iter()
                    .map(|(expression, start, end)| format!("{} {} {}", expression, start, end))
                    .collect::<Vec<String>>();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Expression::Operation(operator, ref lhs, ref rhs) => {
                write!(f, "({} {} {})", lhs, operator, rhs)
            }
        }
    }
}
