//! Simplifies expressions of the IL
//!
//! Simplification is bottom-up and purely local. It folds operations over
//! integers, removes slices which cover their whole base, resolves
//! conditionals with a known condition, and merges adjacent parts of a
//! `Compose` which come from the same place. A compose which only restates
//! its destination, such as `{r0[0:8] 0 8, r0[8:32] 8 32}`, becomes `r0`.

use crate::il::*;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

/// Fold `lhs operator rhs` over integers of the same width.
fn fold(operator: Operator, lhs: &Integer, rhs: &Integer) -> Integer {
    let bits = lhs.bits();
    let (l, r) = (lhs.value(), rhs.value());
    let value = match operator {
        Operator::Add => l + r,
        Operator::Sub => (BigUint::from(1u8) << bits) + l - r,
        Operator::Mul => l * r,
        Operator::And => l & r,
        Operator::Or => l | r,
        Operator::Xor => l ^ r,
        Operator::Shl | Operator::Shr => match r.to_usize() {
            Some(shift) if shift < bits => {
                if operator == Operator::Shl {
                    l << shift
                } else {
                    l >> shift
                }
            }
            _ => BigUint::zero(),
        },
    };
    Integer::from_biguint(value, bits)
}

fn is_zero(expression: &Expression) -> bool {
    match *expression {
        Expression::Integer(ref integer) => integer.is_zero(),
        _ => false,
    }
}

fn simplify_operation(operator: Operator, lhs: Expression, rhs: Expression) -> Expression {
    if let (Expression::Integer(l), Expression::Integer(r)) = (&lhs, &rhs) {
        return Expression::Integer(fold(operator, l, r));
    }
    match operator {
        Operator::Add | Operator::Or | Operator::Xor if is_zero(&lhs) => rhs,
        Operator::Add | Operator::Sub | Operator::Or | Operator::Xor | Operator::Shl | Operator::Shr
            if is_zero(&rhs) =>
        {
            lhs
        }
        Operator::And | Operator::Mul if is_zero(&lhs) => lhs,
        Operator::And | Operator::Mul if is_zero(&rhs) => rhs,
        _ => Expression::Operation(operator, Box::new(lhs), Box::new(rhs)),
    }
}

fn simplify_slice(base: Expression, start: usize, end: usize) -> Expression {
    if start == 0 && end == base.bits() {
        return base;
    }
    match base {
        Expression::Integer(integer) => Expression::Integer(integer.slice(start, end)),
        Expression::Slice(inner, inner_start, _) => {
            simplify_slice(*inner, inner_start + start, inner_start + end)
        }
        Expression::Compose(parts) => {
            let covering = parts
                .iter()
                .position(|(_, part_start, part_end)| *part_start <= start && end <= *part_end);
            match covering {
                Some(index) => {
                    let (expression, part_start, _) = parts[index].clone();
                    simplify_slice(expression, start - part_start, end - part_start)
                }
                None => Expression::Slice(Box::new(Expression::Compose(parts)), start, end),
            }
        }
        base => Expression::Slice(Box::new(base), start, end),
    }
}

/// Join two adjacent compose parts into one, if they come from the same
/// place.
fn join(low: &ComposePart, high: &ComposePart) -> Option<Expression> {
    match (&low.0, &high.0) {
        (Expression::Slice(low_base, low_start, low_end), Expression::Slice(high_base, high_start, high_end))
            if low_base == high_base && low_end == high_start =>
        {
            Some(simplify_slice(
                (**low_base).clone(),
                *low_start,
                *high_end,
            ))
        }
        (Expression::Integer(low_value), Expression::Integer(high_value)) => {
            let width = low.2 - low.1;
            let value = (high_value.value() << width) | low_value.value();
            Some(Expression::Integer(Integer::from_biguint(
                value,
                high.2 - low.1,
            )))
        }
        _ => None,
    }
}

fn simplify_compose(parts: Vec<ComposePart>) -> Expression {
    let mut merged: Vec<ComposePart> = Vec::with_capacity(parts.len());
    for (expression, start, end) in parts {
        let part = (simplify_expression(&expression), start, end);
        let joined = merged.last().and_then(|last| join(last, &part));
        match joined {
            Some(expression) => {
                if let Some(last) = merged.last_mut() {
                    *last = (expression, last.1, end);
                }
            }
            None => merged.push(part),
        }
    }

    if merged.len() == 1 && merged[0].1 == 0 {
        if let Some((expression, _, _)) = merged.pop() {
            return expression;
        }
    }
    Expression::Compose(merged)
}

/// Simplify an expression.
pub fn simplify_expression(expression: &Expression) -> Expression {
    match *expression {
        Expression::Identifier(_) | Expression::Integer(_) | Expression::Label(..) => {
            expression.clone()
        }
        Expression::Memory(ref address, bits) => {
            Expression::Memory(Box::new(simplify_expression(address)), bits)
        }
        Expression::Conditional(ref condition, ref then, ref else_) => {
            let condition = simplify_expression(condition);
            let then = simplify_expression(then);
            let else_ = simplify_expression(else_);
            match condition {
                Expression::Integer(ref integer) => {
                    if integer.is_zero() {
                        else_
                    } else {
                        then
                    }
                }
                _ if then == else_ => then,
                condition => Expression::Conditional(
                    Box::new(condition),
                    Box::new(then),
                    Box::new(else_),
                ),
            }
        }
        Expression::Slice(ref base, start, end) => {
            simplify_slice(simplify_expression(base), start, end)
        }
        Expression::Compose(ref parts) => simplify_compose(parts.clone()),
        Expression::Operation(operator, ref lhs, ref rhs) => {
            simplify_operation(operator, simplify_expression(lhs), simplify_expression(rhs))
        }
    }
}

/// Simplify both sides of an assignment.
pub fn simplify_assignment(assignment: &Assignment) -> Assignment {
    Assignment::new(
        simplify_expression(assignment.dst()),
        simplify_expression(assignment.src()),
    )
}
