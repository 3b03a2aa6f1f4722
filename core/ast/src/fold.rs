//! Constant folding.
//!
//! [`Arena::fold`] reduces an expression to a [`Folded`] value without touching the
//! tree. [`Arena::evaluate`] materializes that value as a new detached literal node,
//! and [`Arena::get_folded_value`] memoizes `evaluate` per node.
//!
//! Integer arithmetic is arbitrary precision, checked against the int256/uint256
//! range after every operation. Division and modulo truncate toward zero.
//! Decimals support `+ - * / %` only.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::{
    arena::Arena,
    errors::FoldError,
    nodes::{AstNode, Field, Location, NodeClass, NodeKind, Value},
    number::{Decimal, int_in_range, max_uint256},
};

/// Largest exponent that can still produce an in-range result for `|base| >= 2`.
const MAX_EXPONENT: u32 = 256;
/// Shifting by more than this leaves no in-range non-zero result.
const MAX_SHIFT: usize = 512;

/// The literal value an expression folds to.
#[derive(Clone, PartialEq, Debug)]
pub enum Folded {
    /// A literal kind (`Int`, `Str`, `NameConstant`, ...) with its value.
    Scalar(NodeKind, Value),
    /// A `List` or `Tuple` of folded elements.
    Sequence(NodeKind, Vec<Folded>),
}

impl Folded {
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Folded::Scalar(kind, _) | Folded::Sequence(kind, _) => *kind,
        }
    }

    fn boolean(value: bool) -> Self {
        Folded::Scalar(NodeKind::NameConstant, Value::Bool(value))
    }
}

type FoldResult = Result<Folded, FoldError>;

impl Arena {
    /// Folds the expression at `id` to a literal value.
    ///
    /// # Errors
    ///
    /// - [`FoldError::NotFound`] if `id` does not exist
    /// - [`FoldError::NotConstant`] if the expression depends on a name, a call or
    ///   any other non-literal
    /// - [`FoldError::InvalidConstantOperation`] if the operands are literals but the
    ///   operation is undefined for them (mismatched types, division by zero,
    ///   out-of-range result)
    pub fn fold(&self, id: u32) -> FoldResult {
        let node = self.find_node(id).ok_or(FoldError::NotFound { id })?;
        match node.kind {
            kind if kind.is_a(NodeClass::Constant) => node
                .value("value")
                .cloned()
                .map(|value| Folded::Scalar(kind, value))
                .ok_or_else(|| FoldError::invalid(format!("`{kind}` literal has no value"))),
            NodeKind::List | NodeKind::Tuple => node
                .children_of("elements")
                .iter()
                .map(|element| self.fold(*element))
                .collect::<Result<_, _>>()
                .map(|items| Folded::Sequence(node.kind, items)),
            NodeKind::UnaryOp => self.fold_unary(node),
            NodeKind::BinOp => self.fold_binary(node),
            NodeKind::BoolOp => self.fold_bool_op(node),
            NodeKind::Compare => self.fold_compare(node),
            NodeKind::Subscript => self.fold_subscript(node),
            NodeKind::IfExp => self.fold_if_exp(node),
            kind => Err(FoldError::not_constant(kind, "value is only known at run time")),
        }
    }

    /// Folds `id` into a new detached literal node carrying the span of `id`.
    /// Nodes that already are literal values evaluate to themselves.
    ///
    /// # Errors
    ///
    /// See [`Arena::fold`].
    pub fn evaluate(&mut self, id: u32) -> Result<u32, FoldError> {
        if self.is_literal_value(id) {
            return Ok(id);
        }
        let folded = self.fold(id)?;
        let location = self.find_node(id).and_then(|node| node.location);
        Ok(self.materialize(&folded, location))
    }

    /// Memoized [`Arena::evaluate`]. A cached result is reused only while it is still
    /// detached; once a pass has spliced it into the tree it is recomputed.
    ///
    /// # Errors
    ///
    /// See [`Arena::fold`]. Failures are not cached.
    pub fn get_folded_value(&mut self, id: u32) -> Result<u32, FoldError> {
        if let Some(cached) = self.folded.get(&id).copied() {
            if self.find_node(cached).is_some() && !self.is_attached(cached) {
                tracing::trace!(id, folded = cached, "Fold cache hit");
                return Ok(cached);
            }
            self.folded.remove(&id);
        }
        let folded = self.evaluate(id)?;
        if folded != id {
            self.folded.insert(id, folded);
        }
        Ok(folded)
    }

    /// Returns `true` for literals and for lists or tuples made only of literal values.
    #[must_use]
    pub fn is_literal_value(&self, id: u32) -> bool {
        let Some(node) = self.find_node(id) else {
            return false;
        };
        match node.kind {
            kind if kind.is_a(NodeClass::Constant) => true,
            NodeKind::List | NodeKind::Tuple => node
                .children_of("elements")
                .iter()
                .all(|element| self.is_literal_value(*element)),
            _ => false,
        }
    }

    fn materialize(&mut self, folded: &Folded, location: Option<Location>) -> u32 {
        let id = self.alloc_id();
        let field = match folded {
            Folded::Scalar(_, value) => Field::Value(value.clone()),
            Folded::Sequence(_, items) => Field::List(
                items
                    .iter()
                    .map(|item| self.materialize(item, location))
                    .collect(),
            ),
        };
        self.insert(AstNode::new(id, folded.kind(), location, vec![field]))
    }

    fn operator(&self, node: &AstNode) -> Result<NodeKind, FoldError> {
        node.child("op")
            .and_then(|op| self.find_node(op))
            .map(|op| op.kind)
            .ok_or_else(|| FoldError::invalid(format!("`{}` has no operator", node.kind)))
    }

    fn fold_child(&self, node: &AstNode, field: &str) -> FoldResult {
        let child = node
            .child(field)
            .ok_or_else(|| FoldError::invalid(format!("`{}` has no `{field}`", node.kind)))?;
        self.fold(child)
    }

    fn fold_unary(&self, node: &AstNode) -> FoldResult {
        let op = self.operator(node)?;
        let operand = self.fold_child(node, "operand")?;
        match (op, operand) {
            (NodeKind::Not, Folded::Scalar(NodeKind::NameConstant, Value::Bool(value))) => {
                Ok(Folded::boolean(!value))
            }
            (NodeKind::USub, Folded::Scalar(NodeKind::Int, Value::Int(value))) => {
                int_result(-value)
            }
            (NodeKind::USub, Folded::Scalar(NodeKind::Decimal, Value::Decimal(value))) => {
                decimal_result(value.neg())
            }
            (NodeKind::Invert, Folded::Scalar(NodeKind::Int, Value::Int(value))) => {
                let inverted = if value.is_negative() {
                    -value - 1
                } else {
                    max_uint256() - value
                };
                int_result(inverted)
            }
            (op, operand) => Err(FoldError::invalid(format!(
                "`{op}` is not defined for `{}`",
                operand.kind()
            ))),
        }
    }

    fn fold_binary(&self, node: &AstNode) -> FoldResult {
        let left = self.fold_child(node, "left")?;
        let op = self.operator(node)?;
        let right = self.fold_child(node, "right")?;
        match (left, right) {
            (Folded::Scalar(_, Value::Int(left)), Folded::Scalar(_, Value::Int(right))) => {
                int_binary(op, &left, &right)
            }
            (Folded::Scalar(_, Value::Decimal(left)), Folded::Scalar(_, Value::Decimal(right))) => {
                decimal_binary(op, &left, &right)
            }
            (left, right) if left.kind() != right.kind() => Err(FoldError::invalid(format!(
                "`{op}` between `{}` and `{}`",
                left.kind(),
                right.kind()
            ))),
            (left, _) => Err(FoldError::invalid(format!(
                "`{op}` is not defined for `{}`",
                left.kind()
            ))),
        }
    }

    fn fold_bool_op(&self, node: &AstNode) -> FoldResult {
        let op = self.operator(node)?;
        let operands = node.children_of("values");
        if operands.len() < 2 {
            return Err(FoldError::invalid(format!(
                "`{op}` needs at least two operands, found {}",
                operands.len()
            )));
        }
        let mut values = Vec::with_capacity(operands.len());
        for value in operands {
            match self.fold(*value)? {
                Folded::Scalar(NodeKind::NameConstant, Value::Bool(b)) => values.push(b),
                other => {
                    return Err(FoldError::invalid(format!(
                        "`{op}` operands must be booleans, found `{}`",
                        other.kind()
                    )));
                }
            }
        }
        match op {
            NodeKind::And => Ok(Folded::boolean(values.iter().all(|b| *b))),
            NodeKind::Or => Ok(Folded::boolean(values.iter().any(|b| *b))),
            op => Err(FoldError::invalid(format!("`{op}` is not a boolean operator"))),
        }
    }

    fn fold_compare(&self, node: &AstNode) -> FoldResult {
        let left = self.fold_child(node, "left")?;
        let op = self.operator(node)?;
        let right = self.fold_child(node, "right")?;
        match op {
            NodeKind::In | NodeKind::NotIn => {
                let Folded::Sequence(_, items) = &right else {
                    return Err(FoldError::invalid(format!(
                        "`{op}` needs a list on the right, found `{}`",
                        right.kind()
                    )));
                };
                if matches!(left, Folded::Sequence(..))
                    || items.iter().any(|item| item.kind() != left.kind())
                {
                    return Err(FoldError::invalid(format!(
                        "`{op}` needs a list of `{}` values",
                        left.kind()
                    )));
                }
                let found = items.contains(&left);
                Ok(Folded::boolean(if op == NodeKind::In { found } else { !found }))
            }
            NodeKind::Eq | NodeKind::NotEq => match (&left, &right) {
                (Folded::Scalar(lk, lv), Folded::Scalar(rk, rv)) if lk == rk => {
                    let equal = lv == rv;
                    Ok(Folded::boolean(if op == NodeKind::Eq { equal } else { !equal }))
                }
                _ => Err(FoldError::invalid(format!(
                    "cannot compare `{}` with `{}`",
                    left.kind(),
                    right.kind()
                ))),
            },
            _ => {
                let ordering = match (&left, &right) {
                    (Folded::Scalar(_, Value::Int(l)), Folded::Scalar(_, Value::Int(r))) => {
                        l.cmp(r)
                    }
                    (
                        Folded::Scalar(_, Value::Decimal(l)),
                        Folded::Scalar(_, Value::Decimal(r)),
                    ) => l.cmp(r),
                    _ => {
                        return Err(FoldError::invalid(format!(
                            "`{op}` needs two numbers of the same kind, found `{}` and `{}`",
                            left.kind(),
                            right.kind()
                        )));
                    }
                };
                let result = match op {
                    NodeKind::Lt => ordering == Ordering::Less,
                    NodeKind::LtE => ordering != Ordering::Greater,
                    NodeKind::Gt => ordering == Ordering::Greater,
                    NodeKind::GtE => ordering != Ordering::Less,
                    op => return Err(FoldError::invalid(format!("`{op}` is not a comparison"))),
                };
                Ok(Folded::boolean(result))
            }
        }
    }

    fn fold_subscript(&self, node: &AstNode) -> FoldResult {
        let value = self.fold_child(node, "value")?;
        let index = self.fold_child(node, "slice")?;
        let Folded::Sequence(kind, items) = value else {
            return Err(FoldError::invalid(format!("cannot index into `{}`", value.kind())));
        };
        let Folded::Scalar(NodeKind::Int, Value::Int(index)) = index else {
            return Err(FoldError::invalid(format!(
                "`{kind}` index must be an `Int`, found `{}`",
                index.kind()
            )));
        };
        index
            .to_usize()
            .and_then(|i| items.get(i).cloned())
            .ok_or_else(|| {
                FoldError::invalid(format!(
                    "index {index} is out of range for `{kind}` of length {}",
                    items.len()
                ))
            })
    }

    fn fold_if_exp(&self, node: &AstNode) -> FoldResult {
        match self.fold_child(node, "test")? {
            Folded::Scalar(NodeKind::NameConstant, Value::Bool(true)) => {
                self.fold_child(node, "body")
            }
            Folded::Scalar(NodeKind::NameConstant, Value::Bool(false)) => {
                self.fold_child(node, "orelse")
            }
            other => Err(FoldError::invalid(format!(
                "condition must be a boolean, found `{}`",
                other.kind()
            ))),
        }
    }
}

fn int_result(value: BigInt) -> FoldResult {
    if int_in_range(&value) {
        Ok(Folded::Scalar(NodeKind::Int, Value::Int(value)))
    } else {
        Err(FoldError::invalid(format!("integer {value} is out of bounds")))
    }
}

fn decimal_result(value: Decimal) -> FoldResult {
    if value.is_in_range() {
        Ok(Folded::Scalar(NodeKind::Decimal, Value::Decimal(value)))
    } else {
        Err(FoldError::invalid(format!("decimal {value} is out of bounds")))
    }
}

fn int_binary(op: NodeKind, left: &BigInt, right: &BigInt) -> FoldResult {
    match op {
        NodeKind::Add => int_result(left + right),
        NodeKind::Sub => int_result(left - right),
        NodeKind::Mult => int_result(left * right),
        NodeKind::Div | NodeKind::Mod if right.is_zero() => {
            Err(FoldError::invalid("integer division by zero"))
        }
        NodeKind::Div => int_result(left / right),
        NodeKind::Mod => int_result(left % right),
        NodeKind::Pow => int_pow(left, right),
        NodeKind::BitAnd => int_result(left & right),
        NodeKind::BitOr => int_result(left | right),
        NodeKind::BitXor => int_result(left ^ right),
        NodeKind::LShift | NodeKind::RShift => {
            if right.is_negative() {
                return Err(FoldError::invalid("negative shift count"));
            }
            let shift = right.to_usize().unwrap_or(MAX_SHIFT).min(MAX_SHIFT);
            if op == NodeKind::LShift {
                int_result(left << shift)
            } else {
                int_result(left >> shift)
            }
        }
        op => Err(FoldError::invalid(format!("`{op}` is not defined for `Int`"))),
    }
}

fn int_pow(base: &BigInt, exponent: &BigInt) -> FoldResult {
    if exponent.is_negative() {
        return Err(FoldError::invalid("negative exponent"));
    }
    if base.is_zero() {
        return int_result(if exponent.is_zero() { BigInt::one() } else { BigInt::zero() });
    }
    if base.is_one() {
        return int_result(BigInt::one());
    }
    if *base == -BigInt::one() {
        let odd = (exponent % 2u32).is_one();
        return int_result(if odd { -BigInt::one() } else { BigInt::one() });
    }
    match exponent.to_u32().filter(|e| *e <= MAX_EXPONENT) {
        Some(exponent) => int_result(base.pow(exponent)),
        None => Err(FoldError::invalid(format!("{base} ** {exponent} is out of bounds"))),
    }
}

fn decimal_binary(op: NodeKind, left: &Decimal, right: &Decimal) -> FoldResult {
    let result = match op {
        NodeKind::Add => left.add(right),
        NodeKind::Sub => left.sub(right),
        NodeKind::Mult => left.mul(right),
        NodeKind::Div => left
            .checked_div(right)
            .ok_or_else(|| FoldError::invalid("decimal division by zero"))?,
        NodeKind::Mod => left
            .checked_rem(right)
            .ok_or_else(|| FoldError::invalid("decimal modulo by zero"))?,
        op => return Err(FoldError::invalid(format!("`{op}` is not defined for `Decimal`"))),
    };
    decimal_result(result)
}
