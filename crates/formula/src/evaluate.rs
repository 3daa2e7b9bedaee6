//! Numeric evaluation of equation trees.

use std::collections::HashMap;

use dossier_core::{BigOpKind, BinOp, EquationNode};
use thiserror::Error;

use crate::linearize::linearize;

/// Sums and products stop after this many terms.
const MAX_TERMS: i64 = 100_000;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unbound variable: {0}")]
    Unbound(String),

    #[error("relation '{0}' has no numeric value")]
    Relation(String),

    #[error("opaque text cannot be evaluated: {0}")]
    Opaque(String),

    #[error("invalid number literal: {0}")]
    InvalidNumber(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("{name} expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: &'static str,
        got: usize,
    },
}

/// Variable bindings. Subscripted variables are bound under their
/// linearized spelling, e.g. `p_i` or `x_{10}`.
pub type Env = HashMap<String, f64>;

/// Evaluate an arithmetic tree. Relations are rejected; use [`sides`] to
/// evaluate each side of an equation separately.
pub fn evaluate(node: &EquationNode, env: &Env) -> Result<f64, EvalError> {
    match node {
        EquationNode::Number { value } => value
            .parse::<f64>()
            .map_err(|_| EvalError::InvalidNumber(value.clone())),
        EquationNode::Symbol { symbol } => {
            if symbol.opaque {
                return Err(EvalError::Opaque(symbol.name.clone()));
            }
            if let Some(v) = env.get(&symbol.name) {
                return Ok(*v);
            }
            match symbol.name.as_str() {
                "pi" => Ok(std::f64::consts::PI),
                "e" => Ok(std::f64::consts::E),
                "infty" => Ok(f64::INFINITY),
                other => Err(EvalError::Unbound(other.to_string())),
            }
        }
        EquationNode::BinaryOp { op, left, right } => {
            let arithmetic: fn(f64, f64) -> f64 = match op {
                BinOp::Add => |l, r| l + r,
                BinOp::Sub => |l, r| l - r,
                BinOp::Mul => |l, r| l * r,
                BinOp::Div => |l, r| l / r,
                relation => return Err(EvalError::Relation(relation.symbol().to_string())),
            };
            Ok(arithmetic(evaluate(left, env)?, evaluate(right, env)?))
        }
        EquationNode::Neg { operand } => Ok(-evaluate(operand, env)?),
        EquationNode::Fraction {
            numerator,
            denominator,
        } => Ok(evaluate(numerator, env)? / evaluate(denominator, env)?),
        EquationNode::Power { base, exponent } => {
            Ok(evaluate(base, env)?.powf(evaluate(exponent, env)?))
        }
        EquationNode::Subscript { .. } => {
            let key = linearize(node);
            env.get(&key).copied().ok_or(EvalError::Unbound(key))
        }
        EquationNode::Function { name, args } => apply_function(name, args, env),
        EquationNode::BigOperator {
            kind,
            lower,
            upper,
            body,
        } => evaluate_big_operator(*kind, lower.as_deref(), upper.as_deref(), body, env),
        EquationNode::Group { children, .. } => match children.as_slice() {
            [only] => evaluate(only, env),
            _ => Err(EvalError::Unsupported(format!(
                "tuple of {} values",
                children.len()
            ))),
        },
    }
}

/// The two sides of a top-level relation, if the tree is one.
pub fn sides(node: &EquationNode) -> Option<(BinOp, &EquationNode, &EquationNode)> {
    match node {
        EquationNode::BinaryOp { op, left, right } if op.is_relation() => {
            Some((*op, left.as_ref(), right.as_ref()))
        }
        _ => None,
    }
}

fn apply_function(name: &str, args: &[EquationNode], env: &Env) -> Result<f64, EvalError> {
    let values = args
        .iter()
        .map(|a| evaluate(a, env))
        .collect::<Result<Vec<_>, _>>()?;

    let unary = |f: fn(f64) -> f64| match values.as_slice() {
        [x] => Ok(f(*x)),
        _ => Err(EvalError::Arity {
            name: name.to_string(),
            expected: "1",
            got: values.len(),
        }),
    };

    match name {
        "sin" => unary(f64::sin),
        "cos" => unary(f64::cos),
        "tan" => unary(f64::tan),
        "sinh" => unary(f64::sinh),
        "cosh" => unary(f64::cosh),
        "tanh" => unary(f64::tanh),
        "exp" => unary(f64::exp),
        "ln" | "log" => unary(f64::ln),
        "sqrt" => unary(f64::sqrt),
        "abs" => unary(f64::abs),
        "root" => match values.as_slice() {
            [x, n] => Ok(x.powf(1.0 / n)),
            _ => Err(EvalError::Arity {
                name: name.to_string(),
                expected: "2",
                got: values.len(),
            }),
        },
        "max" | "min" if !values.is_empty() => {
            let fold = if name == "max" { f64::max } else { f64::min };
            Ok(values.iter().copied().reduce(fold).unwrap_or(f64::NAN))
        }
        "max" | "min" => Err(EvalError::Arity {
            name: name.to_string(),
            expected: "at least 1",
            got: 0,
        }),
        other => Err(EvalError::Unsupported(format!("function {other}"))),
    }
}

fn evaluate_big_operator(
    kind: BigOpKind,
    lower: Option<&EquationNode>,
    upper: Option<&EquationNode>,
    body: &EquationNode,
    env: &Env,
) -> Result<f64, EvalError> {
    if kind == BigOpKind::Integral {
        return Err(EvalError::Unsupported("integrals".into()));
    }
    let (var, from) = match lower.and_then(sides) {
        Some((BinOp::Eq, EquationNode::Symbol { symbol }, from)) => {
            (symbol.name.clone(), evaluate(from, env)?)
        }
        _ => {
            return Err(EvalError::Unsupported(
                "big operator without an index variable".into(),
            ));
        }
    };
    let Some(upper) = upper else {
        return Err(EvalError::Unsupported("big operator without an upper bound".into()));
    };
    let to = evaluate(upper, env)?;

    if !from.is_finite() || !to.is_finite() {
        return Err(EvalError::Unsupported(format!(
            "non-finite bounds {from} to {to}"
        )));
    }
    let (from, to) = (from.round() as i64, to.round() as i64);
    match to.checked_sub(from) {
        Some(span) if span < MAX_TERMS => {}
        _ => {
            return Err(EvalError::Unsupported(format!(
                "more than {MAX_TERMS} terms"
            )));
        }
    }

    let mut scope = env.clone();
    let mut acc = if kind == BigOpKind::Sum { 0.0 } else { 1.0 };
    for i in from..=to {
        scope.insert(var.clone(), i as f64);
        let term = evaluate(body, &scope)?;
        if kind == BigOpKind::Sum {
            acc += term;
        } else {
            acc *= term;
        }
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;

    fn env(pairs: &[(&str, f64)]) -> Env {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn eval(src: &str, bindings: &[(&str, f64)]) -> f64 {
        evaluate(&parse_expression(src).unwrap(), &env(bindings)).unwrap()
    }

    #[test]
    fn arithmetic_and_precedence() {
        assert_eq!(eval("2 + 3 * 4", &[]), 14.0);
        assert_eq!(eval("(2 + 3) * 4", &[]), 20.0);
        assert_eq!(eval("2^3^2", &[]), 512.0);
        assert_eq!(eval("-x^2", &[("x", 3.0)]), -9.0);
        assert_eq!(eval("a - b - c", &[("a", 10.0), ("b", 3.0), ("c", 2.0)]), 5.0);
    }

    #[test]
    fn kinetic_energy_right_side() {
        let tree = parse_expression(r"E = \frac{1}{2}mv^2").unwrap();
        let (op, _, rhs) = sides(&tree).unwrap();
        assert_eq!(op, BinOp::Eq);
        let value = evaluate(rhs, &env(&[("m", 4.0), ("v", 3.0)])).unwrap();
        assert_eq!(value, 18.0);
    }

    #[test]
    fn functions_and_constants() {
        assert!((eval(r"\ln e", &[]) - 1.0).abs() < 1e-12);
        assert!((eval(r"\sqrt[3]{27}", &[]) - 3.0).abs() < 1e-12);
        assert_eq!(eval("max(1, 5, 3)", &[]), 5.0);
        assert!((eval(r"\sin \pi", &[])).abs() < 1e-12);
    }

    #[test]
    fn sums_and_products() {
        assert_eq!(eval(r"\sum_{i=1}^{4} i", &[]), 10.0);
        assert_eq!(eval(r"\prod_{k=1}^{4} k", &[]), 24.0);
        assert_eq!(eval(r"\sum_{i=1}^{n} 2 i", &[("n", 3.0)]), 12.0);
    }

    #[test]
    fn unbounded_ranges_are_rejected() {
        for src in [r"\sum_{i=-\infty}^{0} i", r"\sum_{i=1}^{\infty} i", r"\prod_{k=-\infty}^{\infty} k"] {
            let tree = parse_expression(src).unwrap();
            assert!(
                matches!(evaluate(&tree, &Env::new()), Err(EvalError::Unsupported(_))),
                "{src}"
            );
        }

        let tree = parse_expression(r"\sum_{i=1}^{n} i").unwrap();
        assert!(matches!(
            evaluate(&tree, &env(&[("n", f64::NAN)])),
            Err(EvalError::Unsupported(_))
        ));
        assert!(matches!(
            evaluate(&tree, &env(&[("n", 1e300)])),
            Err(EvalError::Unsupported(_))
        ));

        let tree = parse_expression(r"\sum_{i=a}^{0} i").unwrap();
        assert!(matches!(
            evaluate(&tree, &env(&[("a", -1e300)])),
            Err(EvalError::Unsupported(_))
        ));
    }

    #[test]
    fn empty_range_is_identity() {
        assert_eq!(eval(r"\sum_{i=5}^{1} i", &[]), 0.0);
        assert_eq!(eval(r"\prod_{i=5}^{1} i", &[]), 1.0);
    }

    #[test]
    fn subscripts_bind_by_spelling() {
        assert_eq!(eval("p_i * q_i", &[("p_i", 2.0), ("q_i", 5.0)]), 10.0);
    }

    #[test]
    fn errors() {
        let tree = parse_expression("a = b").unwrap();
        assert!(matches!(
            evaluate(&tree, &Env::new()),
            Err(EvalError::Relation(_))
        ));
        let tree = parse_expression("x + 1").unwrap();
        assert_eq!(
            evaluate(&tree, &Env::new()),
            Err(EvalError::Unbound("x".into()))
        );
        assert!(matches!(
            evaluate(&EquationNode::opaque("(a"), &Env::new()),
            Err(EvalError::Opaque(_))
        ));
    }
}
