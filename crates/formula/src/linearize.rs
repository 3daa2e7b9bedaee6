//! Tree back to linear notation.
//!
//! The output parses again to a tree that evaluates identically, and
//! linearizing that tree reproduces the same string. Products are always
//! written with an explicit `*`; parentheses appear only where precedence
//! or associativity requires them.

use dossier_core::{BigOpKind, BinOp, Delimiter, EquationNode, Symbol};

use crate::symbols;

/// Precedence of a node when it appears as an operand. Atoms bind tightest.
pub(crate) fn precedence(node: &EquationNode) -> u8 {
    match node {
        EquationNode::BinaryOp { op, .. } => op.precedence(),
        EquationNode::Neg { .. } | EquationNode::BigOperator { .. } => 4,
        EquationNode::Group {
            delimiter: Delimiter::None,
            children,
        } => match children.as_slice() {
            [only] => precedence(only),
            _ => 0,
        },
        _ => u8::MAX,
    }
}

/// Whether an operand of `parent` must be parenthesized.
pub(crate) fn needs_parens(parent: BinOp, child: &EquationNode, right: bool) -> bool {
    let child_prec = precedence(child);
    let parent_prec = parent.precedence();
    if child_prec < parent_prec {
        return true;
    }
    right
        && child_prec == parent_prec
        && (matches!(parent, BinOp::Sub | BinOp::Div) || parent.is_relation())
}

/// Whether a node can carry `^` or `_` without grouping.
pub(crate) fn is_script_base(node: &EquationNode) -> bool {
    matches!(
        node,
        EquationNode::Number { .. }
            | EquationNode::Symbol { .. }
            | EquationNode::Function { .. }
            | EquationNode::Subscript { .. }
    ) || matches!(
        node,
        EquationNode::Group { delimiter, .. } if *delimiter != Delimiter::None
    )
}

pub fn linearize(node: &EquationNode) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: &EquationNode, out: &mut String) {
    match node {
        EquationNode::Number { value } => out.push_str(value),
        EquationNode::Symbol { symbol } => write_symbol(symbol, out),
        EquationNode::BinaryOp { op, left, right } => {
            write_operand(left, needs_parens(*op, left, false), out);
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            write_operand(right, needs_parens(*op, right, true), out);
        }
        EquationNode::Neg { operand } => {
            out.push('-');
            let wrap = matches!(**operand, EquationNode::BinaryOp { .. })
                || precedence(operand) == 0;
            write_operand(operand, wrap, out);
        }
        EquationNode::Fraction {
            numerator,
            denominator,
        } => {
            out.push_str("\\frac{");
            write_node(numerator, out);
            out.push_str("}{");
            write_node(denominator, out);
            out.push('}');
        }
        EquationNode::Power { base, exponent } => {
            write_base(base, out);
            out.push('^');
            write_script(exponent, out);
        }
        EquationNode::Subscript { base, index } => {
            write_base(base, out);
            out.push('_');
            write_script(index, out);
        }
        EquationNode::Function { name, args } => write_function(name, args, out),
        EquationNode::BigOperator {
            kind,
            lower,
            upper,
            body,
        } => {
            out.push_str(match kind {
                BigOpKind::Sum => "\\sum",
                BigOpKind::Integral => "\\int",
                BigOpKind::Product => "\\prod",
            });
            if let Some(lower) = lower {
                out.push_str("_{");
                write_node(lower, out);
                out.push('}');
            }
            if let Some(upper) = upper {
                out.push_str("^{");
                write_node(upper, out);
                out.push('}');
            }
            out.push(' ');
            if is_bare_body(body) {
                write_node(body, out);
            } else {
                out.push('{');
                write_node(body, out);
                out.push('}');
            }
        }
        EquationNode::Group {
            delimiter,
            children,
        } => {
            let (open, close) = match delimiter {
                Delimiter::Brace => ("\\{", "\\}"),
                other => (other.open(), other.close()),
            };
            out.push_str(open);
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_node(child, out);
            }
            out.push_str(close);
        }
    }
}

fn write_operand(node: &EquationNode, wrap: bool, out: &mut String) {
    if wrap {
        out.push('(');
        write_node(node, out);
        out.push(')');
    } else {
        write_node(node, out);
    }
}

fn write_base(base: &EquationNode, out: &mut String) {
    if is_script_base(base) {
        write_node(base, out);
    } else {
        out.push('{');
        write_node(base, out);
        out.push('}');
    }
}

/// Exponents and indices: one character bare, anything longer braced.
fn write_script(script: &EquationNode, out: &mut String) {
    let mut text = String::new();
    write_node(script, &mut text);
    let bare = match script {
        EquationNode::Number { value } => value.chars().count() == 1,
        EquationNode::Symbol { symbol } => {
            !symbol.opaque && (text.chars().count() == 1 || symbol.glyph.is_some())
        }
        _ => false,
    };
    if bare {
        out.push_str(&text);
    } else {
        out.push('{');
        out.push_str(&text);
        out.push('}');
    }
}

fn is_bare_body(body: &EquationNode) -> bool {
    matches!(
        body,
        EquationNode::Number { .. }
            | EquationNode::Symbol { .. }
            | EquationNode::Function { .. }
            | EquationNode::Fraction { .. }
            | EquationNode::Power { .. }
            | EquationNode::Subscript { .. }
    ) || matches!(
        body,
        EquationNode::Group { delimiter, .. } if *delimiter != Delimiter::None
    )
}

fn write_function(name: &str, args: &[EquationNode], out: &mut String) {
    match (name, args) {
        ("sqrt", [arg]) => {
            out.push_str("\\sqrt{");
            write_node(arg, out);
            out.push('}');
        }
        ("root", [arg, degree]) => {
            out.push_str("\\sqrt[");
            write_node(degree, out);
            out.push_str("]{");
            write_node(arg, out);
            out.push('}');
        }
        (accent, [arg]) if symbols::is_accent(accent) => {
            out.push('\\');
            out.push_str(accent);
            out.push('{');
            write_node(arg, out);
            out.push('}');
        }
        _ => {
            out.push_str(name);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_node(arg, out);
            }
            out.push(')');
        }
    }
}

fn write_symbol(symbol: &Symbol, out: &mut String) {
    let name = symbol.name.as_str();
    if symbol.opaque {
        out.push_str(name);
    } else if symbols::glyph(name).is_some() {
        out.push('\\');
        out.push_str(name);
    } else if is_plain_ident(name) {
        out.push_str(name);
    } else {
        out.push_str("\\text{");
        out.push_str(name);
        out.push('}');
    }
}

/// An identifier that lexes back as exactly one symbol.
fn is_plain_ident(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let letters_then_digits = {
        let rest: Vec<char> = chars.collect();
        let split = rest
            .iter()
            .position(|c| c.is_ascii_digit())
            .unwrap_or(rest.len());
        rest[..split].iter().all(char::is_ascii_alphabetic)
            && rest[split..].iter().all(char::is_ascii_digit)
    };
    first.is_ascii_alphabetic()
        && letters_then_digits
        && symbols::is_single_word(name)
        && !symbols::is_function(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;

    fn roundtrip(src: &str) -> String {
        let tree = parse_expression(src).unwrap();
        linearize(&tree)
    }

    fn assert_fixpoint(src: &str) {
        let once = roundtrip(src);
        let twice = roundtrip(&once);
        assert_eq!(once, twice, "source: {src}");
    }

    #[test]
    fn kinetic_energy_linearizes() {
        assert_eq!(roundtrip(r"E = \frac{1}{2}mv^2"), r"E = \frac{1}{2} * m * v^2");
    }

    #[test]
    fn parentheses_only_where_needed() {
        assert_eq!(roundtrip("a - (b - c)"), "a - (b - c)");
        assert_eq!(roundtrip("(a - b) - c"), "(a - b) - c");
        assert_eq!(roundtrip("a * (b + c)"), "a * (b + c)");
        assert_eq!(roundtrip("-(a + b)"), "-(a + b)");
    }

    #[test]
    fn scripts_brace_long_operands() {
        assert_eq!(roundtrip("x^{10}"), "x^{10}");
        assert_eq!(roundtrip("p_{max}"), r"p_{\text{max}}");
        assert_eq!(roundtrip(r"x^{-\alpha}"), r"x^{-\alpha}");
        assert_eq!(roundtrip(r"e^{\alpha}"), r"e^\alpha");
    }

    #[test]
    fn symbols_spell_back() {
        assert_eq!(roundtrip("α + price"), r"\alpha + price");
        assert_eq!(roundtrip(r"\text{Total cost} = C"), r"\text{Total cost} = C");
    }

    #[test]
    fn linearization_is_a_fixpoint() {
        for src in [
            r"E = \frac{1}{2}mv^2",
            r"W = \sum_{i=1}^{n} (u_i - p_i)",
            r"U(x) = \alpha \ln x - p x",
            r"C = \int_0^{T} c(t) dt",
            r"q = a - b p, p \geq 0",
            r"\sqrt[3]{x^2 + y^2}",
            "x^y^z - -y",
            r"\hat{\beta} = (X'X)",
            r"\max_{p} p q",
            r"\{a, b\}",
        ] {
            if parse_expression(src).is_ok() {
                assert_fixpoint(src);
            }
        }
    }

    #[test]
    fn reparsed_tree_evaluates_identically() {
        use crate::evaluate::{Env, evaluate};

        let environments: Vec<Env> = [
            [1.5, 2.0, 3.0, 0.5, 4.0, 2.5, 2.0, 3.0, 4.0],
            [7.0, 0.25, 1.5, 3.0, 1.2, 0.8, 5.0, 0.5, 3.0],
            [0.3, 4.0, 2.0, 1.1, 2.2, 3.3, 1.0, 9.0, 6.0],
        ]
        .iter()
        .map(|values| {
            ["a", "b", "c", "x", "y", "z", "m", "v", "n"]
                .iter()
                .zip(values)
                .map(|(name, value)| (name.to_string(), *value))
                .collect()
        })
        .collect();

        for src in [
            "a - (b - c)",
            "(a - b) - c",
            "a - b - c",
            "a/b c",
            "a / (b / c)",
            "-x^2",
            "(-x)^2",
            "a^{b^c}",
            "x^y^z",
            r"\frac{a}{b} c",
            r"\frac{1}{2}mv^2",
            r"\sum_{i=1}^{n} i^2",
            r"\sum_{i=1}^{n} (a - i) * b",
            r"\sqrt[3]{x^2 + y^2}",
            "-(a+b)",
            "a^{-b}",
            "(a + b) / (c * x)",
        ] {
            let first = parse_expression(src).unwrap();
            let second = parse_expression(&linearize(&first)).unwrap();
            for env in &environments {
                let expected = evaluate(&first, env).unwrap();
                let actual = evaluate(&second, env).unwrap();
                assert!(
                    (expected - actual).abs() <= 1e-9 * expected.abs().max(1.0),
                    "{src} linearized as {}: {expected} vs {actual}",
                    linearize(&first)
                );
            }
        }
    }
}
