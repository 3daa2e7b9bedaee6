//! LaTeX rendering for Markdown output.

use dossier_core::{BigOpKind, BinOp, Delimiter, EquationNode, Symbol};

use crate::linearize::{is_script_base, needs_parens};
use crate::symbols;

/// Functions LaTeX typesets with a built-in operator command.
const LATEX_OPERATORS: &[&str] = &[
    "sin", "cos", "tan", "sinh", "cosh", "tanh", "arcsin", "arccos", "arctan", "exp", "ln", "log",
    "max", "min", "sup", "inf", "lim", "det", "Pr",
];

pub fn to_latex(node: &EquationNode) -> String {
    let mut out = String::new();
    render(node, &mut out);
    out
}

fn render(node: &EquationNode, out: &mut String) {
    match node {
        EquationNode::Number { value } => out.push_str(value),
        EquationNode::Symbol { symbol } => render_symbol(symbol, out),
        EquationNode::BinaryOp { op, left, right } => {
            render_operand(left, needs_parens(*op, left, false), out);
            match op {
                BinOp::Mul if starts_with_number(right) => out.push_str(" \\cdot "),
                BinOp::Mul => out.push(' '),
                other => {
                    out.push(' ');
                    out.push_str(relation_command(*other));
                    out.push(' ');
                }
            }
            render_operand(right, needs_parens(*op, right, true), out);
        }
        EquationNode::Neg { operand } => {
            out.push('-');
            let wrap = matches!(**operand, EquationNode::BinaryOp { .. });
            render_operand(operand, wrap, out);
        }
        EquationNode::Fraction {
            numerator,
            denominator,
        } => {
            out.push_str("\\frac{");
            render(numerator, out);
            out.push_str("}{");
            render(denominator, out);
            out.push('}');
        }
        EquationNode::Power { base, exponent } => {
            render_base(base, out);
            out.push_str("^{");
            render(exponent, out);
            out.push('}');
        }
        EquationNode::Subscript { base, index } => {
            render_base(base, out);
            out.push_str("_{");
            render(index, out);
            out.push('}');
        }
        EquationNode::Function { name, args } => render_function(name, args, out),
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
                render(lower, out);
                out.push('}');
            }
            if let Some(upper) = upper {
                out.push_str("^{");
                render(upper, out);
                out.push('}');
            }
            out.push(' ');
            let wrap = matches!(**body, EquationNode::BinaryOp { op, .. } if op != BinOp::Mul);
            render_operand(body, wrap, out);
        }
        EquationNode::Group {
            delimiter,
            children,
        } => {
            let (open, close) = match delimiter {
                Delimiter::Paren => ("\\left(", "\\right)"),
                Delimiter::Bracket => ("\\left[", "\\right]"),
                Delimiter::Brace => ("\\left\\{", "\\right\\}"),
                Delimiter::None => ("", ""),
            };
            out.push_str(open);
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    out.push_str(if *delimiter == Delimiter::None {
                        ", \\quad "
                    } else {
                        ", "
                    });
                }
                render(child, out);
            }
            out.push_str(close);
        }
    }
}

fn relation_command(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "\\cdot",
        BinOp::Div => "/",
        BinOp::Eq => "=",
        BinOp::NotEq => "\\neq",
        BinOp::Lt => "<",
        BinOp::Gt => ">",
        BinOp::LtEq => "\\leq",
        BinOp::GtEq => "\\geq",
        BinOp::Approx => "\\approx",
        BinOp::Propto => "\\propto",
        BinOp::Equiv => "\\equiv",
        BinOp::Implies => "\\Rightarrow",
    }
}

fn starts_with_number(node: &EquationNode) -> bool {
    match node {
        EquationNode::Number { .. } => true,
        EquationNode::BinaryOp { left, .. } => starts_with_number(left),
        EquationNode::Power { base, .. } | EquationNode::Subscript { base, .. } => {
            starts_with_number(base)
        }
        _ => false,
    }
}

fn render_operand(node: &EquationNode, wrap: bool, out: &mut String) {
    if wrap {
        out.push_str("\\left(");
        render(node, out);
        out.push_str("\\right)");
    } else {
        render(node, out);
    }
}

fn render_base(base: &EquationNode, out: &mut String) {
    let wrap = !is_script_base(base);
    render_operand(base, wrap, out);
}

fn render_function(name: &str, args: &[EquationNode], out: &mut String) {
    match (name, args) {
        ("sqrt", [arg]) => {
            out.push_str("\\sqrt{");
            render(arg, out);
            out.push('}');
        }
        ("root", [arg, degree]) => {
            out.push_str("\\sqrt[");
            render(degree, out);
            out.push_str("]{");
            render(arg, out);
            out.push('}');
        }
        ("abs", [arg]) => {
            out.push_str("\\left|");
            render(arg, out);
            out.push_str("\\right|");
        }
        (accent, [arg]) if symbols::is_accent(accent) => {
            out.push('\\');
            out.push_str(accent);
            out.push('{');
            render(arg, out);
            out.push('}');
        }
        _ => {
            if LATEX_OPERATORS.contains(&name) {
                out.push('\\');
                out.push_str(name);
            } else if symbols::is_function(name) {
                out.push_str("\\operatorname{");
                out.push_str(name);
                out.push('}');
            } else if name.chars().count() > 1 {
                out.push_str("\\mathrm{");
                out.push_str(&escape_text(name));
                out.push('}');
            } else {
                out.push_str(name);
            }
            out.push_str("\\left(");
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render(arg, out);
            }
            out.push_str("\\right)");
        }
    }
}

fn render_symbol(symbol: &Symbol, out: &mut String) {
    let name = symbol.name.as_str();
    if symbol.opaque {
        out.push_str("\\text{");
        out.push_str(&escape_text(name));
        out.push('}');
    } else if symbols::glyph(name).is_some() {
        out.push('\\');
        out.push_str(name);
    } else if LATEX_OPERATORS.contains(&name) {
        out.push('\\');
        out.push_str(name);
    } else if name.chars().count() == 1 {
        out.push_str(&escape_text(name));
    } else {
        out.push_str("\\mathrm{");
        out.push_str(&escape_text(name));
        out.push('}');
    }
}

/// Escape LaTeX special characters in text mode.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '{' | '}' | '$' | '&' | '#' | '_' | '%' => {
                out.push('\\');
                out.push(c);
            }
            '^' => out.push_str("\\^{}"),
            '~' => out.push_str("\\~{}"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;

    fn latex(src: &str) -> String {
        to_latex(&parse_expression(src).unwrap())
    }

    #[test]
    fn kinetic_energy() {
        assert_eq!(latex(r"E = \frac{1}{2}mv^2"), r"E = \frac{1}{2} m v^{2}");
    }

    #[test]
    fn relations_and_greek() {
        assert_eq!(latex("α <= β"), r"\alpha \leq \beta");
        assert_eq!(latex("x != 2 * y"), r"x \neq 2 y");
        assert_eq!(latex("2 * 3"), r"2 \cdot 3");
    }

    #[test]
    fn functions_and_sums() {
        assert_eq!(latex("ln(x)"), r"\ln\left(x\right)");
        assert_eq!(
            latex(r"\sum_{i=1}^{n} (p_i - c)"),
            r"\sum_{i = 1}^{n} \left(p_{i} - c\right)"
        );
        assert_eq!(latex("price * q"), r"\mathrm{price} q");
    }

    #[test]
    fn opaque_text_is_escaped() {
        assert_eq!(
            to_latex(&EquationNode::opaque("50% & up")),
            r"\text{50\% \& up}"
        );
    }
}
