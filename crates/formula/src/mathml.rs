//! Presentation MathML rendering for HTML output.

use dossier_core::{BigOpKind, BinOp, Delimiter, EquationNode};

use crate::linearize::{is_script_base, needs_parens};
use crate::symbols;

const MATH_OPEN: &str = r#"<math xmlns="http://www.w3.org/1998/Math/MathML" display="block">"#;

/// Render a tree as a complete block-level `<math>` element.
pub fn to_mathml(node: &EquationNode) -> String {
    let mut out = String::from(MATH_OPEN);
    out.push_str("<mrow>");
    render(node, &mut out);
    out.push_str("</mrow></math>");
    out
}

fn render(node: &EquationNode, out: &mut String) {
    match node {
        EquationNode::Number { value } => element("mn", value, out),
        EquationNode::Symbol { symbol } => {
            if symbol.opaque {
                element("mtext", &symbol.name, out);
            } else if let Some(glyph) = symbols::glyph(&symbol.name) {
                element("mi", &glyph.to_string(), out);
            } else if symbol.name.chars().count() > 1 {
                out.push_str("<mi mathvariant=\"normal\">");
                out.push_str(&escape(&symbol.name));
                out.push_str("</mi>");
            } else {
                element("mi", &symbol.name, out);
            }
        }
        EquationNode::BinaryOp { op, left, right } => {
            out.push_str("<mrow>");
            render_operand(left, needs_parens(*op, left, false), out);
            element("mo", operator(*op), out);
            render_operand(right, needs_parens(*op, right, true), out);
            out.push_str("</mrow>");
        }
        EquationNode::Neg { operand } => {
            out.push_str("<mrow>");
            element("mo", "\u{2212}", out);
            let wrap = matches!(**operand, EquationNode::BinaryOp { .. });
            render_operand(operand, wrap, out);
            out.push_str("</mrow>");
        }
        EquationNode::Fraction {
            numerator,
            denominator,
        } => {
            out.push_str("<mfrac>");
            render_row(numerator, out);
            render_row(denominator, out);
            out.push_str("</mfrac>");
        }
        EquationNode::Power { base, exponent } => match base.as_ref() {
            EquationNode::Subscript {
                base: inner,
                index,
            } => {
                out.push_str("<msubsup>");
                render_script_base(inner, out);
                render_row(index, out);
                render_row(exponent, out);
                out.push_str("</msubsup>");
            }
            _ => {
                out.push_str("<msup>");
                render_script_base(base, out);
                render_row(exponent, out);
                out.push_str("</msup>");
            }
        },
        EquationNode::Subscript { base, index } => {
            out.push_str("<msub>");
            render_script_base(base, out);
            render_row(index, out);
            out.push_str("</msub>");
        }
        EquationNode::Function { name, args } => render_function(name, args, out),
        EquationNode::BigOperator {
            kind,
            lower,
            upper,
            body,
        } => {
            let glyph = match kind {
                BigOpKind::Sum => "\u{2211}",
                BigOpKind::Integral => "\u{222B}",
                BigOpKind::Product => "\u{220F}",
            };
            out.push_str("<mrow>");
            match (lower, upper) {
                (Some(lower), Some(upper)) => {
                    out.push_str("<munderover>");
                    element("mo", glyph, out);
                    render_row(lower, out);
                    render_row(upper, out);
                    out.push_str("</munderover>");
                }
                (Some(lower), None) => {
                    out.push_str("<munder>");
                    element("mo", glyph, out);
                    render_row(lower, out);
                    out.push_str("</munder>");
                }
                (None, Some(upper)) => {
                    out.push_str("<mover>");
                    element("mo", glyph, out);
                    render_row(upper, out);
                    out.push_str("</mover>");
                }
                (None, None) => element("mo", glyph, out),
            }
            let wrap = matches!(**body, EquationNode::BinaryOp { op, .. } if op != BinOp::Mul);
            render_operand(body, wrap, out);
            out.push_str("</mrow>");
        }
        EquationNode::Group {
            delimiter,
            children,
        } => {
            out.push_str("<mrow>");
            let (open, close) = match delimiter {
                Delimiter::Brace => ("{", "}"),
                other => (other.open(), other.close()),
            };
            if !open.is_empty() {
                element("mo", open, out);
            }
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    element("mo", ",", out);
                }
                render(child, out);
            }
            if !close.is_empty() {
                element("mo", close, out);
            }
            out.push_str("</mrow>");
        }
    }
}

fn operator(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "\u{2212}",
        BinOp::Mul => "\u{22C5}",
        BinOp::Div => "/",
        BinOp::Eq => "=",
        BinOp::NotEq => "\u{2260}",
        BinOp::Lt => "<",
        BinOp::Gt => ">",
        BinOp::LtEq => "\u{2264}",
        BinOp::GtEq => "\u{2265}",
        BinOp::Approx => "\u{2248}",
        BinOp::Propto => "\u{221D}",
        BinOp::Equiv => "\u{2261}",
        BinOp::Implies => "\u{21D2}",
    }
}

fn render_function(name: &str, args: &[EquationNode], out: &mut String) {
    match (name, args) {
        ("sqrt", [arg]) => {
            out.push_str("<msqrt>");
            render(arg, out);
            out.push_str("</msqrt>");
        }
        ("root", [arg, degree]) => {
            out.push_str("<mroot>");
            render_row(arg, out);
            render_row(degree, out);
            out.push_str("</mroot>");
        }
        (accent, [arg]) if symbols::is_accent(accent) => {
            let mark = match accent {
                "hat" | "widehat" => "^",
                "tilde" | "widetilde" => "~",
                "dot" => "\u{02D9}",
                "ddot" => "\u{00A8}",
                "vec" => "\u{2192}",
                "underline" => "_",
                _ => "\u{00AF}",
            };
            let (tag, close) = if accent == "underline" {
                ("<munder accentunder=\"true\">", "</munder>")
            } else {
                ("<mover accent=\"true\">", "</mover>")
            };
            out.push_str(tag);
            render_row(arg, out);
            element("mo", mark, out);
            out.push_str(close);
        }
        _ => {
            out.push_str("<mrow>");
            if name.chars().count() > 1 {
                out.push_str("<mi mathvariant=\"normal\">");
                out.push_str(&escape(name));
                out.push_str("</mi>");
            } else {
                element("mi", name, out);
            }
            out.push_str("<mo>&#x2061;</mo><mrow>");
            element("mo", "(", out);
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    element("mo", ",", out);
                }
                render(arg, out);
            }
            element("mo", ")", out);
            out.push_str("</mrow></mrow>");
        }
    }
}

fn render_operand(node: &EquationNode, wrap: bool, out: &mut String) {
    if wrap {
        out.push_str("<mrow>");
        element("mo", "(", out);
        render(node, out);
        element("mo", ")", out);
        out.push_str("</mrow>");
    } else {
        render(node, out);
    }
}

fn render_script_base(base: &EquationNode, out: &mut String) {
    render_operand(base, !is_script_base(base), out);
}

/// Script and fraction slots take exactly one child element.
fn render_row(node: &EquationNode, out: &mut String) {
    out.push_str("<mrow>");
    render(node, out);
    out.push_str("</mrow>");
}

fn element(tag: &str, text: &str, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(&escape(text));
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Escape text content for XML.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;

    fn mathml(src: &str) -> String {
        to_mathml(&parse_expression(src).unwrap())
    }

    #[test]
    fn wraps_in_math_element() {
        let out = mathml("x");
        assert!(out.starts_with(MATH_OPEN));
        assert!(out.ends_with("</math>"));
    }

    #[test]
    fn fraction_and_power() {
        let out = mathml(r"E = \frac{1}{2}mv^2");
        assert!(out.contains("<mfrac><mrow><mn>1</mn></mrow><mrow><mn>2</mn></mrow></mfrac>"));
        assert!(out.contains("<msup><mi>v</mi><mrow><mn>2</mn></mrow></msup>"));
        assert!(out.contains("<mo>=</mo>"));
    }

    #[test]
    fn subscript_power_collapses() {
        let out = mathml("p_i^2");
        assert!(out.contains("<msubsup><mi>p</mi><mrow><mi>i</mi></mrow><mrow><mn>2</mn></mrow></msubsup>"));
    }

    #[test]
    fn greek_and_relations() {
        let out = mathml("α <= β");
        assert!(out.contains("<mi>α</mi><mo>≤</mo><mi>β</mi>"));
    }

    #[test]
    fn opaque_text_escaped() {
        let out = to_mathml(&EquationNode::opaque("a < b & c"));
        assert!(out.contains("<mtext>a &lt; b &amp; c</mtext>"));
    }

    #[test]
    fn sum_uses_underover() {
        let out = mathml(r"\sum_{i=1}^{n} x_i");
        assert!(out.contains("<munderover><mo>∑</mo>"));
        assert!(out.contains("<msub><mi>x</mi><mrow><mi>i</mi></mrow></msub>"));
    }
}
