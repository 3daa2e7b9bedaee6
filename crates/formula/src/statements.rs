//! Splitting a formula fragment into statements and parsing each one.
//!
//! A fragment is free text written by a generator: bullet lists, Markdown
//! emphasis, display-math fences, numbered equations and explanatory
//! clauses all appear. Each statement is cleaned, stripped of its number,
//! label and qualifier, then parsed. Failures never propagate: a statement
//! that does not parse is kept verbatim as an opaque symbol with the reason
//! recorded in [`Equation::fallback`].

use std::sync::LazyLock;

use dossier_core::{Delimiter, Equation, EquationNode, Fallback};
use regex_lite::Regex;
use tracing::debug;

use crate::lexer::{Token, TokenKind, lex};
use crate::parser::{parse_expression, parse_tokens};
use crate::symbols;

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\((\d+[a-z]?)\)\s*").expect("leading number pattern")
});

static TRAILING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+\((\d+[a-z]?)\)\.?\s*$").expect("trailing number pattern")
});

static EQUATION_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:eq\.?|equation)\s*\(?(\d+[a-z]?)\)?\s*[:.]\s*")
        .expect("equation prefix pattern")
});

static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9 '\-]{0,60}?)\s*:\s*(.+)$").expect("label pattern")
});

static QUALIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i),?\s+(where|with|for all|for each|for every|subject to|s\.t\.|if)\s+",
    )
    .expect("qualifier pattern")
});

static BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*•+]\s+|\d+[.)]\s+)").expect("bullet pattern")
});

/// Parse every statement in a formula fragment, in order.
pub fn parse_formulas(body: &str) -> Vec<Equation> {
    let mut equations = Vec::new();
    for line in logical_lines(body) {
        for statement in split_top_level(&line, ';') {
            if let Some(equation) = parse_statement(&statement) {
                equations.push(equation);
            }
        }
    }
    debug!(
        statements = equations.len(),
        degraded = equations.iter().filter(|e| e.is_degraded()).count(),
        "Parsed formula fragment"
    );
    equations
}

/// Parse one statement. Returns `None` when nothing but decoration or
/// metadata is left.
pub fn parse_statement(raw: &str) -> Option<Equation> {
    let source = raw.trim().to_string();
    let mut text = source.as_str();

    // "Utility function:" introduces the next statement
    if text.ends_with(':') && !has_operator_text(text) {
        return None;
    }

    let mut number = None;
    if let Some(caps) = EQUATION_PREFIX.captures(text) {
        number = Some(caps[1].to_string());
        text = &text[caps[0].len()..];
    } else if let Some(caps) = LEADING_NUMBER.captures(text) {
        number = Some(caps[1].to_string());
        text = &text[caps[0].len()..];
    }
    if number.is_none()
        && let Some(caps) = TRAILING_NUMBER.captures(text)
    {
        number = Some(caps[1].to_string());
        let cut = caps.get(0).map_or(text.len(), |m| m.start());
        text = &text[..cut];
    }

    let mut label = None;
    if let Some(caps) = LABEL.captures(text) {
        let candidate = caps[1].trim();
        if !candidate.is_empty() && !has_operator_text(candidate) {
            label = Some(candidate.to_string());
            let rest = caps.get(2).map_or("", |m| m.as_str());
            text = rest;
        }
    }

    let mut qualifier = None;
    if let Some(m) = QUALIFIER.find(text)
        && m.start() > 0
    {
        let tail = text[m.start()..]
            .trim_start_matches(',')
            .trim()
            .trim_end_matches(['.', ','])
            .to_string();
        qualifier = Some(tail);
        text = &text[..m.start()];
    }

    let expr = text.trim().trim_end_matches(['.', ',', ':']).trim();
    if expr.is_empty() {
        return None;
    }

    let (root, fallback) = parse_or_degrade(expr);
    Some(Equation {
        source,
        number,
        label,
        qualifier,
        root,
        fallback,
    })
}

fn parse_or_degrade(expr: &str) -> (EquationNode, Option<Fallback>) {
    let tokens = lex(expr);

    if !tokens.iter().any(is_operator) {
        return (EquationNode::opaque(expr), Some(Fallback::NoOperator));
    }

    if reads_as_prose(expr) {
        return (
            EquationNode::opaque(expr),
            Some(Fallback::Unparseable {
                detail: "reads as prose".into(),
            }),
        );
    }

    if let Some(index) = first_unbalanced(&tokens) {
        return degrade_unbalanced(expr, &tokens, index);
    }

    match parse_expression(expr) {
        Ok(root) => (root, None),
        Err(e) => (
            EquationNode::opaque(expr),
            Some(Fallback::Unparseable {
                detail: e.to_string(),
            }),
        ),
    }
}

/// Keep the longest parseable prefix before the first unbalanced delimiter
/// and wrap the rest as one opaque symbol.
fn degrade_unbalanced(
    expr: &str,
    tokens: &[Token],
    index: usize,
) -> (EquationNode, Option<Fallback>) {
    let eof = Token {
        kind: TokenKind::Eof,
        span: Default::default(),
        text: String::new(),
        space_before: false,
    };

    let mut end = index;
    while end > 0 {
        let mut prefix: Vec<Token> = tokens[..end].to_vec();
        let at = tokens[end].span.start;
        prefix.push(Token {
            span: crate::lexer::Span::new(at, at),
            ..eof.clone()
        });
        if let Ok(node) = parse_tokens(expr, prefix) {
            let remainder = expr[tokens[end].span.start..].trim().to_string();
            let root = EquationNode::group(
                Delimiter::None,
                vec![node, EquationNode::opaque(remainder.clone())],
            );
            return (root, Some(Fallback::UnbalancedDelimiters { remainder }));
        }
        end -= 1;
    }

    (
        EquationNode::opaque(expr),
        Some(Fallback::UnbalancedDelimiters {
            remainder: expr.to_string(),
        }),
    )
}

/// Index of the first closer without an opener, or of the first opener that
/// never closes, whichever comes first.
fn first_unbalanced(tokens: &[Token]) -> Option<usize> {
    let mut stack: Vec<(usize, TokenKind)> = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        if token.kind.is_opening() {
            stack.push((i, token.kind));
        } else if token.kind.is_closing() {
            match stack.last() {
                Some((_, open)) if open.closer() == Some(token.kind) => {
                    stack.pop();
                }
                // A mismatched closer breaks the innermost open group
                Some((j, _)) => return Some(*j),
                None => return Some(i),
            }
        }
    }
    stack.first().map(|(i, _)| *i)
}

fn is_operator(token: &Token) -> bool {
    matches!(
        token.kind,
        TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Caret
            | TokenKind::Underscore
            | TokenKind::Relation(_)
            | TokenKind::Command
    )
}

fn has_operator_text(s: &str) -> bool {
    s.chars()
        .any(|c| matches!(c, '=' | '+' | '*' | '/' | '^' | '_' | '<' | '>' | '\\' | '(' | ')'))
}

/// Three or more consecutive plain English words mark a sentence, not a
/// formula.
fn reads_as_prose(expr: &str) -> bool {
    let mut run = 0;
    for word in expr.split_whitespace() {
        let word = word.trim_matches(|c: char| matches!(c, ',' | '.' | ';' | ':' | '"' | '\''));
        let plain = word.chars().count() >= 3
            && word.chars().all(char::is_alphabetic)
            && !symbols::is_function(word)
            && symbols::greek_glyph(word).is_none();
        if plain {
            run += 1;
            if run >= 3 {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

// ── Line handling ─────────────────────────────────────────────────────────

/// Strip Markdown and display-math decoration from one physical line.
/// Returns `None` for lines that carry no content at all.
fn clean_line(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty()
        || trimmed.starts_with("```")
        || trimmed.starts_with("~~~")
        || trimmed == "$$"
        || trimmed == r"\["
        || trimmed == r"\]"
        || trimmed.starts_with(r"\begin{")
        || trimmed.starts_with(r"\end{")
        || trimmed.chars().all(|c| matches!(c, '-' | '=' | '*' | '_'))
    {
        return None;
    }

    let mut text = BULLET.replace(trimmed, "").into_owned();
    text = text.replace("**", "").replace('`', "");
    for marker in [r"\(", r"\)", r"\[", r"\]", "$$"] {
        text = text.replace(marker, " ");
    }
    let text = text.trim().trim_end_matches(r"\\").trim().to_string();
    if text.is_empty() { None } else { Some(text) }
}

/// Join physical lines into logical statements: a line that ends in an
/// operator or leaves a delimiter open continues on the next line. Blank
/// lines always end a statement.
fn logical_lines(body: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut pending = String::new();

    for line in body.lines() {
        if line.trim().is_empty() {
            if !pending.is_empty() {
                out.push(std::mem::take(&mut pending));
            }
            continue;
        }
        let Some(clean) = clean_line(line) else {
            continue;
        };
        if !pending.is_empty() {
            pending.push(' ');
        }
        pending.push_str(&clean);
        if !continues(&pending) {
            out.push(std::mem::take(&mut pending));
        }
    }
    if !pending.is_empty() {
        out.push(pending);
    }
    out
}

fn continues(text: &str) -> bool {
    let trimmed = text.trim_end();
    let dangling = ['+', '-', '*', '/', '=', '^', '_', '(', '[', '{']
        .iter()
        .any(|c| trimmed.ends_with(*c))
        || [r"\cdot", r"\times", r"\leq", r"\geq"]
            .iter()
            .any(|c| trimmed.ends_with(c));
    dangling || depth_at_end(trimmed) > 0
}

fn depth_at_end(text: &str) -> i32 {
    let mut depth = 0i32;
    for c in text.chars() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// Split on `sep` where no bracket is open.
fn split_top_level(text: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ => {}
        }
        if c == sep && depth <= 0 {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_core::BinOp;

    #[test]
    fn one_statement_per_line() {
        let eqs = parse_formulas("R = p * q\nC = c * q\n\nπ = R - C");
        assert_eq!(eqs.len(), 3);
        assert!(eqs.iter().all(|e| !e.is_degraded()));
        assert_eq!(eqs[2].source, "π = R - C");
    }

    #[test]
    fn semicolons_split_statements() {
        let eqs = parse_formulas("a = 1; b = 2");
        assert_eq!(eqs.len(), 2);
    }

    #[test]
    fn markdown_decoration_removed() {
        let body = "**Utility function:**\n\n- $$U = \\alpha \\ln x$$\n\n```\nq = a - b p\n```";
        let eqs = parse_formulas(body);
        assert_eq!(eqs.len(), 2, "{eqs:?}");
        assert!(eqs.iter().all(|e| !e.is_degraded()), "{eqs:?}");
    }

    #[test]
    fn metadata_extracted() {
        let eq = parse_statement("Demand: q = a - b p (3)").unwrap();
        assert_eq!(eq.number.as_deref(), Some("3"));
        assert_eq!(eq.label.as_deref(), Some("Demand"));
        assert!(!eq.is_degraded());

        let eq = parse_statement("R = p q, where p is the price").unwrap();
        assert_eq!(eq.qualifier.as_deref(), Some("where p is the price"));
        assert!(matches!(eq.root, EquationNode::BinaryOp { op: BinOp::Eq, .. }));

        let eq = parse_statement("Equation 2: x = y").unwrap();
        assert_eq!(eq.number.as_deref(), Some("2"));
    }

    #[test]
    fn continuation_lines_join() {
        let eqs = parse_formulas("W = \\sum_{i=1}^{n} (u_i -\n p_i)");
        assert_eq!(eqs.len(), 1);
        assert!(!eqs[0].is_degraded());
    }

    #[test]
    fn no_operator_is_verbatim() {
        let eq = parse_statement("Marginal cost pricing").unwrap();
        assert_eq!(eq.fallback, Some(Fallback::NoOperator));
        assert_eq!(eq.root, EquationNode::opaque("Marginal cost pricing"));
    }

    #[test]
    fn prose_with_operators_is_verbatim() {
        let eq = parse_statement("The price equals marginal cost = p").unwrap();
        assert!(matches!(eq.fallback, Some(Fallback::Unparseable { .. })));
        assert!(eq.root.contains_opaque());
    }

    #[test]
    fn unclosed_paren_keeps_prefix() {
        let eq = parse_statement("y = a + (b * c").unwrap();
        match &eq.fallback {
            Some(Fallback::UnbalancedDelimiters { remainder }) => {
                assert_eq!(remainder, "+ (b * c");
            }
            other => panic!("expected unbalanced fallback, got {other:?}"),
        }
        let EquationNode::Group { children, .. } = &eq.root else {
            panic!("expected group, got {:?}", eq.root);
        };
        assert_eq!(
            children[0],
            EquationNode::binary(BinOp::Eq, EquationNode::symbol("y"), EquationNode::symbol("a"))
        );
        assert_eq!(children[1], EquationNode::opaque("+ (b * c"));
    }

    #[test]
    fn stray_closer_is_unbalanced() {
        let eq = parse_statement("x = y) + 1").unwrap();
        assert!(matches!(
            eq.fallback,
            Some(Fallback::UnbalancedDelimiters { .. })
        ));
    }

    #[test]
    fn decoration_only_fragment_is_empty() {
        assert!(parse_formulas("```\n$$\n\n---\n").is_empty());
    }
}
