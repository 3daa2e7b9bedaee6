//! Equation trees produced by the formula parser.
//!
//! Every node owns its children outright; there is no sharing between
//! subtrees and no back-pointers.

use serde::{Deserialize, Serialize};

/// A named variable or an opaque verbatim span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Source spelling without a leading backslash (`alpha`, `p_i`, `E`).
    pub name: String,
    /// Normalized glyph for Greek letters and similar named constants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glyph: Option<char>,
    /// Raw text that could not be parsed. Rendered verbatim.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub opaque: bool,
}

impl Symbol {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            glyph: None,
            opaque: false,
        }
    }

    pub fn greek(name: impl Into<String>, glyph: char) -> Self {
        Self {
            name: name.into(),
            glyph: Some(glyph),
            opaque: false,
        }
    }

    pub fn opaque(raw: impl Into<String>) -> Self {
        Self {
            name: raw.into(),
            glyph: None,
            opaque: true,
        }
    }

    /// Glyph if present, name otherwise.
    pub fn display(&self) -> String {
        match self.glyph {
            Some(g) => g.to_string(),
            None => self.name.clone(),
        }
    }
}

/// Binary operators, arithmetic and relational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Approx,
    Propto,
    Equiv,
    Implies,
}

impl BinOp {
    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Add | BinOp::Sub => 2,
            BinOp::Mul | BinOp::Div => 3,
            _ => 1,
        }
    }

    pub fn is_relation(self) -> bool {
        self.precedence() == 1
    }

    /// Plain-text spelling used by the linearizer.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "=",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::LtEq => "<=",
            BinOp::GtEq => ">=",
            BinOp::Approx => "~=",
            BinOp::Propto => "\\propto",
            BinOp::Equiv => "\\equiv",
            BinOp::Implies => "=>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BigOpKind {
    Sum,
    Integral,
    Product,
}

/// Bracket style of a [`EquationNode::Group`]. `None` is an invisible
/// grouping such as a comma list or a degraded prefix/remainder pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    Paren,
    Bracket,
    Brace,
    None,
}

impl Delimiter {
    pub fn open(self) -> &'static str {
        match self {
            Delimiter::Paren => "(",
            Delimiter::Bracket => "[",
            Delimiter::Brace => "{",
            Delimiter::None => "",
        }
    }

    pub fn close(self) -> &'static str {
        match self {
            Delimiter::Paren => ")",
            Delimiter::Bracket => "]",
            Delimiter::Brace => "}",
            Delimiter::None => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum EquationNode {
    /// Numeric literal, kept as written (`0.5`, `10`).
    Number { value: String },
    Symbol { symbol: Symbol },
    BinaryOp {
        op: BinOp,
        left: Box<EquationNode>,
        right: Box<EquationNode>,
    },
    /// Unary minus.
    Neg { operand: Box<EquationNode> },
    Fraction {
        numerator: Box<EquationNode>,
        denominator: Box<EquationNode>,
    },
    Power {
        base: Box<EquationNode>,
        exponent: Box<EquationNode>,
    },
    Subscript {
        base: Box<EquationNode>,
        index: Box<EquationNode>,
    },
    Function {
        name: String,
        args: Vec<EquationNode>,
    },
    BigOperator {
        kind: BigOpKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lower: Option<Box<EquationNode>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        upper: Option<Box<EquationNode>>,
        body: Box<EquationNode>,
    },
    Group {
        delimiter: Delimiter,
        children: Vec<EquationNode>,
    },
}

impl EquationNode {
    pub fn number(value: impl Into<String>) -> Self {
        Self::Number {
            value: value.into(),
        }
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Self::Symbol {
            symbol: Symbol::named(name),
        }
    }

    pub fn opaque(raw: impl Into<String>) -> Self {
        Self::Symbol {
            symbol: Symbol::opaque(raw),
        }
    }

    pub fn binary(op: BinOp, left: EquationNode, right: EquationNode) -> Self {
        Self::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn neg(operand: EquationNode) -> Self {
        Self::Neg {
            operand: Box::new(operand),
        }
    }

    pub fn fraction(numerator: EquationNode, denominator: EquationNode) -> Self {
        Self::Fraction {
            numerator: Box::new(numerator),
            denominator: Box::new(denominator),
        }
    }

    pub fn power(base: EquationNode, exponent: EquationNode) -> Self {
        Self::Power {
            base: Box::new(base),
            exponent: Box::new(exponent),
        }
    }

    pub fn subscript(base: EquationNode, index: EquationNode) -> Self {
        Self::Subscript {
            base: Box::new(base),
            index: Box::new(index),
        }
    }

    pub fn function(name: impl Into<String>, args: Vec<EquationNode>) -> Self {
        Self::Function {
            name: name.into(),
            args,
        }
    }

    pub fn group(delimiter: Delimiter, children: Vec<EquationNode>) -> Self {
        Self::Group {
            delimiter,
            children,
        }
    }

    /// True when this node, or any descendant, is an opaque symbol.
    pub fn contains_opaque(&self) -> bool {
        match self {
            Self::Number { .. } => false,
            Self::Symbol { symbol } => symbol.opaque,
            Self::BinaryOp { left, right, .. } => left.contains_opaque() || right.contains_opaque(),
            Self::Neg { operand } => operand.contains_opaque(),
            Self::Fraction {
                numerator,
                denominator,
            } => numerator.contains_opaque() || denominator.contains_opaque(),
            Self::Power { base, exponent } => base.contains_opaque() || exponent.contains_opaque(),
            Self::Subscript { base, index } => base.contains_opaque() || index.contains_opaque(),
            Self::Function { args, .. } => args.iter().any(Self::contains_opaque),
            Self::BigOperator {
                lower, upper, body, ..
            } => {
                lower.as_deref().is_some_and(Self::contains_opaque)
                    || upper.as_deref().is_some_and(Self::contains_opaque)
                    || body.contains_opaque()
            }
            Self::Group { children, .. } => children.iter().any(Self::contains_opaque),
        }
    }
}

/// Why a statement did not parse cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Fallback {
    /// No operator at all; the line is kept verbatim.
    NoOperator,
    /// A delimiter never closed (or closed without opening); the tail from
    /// that point on is kept verbatim.
    UnbalancedDelimiters { remainder: String },
    /// Any other parse failure; the whole statement is kept verbatim.
    Unparseable { detail: String },
}

impl std::fmt::Display for Fallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fallback::NoOperator => f.write_str("no recognizable operator"),
            Fallback::UnbalancedDelimiters { remainder } => {
                write!(f, "unbalanced delimiters near '{remainder}'")
            }
            Fallback::Unparseable { detail } => write!(f, "unparseable: {detail}"),
        }
    }
}

/// One parsed statement of a formula fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equation {
    /// The statement text as it appeared, after joining continuation lines.
    pub source: String,
    /// Equation number marker, e.g. `3` from "(3)".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    /// Leading label such as "Utility".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Trailing qualifier such as "where p is the unit price".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    pub root: EquationNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Fallback>,
}

impl Equation {
    pub fn is_degraded(&self) -> bool {
        self.fallback.is_some()
    }
}
