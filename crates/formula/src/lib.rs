//! # Dossier Formula
//!
//! Parses the loosely formatted linear notation found in formula fragments
//! into [`dossier_core::EquationNode`] trees, and turns trees back into
//! text: linear notation, LaTeX and MathML. A small evaluator checks that
//! two trees compute the same value.
//!
//! ```text
//! fragment ──► statements ──► lexer ──► parser ──► Equation
//!                                                    │
//!                      linearize / to_latex / to_mathml / evaluate
//! ```

pub mod evaluate;
pub mod latex;
mod lexer;
pub mod linearize;
pub mod mathml;
pub mod parser;
pub mod statements;
mod symbols;

pub use evaluate::{Env, EvalError, evaluate, sides};
pub use latex::to_latex;
pub use linearize::linearize;
pub use mathml::to_mathml;
pub use parser::{ParseError, parse_expression};
pub use statements::{parse_formulas, parse_statement};
