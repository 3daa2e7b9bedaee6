//! Tokenizer for linear formula notation.
//!
//! Accepts plain text (`U = a*x^2 - p`), LaTeX fragments
//! (`\frac{1}{2} m v^2`) and the common Unicode operators. Lexing never
//! fails: anything unrecognized becomes an [`TokenKind::Other`] token and
//! the parser decides what to do with it.

use dossier_core::BinOp;

use crate::symbols;

/// Byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    Ident,
    /// `\name`; the token text holds `name` without the backslash.
    Command,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Underscore,
    Comma,
    Semicolon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    /// `\{`, a visible brace.
    LBraceLit,
    /// `\}`
    RBraceLit,
    Relation(BinOp),
    Other,
    Eof,
}

impl TokenKind {
    pub fn is_opening(self) -> bool {
        matches!(
            self,
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace | TokenKind::LBraceLit
        )
    }

    pub fn is_closing(self) -> bool {
        matches!(
            self,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace | TokenKind::RBraceLit
        )
    }

    /// The closer matching an opener.
    pub fn closer(self) -> Option<TokenKind> {
        match self {
            TokenKind::LParen => Some(TokenKind::RParen),
            TokenKind::LBracket => Some(TokenKind::RBracket),
            TokenKind::LBrace => Some(TokenKind::RBrace),
            TokenKind::LBraceLit => Some(TokenKind::RBraceLit),
            _ => None,
        }
    }
}

/// A token with its kind, span, and text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
    /// Whitespace separated this token from the previous one.
    pub space_before: bool,
}

fn command_kind(name: &str) -> Option<TokenKind> {
    let kind = match name {
        "cdot" | "times" | "ast" => TokenKind::Star,
        "div" => TokenKind::Slash,
        "le" | "leq" | "leqslant" => TokenKind::Relation(BinOp::LtEq),
        "ge" | "geq" | "geqslant" => TokenKind::Relation(BinOp::GtEq),
        "ne" | "neq" => TokenKind::Relation(BinOp::NotEq),
        "approx" | "simeq" | "sim" | "cong" => TokenKind::Relation(BinOp::Approx),
        "propto" => TokenKind::Relation(BinOp::Propto),
        "equiv" => TokenKind::Relation(BinOp::Equiv),
        "Rightarrow" | "implies" | "Longrightarrow" => TokenKind::Relation(BinOp::Implies),
        "lt" => TokenKind::Relation(BinOp::Lt),
        "gt" => TokenKind::Relation(BinOp::Gt),
        _ => return None,
    };
    Some(kind)
}

fn unicode_kind(c: char) -> Option<(TokenKind, &'static str)> {
    let kind = match c {
        '·' | '×' | '∗' | '⋅' => (TokenKind::Star, "*"),
        '÷' => (TokenKind::Slash, "/"),
        '−' | '–' => (TokenKind::Minus, "-"),
        '≤' | '⩽' => (TokenKind::Relation(BinOp::LtEq), "<="),
        '≥' | '⩾' => (TokenKind::Relation(BinOp::GtEq), ">="),
        '≠' => (TokenKind::Relation(BinOp::NotEq), "!="),
        '≈' | '≃' => (TokenKind::Relation(BinOp::Approx), "~="),
        '∝' => (TokenKind::Relation(BinOp::Propto), "propto"),
        '≡' => (TokenKind::Relation(BinOp::Equiv), "equiv"),
        '⇒' | '⟹' => (TokenKind::Relation(BinOp::Implies), "=>"),
        '∑' => (TokenKind::Command, "sum"),
        '∫' => (TokenKind::Command, "int"),
        '∏' => (TokenKind::Command, "prod"),
        '√' => (TokenKind::Command, "sqrt"),
        '∞' => (TokenKind::Command, "infty"),
        '∂' => (TokenKind::Command, "partial"),
        _ => return None,
    };
    Some(kind)
}

struct Lexer<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    tokens: Vec<Token>,
    space_before: bool,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            pos: 0,
            tokens: Vec::new(),
            space_before: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map_or(self.source.len(), |(i, _)| *i)
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize, text: impl Into<String>) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, end),
            text: text.into(),
            space_before: self.space_before,
        });
        self.space_before = false;
    }

    fn run(mut self) -> Vec<Token> {
        while let Some(c) = self.peek() {
            let start = self.offset();

            if c.is_whitespace() || c == '&' || c == '$' {
                self.pos += 1;
                self.space_before = true;
                continue;
            }

            if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) {
                self.lex_number(start);
                continue;
            }

            if c == '\\' {
                self.lex_command(start);
                continue;
            }

            if let Some(name) = symbols::greek_name(c) {
                self.pos += 1;
                let end = self.offset();
                self.push(TokenKind::Ident, start, end, name);
                continue;
            }

            if c.is_alphabetic() {
                self.lex_ident(start);
                continue;
            }

            if let Some((kind, text)) = unicode_kind(c) {
                self.pos += 1;
                let end = self.offset();
                self.push(kind, start, end, text);
                continue;
            }

            let two: String = [Some(c), self.peek_at(1)].into_iter().flatten().collect();
            let pair = match two.as_str() {
                "<=" => Some(BinOp::LtEq),
                ">=" => Some(BinOp::GtEq),
                "!=" | "/=" => Some(BinOp::NotEq),
                "~=" => Some(BinOp::Approx),
                "=>" => Some(BinOp::Implies),
                "==" => Some(BinOp::Eq),
                _ => None,
            };
            if let Some(op) = pair {
                self.pos += 2;
                let end = self.offset();
                self.push(TokenKind::Relation(op), start, end, two);
                continue;
            }

            let kind = match c {
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' => TokenKind::Star,
                '/' => TokenKind::Slash,
                '^' => TokenKind::Caret,
                '_' => TokenKind::Underscore,
                ',' => TokenKind::Comma,
                ';' => TokenKind::Semicolon,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '[' => TokenKind::LBracket,
                ']' => TokenKind::RBracket,
                '{' => TokenKind::LBrace,
                '}' => TokenKind::RBrace,
                '=' => TokenKind::Relation(BinOp::Eq),
                '<' => TokenKind::Relation(BinOp::Lt),
                '>' => TokenKind::Relation(BinOp::Gt),
                '~' => TokenKind::Relation(BinOp::Approx),
                _ => TokenKind::Other,
            };
            self.pos += 1;
            let end = self.offset();
            self.push(kind, start, end, c.to_string());
        }

        let len = self.source.len();
        self.push(TokenKind::Eof, len, len, "");
        self.tokens
    }

    fn lex_number(&mut self, start: usize) {
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else if c == '.' && !seen_dot && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) {
                seen_dot = true;
                self.pos += 1;
            } else {
                break;
            }
        }
        let end = self.offset();
        let source = self.source;
        self.push(TokenKind::Number, start, end, &source[start..end]);
    }

    fn lex_command(&mut self, start: usize) {
        let source = self.source;
        self.pos += 1;
        let name_start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }

        if self.pos == name_start {
            // Single-character command: spacing, escaped braces, line breaks
            let Some(c) = self.peek() else {
                let end = self.offset();
                self.push(TokenKind::Other, start, end, "\\");
                return;
            };
            self.pos += 1;
            let end = self.offset();
            match c {
                ',' | ';' | ':' | '!' | ' ' | '\\' => self.space_before = true,
                '{' => self.push(TokenKind::LBraceLit, start, end, "\\{"),
                '}' => self.push(TokenKind::RBraceLit, start, end, "\\}"),
                _ => self.push(TokenKind::Other, start, end, &source[start..end]),
            }
            return;
        }

        let end = self.offset();
        let name = &source[start + 1..end];
        if symbols::is_ignored(name) {
            self.space_before = true;
            return;
        }
        match command_kind(name) {
            Some(kind) => self.push(kind, start, end, name),
            None => self.push(TokenKind::Command, start, end, name),
        }
    }

    fn lex_ident(&mut self, start: usize) {
        let word_start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphabetic() && symbols::greek_name(c).is_none())
        {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let end = self.offset();
        let source = self.source;
        let word = &source[start..end];

        // `ab(x)` stays a call; `mv` becomes m·v
        let called = self.peek() == Some('(');
        if called || symbols::is_single_word(word) {
            self.push(TokenKind::Ident, start, end, word);
            return;
        }

        for i in word_start..self.pos {
            let (s, c) = self.chars[i];
            let e = s + c.len_utf8();
            self.push(TokenKind::Ident, s, e, c.to_string());
        }
    }
}

/// Tokenize `source`. The last token is always [`TokenKind::Eof`].
pub fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).into_iter().map(|t| t.kind).collect()
    }

    fn texts(src: &str) -> Vec<String> {
        lex(src)
            .into_iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn lex_plain_expression() {
        assert_eq!(
            kinds("U = a*x^2 - 3.5"),
            vec![
                TokenKind::Ident,
                TokenKind::Relation(BinOp::Eq),
                TokenKind::Ident,
                TokenKind::Star,
                TokenKind::Ident,
                TokenKind::Caret,
                TokenKind::Number,
                TokenKind::Minus,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_latex_commands() {
        let tokens = lex(r"\frac{1}{2} \alpha \cdot \leq");
        assert_eq!(tokens[0].kind, TokenKind::Command);
        assert_eq!(tokens[0].text, "frac");
        assert_eq!(tokens[7].text, "alpha");
        assert_eq!(tokens[8].kind, TokenKind::Star);
        assert_eq!(tokens[9].kind, TokenKind::Relation(BinOp::LtEq));
    }

    #[test]
    fn short_lowercase_runs_split() {
        assert_eq!(texts("mv^2"), ["m", "v", "^", "2"]);
        assert_eq!(texts("price"), ["price"]);
        assert_eq!(texts("ab(x)"), ["ab", "(", "x", ")"]);
        assert_eq!(texts("p1"), ["p1"]);
    }

    #[test]
    fn unicode_operators_and_greek() {
        assert_eq!(
            kinds("α ≤ β × 2"),
            vec![
                TokenKind::Ident,
                TokenKind::Relation(BinOp::LtEq),
                TokenKind::Ident,
                TokenKind::Star,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
        assert_eq!(lex("α")[0].text, "alpha");
        assert_eq!(lex("∑")[0].text, "sum");
    }

    #[test]
    fn sizing_and_spacing_skipped() {
        assert_eq!(texts(r"\left( a \, b \right)"), ["(", "a", "b", ")"]);
    }

    #[test]
    fn two_char_relations() {
        assert_eq!(kinds("a<=b")[1], TokenKind::Relation(BinOp::LtEq));
        assert_eq!(kinds("a != b")[1], TokenKind::Relation(BinOp::NotEq));
        assert_eq!(kinds("a => b")[1], TokenKind::Relation(BinOp::Implies));
    }

    #[test]
    fn space_before_tracked() {
        let tokens = lex("f(x) g (y)");
        assert!(!tokens[1].space_before);
        assert!(tokens[5].space_before);
    }
}
