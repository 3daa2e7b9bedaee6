//! Name tables: Greek letters, functions, commands.

/// Greek letter names and their glyphs.
const GREEK: &[(&str, char)] = &[
    ("alpha", 'α'),
    ("beta", 'β'),
    ("gamma", 'γ'),
    ("delta", 'δ'),
    ("epsilon", 'ε'),
    ("varepsilon", 'ε'),
    ("zeta", 'ζ'),
    ("eta", 'η'),
    ("theta", 'θ'),
    ("vartheta", 'ϑ'),
    ("iota", 'ι'),
    ("kappa", 'κ'),
    ("lambda", 'λ'),
    ("mu", 'μ'),
    ("nu", 'ν'),
    ("xi", 'ξ'),
    ("pi", 'π'),
    ("rho", 'ρ'),
    ("sigma", 'σ'),
    ("tau", 'τ'),
    ("upsilon", 'υ'),
    ("phi", 'φ'),
    ("varphi", 'φ'),
    ("chi", 'χ'),
    ("psi", 'ψ'),
    ("omega", 'ω'),
    ("Gamma", 'Γ'),
    ("Delta", 'Δ'),
    ("Theta", 'Θ'),
    ("Lambda", 'Λ'),
    ("Xi", 'Ξ'),
    ("Pi", 'Π'),
    ("Sigma", 'Σ'),
    ("Phi", 'Φ'),
    ("Psi", 'Ψ'),
    ("Omega", 'Ω'),
];

/// Named constants that are not Greek letters.
const SPECIAL: &[(&str, char)] = &[
    ("infty", '∞'),
    ("partial", '∂'),
    ("nabla", '∇'),
    ("cdots", '⋯'),
    ("ldots", '…'),
    ("dots", '…'),
    ("ell", 'ℓ'),
];

/// Function names recognized with or without a backslash.
const FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "sinh", "cosh", "tanh", "arcsin", "arccos", "arctan", "exp", "ln", "log",
    "max", "min", "sup", "inf", "lim", "argmax", "argmin", "det", "abs", "sqrt", "Pr", "Var",
    "Cov",
];

/// Commands that take one argument and decorate it.
const ACCENTS: &[&str] = &[
    "hat", "bar", "tilde", "dot", "ddot", "vec", "overline", "underline", "widehat", "widetilde",
];

/// Commands whose brace argument is literal text.
const TEXT_COMMANDS: &[&str] = &[
    "text", "mathrm", "textrm", "mathit", "textit", "mathbf", "textbf", "mathsf", "operatorname",
    "mathbb", "mathcal",
];

/// Commands that only size or space and carry no meaning.
const IGNORED: &[&str] = &[
    "left", "right", "big", "Big", "bigg", "Bigg", "bigl", "bigr", "Bigl", "Bigr", "quad", "qquad",
    "displaystyle", "limits", "nolimits", ",", ";", ":", "!", " ",
];

pub fn greek_glyph(name: &str) -> Option<char> {
    GREEK.iter().find(|(n, _)| *n == name).map(|(_, g)| *g)
}

/// Name for a Unicode Greek glyph, e.g. `α` → `alpha`.
pub fn greek_name(glyph: char) -> Option<&'static str> {
    GREEK.iter().find(|(_, g)| *g == glyph).map(|(n, _)| *n)
}

pub fn special_glyph(name: &str) -> Option<char> {
    SPECIAL.iter().find(|(n, _)| *n == name).map(|(_, g)| *g)
}

/// Glyph for any named symbol (Greek or special).
pub fn glyph(name: &str) -> Option<char> {
    greek_glyph(name).or_else(|| special_glyph(name))
}

pub fn is_function(name: &str) -> bool {
    FUNCTIONS.contains(&name)
}

pub fn is_accent(name: &str) -> bool {
    ACCENTS.contains(&name)
}

pub fn is_text_command(name: &str) -> bool {
    TEXT_COMMANDS.contains(&name)
}

pub fn is_ignored(name: &str) -> bool {
    IGNORED.contains(&name)
}

/// Whether a bare identifier is taken as one word rather than a product of
/// single letters.
///
/// The rule, in order:
/// - one character, a Greek name or a known function: one word;
/// - anything with an uppercase letter, digit or non-ASCII char (`MC`,
///   `Q2`): one word;
/// - two lowercase letters (`mv`, `pq`, `ab`): always a product;
/// - three or four lowercase letters: one word only if it has a vowel
///   (`tax`, `cost` stay whole, `xyz` and `dxdt` split);
/// - five or more: one word.
///
/// So `\frac{1}{2}mv^2` reads as `m·v²`. A two-letter name has to be
/// written as `\text{..}` or carry an uppercase letter.
pub fn is_single_word(ident: &str) -> bool {
    if ident.chars().count() <= 1 || greek_glyph(ident).is_some() || is_function(ident) {
        return true;
    }
    if !ident.chars().all(|c| c.is_ascii_lowercase()) {
        return true;
    }
    let len = ident.len();
    let has_vowel = ident.chars().any(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'));
    match len {
        2 => false,
        3 | 4 => has_vowel,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greek_lookup_both_directions() {
        assert_eq!(greek_glyph("alpha"), Some('α'));
        assert_eq!(greek_glyph("Omega"), Some('Ω'));
        assert_eq!(greek_name('λ'), Some("lambda"));
        assert_eq!(greek_glyph("alp"), None);
    }

    #[test]
    fn word_splitting_rule() {
        assert!(!is_single_word("mv"));
        assert!(!is_single_word("xyz"));
        assert!(!is_single_word("ab"));
        assert!(!is_single_word("dxdt"));
        assert!(is_single_word("cost"));
        assert!(is_single_word("Q2"));
        assert!(is_single_word("price"));
        assert!(is_single_word("tax"));
        assert!(is_single_word("MC"));
        assert!(is_single_word("pi"));
        assert!(is_single_word("ln"));
        assert!(is_single_word("x"));
    }
}
