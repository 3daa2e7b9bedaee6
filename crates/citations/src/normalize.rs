//! Title normalization, the citation dedup key.

/// Words skipped when a title word stands in for an author name.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "on", "of", "in", "for", "and", "to", "with", "from", "by", "at",
];

/// Case-fold, drop punctuation, collapse whitespace.
///
/// `"Pricing the  Internet!"` and `"pricing the internet"` normalize to the
/// same key.
pub fn normalize_title(title: &str) -> String {
    let folded: String = title
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase ASCII letters and digits only, for citation keys.
pub(crate) fn key_fragment(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// First title word that is not a stopword, as a key fragment.
pub(crate) fn significant_word(title: &str) -> String {
    normalize_title(title)
        .split(' ')
        .find(|w| !STOPWORDS.contains(w))
        .map(key_fragment)
        .filter(|w| !w.is_empty())
        .unwrap_or_else(|| "untitled".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_whitespace_and_punctuation_insensitive() {
        assert_eq!(normalize_title("Pricing the Internet"), "pricing the internet");
        assert_eq!(normalize_title("pricing   the internet"), "pricing the internet");
        assert_eq!(normalize_title("  Pricing the Internet. "), "pricing the internet");
        assert_eq!(
            normalize_title("Congestion-Based Pricing: A Survey"),
            "congestion based pricing a survey"
        );
    }

    #[test]
    fn key_fragments() {
        assert_eq!(key_fragment("MacKie-Mason"), "mackiemason");
        assert_eq!(significant_word("The Economics of Bandwidth"), "economics");
        assert_eq!(significant_word("..."), "untitled");
    }
}
