//! Paragraph splitting and the per-section acceptance checks.
//!
//! Generated text is never partially trusted: a block either satisfies its
//! contract as a whole or the attempt counts as failed.

use dossier_citations::normalize_title;
use dossier_core::NarrativeSection;

/// Split generated text into paragraphs on blank lines.
///
/// Heading lines (`# Introduction`, `**Conclusion**`, a bare section name)
/// are dropped. Lines inside a paragraph are joined with single spaces.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            flush(&mut current, &mut paragraphs);
            continue;
        }
        if is_heading_line(line) {
            flush(&mut current, &mut paragraphs);
            continue;
        }
        current.push(line);
    }
    flush(&mut current, &mut paragraphs);
    paragraphs
}

fn flush(current: &mut Vec<&str>, out: &mut Vec<String>) {
    if !current.is_empty() {
        out.push(current.join(" "));
        current.clear();
    }
}

fn is_heading_line(line: &str) -> bool {
    if line.starts_with('#') {
        return true;
    }
    let bare = line
        .trim_matches(|c| c == '*' || c == '_')
        .trim_end_matches(':')
        .trim();
    let emphasized = line.len() > bare.len() && line.starts_with(['*', '_']);
    let section_name = NarrativeSection::ALL
        .iter()
        .any(|s| s.heading().eq_ignore_ascii_case(bare));
    section_name || (emphasized && bare.split_whitespace().count() <= 8 && !bare.ends_with('.'))
}

/// Check a section's paragraphs. `titles` are the corpus paper titles.
pub fn check_section(
    section: NarrativeSection,
    paragraphs: &[String],
    titles: &[String],
) -> Result<(), String> {
    if paragraphs.is_empty() {
        return Err("no paragraphs returned".into());
    }

    if let Some(required) = section.required_paragraphs()
        && paragraphs.len() != required
    {
        return Err(format!(
            "expected exactly {required} paragraphs, got {}",
            paragraphs.len()
        ));
    }

    if section == NarrativeSection::Discussion {
        let mut distinct: Vec<String> = titles.iter().map(|t| normalize_title(t)).collect();
        distinct.sort();
        distinct.dedup();
        distinct.retain(|t| !t.is_empty());
        let needed = distinct.len().min(2);
        let mentioned = mentioned_titles(paragraphs, titles);
        if mentioned < needed {
            return Err(format!(
                "discussion must compare at least {needed} papers by title, mentions {mentioned}"
            ));
        }
    }

    Ok(())
}

/// Number of distinct titles that appear in the text, compared on
/// normalized form.
fn mentioned_titles(paragraphs: &[String], titles: &[String]) -> usize {
    let haystack = format!(" {} ", normalize_title(&paragraphs.join(" ")));
    let mut seen: Vec<String> = Vec::new();
    for title in titles {
        let needle = normalize_title(title);
        if needle.is_empty() || seen.contains(&needle) {
            continue;
        }
        if haystack.contains(&format!(" {needle} ")) {
            seen.push(needle);
        }
    }
    seen.len()
}
