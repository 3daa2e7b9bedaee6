//! Splitting a demand body into prose and code segments.
//!
//! Fenced blocks win. Outside fences, each line gets a code-likeness score
//! from its indentation, punctuation density and leading keyword; runs of
//! lines over the threshold become one heuristic block.

use std::sync::LazyLock;

use dossier_core::{CodeBlock, CodeOrigin, Segment};
use regex_lite::Regex;
use tracing::debug;

/// Language used when nothing says otherwise.
pub const DEFAULT_LANGUAGE: &str = "python";

/// A line scoring at or above this is code.
const CODE_THRESHOLD: i32 = 3;

/// A heuristic block of one line must score at least this.
const SINGLE_LINE_THRESHOLD: i32 = 5;

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[A-Za-z_][A-Za-z0-9_.\[\], ]*\s*(=|\+=|-=|\*=|/=)\s*[^=\s]")
        .expect("assignment pattern")
});

static CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_.]*\(").expect("call pattern"));

/// Statement keywords that open a Python line.
const LEADING_KEYWORDS: &[&str] = &[
    "def ", "class ", "import ", "from ", "return", "for ", "while ", "if ", "elif ", "else:",
    "try:", "except", "finally:", "with ", "raise ", "yield ", "lambda ", "assert ", "pass",
    "break", "continue", "print(", "async def ", "await ",
];

/// Segments of one body, plus whether a fence was left open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub segments: Vec<Segment>,
    /// A fence opened and never closed; its content ran to the end.
    pub unterminated_fence: bool,
}

impl Extraction {
    pub fn code_blocks(&self) -> impl Iterator<Item = &CodeBlock> {
        self.segments.iter().filter_map(Segment::as_code)
    }
}

struct Fence {
    marker: char,
    len: usize,
    language: String,
    lines: Vec<String>,
}

/// Opening or closing fence: three or more backticks or tildes.
fn fence_marker(line: &str) -> Option<(char, usize, &str)> {
    let trimmed = line.trim_start();
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    (len >= 3).then(|| (marker, len, trimmed[len..].trim()))
}

pub fn extract(body: &str) -> Extraction {
    let mut out = Extraction::default();
    let mut loose: Vec<&str> = Vec::new();
    let mut fence: Option<Fence> = None;

    for line in body.lines() {
        if let Some(open) = fence.as_mut() {
            if let Some((marker, len, rest)) = fence_marker(line)
                && marker == open.marker
                && len >= open.len
                && rest.is_empty()
            {
                if let Some(done) = fence.take() {
                    out.segments.push(Segment::Code {
                        block: CodeBlock {
                            language: done.language,
                            lines: done.lines,
                            origin: CodeOrigin::Fenced,
                        },
                    });
                }
                continue;
            }
            open.lines.push(line.trim_end().to_string());
            continue;
        }

        if let Some((marker, len, info)) = fence_marker(line) {
            split_loose(&loose, &mut out.segments);
            loose.clear();
            fence = Some(Fence {
                marker,
                len,
                language: language_from_info(info),
                lines: Vec::new(),
            });
            continue;
        }

        loose.push(line);
    }

    if let Some(open) = fence {
        out.unterminated_fence = true;
        out.segments.push(Segment::Code {
            block: CodeBlock {
                language: open.language,
                lines: open.lines,
                origin: CodeOrigin::Fenced,
            },
        });
    }
    split_loose(&loose, &mut out.segments);

    debug!(
        segments = out.segments.len(),
        code_blocks = out.code_blocks().count(),
        unterminated = out.unterminated_fence,
        "Extracted code segments"
    );
    out
}

/// Fence info string to a language tag: first word, lowercased.
fn language_from_info(info: &str) -> String {
    let word = info
        .split(|c: char| c.is_whitespace() || c == '{' || c == ',')
        .next()
        .unwrap_or("")
        .trim_start_matches('.')
        .to_lowercase();
    match word.as_str() {
        "" => DEFAULT_LANGUAGE.to_string(),
        "py" | "python3" => "python".to_string(),
        _ => word,
    }
}

/// Score how much a line looks like source code.
pub fn code_score(line: &str) -> i32 {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return 0;
    }
    let mut score = 0;

    if LEADING_KEYWORDS.iter().any(|k| trimmed.starts_with(k)) {
        score += 3;
        if trimmed.ends_with(':') {
            score += 2;
        }
    }
    if trimmed.starts_with('@') && !trimmed.contains(' ') {
        score += 4;
    }
    if line.starts_with("    ") || line.starts_with('\t') {
        score += 2;
    }
    if ASSIGNMENT.is_match(line) {
        score += 2;
    }
    if CALL.is_match(trimmed) {
        score += 1;
    }
    if trimmed.starts_with("# ") || trimmed == "#" {
        score += 1;
    }

    let punct = trimmed
        .chars()
        .filter(|c| "()[]{}=:.,_#'\"+-*/<>".contains(*c))
        .count();
    if punct * 100 / trimmed.chars().count().max(1) >= 15 {
        score += 1;
    }

    let words: Vec<&str> = trimmed.split_whitespace().collect();
    let wordy = words
        .iter()
        .filter(|w| w.chars().all(|c| c.is_alphabetic() || ",.;:!?'".contains(c)))
        .count();
    if words.len() >= 6 && wordy * 10 >= words.len() * 8 {
        score -= 3;
    }
    if trimmed.ends_with('.') && !trimmed.ends_with("...") && words.len() >= 4 {
        score -= 2;
    }
    score
}

/// Group unfenced lines into prose and heuristic code blocks.
fn split_loose(lines: &[&str], segments: &mut Vec<Segment>) {
    if lines.is_empty() {
        return;
    }
    let scores: Vec<i32> = lines.iter().map(|l| code_score(l)).collect();
    let is_code = |i: usize| scores[i] >= CODE_THRESHOLD;

    let mut prose: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if !is_code(i) {
            prose.push(lines[i]);
            i += 1;
            continue;
        }

        // Extend over code lines, blank lines and comments that lead to more code
        let start = i;
        let mut end = i + 1;
        let mut j = i + 1;
        while j < lines.len() {
            let trimmed = lines[j].trim();
            if is_code(j) {
                end = j + 1;
            } else if !(trimmed.is_empty() || trimmed.starts_with('#')) {
                break;
            }
            j += 1;
        }

        let code_lines = (start..end).filter(|k| is_code(*k)).count();
        let strong = scores[start..end].iter().copied().max().unwrap_or(0);
        if code_lines < 2 && strong < SINGLE_LINE_THRESHOLD {
            prose.extend_from_slice(&lines[start..end]);
            i = end;
            continue;
        }

        flush_prose(&mut prose, segments);
        segments.push(Segment::Code {
            block: CodeBlock {
                language: DEFAULT_LANGUAGE.to_string(),
                lines: lines[start..end]
                    .iter()
                    .map(|l| l.trim_end().to_string())
                    .collect(),
                origin: CodeOrigin::Heuristic,
            },
        });
        i = end;
    }
    flush_prose(&mut prose, segments);
}

fn flush_prose(prose: &mut Vec<&str>, segments: &mut Vec<Segment>) {
    let text = prose.join("\n").trim().to_string();
    prose.clear();
    if !text.is_empty() {
        segments.push(Segment::Prose { text });
    }
}
