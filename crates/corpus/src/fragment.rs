//! Fragment file parsing.
//!
//! A fragment looks like:
//!
//! ```text
//! Paper: Pricing the Internet
//! Demand 2: Give the mathematical formulas of the model
//! ================================================================
//! <body>
//! ```
//!
//! The role comes from the `Demand N` header. The separator is any line made
//! only of `=` (at least three). Files without a separator keep whatever
//! header lines lead the file and treat the rest as body.

use std::sync::LazyLock;

use dossier_core::DemandRole;
use regex_lite::Regex;

static DEMAND_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^demand\s+(\d+)\s*[:.\-]?\s*.*$").expect("demand header pattern")
});

static PAPER_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^paper\s*:\s*(.*)$").expect("paper header pattern"));

static FILENAME_ROLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)demand[_\- ]?0*(\d+)").expect("fragment filename pattern"));

/// One parsed fragment file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Title from the `Paper:` header line.
    pub title: Option<String>,
    /// Role from the `Demand N:` header line.
    pub role: Option<DemandRole>,
    /// Body text, trimmed.
    pub body: String,
}

fn is_separator(line: &str) -> bool {
    let line = line.trim();
    line.len() >= 3 && line.chars().all(|c| c == '=')
}

/// Parse the text of a fragment file.
pub fn parse_fragment(text: &str) -> Fragment {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lines: Vec<&str> = text.lines().collect();

    let (header, body_lines) = match lines.iter().position(|l| is_separator(l)) {
        Some(sep) => (&lines[..sep], &lines[sep + 1..]),
        None => {
            let leading = lines
                .iter()
                .take_while(|l| {
                    let l = l.trim();
                    PAPER_HEADER.is_match(l) || DEMAND_HEADER.is_match(l)
                })
                .count();
            (&lines[..leading], &lines[leading..])
        }
    };

    let mut title = None;
    let mut role = None;

    for line in header {
        let line = line.trim();
        if let Some(caps) = PAPER_HEADER.captures(line) {
            let value = caps.get(1).map_or("", |m| m.as_str()).trim();
            if title.is_none() && !value.is_empty() {
                title = Some(value.to_string());
            }
        } else if role.is_none()
            && let Some(caps) = DEMAND_HEADER.captures(line)
        {
            role = caps
                .get(1)
                .and_then(|m| m.as_str().parse::<u8>().ok())
                .and_then(DemandRole::from_number);
        }
    }

    Fragment {
        title,
        role,
        body: body_lines.join("\n").trim().to_string(),
    }
}

/// Role implied by a file name such as `demand_06.txt`.
pub fn role_from_filename(name: &str) -> Option<DemandRole> {
    FILENAME_ROLE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u8>().ok())
        .and_then(DemandRole::from_number)
}
