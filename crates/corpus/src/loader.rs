//! Corpus discovery and per-paper loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use dossier_core::{
    Absence, Category, CategoryPapers, Corpus, Demand, DemandRole, Diagnostic, DiagnosticKind,
    DiagnosticLog, Paper, PaperRef, Position, Slot,
};
use tracing::{debug, info, warn};

use crate::error::CorpusError;
use crate::fragment::{parse_fragment, role_from_filename};

/// A paper folder found during discovery, not yet read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperSource {
    pub category: Category,
    pub folder: String,
    pub path: PathBuf,
    pub position: Position,
}

/// Result of walking the category folders.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Paper folders in traversal order.
    pub sources: Vec<PaperSource>,
    pub diagnostics: DiagnosticLog,
}

/// A loaded paper plus the degradations recorded while loading it.
#[derive(Debug, Clone)]
pub struct LoadedPaper {
    pub paper: Paper,
    pub diagnostics: DiagnosticLog,
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Sorted, non-hidden child directory names of `dir`.
fn child_dirs(dir: &Path) -> Result<Vec<String>, CorpusError> {
    let entries = std::fs::read_dir(dir).map_err(|source| CorpusError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .filter(|n| !is_hidden(n))
        .collect();

    // Sort for deterministic ordering
    names.sort();
    Ok(names)
}

/// Walk `root` and list every paper folder in traversal order.
///
/// Category order is fixed; paper folders within a category are ordered by
/// name. A missing category folder yields an empty category and a
/// `MissingInput` diagnostic. Unknown folders at the root are ignored.
pub fn discover(root: &Path) -> Result<Discovery, CorpusError> {
    if !root.exists() {
        return Err(CorpusError::RootMissing(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(CorpusError::NotADirectory(root.to_path_buf()));
    }

    let mut discovery = Discovery::default();

    for name in child_dirs(root)? {
        if Category::from_folder_name(&name).is_none() {
            warn!(folder = %name, "Ignoring unknown folder at corpus root");
        }
    }

    for category in Category::ALL {
        let dir = root.join(category.folder_name());
        if !dir.is_dir() {
            discovery.diagnostics.record(Diagnostic::new(
                DiagnosticKind::MissingInput,
                format!("category folder '{}' not found", category.folder_name()),
            ));
            continue;
        }

        let folders = child_dirs(&dir)?;
        debug!(category = %category, papers = folders.len(), "Discovered category");

        for (index, folder) in folders.into_iter().enumerate() {
            discovery.sources.push(PaperSource {
                category,
                path: dir.join(&folder),
                folder,
                position: Position {
                    category: category.index(),
                    paper: index,
                },
            });
        }
    }

    if discovery.sources.is_empty() {
        return Err(CorpusError::NoPapers(root.to_path_buf()));
    }

    info!(
        root = %root.display(),
        papers = discovery.sources.len(),
        "Corpus discovered"
    );
    Ok(discovery)
}

/// Pick the most frequent title; ties go to the one seen first.
fn vote_title(candidates: &[String]) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for title in candidates {
        match counts.iter_mut().find(|(t, _)| *t == title.as_str()) {
            Some((_, n)) => *n += 1,
            None => counts.push((title.as_str(), 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (title, n) in counts {
        if best.is_none_or(|(_, m)| n > m) {
            best = Some((title, n));
        }
    }
    best.map(|(t, _)| t.to_string())
}

enum Issue {
    Unreadable { file: String, error: String },
    NoRole { file: String },
    Duplicate { file: String, role: DemandRole },
}

/// Read one paper folder into a [`Paper`].
///
/// Never fails: unreadable or missing fragments become absent slots with a
/// diagnostic, and an unreadable folder yields a paper with eight absent
/// slots.
pub async fn load_paper(source: &PaperSource) -> LoadedPaper {
    let mut issues = Vec::new();
    let mut titles = Vec::new();
    let mut bodies: HashMap<DemandRole, String> = HashMap::new();

    let mut files = match list_fragment_files(&source.path).await {
        Ok(files) => files,
        Err(e) => {
            warn!(folder = %source.path.display(), error = %e, "Failed to read paper folder");
            issues.push(Issue::Unreadable {
                file: source.folder.clone(),
                error: e.to_string(),
            });
            Vec::new()
        }
    };
    files.sort();

    for file in files {
        let path = source.path.join(&file);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                issues.push(Issue::Unreadable {
                    file,
                    error: e.to_string(),
                });
                continue;
            }
        };

        let fragment = parse_fragment(&text);
        if let Some(title) = fragment.title.clone() {
            titles.push(title);
        }

        let Some(role) = fragment.role.or_else(|| role_from_filename(&file)) else {
            issues.push(Issue::NoRole { file });
            continue;
        };

        if bodies.contains_key(&role) {
            issues.push(Issue::Duplicate { file, role });
            continue;
        }
        bodies.insert(role, fragment.body);
    }

    let voted = vote_title(&titles);
    let title_fell_back = voted.is_none();
    let title = voted.unwrap_or_else(|| source.folder.clone());

    let paper_ref = PaperRef {
        category: source.category,
        folder: source.folder.clone(),
        title: title.clone(),
    };
    let mut diagnostics = DiagnosticLog::new();

    if title_fell_back {
        diagnostics.record(
            Diagnostic::new(
                DiagnosticKind::ParseDegraded,
                "no 'Paper:' header found; using folder name as title",
            )
            .for_paper(paper_ref.clone()),
        );
    }

    for issue in issues {
        let diagnostic = match issue {
            Issue::Unreadable { file, error } => Diagnostic::new(
                DiagnosticKind::MissingInput,
                format!("could not read '{file}': {error}"),
            ),
            Issue::NoRole { file } => Diagnostic::new(
                DiagnosticKind::ParseDegraded,
                format!("'{file}' carries no demand number; ignored"),
            ),
            Issue::Duplicate { file, role } => Diagnostic::new(
                DiagnosticKind::ParseDegraded,
                format!("'{file}' repeats demand {role}; first fragment kept"),
            )
            .for_role(role),
        };
        diagnostics.record(diagnostic.for_paper(paper_ref.clone()));
    }

    let slots: [Slot; 8] = std::array::from_fn(|i| {
        let role = DemandRole::ALL[i];
        match bodies.remove(&role) {
            Some(body) if !body.trim().is_empty() => Slot::Present {
                demand: Demand::new(role, body),
            },
            Some(_) => Slot::Absent {
                reason: Absence::EmptyBody,
            },
            None => Slot::Absent {
                reason: Absence::MissingFile,
            },
        }
    });

    for (role, slot) in DemandRole::ALL.iter().zip(slots.iter()) {
        if let Slot::Absent { reason } = slot {
            diagnostics.record(
                Diagnostic::new(DiagnosticKind::MissingInput, reason.to_string())
                    .for_paper(paper_ref.clone())
                    .for_role(*role),
            );
        }
    }

    debug!(paper = %title, folder = %source.folder, "Paper loaded");

    LoadedPaper {
        paper: Paper::new(title, &source.folder, source.category, source.position, slots),
        diagnostics,
    }
}

async fn list_fragment_files(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_text = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
        if !is_text || !path.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str().filter(|n| !is_hidden(n)) {
            files.push(name.to_string());
        }
    }
    Ok(files)
}

/// Group loaded papers into a [`Corpus`], ordered by traversal position.
pub fn assemble(mut papers: Vec<Paper>) -> Corpus {
    papers.sort_by_key(|p| p.position);
    let mut groups: Vec<CategoryPapers> = Vec::new();
    for paper in papers {
        match groups.last_mut() {
            Some(group) if group.category == paper.category => group.papers.push(paper),
            _ => groups.push(CategoryPapers {
                category: paper.category,
                papers: vec![paper],
            }),
        }
    }
    Corpus::new(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_fragment(dir: &Path, n: u8, title: &str, body: &str) {
        let text = format!(
            "Paper: {title}\nDemand {n}: prompt {n}\n{}\n{body}",
            "=".repeat(80)
        );
        std::fs::write(dir.join(format!("demand_{n:02}.txt")), text).unwrap();
    }

    fn write_paper(root: &Path, category: &str, folder: &str, title: &str) -> PathBuf {
        let dir = root.join(category).join(folder);
        std::fs::create_dir_all(&dir).unwrap();
        for n in 1..=8 {
            write_fragment(&dir, n, title, &format!("body {n}"));
        }
        dir
    }

    #[test]
    fn discover_orders_categories_and_papers() {
        let tmp = tempfile::tempdir().unwrap();
        write_paper(tmp.path(), "bandwidth_pricing_2000_2010", "b_paper", "B");
        write_paper(tmp.path(), "internet_pricing_1990_2000", "z_paper", "Z");
        write_paper(tmp.path(), "internet_pricing_1990_2000", "a_paper", "A");
        std::fs::create_dir_all(tmp.path().join("scratch")).unwrap();

        let discovery = discover(tmp.path()).unwrap();
        let folders: Vec<&str> = discovery.sources.iter().map(|s| s.folder.as_str()).collect();
        assert_eq!(folders, ["a_paper", "z_paper", "b_paper"]);
        assert_eq!(discovery.sources[1].position, Position { category: 0, paper: 1 });
        assert_eq!(discovery.sources[2].position, Position { category: 3, paper: 0 });

        // Two categories absent
        assert_eq!(discovery.diagnostics.count(DiagnosticKind::MissingInput), 2);
    }

    #[test]
    fn discover_missing_root_is_error() {
        let err = discover(Path::new("/nonexistent/corpus")).unwrap_err();
        assert!(matches!(err, CorpusError::RootMissing(_)));
    }

    #[test]
    fn discover_empty_corpus_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("internet_pricing_1990_2000")).unwrap();
        assert!(matches!(discover(tmp.path()), Err(CorpusError::NoPapers(_))));
    }

    #[tokio::test]
    async fn load_complete_paper() {
        let tmp = tempfile::tempdir().unwrap();
        write_paper(tmp.path(), "internet_pricing_1990_2000", "p", "Pricing the Internet");
        let discovery = discover(tmp.path()).unwrap();

        let loaded = load_paper(&discovery.sources[0]).await;
        assert!(loaded.paper.is_complete());
        assert_eq!(loaded.paper.title, "Pricing the Internet");
        assert_eq!(
            loaded.paper.demand(DemandRole::Findings).unwrap().body(),
            "body 8"
        );
        assert!(loaded.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn missing_fragment_degrades_one_slot() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = write_paper(tmp.path(), "internet_pricing_1990_2000", "p", "T");
        std::fs::remove_file(dir.join("demand_06.txt")).unwrap();
        let discovery = discover(tmp.path()).unwrap();

        let loaded = load_paper(&discovery.sources[0]).await;
        assert_eq!(
            loaded.paper.slot(DemandRole::AiCode),
            &Slot::Absent {
                reason: Absence::MissingFile
            }
        );
        assert_eq!(loaded.diagnostics.len(), 1);
        let d = loaded.diagnostics.iter().next().unwrap();
        assert_eq!(d.kind, DiagnosticKind::MissingInput);
        assert_eq!(d.role, Some(DemandRole::AiCode));
    }

    #[tokio::test]
    async fn empty_body_is_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = write_paper(tmp.path(), "internet_pricing_1990_2000", "p", "T");
        write_fragment(&dir, 3, "T", "   \n  ");
        let discovery = discover(tmp.path()).unwrap();

        let loaded = load_paper(&discovery.sources[0]).await;
        assert_eq!(
            loaded.paper.slot(DemandRole::MonteCarloAlgorithm),
            &Slot::Absent {
                reason: Absence::EmptyBody
            }
        );
    }

    #[tokio::test]
    async fn role_comes_from_header_not_filename() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("internet_pricing_1990_2000").join("p");
        std::fs::create_dir_all(&dir).unwrap();
        // File named like demand 1 but header says demand 5
        std::fs::write(
            dir.join("demand_01.txt"),
            "Paper: T\nDemand 5: ai choice\n=====\nRandom forest",
        )
        .unwrap();
        let discovery = discover(tmp.path()).unwrap();

        let loaded = load_paper(&discovery.sources[0]).await;
        assert_eq!(
            loaded.paper.demand(DemandRole::AiChoice).unwrap().body(),
            "Random forest"
        );
        assert!(loaded.paper.demand(DemandRole::Explanation).is_none());
    }

    #[tokio::test]
    async fn title_majority_vote_and_folder_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = write_paper(tmp.path(), "internet_pricing_1990_2000", "p", "Majority Title");
        write_fragment(&dir, 1, "Odd Title", "x");
        write_fragment(&dir, 2, "Odd Title", "x");
        let discovery = discover(tmp.path()).unwrap();
        let loaded = load_paper(&discovery.sources[0]).await;
        assert_eq!(loaded.paper.title, "Majority Title");

        let bare = tmp.path().join("internet_pricing_1990_2000").join("q_folder");
        std::fs::create_dir_all(&bare).unwrap();
        std::fs::write(bare.join("demand_01.txt"), "no header at all").unwrap();
        let discovery = discover(tmp.path()).unwrap();
        let loaded = load_paper(&discovery.sources[1]).await;
        assert_eq!(loaded.paper.title, "q_folder");
        assert_eq!(loaded.diagnostics.count(DiagnosticKind::ParseDegraded), 1);
        // Role came from filename
        assert!(loaded.paper.demand(DemandRole::Explanation).is_some());
    }

    #[test]
    fn vote_ties_go_to_first_seen() {
        let titles = vec!["B".to_string(), "A".to_string(), "A".to_string(), "B".to_string()];
        assert_eq!(vote_title(&titles).as_deref(), Some("B"));
        assert_eq!(vote_title(&[]), None);
    }

    #[tokio::test]
    async fn assembles_in_category_order() {
        let tmp = tempfile::tempdir().unwrap();
        write_paper(tmp.path(), "internet_pricing_2000_2010", "x", "X");
        write_paper(tmp.path(), "internet_pricing_1990_2000", "y", "Y");
        let discovery = discover(tmp.path()).unwrap();
        let mut papers = Vec::new();
        for source in &discovery.sources {
            papers.push(load_paper(source).await.paper);
        }
        let corpus = assemble(papers);

        let titles: Vec<&str> = corpus.papers().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Y", "X"]);
        assert_eq!(corpus.categories().len(), 4);
    }
}
