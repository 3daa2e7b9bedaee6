//! End-to-end tests for the Dossier compiler.
//!
//! These run the full pipeline over a corpus written to a temp directory,
//! with scripted generation and reference services, and check the
//! serialized output of every format.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use dossier_config::AppConfig;
use dossier_core::{
    Author, LookupError, Message, Provider, ProviderError, ProviderRequest, ProviderResponse,
    ReferenceRecord, ReferenceService, Role,
};
use dossier_document::serializer_for;
use dossier_pipeline::{Pipeline, PipelineSettings, RunFailure};
use tokio_util::sync::CancellationToken;

// ── Scripted services ────────────────────────────────────────────────────

/// Answers each section prompt with a well-formed response; the
/// introduction can be made to fail the paragraph contract.
struct ScriptedProvider {
    intro_paragraphs: usize,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(intro_paragraphs: usize) -> Self {
        Self {
            intro_paragraphs,
            calls: AtomicUsize::new(0),
        }
    }

    fn paragraphs(n: usize, topic: &str) -> String {
        (1..=n)
            .map(|i| format!("{topic} paragraph {i} about network pricing."))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = &request.messages[1].content;
        let content = if prompt.contains("-paragraph introduction") {
            Self::paragraphs(self.intro_paragraphs, "Introduction")
        } else if prompt.contains("-paragraph conclusion") {
            Self::paragraphs(3, "Conclusion")
        } else {
            "## Discussion\n\nPricing the Internet relies on a smart market.\n\n\
             Congestion Pricing for Bandwidth prefers posted prices."
                .to_string()
        };
        Ok(ProviderResponse {
            message: Message {
                role: Role::Assistant,
                content,
            },
            usage: None,
            model: request.model,
        })
    }
}

/// Knows one paper; everything else is not found.
struct OneKnownPaper {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl ReferenceService for OneKnownPaper {
    fn name(&self) -> &str {
        "e2e_refs"
    }

    async fn lookup(&self, title: &str) -> Result<ReferenceRecord, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !title.to_lowercase().contains("pricing the internet") {
            return Err(LookupError::NotFound(title.to_string()));
        }
        Ok(ReferenceRecord {
            title: "Pricing the Internet".into(),
            authors: vec![
                Author::new(Some("Jeffrey"), "MacKie-Mason"),
                Author::new(Some("Hal"), "Varian"),
            ],
            year: Some(1995),
            venue: Some("Public Access to the Internet".into()),
            doi: None,
        })
    }
}

// ── Corpus fixture ───────────────────────────────────────────────────────

fn write_fragment(dir: &Path, n: u8, title: &str, body: &str) {
    let text = format!(
        "Paper: {title}\nDemand {n}: prompt {n}\n{}\n{body}\n",
        "=".repeat(80)
    );
    std::fs::write(dir.join(format!("demand_{n:02}.txt")), text).unwrap();
}

fn write_paper(root: &Path, category: &str, folder: &str, title: &str, skip: &[u8]) {
    let dir = root.join(category).join(folder);
    std::fs::create_dir_all(&dir).unwrap();
    for n in 1..=8u8 {
        if skip.contains(&n) {
            continue;
        }
        let body = match n {
            2 => "Utility: U = v - p * x\n\nE = \\frac{1}{2}mv^2 (2)".to_string(),
            4 => "```python\nimport numpy as np\nrevenue = np.mean(draws)\n```".to_string(),
            6 => "We fit a model:\n\nfrom sklearn.linear_model import LinearRegression\nmodel = LinearRegression()\nmodel.fit(X, y)".to_string(),
            7 => "Kaggle: internet prices".to_string(),
            _ => format!("{title} body {n}."),
        };
        write_fragment(&dir, n, title, &body);
    }
}

fn corpus() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    write_paper(tmp.path(), "internet_pricing_1990_2000", "a_pricing", "Pricing the Internet", &[]);
    write_paper(
        tmp.path(),
        "bandwidth_pricing_1990_2000",
        "congestion",
        "Congestion Pricing for Bandwidth",
        &[6],
    );
    write_paper(tmp.path(), "internet_pricing_2000_2010", "revisited", "pricing the  INTERNET", &[]);
    tmp
}

fn settings(root: &Path) -> PipelineSettings {
    let mut config = AppConfig::default();
    config.pipeline.corpus_root = root.to_path_buf();
    config.pipeline.max_workers = 2;
    config.document.title = "Pricing Models Report".into();
    config.retry.max_attempts = 2;
    let mut settings = PipelineSettings::from_config(&config);
    settings.generation_retry.initial_backoff = Duration::from_millis(5);
    settings.lookup_retry.initial_backoff = Duration::from_millis(5);
    settings
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_markdown_document() {
    let tmp = corpus();
    let references = Arc::new(OneKnownPaper {
        calls: AtomicUsize::new(0),
    });
    let pipeline = Pipeline::new(
        settings(tmp.path()),
        Arc::new(ScriptedProvider::new(5)),
        references.clone(),
        CancellationToken::new(),
    );

    let outcome = pipeline.run().await.unwrap();
    // Two distinct normalized titles, three papers.
    assert_eq!(references.calls.load(Ordering::SeqCst), 2);

    let md = serializer_for("markdown")
        .unwrap()
        .serialize(&outcome.document)
        .unwrap();
    let at = |needle: &str| md.find(needle).unwrap_or_else(|| panic!("missing {needle:?}"));

    assert!(md.starts_with("---\ntitle: \"Pricing Models Report\"\n---"));
    assert!(at("\n# Introduction\n") < at("\n# internet pricing (from 1990 to 2000)\n"));
    assert!(at("\n## Pricing the Internet [1]\n") < at("\n## Congestion Pricing for Bandwidth [2]\n"));
    assert!(at("\n## Congestion Pricing for Bandwidth [2]\n") < at("\n## pricing the  INTERNET [1]\n"));
    assert!(at("\n# Discussion\n") < at("\n# Conclusion\n"));
    assert!(at("\n# Conclusion\n") < at("\n# Bibliography\n"));

    // Headings inside generated text never reach the document.
    assert!(!md.contains("## Discussion"));

    assert!(md.contains("**Utility:**"));
    assert!(md.contains("\\tag{2}"));
    assert!(md.contains("```python\nimport numpy as np\n"));
    assert!(md.contains("*[Content unavailable: fragment file missing.]*"));
    assert!(md.contains("(1995)"));
    assert!(md.contains("[2] Congestion Pricing for Bandwidth (metadata not found)."));

    assert_eq!(outcome.report.tally.papers, 3);
    assert_eq!(outcome.report.tally.absent_slots, 1);
    assert_eq!(outcome.report.citations, 2);
    assert_eq!(outcome.report.unresolved_citations, 1);
    assert_eq!(outcome.report.missing_inputs, 2);
}

#[tokio::test]
async fn e2e_html_and_json_share_structure() {
    let tmp = corpus();
    let pipeline = Pipeline::new(
        settings(tmp.path()),
        Arc::new(ScriptedProvider::new(5)),
        Arc::new(OneKnownPaper {
            calls: AtomicUsize::new(0),
        }),
        CancellationToken::new(),
    );
    let outcome = pipeline.run().await.unwrap();

    let html = serializer_for("html")
        .unwrap()
        .serialize(&outcome.document)
        .unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<math"));
    assert!(html.contains("class=\"listing\""));
    assert!(html.contains("<li id=\"ref-1\" value=\"1\">"));

    let json = serializer_for("json")
        .unwrap()
        .serialize(&outcome.document)
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let sections = value["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 8);
    assert_eq!(sections[1]["children"][0]["children"].as_array().unwrap().len(), 8);
    assert_eq!(sections[7]["content"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn e2e_synthesis_failure_yields_no_document() {
    let tmp = corpus();
    let provider = Arc::new(ScriptedProvider::new(4));
    let pipeline = Pipeline::new(
        settings(tmp.path()),
        provider.clone(),
        Arc::new(OneKnownPaper {
            calls: AtomicUsize::new(0),
        }),
        CancellationToken::new(),
    );

    let failure = pipeline.run().await.unwrap_err();
    assert!(matches!(failure, RunFailure::Synthesis(_)));
    assert!(failure.to_string().contains("Introduction synthesis failed after 2 attempt(s)"));
    // Two introduction attempts plus one each for discussion and conclusion.
    assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn e2e_empty_corpus_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(
        settings(tmp.path()),
        Arc::new(ScriptedProvider::new(5)),
        Arc::new(OneKnownPaper {
            calls: AtomicUsize::new(0),
        }),
        CancellationToken::new(),
    );
    let failure = pipeline.run().await.unwrap_err();
    assert_eq!(failure.kind(), "CorpusFailure");
}
