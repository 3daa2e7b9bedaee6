//! One compiler run: load, process papers and synthesize in parallel,
//! resolve citations, build the IR.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use dossier_citations::CitationResolver;
use dossier_config::AppConfig;
use dossier_core::{
    Corpus, Diagnostic, DiagnosticKind, DiagnosticLog, Paper, Provider, ReferenceService,
    RetryPolicy,
};
use dossier_corpus::{CorpusError, assemble, discover, load_paper};
use dossier_document::{DocumentBuilder, DocumentIr, RenderedPaper, StructuralViolation};
use dossier_narrative::{NarrativeSynthesizer, SynthesisFailure, SynthesisSettings};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::render::render_paper;
use crate::report::{RunReport, Tally};

/// The fatal cause of a failed run.
#[derive(Debug, Error)]
pub enum RunFailure {
    #[error("Corpus could not be loaded: {0}")]
    Corpus(#[from] CorpusError),

    #[error("Narrative synthesis failed: {0}")]
    Synthesis(#[from] SynthesisFailure),

    #[error("Document structure violated: {0}")]
    Structure(#[from] StructuralViolation),

    #[error("Worker task failed: {0}")]
    Worker(String),

    #[error("Run cancelled")]
    Cancelled,
}

impl RunFailure {
    /// Taxonomy name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Corpus(_) => "CorpusFailure",
            Self::Synthesis(_) => "SynthesisFailure",
            Self::Structure(_) => "StructuralViolation",
            Self::Worker(_) => "WorkerFailure",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// A successful run: the document, every degradation, and the summary.
#[derive(Debug)]
pub struct RunOutcome {
    pub document: DocumentIr,
    pub diagnostics: DiagnosticLog,
    pub report: RunReport,
}

/// An offline pass: load and process without any network call.
#[derive(Debug)]
pub struct Inspection {
    pub corpus: Corpus,
    pub papers: Vec<RenderedPaper>,
    pub diagnostics: DiagnosticLog,
    pub tally: Tally,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub corpus_root: PathBuf,
    pub max_workers: usize,
    pub title: String,
    pub synthesis: SynthesisSettings,
    pub generation_retry: RetryPolicy,
    pub lookup_retry: RetryPolicy,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            corpus_root: config.pipeline.corpus_root.clone(),
            max_workers: config.pipeline.max_workers,
            title: config.document.title.clone(),
            synthesis: SynthesisSettings {
                model: config.generation.model.clone(),
                temperature: config.generation.temperature,
                max_tokens: config.generation.max_tokens,
                corpus_char_limit: config.generation.corpus_char_limit,
            },
            generation_retry: config.generation_retry(),
            lookup_retry: config.lookup_retry(),
        }
    }
}

struct ProcessedPaper {
    rendered: RenderedPaper,
    diagnostics: DiagnosticLog,
}

pub struct Pipeline {
    settings: PipelineSettings,
    provider: Arc<dyn Provider>,
    references: Arc<dyn ReferenceService>,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        provider: Arc<dyn Provider>,
        references: Arc<dyn ReferenceService>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            settings,
            provider,
            references,
            cancel,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run the whole compiler. Either a complete document plus diagnostics,
    /// or the fatal cause.
    pub async fn run(&self) -> Result<RunOutcome, RunFailure> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            run_id = %run_id,
            root = %self.settings.corpus_root.display(),
            workers = self.settings.max_workers,
            "Run started"
        );

        let (corpus, mut diagnostics) = load(&self.settings, &self.cancel).await?;

        let resolver = Arc::new(CitationResolver::new(
            self.references.clone(),
            self.settings.lookup_retry.clone(),
            self.cancel.clone(),
        ));
        let synthesizer = NarrativeSynthesizer::new(
            self.provider.clone(),
            self.settings.synthesis.clone(),
            self.settings.generation_retry.clone(),
            self.cancel.clone(),
        );

        let (narrative, processed) = tokio::join!(
            synthesizer.synthesize(&corpus),
            process(&self.settings, &self.cancel, &corpus, Some(resolver.clone())),
        );
        let processed = processed?;
        check_cancelled(&self.cancel)?;
        let narrative = narrative.map_err(|failure| {
            if failure.is_cancelled() {
                RunFailure::Cancelled
            } else {
                RunFailure::Synthesis(failure)
            }
        })?;

        let mut papers = Vec::with_capacity(processed.len());
        for paper in processed {
            diagnostics.merge(paper.diagnostics);
            papers.push(paper.rendered);
        }
        let tally = Tally::of(&papers);

        let bibliography = resolver.finish();
        let document = DocumentBuilder::new(self.settings.title.as_str()).build(
            &narrative,
            papers,
            &bibliography,
        )?;

        let report = RunReport::new(
            run_id,
            started_at,
            tally,
            bibliography.len(),
            bibliography.unresolved_count(),
            &diagnostics,
        );
        info!(
            run_id = %run_id,
            elapsed_ms = report.elapsed_ms(),
            diagnostics = diagnostics.len(),
            "Run finished"
        );

        Ok(RunOutcome {
            document,
            diagnostics,
            report,
        })
    }
}

/// Load and process the corpus with no external calls.
pub async fn inspect(
    settings: &PipelineSettings,
    cancel: &CancellationToken,
) -> Result<Inspection, RunFailure> {
    let (corpus, mut diagnostics) = load(settings, cancel).await?;
    let processed = process(settings, cancel, &corpus, None).await?;
    check_cancelled(cancel)?;

    let mut papers = Vec::with_capacity(processed.len());
    for paper in processed {
        diagnostics.merge(paper.diagnostics);
        papers.push(paper.rendered);
    }
    let tally = Tally::of(&papers);
    Ok(Inspection {
        corpus,
        papers,
        diagnostics,
        tally,
    })
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), RunFailure> {
    if cancel.is_cancelled() {
        warn!("Run cancelled");
        return Err(RunFailure::Cancelled);
    }
    Ok(())
}

/// Discover the corpus and read every paper folder, at most `max_workers`
/// at a time.
async fn load(
    settings: &PipelineSettings,
    cancel: &CancellationToken,
) -> Result<(Corpus, DiagnosticLog), RunFailure> {
    let discovery = discover(&settings.corpus_root)?;
    let mut diagnostics = discovery.diagnostics;
    check_cancelled(cancel)?;

    let semaphore = Arc::new(Semaphore::new(settings.max_workers.max(1)));
    let mut handles = Vec::with_capacity(discovery.sources.len());
    for source in discovery.sources {
        let semaphore = semaphore.clone();
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok()?;
            if cancel.is_cancelled() {
                return None;
            }
            Some(load_paper(&source).await)
        }));
    }

    let mut papers = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(Some(loaded)) => {
                diagnostics.merge(loaded.diagnostics);
                papers.push(loaded.paper);
            }
            Ok(None) => {}
            Err(e) => return Err(RunFailure::Worker(e.to_string())),
        }
    }
    check_cancelled(cancel)?;

    let corpus = assemble(papers);
    info!(
        papers = corpus.paper_count(),
        diagnostics = diagnostics.len(),
        "Corpus loaded"
    );
    Ok((corpus, diagnostics))
}

/// Render every paper and, when a resolver is given, resolve its citation.
/// Results come back in traversal order.
async fn process(
    settings: &PipelineSettings,
    cancel: &CancellationToken,
    corpus: &Corpus,
    resolver: Option<Arc<CitationResolver>>,
) -> Result<Vec<ProcessedPaper>, RunFailure> {
    let semaphore = Arc::new(Semaphore::new(settings.max_workers.max(1)));
    let mut handles = Vec::with_capacity(corpus.paper_count());
    for paper in corpus.papers() {
        let paper = paper.clone();
        let semaphore = semaphore.clone();
        let resolver = resolver.clone();
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok()?;
            if cancel.is_cancelled() {
                return None;
            }
            Some(process_paper(&paper, resolver.as_deref()).await)
        }));
    }

    let mut processed = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(Some(paper)) => processed.push(paper),
            Ok(None) => {}
            Err(e) => return Err(RunFailure::Worker(e.to_string())),
        }
    }
    Ok(processed)
}

async fn process_paper(paper: &Paper, resolver: Option<&CitationResolver>) -> ProcessedPaper {
    let (rendered, mut diagnostics) = render_paper(paper);

    if let Some(resolver) = resolver {
        let resolution = resolver.resolve(&paper.title, paper.position).await;
        if let Some(reason) = resolution.failure {
            diagnostics.record(
                Diagnostic::new(
                    DiagnosticKind::LookupFailure,
                    format!("citation left unresolved: {reason}"),
                )
                .for_paper(paper.reference()),
            );
        }
    }

    ProcessedPaper {
        rendered,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dossier_core::{
        Author, DemandRole, LookupError, Message, ProviderError, ProviderRequest,
        ProviderResponse, ReferenceRecord, Role,
    };
    use dossier_document::{Block, SectionKind};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct ScriptedProvider {
        intro_paragraphs: usize,
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            let prompt = &request.messages[1].content;
            let n = if prompt.contains("-paragraph introduction") {
                self.intro_paragraphs
            } else if prompt.contains("-paragraph conclusion") {
                3
            } else {
                0
            };
            let content = if n == 0 {
                "Pricing the Internet proposes a smart market.\n\n\
                 Bandwidth Futures prices capacity ahead of time."
                    .to_string()
            } else {
                (1..=n)
                    .map(|i| format!("Paragraph {i}."))
                    .collect::<Vec<_>>()
                    .join("\n\n")
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

    #[derive(Default)]
    struct CountingReferences {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReferenceService for CountingReferences {
        fn name(&self) -> &str {
            "counting"
        }

        async fn lookup(&self, title: &str) -> Result<ReferenceRecord, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            if title.contains("futures") {
                return Err(LookupError::NotFound(title.into()));
            }
            Ok(ReferenceRecord {
                title: title.into(),
                authors: vec![Author::new(Some("Jeffrey"), "MacKie-Mason")],
                year: Some(1995),
                venue: None,
                doi: None,
            })
        }
    }

    fn write_paper(root: &Path, category: &str, folder: &str, title: &str, skip: &[u8]) {
        let dir = root.join(category).join(folder);
        std::fs::create_dir_all(&dir).unwrap();
        for n in 1..=8u8 {
            if skip.contains(&n) {
                continue;
            }
            let body = match n {
                2 => "U = v - p * x".to_string(),
                4 | 6 => "```python\nimport numpy as np\nprint(np.mean([1, 2]))\n```".to_string(),
                _ => format!("Body {n}."),
            };
            let text = format!(
                "Paper: {title}\nDemand {n}: prompt\n{}\n{body}\n",
                "=".repeat(40)
            );
            std::fs::write(dir.join(format!("demand_{n}.txt")), text).unwrap();
        }
    }

    fn corpus_root() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        write_paper(tmp.path(), "internet_pricing_1990_2000", "a_pricing", "Pricing the Internet", &[]);
        write_paper(tmp.path(), "internet_pricing_1990_2000", "b_futures", "Bandwidth Futures", &[6]);
        write_paper(tmp.path(), "internet_pricing_2000_2010", "c_repeat", "pricing   the internet", &[]);
        tmp
    }

    fn settings(root: &Path) -> PipelineSettings {
        let fast = RetryPolicy {
            max_attempts: 2,
            attempt_timeout: Duration::from_secs(5),
            initial_backoff: Duration::from_millis(10),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_millis(50),
        };
        PipelineSettings {
            corpus_root: root.to_path_buf(),
            max_workers: 2,
            title: "Report".into(),
            synthesis: SynthesisSettings::default(),
            generation_retry: fast.clone(),
            lookup_retry: fast,
        }
    }

    fn pipeline(
        root: &Path,
        intro_paragraphs: usize,
        references: Arc<CountingReferences>,
        cancel: CancellationToken,
    ) -> Pipeline {
        Pipeline::new(
            settings(root),
            Arc::new(ScriptedProvider { intro_paragraphs }),
            references,
            cancel,
        )
    }

    #[tokio::test]
    async fn full_run_builds_document() {
        let tmp = corpus_root();
        let references = Arc::new(CountingReferences::default());
        let outcome = pipeline(tmp.path(), 5, references.clone(), CancellationToken::new())
            .run()
            .await
            .unwrap();

        // Same normalized title in two categories: one lookup, one entry.
        assert_eq!(references.calls.load(Ordering::SeqCst), 2);
        let bibliography = outcome.document.bibliography();
        assert_eq!(bibliography.len(), 2);
        assert_eq!(bibliography[0].key, "mackiemason1995");
        assert_eq!(bibliography[1].key, "bandwidthnd");

        let headings: Vec<_> = outcome.document.papers().map(|p| p.heading()).collect();
        assert_eq!(
            headings,
            [
                "Pricing the Internet [1]",
                "Bandwidth Futures [2]",
                "pricing   the internet [1]"
            ]
        );

        assert_eq!(outcome.report.tally.papers, 3);
        assert_eq!(outcome.report.unresolved_citations, 1);
    }

    #[tokio::test]
    async fn missing_fragment_degrades_one_slot() {
        let tmp = corpus_root();
        let outcome = pipeline(
            tmp.path(),
            5,
            Arc::new(CountingReferences::default()),
            CancellationToken::new(),
        )
        .run()
        .await
        .unwrap();

        let futures = outcome
            .document
            .papers()
            .find(|p| p.title == "Bandwidth Futures")
            .unwrap();
        assert_eq!(futures.children.len(), 8);
        assert!(matches!(
            futures.children[5].content.as_slice(),
            [Block::Placeholder { role: DemandRole::AiCode, .. }]
        ));

        let missing: Vec<_> = outcome
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::MissingInput && d.role.is_some())
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].role, Some(DemandRole::AiCode));
        assert_eq!(
            missing[0].paper.as_ref().map(|p| p.title.as_str()),
            Some("Bandwidth Futures")
        );
        assert!(matches!(
            outcome.document.sections.last().map(|s| &s.kind),
            Some(SectionKind::Bibliography)
        ));
    }

    #[tokio::test]
    async fn short_introduction_fails_run() {
        let tmp = corpus_root();
        let failure = pipeline(
            tmp.path(),
            4,
            Arc::new(CountingReferences::default()),
            CancellationToken::new(),
        )
        .run()
        .await
        .unwrap_err();
        assert_eq!(failure.kind(), "SynthesisFailure");
    }

    #[tokio::test]
    async fn cancelled_run_reports_cancellation() {
        let tmp = corpus_root();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let references = Arc::new(CountingReferences::default());
        let failure = pipeline(tmp.path(), 5, references.clone(), cancel)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(failure, RunFailure::Cancelled));
        assert_eq!(references.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_root_is_corpus_failure() {
        let failure = pipeline(
            Path::new("/definitely/not/here"),
            5,
            Arc::new(CountingReferences::default()),
            CancellationToken::new(),
        )
        .run()
        .await
        .unwrap_err();
        assert!(matches!(failure, RunFailure::Corpus(CorpusError::RootMissing(_))));
    }

    #[tokio::test]
    async fn inspect_counts_content() {
        let tmp = corpus_root();
        let inspection = inspect(&settings(tmp.path()), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(inspection.tally.papers, 3);
        assert_eq!(inspection.tally.absent_slots, 1);
        assert_eq!(inspection.tally.equations, 3);
        assert_eq!(inspection.tally.code_blocks, 5);
        assert_eq!(inspection.corpus.paper_count(), 3);
    }
}
