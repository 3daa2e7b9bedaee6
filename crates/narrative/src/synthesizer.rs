//! The narrative synthesizer: one generation request per block, each under
//! the retry policy, all three in flight together.

use std::sync::Arc;
use std::time::Duration;

use dossier_core::{
    Corpus, Message, Narrative, NarrativeSection, Provider, ProviderError, ProviderRequest,
    RetryPolicy, Retryable, with_retry,
};
use dossier_corpus::corpus_digest;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::contract::{check_section, split_paragraphs};
use crate::prompts::{SYSTEM_PROMPT, section_prompt};

/// Why a single attempt at a block failed.
#[derive(Debug, Clone, Error)]
pub enum SynthesisError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The text came back but broke the block's paragraph contract.
    #[error("Contract violation: {0}")]
    Contract(String),
}

impl Retryable for SynthesisError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_transient(),
            Self::Contract(_) => true,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Provider(e) => Retryable::retry_after(e),
            Self::Contract(_) => None,
        }
    }

    fn timed_out(after: Duration) -> Self {
        Self::Provider(ProviderError::timed_out(after))
    }

    fn cancelled() -> Self {
        Self::Provider(ProviderError::Cancelled)
    }
}

/// A block that could not be produced within the retry budget. Fatal for
/// the run.
#[derive(Debug, Clone, Error)]
#[error("{section} synthesis failed after {attempts} attempt(s): {error}")]
pub struct SynthesisFailure {
    pub section: NarrativeSection,
    pub attempts: u32,
    pub error: SynthesisError,
}

impl SynthesisFailure {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.error, SynthesisError::Provider(ProviderError::Cancelled))
    }
}

/// Request parameters shared by the three blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Digest length cap, in characters.
    pub corpus_char_limit: usize,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            model: "deepseek-chat".into(),
            temperature: 0.4,
            max_tokens: 4000,
            corpus_char_limit: 150_000,
        }
    }
}

pub struct NarrativeSynthesizer {
    provider: Arc<dyn Provider>,
    settings: SynthesisSettings,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl NarrativeSynthesizer {
    pub fn new(
        provider: Arc<dyn Provider>,
        settings: SynthesisSettings,
        policy: RetryPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            provider,
            settings,
            policy,
            cancel,
        }
    }

    /// Produce all three blocks, or the first block that failed.
    pub async fn synthesize(&self, corpus: &Corpus) -> Result<Narrative, SynthesisFailure> {
        let digest = corpus_digest(corpus, self.settings.corpus_char_limit);
        if digest.truncated {
            warn!(
                full_chars = digest.full_chars,
                limit = self.settings.corpus_char_limit,
                "Corpus digest truncated for generation"
            );
        }

        let titles: Vec<String> = corpus.papers().map(|p| p.title.clone()).collect();
        let papers_count = corpus.paper_count();

        info!(
            provider = self.provider.name(),
            model = %self.settings.model,
            papers = papers_count,
            "Synthesizing narrative"
        );

        let (introduction, discussion, conclusion) = futures::try_join!(
            self.section(NarrativeSection::Introduction, papers_count, &digest.text, &titles),
            self.section(NarrativeSection::Discussion, papers_count, &digest.text, &titles),
            self.section(NarrativeSection::Conclusion, papers_count, &digest.text, &titles),
        )?;

        Ok(Narrative {
            introduction,
            discussion,
            conclusion,
        })
    }

    async fn section(
        &self,
        section: NarrativeSection,
        papers_count: usize,
        digest: &str,
        titles: &[String],
    ) -> Result<Vec<String>, SynthesisFailure> {
        let request = ProviderRequest {
            model: self.settings.model.clone(),
            messages: vec![
                Message::system(SYSTEM_PROMPT),
                Message::user(section_prompt(section, papers_count, digest)),
            ],
            temperature: self.settings.temperature,
            max_tokens: Some(self.settings.max_tokens),
        };
        let label = format!("{section} synthesis");

        let result = with_retry(&self.policy, &self.cancel, &label, |attempt| {
            let request = request.clone();
            let provider = self.provider.clone();
            async move {
                debug!(section = %section, attempt = attempt + 1, "Requesting narrative block");
                let response = provider.complete(request).await?;
                if let Some(usage) = response.usage {
                    debug!(
                        section = %section,
                        prompt_tokens = usage.prompt_tokens,
                        completion_tokens = usage.completion_tokens,
                        "Generation usage"
                    );
                }
                let paragraphs = split_paragraphs(&response.message.content);
                check_section(section, &paragraphs, titles).map_err(SynthesisError::Contract)?;
                Ok::<_, SynthesisError>(paragraphs)
            }
        })
        .await;

        match result {
            Ok(paragraphs) => {
                info!(section = %section, paragraphs = paragraphs.len(), "Narrative block accepted");
                Ok(paragraphs)
            }
            Err(failure) => Err(SynthesisFailure {
                section,
                attempts: failure.attempts,
                error: failure.error,
            }),
        }
    }
}
