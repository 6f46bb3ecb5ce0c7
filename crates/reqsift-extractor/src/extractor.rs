//! Core Extractor implementation

use crate::chunking::{chunk_by_budget, chunk_with_overlap};
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::identifier::extract_identifier;
use crate::merge::{merge_fragments, merge_pair};
use crate::prompt::{PromptBuilder, PromptKind};
use crate::salvage::{salvage, SalvageStrategy, Salvaged};
use crate::tokenizer::{TiktokenEstimator, UnitEstimator};
use crate::types::{ChunkFailure, ExtractionMetadata, ExtractionResult, NamedRequirement};
use reqsift_domain::traits::{LlmProvider, TransientError};
use reqsift_domain::{Chunk, Document, RecordSet, RequirementRecord, UpsertOutcome};
use reqsift_llm::RetryPolicy;
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// The Extractor pulls requirement sections out of a document with a
/// generation service
///
/// Chunks are processed strictly in order: the prompt for chunk `i + 1`
/// names the last requirement seen in chunk `i`.
pub struct Extractor<L>
where
    L: LlmProvider,
{
    llm_provider: Arc<L>,
    config: ExtractorConfig,
    estimator: Arc<dyn UnitEstimator>,
    retry: RetryPolicy,
    model_hint: Option<String>,
    cancel: Option<CancellationToken>,
}

impl<L> Extractor<L>
where
    L: LlmProvider + Send + Sync + 'static,
{
    /// Create a new Extractor
    ///
    /// The configuration is validated here so a bad window/overlap pair fails
    /// before any chunk is sent.
    pub fn new(llm_provider: L, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        Self::from_shared(Arc::new(llm_provider), config)
    }

    /// Create an Extractor around a provider that is shared elsewhere
    pub fn from_shared(llm_provider: Arc<L>, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate()?;
        let estimator = TiktokenEstimator::new(&config.tokenizer_model);
        let retry = config.retry.policy();
        Ok(Self {
            llm_provider,
            config,
            estimator: Arc::new(estimator),
            retry,
            model_hint: None,
            cancel: None,
        })
    }

    /// Replace the unit estimator used for window sizing
    pub fn with_estimator(mut self, estimator: Arc<dyn UnitEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Ask the provider for a specific model on every call
    pub fn with_model_hint(mut self, model: impl Into<String>) -> Self {
        self.model_hint = Some(model.into());
        self
    }

    /// Stop runs between chunks once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Model reported in result metadata
    pub fn model_name(&self) -> String {
        self.model_hint
            .clone()
            .unwrap_or_else(|| self.llm_provider.model_name().to_string())
    }

    pub(crate) fn estimator(&self) -> &dyn UnitEstimator {
        self.estimator.as_ref()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    /// Extract every requirement in the document
    ///
    /// Per-chunk failures are logged and skipped. A permanent provider error
    /// stops the run and is reported in `metadata.aborted`; the records
    /// collected so far are still returned.
    pub async fn extract_all(&self, document: &Document) -> Result<ExtractionResult, ExtractorError> {
        self.config.validate()?;
        let start_time = Instant::now();

        let chunks = self.window_chunks(document);
        info!(
            "Extracting requirements from {} paragraphs in {} chunks",
            document.len(),
            chunks.len()
        );

        let mut records = RecordSet::new();
        let mut failures = Vec::new();
        let mut metadata = ExtractionMetadata {
            model_name: self.model_name(),
            chunks_total: chunks.len(),
            ..ExtractionMetadata::default()
        };
        let mut last_title: Option<String> = None;

        for (idx, chunk) in chunks.iter().enumerate() {
            if self.is_cancelled() {
                warn!("Extraction cancelled before chunk {}/{}", idx + 1, chunks.len());
                metadata.cancelled = true;
                break;
            }

            debug!(
                "Processing chunk {}/{} (paragraphs {}..{}, {} units)",
                idx + 1,
                chunks.len(),
                chunk.source_range.start,
                chunk.source_range.end,
                chunk.unit_count
            );

            let context = if idx > 0 && self.config.enable_context {
                last_title
                    .clone()
                    .or_else(|| chunks[idx - 1].last_marker.clone())
            } else {
                None
            };
            let kind = match context {
                Some(last_title) => PromptKind::Continuation { last_title },
                None => PromptKind::Initial,
            };
            let prompt = PromptBuilder::new(chunk.text.as_str(), kind).build();

            let salvaged = match self.request(prompt).await {
                Ok(salvaged) => salvaged,
                Err(e) if e.is_fatal() => {
                    error!("Aborting extraction at chunk {}: {}", idx + 1, e);
                    metadata.aborted = Some(e.to_string());
                    break;
                }
                Err(e) => {
                    warn!("Skipping chunk {}/{}: {}", idx + 1, chunks.len(), e);
                    failures.push(chunk_failure(idx, chunk, &e));
                    continue;
                }
            };
            metadata.chunks_processed += 1;

            for mut candidate in salvaged.candidates() {
                if candidate.title.is_empty() || !candidate.has_content(self.config.min_content_chars) {
                    continue;
                }
                if candidate.identifier.is_none() {
                    candidate.identifier = extract_identifier(&candidate.content);
                }
                last_title = Some(candidate.title.clone());

                let title = candidate.title.clone();
                match records.upsert_with(candidate, merge_pair) {
                    UpsertOutcome::Inserted => debug!("New requirement: {}", title),
                    UpsertOutcome::Merged => {
                        debug!("Merged continuation of: {}", title);
                        metadata.candidates_merged += 1;
                    }
                }
                metadata.candidates_accepted += 1;
            }
        }

        let mut records = records.into_vec();
        if !self.config.section_prefixes.is_empty() {
            let before = records.len();
            records.retain(|r| has_section_prefix(r, &self.config.section_prefixes));
            debug!("Section filter kept {}/{} records", records.len(), before);
        }

        metadata.processing_time_ms = start_time.elapsed().as_millis() as u64;
        metadata.timestamp = unix_now();

        info!(
            "Extraction complete: {} records, {} chunks skipped, {} ms",
            records.len(),
            failures.len(),
            metadata.processing_time_ms
        );

        Ok(ExtractionResult {
            records,
            failures,
            metadata,
        })
    }

    /// Search the document for one named requirement
    ///
    /// Returns the merged content, or `None` when nothing was found.
    pub async fn extract_specific(
        &self,
        document: &Document,
        name: &str,
    ) -> Result<Option<String>, ExtractorError> {
        Ok(self.search_named(document, name).await?.content)
    }

    /// Search for each name in turn, keeping those that produced content
    pub async fn extract_named(
        &self,
        document: &Document,
        names: &[String],
    ) -> Result<Vec<NamedRequirement>, ExtractorError> {
        info!("Extracting {} named requirements", names.len());

        let mut found = Vec::new();
        for name in names {
            if self.is_cancelled() {
                warn!("Named extraction cancelled before '{}'", name);
                break;
            }

            let search = self.search_named(document, name).await?;
            match search.content {
                Some(content) => found.push(NamedRequirement {
                    name: name.clone(),
                    content,
                }),
                None => info!("No content found for '{}'", name),
            }

            if search.aborted {
                warn!("Stopping named extraction after '{}'", name);
                break;
            }
        }

        info!("Named extraction complete: {}/{} found", found.len(), names.len());
        Ok(found)
    }

    async fn search_named(&self, document: &Document, name: &str) -> Result<NamedSearch, ExtractorError> {
        self.config.validate()?;

        let chunks = chunk_with_overlap(
            document.paragraphs(),
            self.config.window_units,
            self.config.overlap_units,
            self.estimator(),
        );
        debug!("Searching {} chunks for '{}'", chunks.len(), name);

        let mut fragments: Vec<String> = Vec::new();
        let mut aborted = false;

        for (idx, chunk) in chunks.iter().enumerate() {
            if self.is_cancelled() {
                break;
            }

            let kind = if fragments.is_empty() {
                PromptKind::Specific { name: name.to_string() }
            } else {
                PromptKind::SpecificContinuation { name: name.to_string() }
            };
            let prompt = PromptBuilder::new(chunk.text.as_str(), kind).build();

            let salvaged = match self.request(prompt).await {
                Ok(salvaged) => salvaged,
                Err(e) if e.is_fatal() => {
                    error!("Aborting search for '{}': {}", name, e);
                    aborted = true;
                    break;
                }
                Err(e) => {
                    warn!("Skipping chunk {} while searching '{}': {}", idx + 1, name, e);
                    continue;
                }
            };

            match salvaged
                .single_candidate()
                .filter(|c| c.has_content(self.config.min_content_chars))
            {
                Some(candidate) => fragments.push(candidate.content),
                // Content already found and this window has none: the section ended.
                None if !fragments.is_empty() => {
                    debug!("'{}' ends before chunk {}", name, idx + 1);
                    break;
                }
                None => {}
            }
        }

        let content = (!fragments.is_empty()).then(|| merge_fragments(&fragments, None));
        Ok(NamedSearch { content, aborted })
    }

    fn window_chunks(&self, document: &Document) -> Vec<Chunk> {
        if self.config.enable_context {
            chunk_with_overlap(
                document.paragraphs(),
                self.config.window_units,
                self.config.overlap_units,
                self.estimator(),
            )
        } else {
            chunk_by_budget(document.paragraphs(), self.config.window_units, self.estimator())
        }
    }

    /// Call the provider and salvage structured data from the reply
    pub(crate) async fn request(&self, prompt: String) -> Result<Salvaged, ExtractorError> {
        debug!("Prompt length: {} chars", prompt.len());
        let reply = self.call_llm(prompt).await?;
        debug!("Reply length: {} chars", reply.len());

        let salvaged = salvage(&reply);
        match salvaged.strategy {
            SalvageStrategy::Sentinel => {
                return Err(ExtractorError::SalvageFailure(format!(
                    "no structured data in {} chars of reply",
                    reply.chars().count()
                )))
            }
            SalvageStrategy::Manual => warn!("Reply salvaged from headings only"),
            SalvageStrategy::FencedBlock => {}
            other => debug!("Reply salvaged with {:?}", other),
        }
        Ok(salvaged)
    }

    /// Call the LLM provider with retry and a per-call deadline
    ///
    /// A blocking call cannot be interrupted: when the deadline passes the
    /// task is abandoned, not stopped, and the retry may overlap it. HTTP
    /// providers should carry a request timeout below the deadline
    /// ([`ExtractorConfig::request_timeout`]) so abandoned calls end.
    async fn call_llm(&self, prompt: String) -> Result<String, ExtractorError> {
        let deadline = self.config.call_timeout();
        let timeout_secs = self.config.call_timeout_secs;

        self.retry
            .run(|attempt| {
                let llm = Arc::clone(&self.llm_provider);
                let prompt = prompt.clone();
                let model_hint = self.model_hint.clone();
                async move {
                    if attempt > 1 {
                        debug!("Generation attempt {}", attempt);
                    }
                    // Call in a blocking context since LlmProvider is not async
                    let task = tokio::task::spawn_blocking(move || {
                        llm.generate(&prompt, model_hint.as_deref())
                            .map_err(|e| classify(&e))
                    });
                    match timeout(deadline, task).await {
                        Ok(Ok(reply)) => reply,
                        Ok(Err(e)) => Err(ExtractorError::Join(e.to_string())),
                        Err(_) => Err(ExtractorError::Timeout(timeout_secs)),
                    }
                }
            })
            .await
    }
}

/// Outcome of searching for one name
struct NamedSearch {
    content: Option<String>,
    aborted: bool,
}

fn classify<E: TransientError + Display>(error: &E) -> ExtractorError {
    if error.is_transient() {
        ExtractorError::TransientService(error.to_string())
    } else {
        ExtractorError::PermanentService(error.to_string())
    }
}

fn chunk_failure(idx: usize, chunk: &Chunk, error: &ExtractorError) -> ChunkFailure {
    ChunkFailure {
        chunk_index: idx,
        paragraphs: (chunk.source_range.start, chunk.source_range.end),
        reason: error.to_string(),
    }
}

fn has_section_prefix(record: &RequirementRecord, prefixes: &[String]) -> bool {
    record
        .chapter
        .as_deref()
        .is_some_and(|chapter| prefixes.iter().any(|p| chapter.starts_with(p.as_str())))
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
