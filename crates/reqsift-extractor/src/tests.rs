//! Integration tests for the Extractor

#[cfg(test)]
mod tests {
    use crate::tokenizer::CharEstimator;
    use crate::{Extractor, ExtractorConfig, RetryConfig};
    use reqsift_domain::traits::LlmProvider;
    use reqsift_domain::{Document, RequirementRecord};
    use reqsift_llm::{LlmError, MockProvider};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    const EMPTY: &str = r#"{"requirements": []}"#;

    /// Three sections; with a 100-unit window and 20-unit overlap the Beta
    /// section is split across two chunks (paragraphs 0..6 and 4..8).
    fn three_sections() -> Document {
        Document::from_raw([
            "3.1.1 Alpha",
            "Alpha must log all.",
            "3.1.2 Beta",
            "Beta step one runs.",
            "Beta step two runs.",
            "Beta step 3 runs.",
            "3.1.3 Gamma",
            "Gamma does things.",
        ])
    }

    fn config(window_units: usize, overlap_units: usize) -> ExtractorConfig {
        ExtractorConfig {
            window_units,
            overlap_units,
            retry: RetryConfig {
                max_attempts: 3,
                initial_backoff_ms: 1,
                max_backoff_ms: 1,
                multiplier: 1.0,
            },
            ..ExtractorConfig::default()
        }
    }

    fn extractor<L>(llm: L, config: ExtractorConfig) -> Extractor<L>
    where
        L: LlmProvider + Send + Sync + 'static,
    {
        Extractor::new(llm, config)
            .unwrap()
            .with_estimator(Arc::new(CharEstimator))
    }

    fn record(title: &str, content: &str) -> RequirementRecord {
        RequirementRecord {
            title: title.to_string(),
            chapter: None,
            identifier: None,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_section_straddling_chunks_merges_into_one_record() {
        let llm = MockProvider::new(EMPTY);
        llm.push_response(
            r#"```json
{"requirements": [
  {"chapter_number": "3.1.1", "title": "Alpha", "content": "Alpha must log all."},
  {"chapter_number": "3.1.2", "title": "Beta", "content": "Beta step one runs.\nBeta step two runs."}
]}
```"#,
        );
        llm.push_response(
            r#"```json
{"requirements": [
  {"title": "Beta", "content": "Beta step two runs.\nBeta step 3 runs."},
  {"chapter_number": "3.1.3", "title": "Gamma", "content": "Gamma does things."}
]}
```"#,
        );
        let probe = llm.clone();
        let extractor = extractor(llm, config(100, 20));

        let result = extractor.extract_all(&three_sections()).await.unwrap();

        assert_eq!(result.metadata.chunks_total, 2);
        let titles: Vec<_> = result.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Beta", "Gamma"]);

        let beta = &result.records[1];
        assert_eq!(
            beta.content,
            "Beta step one runs.\nBeta step two runs.\nBeta step 3 runs."
        );
        assert_eq!(beta.chapter.as_deref(), Some("3.1.2"));
        assert_eq!(result.metadata.candidates_merged, 1);

        // The second window resumes from the last title of the first.
        let prompts = probe.prompts();
        assert!(!prompts[0].contains("Continue from there"));
        assert!(prompts[1].contains("\"Beta\""));
        assert!(prompts[1].contains("Continue from there"));
    }

    #[tokio::test]
    async fn test_failed_chunk_is_skipped() {
        let llm = MockProvider::new(
            r#"{"requirements": [{"title": "Gamma", "content": "Gamma does things."}]}"#,
        );
        for _ in 0..3 {
            llm.push_error(LlmError::Timeout);
        }
        let probe = llm.clone();
        let extractor = extractor(llm, config(100, 20));

        let result = extractor.extract_all(&three_sections()).await.unwrap();

        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].chunk_index, 0);
        assert_eq!(result.failures[0].paragraphs, (0, 6));
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].title, "Gamma");
        assert!(result.metadata.aborted.is_none());

        // Three attempts for the first chunk, one for the second, which
        // falls back to the section marker for context.
        let prompts = probe.prompts();
        assert_eq!(prompts.len(), 4);
        assert!(prompts[3].contains("\"3.1.2 Beta\""));
    }

    #[tokio::test]
    async fn test_permanent_error_aborts_run() {
        let llm = MockProvider::new(EMPTY);
        llm.push_error(LlmError::Authentication("invalid api key".into()));
        let probe = llm.clone();
        let extractor = extractor(llm, config(100, 20));

        let result = extractor.extract_all(&three_sections()).await.unwrap();

        assert!(result.records.is_empty());
        assert_eq!(result.metadata.chunks_processed, 0);
        assert!(result
            .metadata
            .aborted
            .as_deref()
            .is_some_and(|reason| reason.contains("invalid api key")));
        assert_eq!(probe.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let llm = MockProvider::new(EMPTY);
        let probe = llm.clone();
        let token = CancellationToken::new();
        token.cancel();
        let extractor = extractor(llm, config(100, 20)).with_cancellation(token);

        let result = extractor.extract_all(&three_sections()).await.unwrap();

        assert!(result.metadata.cancelled);
        assert_eq!(probe.call_count(), 0);
    }

    /// Cancels the run from inside the first generation call
    struct CancellingProvider {
        inner: MockProvider,
        token: CancellationToken,
    }

    impl LlmProvider for CancellingProvider {
        type Error = LlmError;

        fn generate(&self, prompt: &str, model_hint: Option<&str>) -> Result<String, LlmError> {
            self.token.cancel();
            self.inner.generate(prompt, model_hint)
        }

        fn model_name(&self) -> &str {
            self.inner.model_name()
        }
    }

    #[tokio::test]
    async fn test_cancelled_between_chunks_keeps_partial_results() {
        let inner = MockProvider::new(
            r#"{"requirements": [{"title": "Alpha", "content": "Alpha must log all."}]}"#,
        );
        let probe = inner.clone();
        let token = CancellationToken::new();
        let llm = CancellingProvider {
            inner,
            token: token.clone(),
        };
        let extractor = extractor(llm, config(100, 20)).with_cancellation(token);

        let result = extractor.extract_all(&three_sections()).await.unwrap();

        assert!(result.metadata.cancelled);
        assert_eq!(probe.call_count(), 1);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].title, "Alpha");
    }

    #[tokio::test]
    async fn test_rematch_never_reintroduces_matched_titles() {
        let reply = r#"{"requirements": [
            {"title": "Alpha", "content": "Alpha rewritten by the service."},
            {"chapter_number": "3.1.2", "title": "Beta", "identifier": "REQ-1.2", "content": "Beta step one runs."},
            {"title": "Gamma", "content": "Gamma does things."}
        ]}"#;
        let llm = MockProvider::new(reply);
        let probe = llm.clone();
        let extractor = extractor(llm, config(100, 20));
        let matched = vec![record("Alpha", "Alpha must log all.")];

        let first = extractor.rematch(&three_sections(), &matched).await.unwrap();
        let second = extractor.rematch(&three_sections(), &matched).await.unwrap();

        for result in [&first, &second] {
            let titles: Vec<_> = result.records.iter().map(|r| r.title.as_str()).collect();
            assert_eq!(titles, vec!["Alpha", "Beta", "Gamma"]);
            assert_eq!(result.records[0].content, "Alpha must log all.");
            assert_eq!(result.added, 2);
            assert_eq!(result.resume_index, 2);
        }
        assert_eq!(first.records[1].content, "标识号: REQ-1.2\nBeta step one runs.");

        // Only the text after the last match is sent.
        let prompt = &probe.prompts()[0];
        assert!(prompt.contains("3.1.2 Beta"));
        assert!(!prompt.contains("Alpha must log all."));
    }

    #[tokio::test]
    async fn test_rematch_at_document_end_makes_no_call() {
        let llm = MockProvider::new(EMPTY);
        let probe = llm.clone();
        let extractor = extractor(llm, config(100, 20));
        let matched = vec![record("Gamma", "Gamma does things.")];

        let result = extractor.rematch(&three_sections(), &matched).await.unwrap();

        assert_eq!(result.added, 0);
        assert_eq!(result.resume_index, 8);
        assert_eq!(result.records, matched);
        assert_eq!(probe.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rematch_truncates_remaining_text() {
        let llm = MockProvider::new(EMPTY);
        let probe = llm.clone();
        let cfg = ExtractorConfig {
            rematch_window_units: 31,
            ..config(100, 20)
        };
        let extractor = extractor(llm, cfg);

        extractor.rematch(&three_sections(), &[]).await.unwrap();

        let prompt = &probe.prompts()[0];
        assert!(prompt.contains("3.1.1 Alpha\nAlpha must log all."));
        assert!(!prompt.contains("Beta step"));
    }

    #[tokio::test]
    async fn test_named_extraction_keeps_found_names() {
        let mut llm = MockProvider::new(r#"{"requirement": null}"#);
        llm.add_response(
            "named \"Beta\"",
            r#"{"requirement": {"title": "Beta", "content": "Beta step one runs."}}"#,
        );
        let extractor = extractor(llm, config(100, 20));

        let found = extractor
            .extract_named(&three_sections(), &["Beta".to_string(), "Missing".to_string()])
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Beta");
        assert_eq!(found[0].content, "Beta step one runs.");
    }

    #[tokio::test]
    async fn test_named_search_stops_after_section_ends() {
        let llm = MockProvider::new(
            r#"{"requirement": {"title": "Alpha", "content": "should never be read"}}"#,
        );
        llm.push_response(r#"{"requirement": {"title": "Alpha", "content": "Alpha must log all."}}"#);
        llm.push_response(r#"{"requirement": null}"#);
        let probe = llm.clone();
        let extractor = extractor(llm, config(40, 10));

        let content = extractor
            .extract_specific(&three_sections(), "Alpha")
            .await
            .unwrap();

        assert_eq!(content.as_deref(), Some("Alpha must log all."));
        assert_eq!(probe.call_count(), 2);
        assert!(probe.prompts()[1].contains("was found in the previous text"));
    }

    #[tokio::test]
    async fn test_catalog_filters_dedups_and_sorts() {
        let reply = r#"{"requirements": [
            {"chapter": "3.2.10", "name": "Audit"},
            {"chapter": "3.2", "name": "Functions"},
            {"chapter": "3.2.2", "name": "3.2.2 Export"},
            {"chapter": "3.2.10", "name": "Audit again"}
        ]}"#;
        let extractor = extractor(MockProvider::new(reply), config(100, 20));
        let toc = Document::from_raw(["3.2 Functions", "3.2.2 Export", "3.2.10 Audit"]);

        let entries = extractor.extract_catalog(&toc).await.unwrap();

        let listed: Vec<_> = entries
            .iter()
            .map(|e| (e.chapter.as_str(), e.name.as_str(), e.level))
            .collect();
        assert_eq!(listed, vec![("3.2.2", "Export", 3), ("3.2.10", "Audit", 3)]);
    }
}
