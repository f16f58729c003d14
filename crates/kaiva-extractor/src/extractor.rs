//! Core Extractor implementation

use crate::completer::{complete, unknown_keys};
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::parse_llm_response;
use crate::prompt::PromptBuilder;
use crate::types::{Extraction, ExtractionMetadata, ExtractionStage};
use kaiva_domain::traits::LlmProvider;
use kaiva_domain::FieldSchema;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The Extractor turns document text into a complete field mapping
///
/// Runs `Idle → PromptBuilt → ModelCalled → Parsed → Completed`; any failure
/// ends the run with an error and nothing partial is returned. The model is
/// called exactly once per document.
pub struct Extractor<L>
where
    L: LlmProvider,
{
    llm_provider: L,
    schema: FieldSchema,
    config: ExtractorConfig,
    model_name: String,
}

impl<L> Extractor<L>
where
    L: LlmProvider,
{
    /// Create a new Extractor
    ///
    /// # Errors
    ///
    /// Returns `ExtractorError::Config` if the configuration is invalid.
    pub fn new(
        llm_provider: L,
        schema: FieldSchema,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;

        Ok(Self {
            llm_provider,
            schema,
            config,
            model_name: "llm".to_string(),
        })
    }

    /// Create a new Extractor with a specific model name
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Field schema this extractor reports
    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Extract every schema field from document text
    pub async fn extract(&self, text: &str) -> Result<Extraction, ExtractorError> {
        let start_time = Instant::now();
        let mut stage = ExtractionStage::Idle;

        info!(
            document_chars = text.chars().count(),
            fields = self.schema.len(),
            "Starting field extraction"
        );

        let prompt = PromptBuilder::new(&self.schema, text)
            .with_max_chars(self.config.max_document_chars)
            .build();
        stage = advance(stage, ExtractionStage::PromptBuilt);

        let submitted_chars = prompt.user.chars().count();
        debug!(
            system_chars = prompt.system.len(),
            submitted_chars, "Prompt built"
        );

        let reply = match self.llm_provider.generate(&prompt.system, &prompt.user).await {
            Ok(reply) => reply,
            Err(e) => return Err(fail(stage, ExtractorError::Model(e.to_string()))),
        };
        stage = advance(stage, ExtractionStage::ModelCalled);

        debug!(
            reply_chars = reply.len(),
            "Model reply: {}...",
            preview(&reply, self.config.reply_log_chars)
        );

        let parsed = parse_llm_response(&reply).map_err(|e| fail(stage, e))?;
        stage = advance(stage, ExtractionStage::Parsed);

        let dropped = unknown_keys(&self.schema, &parsed);
        if !dropped.is_empty() {
            debug!(count = dropped.len(), keys = ?dropped, "Dropping keys outside the field schema");
        }

        let result = complete(&self.schema, &parsed);
        stage = advance(stage, ExtractionStage::Completed);

        let metadata = ExtractionMetadata {
            model_name: self.model_name.clone(),
            document_chars: text.chars().count(),
            submitted_chars,
            dropped_fields: dropped.len(),
            not_stated_fields: result.not_stated_count(),
            processing_time_ms: start_time.elapsed().as_millis() as u64,
        };

        info!(
            stage = %stage,
            stated = result.len() - metadata.not_stated_fields,
            not_stated = metadata.not_stated_fields,
            elapsed_ms = metadata.processing_time_ms,
            "Extraction complete"
        );

        Ok(Extraction { result, metadata })
    }
}

fn advance(from: ExtractionStage, to: ExtractionStage) -> ExtractionStage {
    debug_assert!(from.can_transition_to(to), "illegal stage step {} -> {}", from, to);
    debug!(from = %from, to = %to, "Extraction stage");
    to
}

/// Move `stage` to `Failed` and hand the error back
fn fail(stage: ExtractionStage, error: ExtractorError) -> ExtractorError {
    let failed = advance(stage, ExtractionStage::Failed(error.kind()));
    warn!(stage = %stage, to = %failed, "Extraction failed: {}", error);
    error
}

fn preview(text: &str, max_chars: usize) -> &str {
    crate::prompt::truncate_chars(text, max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use kaiva_domain::NOT_STATED;
    use kaiva_llm::{LlmError, MockProvider};

    fn two_field_schema() -> FieldSchema {
        FieldSchema::new(["Tenant Legal Name", "Square Footage"]).unwrap()
    }

    fn create_test_extractor(llm: MockProvider) -> Extractor<MockProvider> {
        Extractor::new(llm, two_field_schema(), ExtractorConfig::default()).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ExtractorConfig {
            max_document_chars: 0,
            ..Default::default()
        };
        let result = Extractor::new(MockProvider::default(), two_field_schema(), config);
        assert!(matches!(result, Err(ExtractorError::Config(_))));
    }

    #[tokio::test]
    async fn test_complete_reply() {
        let llm = MockProvider::new(
            "{'Tenant Legal Name': 'Acme Corp', 'Square Footage': '5,000 sq ft'}",
        );
        let extractor = create_test_extractor(llm);

        let extraction = extractor.extract("lease text").await.unwrap();
        assert_eq!(extraction.result.get("Tenant Legal Name"), Some("Acme Corp"));
        assert_eq!(extraction.result.get("Square Footage"), Some("5,000 sq ft"));
        assert_eq!(extraction.metadata.not_stated_fields, 0);
    }

    #[tokio::test]
    async fn test_missing_field_gets_sentinel() {
        let llm = MockProvider::new(r#"{"Tenant Legal Name": "Acme Corp"}"#);
        let extractor = create_test_extractor(llm);

        let extraction = extractor.extract("lease text").await.unwrap();
        assert_eq!(extraction.result.get("Square Footage"), Some(NOT_STATED));
        assert_eq!(extraction.metadata.not_stated_fields, 1);
    }

    #[tokio::test]
    async fn test_unparseable_reply() {
        let llm = MockProvider::new("I could not find this information.");
        let extractor = create_test_extractor(llm);

        let err = extractor.extract("lease text").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::UnparseableReply);
    }

    #[tokio::test]
    async fn test_model_error() {
        let llm = MockProvider::failing(LlmError::Authentication("bad key".to_string()));
        let extractor = create_test_extractor(llm.clone());

        let err = extractor.extract("lease text").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::ModelError);
        assert!(err.to_string().contains("bad key"));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_text_truncated_before_model_call() {
        let llm = MockProvider::new("{}");
        let config = ExtractorConfig {
            max_document_chars: 100,
            ..Default::default()
        };
        let extractor = Extractor::new(llm.clone(), two_field_schema(), config).unwrap();

        let text = "x".repeat(500);
        let extraction = extractor.extract(&text).await.unwrap();

        let (_, user) = llm.last_request().unwrap();
        assert_eq!(user.len(), 100);
        assert_eq!(extraction.metadata.document_chars, 500);
        assert_eq!(extraction.metadata.submitted_chars, 100);
    }

    #[tokio::test]
    async fn test_dropped_fields_counted() {
        let llm = MockProvider::new("{'Tenant Legal Name': 'Acme', 'Invented Field': 'x'}");
        let extractor = create_test_extractor(llm).with_model_name("gpt-4");

        let extraction = extractor.extract("lease").await.unwrap();
        assert_eq!(extraction.metadata.dropped_fields, 1);
        assert_eq!(extraction.metadata.model_name, "gpt-4");
        assert_eq!(extraction.result.len(), 2);
    }

    #[test]
    fn test_fail_records_failed_stage() {
        let stage = advance(ExtractionStage::Idle, ExtractionStage::PromptBuilt);
        assert_eq!(
            advance(stage, ExtractionStage::Failed(FailureKind::ModelError)),
            ExtractionStage::Failed(FailureKind::ModelError)
        );

        let error = fail(
            ExtractionStage::ModelCalled,
            ExtractorError::UnparseableReply("prose".to_string()),
        );
        assert_eq!(error.kind(), FailureKind::UnparseableReply);
    }

    #[test]
    #[should_panic(expected = "illegal stage step")]
    #[cfg(debug_assertions)]
    fn test_advance_rejects_skipped_stage() {
        advance(ExtractionStage::Idle, ExtractionStage::Completed);
    }
}
