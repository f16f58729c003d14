//! Request and response types for extraction

use crate::error::FailureKind;
use kaiva_domain::ExtractionResult;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Raw key → value mapping recovered from a model reply
///
/// May contain keys outside the field schema and may miss schema keys;
/// the completer reconciles it against the schema.
pub type ReplyMap = HashMap<String, String>;

/// Pipeline position of one extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStage {
    /// Nothing done yet
    Idle,
    /// Instruction and user content built
    PromptBuilt,
    /// Model reply received
    ModelCalled,
    /// Reply parsed into a mapping
    Parsed,
    /// Mapping completed against the schema
    Completed,
    /// Run ended without a result
    Failed(FailureKind),
}

impl ExtractionStage {
    /// Stage reached when this one succeeds; `None` once terminal
    pub fn next(self) -> Option<Self> {
        match self {
            ExtractionStage::Idle => Some(ExtractionStage::PromptBuilt),
            ExtractionStage::PromptBuilt => Some(ExtractionStage::ModelCalled),
            ExtractionStage::ModelCalled => Some(ExtractionStage::Parsed),
            ExtractionStage::Parsed => Some(ExtractionStage::Completed),
            ExtractionStage::Completed | ExtractionStage::Failed(_) => None,
        }
    }

    /// Whether the run has finished, successfully or not
    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// Whether `to` is a legal step from this stage
    ///
    /// Any running stage may fail; otherwise stages advance one at a time.
    pub fn can_transition_to(self, to: Self) -> bool {
        match to {
            ExtractionStage::Failed(_) => !self.is_terminal(),
            _ => self.next() == Some(to),
        }
    }
}

impl fmt::Display for ExtractionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractionStage::Idle => "idle",
            ExtractionStage::PromptBuilt => "prompt_built",
            ExtractionStage::ModelCalled => "model_called",
            ExtractionStage::Parsed => "parsed",
            ExtractionStage::Completed => "completed",
            ExtractionStage::Failed(kind) => return write!(f, "failed({})", kind),
        };
        f.write_str(name)
    }
}

/// Successful extraction: the completed result plus bookkeeping
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    /// Schema-shaped field values
    pub result: ExtractionResult,

    /// Metadata about the extraction
    pub metadata: ExtractionMetadata,
}

/// Metadata about an extraction operation
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionMetadata {
    /// Name of the model used
    pub model_name: String,

    /// Characters of document text received
    pub document_chars: usize,

    /// Characters actually sent to the model after truncation
    pub submitted_chars: usize,

    /// Reply keys dropped because they are not schema fields
    pub dropped_fields: usize,

    /// Schema fields filled with the sentinel
    pub not_stated_fields: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}
