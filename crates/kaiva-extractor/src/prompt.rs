//! LLM prompt engineering for lease field extraction

use kaiva_domain::{FieldSchema, NOT_STATED};

/// System instruction and user content for one model call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Role instruction naming the domain, the fields and the reply shape
    pub system: String,
    /// Document text, possibly truncated
    pub user: String,
}

/// Builds prompts for the LLM to extract lease fields
pub struct PromptBuilder<'a> {
    schema: &'a FieldSchema,
    text: &'a str,
    max_chars: Option<usize>,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(schema: &'a FieldSchema, text: &'a str) -> Self {
        Self {
            schema,
            text,
            max_chars: None,
        }
    }

    /// Only send the first `max_chars` characters of the document
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = Some(max_chars);
        self
    }

    /// Build the system instruction and user content
    pub fn build(&self) -> Prompt {
        let mut system = String::new();

        system.push_str(ROLE_INSTRUCTION);
        system.push_str("\n\n");

        for field in self.schema.iter() {
            system.push_str("- ");
            system.push_str(field);
            system.push('\n');
        }
        system.push('\n');

        system.push_str(&format!(
            "Return ONLY a dictionary with exactly one entry per field listed above. \
             Use each field name verbatim as the key and the clearly stated value as a string. \
             Use '{}' if the information is absent from the document.\n",
            NOT_STATED
        ));
        system.push_str(&format!("Format: {}\n\n", self.example_shape()));
        system.push_str(OUTPUT_FORMAT_REMINDER);

        let user = match self.max_chars {
            Some(limit) => truncate_chars(self.text, limit),
            None => self.text,
        };

        Prompt {
            system,
            user: user.to_string(),
        }
    }

    /// Two-entry illustration of the reply shape using real field names
    fn example_shape(&self) -> String {
        let mut fields = self.schema.iter();
        match (fields.next(), fields.next()) {
            (Some(a), Some(b)) => format!(r#"{{"{}": "Value1", "{}": "Value2"}}"#, a, b),
            (Some(a), None) => format!(r#"{{"{}": "Value1"}}"#, a),
            _ => "{}".to_string(),
        }
    }
}

/// First `limit` characters of `text`, never splitting a character
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

const ROLE_INSTRUCTION: &str = "You are a commercial real estate lease analyst. \
Extract the following fields from the lease document:";

const OUTPUT_FORMAT_REMINDER: &str = "Remember: reply with the dictionary only. \
No markdown code blocks, no explanations, no text before or after it.";
