//! Extraction result: the schema-shaped field → value mapping

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Value reported for any schema field the model did not return
pub const NOT_STATED: &str = "Not Stated";

/// Ordered field → value pairs produced for one document
///
/// Built by the field completer, which guarantees the key set equals the
/// field schema in schema order. Serializes as a JSON object that keeps
/// that order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractionResult {
    entries: Vec<(String, String)>,
}

impl ExtractionResult {
    /// Wrap already-ordered pairs
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    /// Value for a field, if present
    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate over (field, value) pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Field names in order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no fields are present
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count of fields holding the sentinel value
    pub fn not_stated_count(&self) -> usize {
        self.entries.iter().filter(|(_, v)| v == NOT_STATED).count()
    }

    /// Consume into the underlying pairs
    pub fn into_entries(self) -> Vec<(String, String)> {
        self.entries
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, value) in &self.entries {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExtractionResult {
        ExtractionResult::new(vec![
            ("Tenant Legal Name".to_string(), "Acme Corp".to_string()),
            ("Square Footage".to_string(), NOT_STATED.to_string()),
        ])
    }

    #[test]
    fn test_get_and_order() {
        let result = sample();
        assert_eq!(result.get("Tenant Legal Name"), Some("Acme Corp"));
        assert_eq!(result.get("Late Fee"), None);
        let fields: Vec<_> = result.fields().collect();
        assert_eq!(fields, vec!["Tenant Legal Name", "Square Footage"]);
    }

    #[test]
    fn test_not_stated_count() {
        assert_eq!(sample().not_stated_count(), 1);
    }

    #[test]
    fn test_serialize_keeps_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"Tenant Legal Name":"Acme Corp","Square Footage":"Not Stated"}"#
        );
    }
}
