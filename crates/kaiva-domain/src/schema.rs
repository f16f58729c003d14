//! Field schema: the fixed, ordered list of lease attributes

use thiserror::Error;

/// Lease attributes reported for every document, in export order.
pub const LEASE_FIELDS: [&str; 28] = [
    "Transaction Type",
    "Document Date",
    "Tenant Legal Name",
    "Guarantor(s)",
    "Landlord Legal Name",
    "Landlord Broker",
    "Tenant Broker",
    "Building Address",
    "Suite Number(s)",
    "Square Footage",
    "Effective Date",
    "Who pays for what expenses? Pro-Rata Share?",
    "Base Rent Schedule",
    "Percentage Rent",
    "Commencement Date",
    "Rent Commencement Date",
    "Expiration Date",
    "Lease Term",
    "Rent Increases",
    "Tenant Improvements / Tenant Improvement Allowance",
    "Free rent (concession)",
    "Renewal Option(s) to Extend",
    "Early Termination",
    "Rent Abatement",
    "Right to Sublet",
    "Security Deposit Amount",
    "Letter of Credit Amount",
    "Late Fee",
];

/// Errors raised when building a schema
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// Schema has no fields
    #[error("Field schema cannot be empty")]
    Empty,

    /// A field name is blank
    #[error("Field name at position {0} is blank")]
    BlankName(usize),

    /// A field name appears more than once
    #[error("Duplicate field name: {0}")]
    Duplicate(String),
}

/// Ordered sequence of unique field names
///
/// The order is the row order of the exported table. A schema is immutable
/// once built.
///
/// # Examples
///
/// ```
/// use kaiva_domain::FieldSchema;
///
/// let schema = FieldSchema::new(["Tenant Legal Name", "Square Footage"]).unwrap();
/// assert_eq!(schema.len(), 2);
/// assert!(schema.contains("Square Footage"));
///
/// assert!(FieldSchema::new(["Late Fee", "Late Fee"]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    fields: Vec<String>,
}

impl FieldSchema {
    /// Create a schema from field names, preserving their order
    ///
    /// # Errors
    /// Returns error if the list is empty, a name is blank, or a name repeats
    pub fn new<I, S>(names: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields: Vec<String> = Vec::new();
        for (idx, name) in names.into_iter().enumerate() {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(SchemaError::BlankName(idx));
            }
            if fields.contains(&name) {
                return Err(SchemaError::Duplicate(name));
            }
            fields.push(name);
        }

        if fields.is_empty() {
            return Err(SchemaError::Empty);
        }

        Ok(Self { fields })
    }

    /// The built-in commercial lease schema
    pub fn lease() -> Self {
        Self {
            fields: LEASE_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Field names in declared order
    pub fn names(&self) -> &[String] {
        &self.fields
    }

    /// Iterate over field names in declared order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false for a constructed schema
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check whether a field name belongs to the schema
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }
}
