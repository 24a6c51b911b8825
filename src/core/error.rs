use thiserror::Error;

/// Failure modes of the scoring engine and its dataset boundary.
///
/// Only `SecondaryDatasetUnavailable` and `SchemaViolation` abort a run;
/// the rest are absorbed per property or per file and logged.
#[derive(Debug, Error)]
pub enum CompatError {
    #[error("no compatibility data found for the property '{property}'")]
    MissingCompatibilityData { property: String },

    #[error("secondary dataset unavailable at {url}: {reason}")]
    SecondaryDatasetUnavailable { url: String, reason: String },

    #[error("no CSS properties found in {file}")]
    EmptyPropertySet { file: String },

    #[error("{file} is {bytes} bytes, over the {limit} byte scan limit")]
    FileTooLarge { file: String, bytes: u64, limit: u64 },

    #[error("none of the properties in {file} could be resolved")]
    ZeroResolvedProperties { file: String },

    #[error("schema violation in {context}: {detail}")]
    SchemaViolation { context: String, detail: String },
}

impl CompatError {
    pub fn schema(context: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::SchemaViolation {
            context: context.into(),
            detail: detail.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SecondaryDatasetUnavailable { .. } | Self::SchemaViolation { .. }
        )
    }
}
