/// Crate-wide result type.
pub type TexturaResult<T> = Result<T, TexturaError>;

/// Top-level error taxonomy.
///
/// Invalid layer mutations are not represented here: the layer store rejects them by returning
/// `false` instead of failing.
#[derive(thiserror::Error, Debug)]
pub enum TexturaError {
    /// Caller-supplied value is malformed or outside its contract.
    #[error("validation error: {0}")]
    Validation(String),

    /// Upload could not be read, decoded or normalized.
    #[error("ingestion error: {0}")]
    Ingestion(String),

    /// Subject extraction failed or produced an unusable cutout.
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Compositing could not produce a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Export was requested without content, or encoding/writing failed.
    #[error("export error: {0}")]
    Export(String),

    /// Any other failure, with its source chain preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TexturaError {
    /// Build a [`TexturaError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TexturaError::Ingestion`].
    pub fn ingestion(msg: impl Into<String>) -> Self {
        Self::Ingestion(msg.into())
    }

    /// Build a [`TexturaError::Extraction`].
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    /// Build a [`TexturaError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`TexturaError::Export`].
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
