pub type Result<T, E = IngestError> = std::result::Result<T, E>;

/// Why an incoming file did not become a loaded map. Every variant resets the
/// editor to the empty upload prompt; they differ only in what the user is told.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("expected an SVG file, got `{mime}`")]
    InvalidFileType { mime: String },

    #[error("file could not be read: {0}")]
    Read(String),

    #[error("file is {len} bytes, above the {max} byte limit")]
    TooLarge { len: usize, max: usize },

    #[error("file is not valid UTF-8 text")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("malformed SVG: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("map has {count} regions, above the {max} region limit")]
    TooManyRegions { count: usize, max: usize },
}

impl IngestError {
    /// Stable machine-readable code, shared with the JS facade.
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::InvalidFileType { .. } => "invalid_file_type",
            IngestError::Read(_) => "read_failure",
            _ => "parse_failure",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no map is loaded")]
    NothingLoaded,

    #[error("pristine map text no longer parses: {0}")]
    Reparse(#[from] roxmltree::Error),

    #[error("region {index} comes from a DTD entity and its id cannot be rewritten in place")]
    Unspliceable { index: usize },

    #[error("failed to encode id mapping: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("upload request failed: {0}")]
    Transport(String),

    #[error("upload rejected with HTTP status {0}")]
    Status(u16),
}
