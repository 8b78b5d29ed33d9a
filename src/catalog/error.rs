use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed file read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog fetch failed: {0}")]
    Fetch(#[from] FeedError),
    #[error("catalog feed contained no valid entries ({skipped} skipped)")]
    NoValidEntries { skipped: usize },
}

/// A single malformed element group. Never fatal to a batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogParseError {
    #[error("malformed catalog identifier in line 1: {line:?}")]
    MalformedIdentifier { line: String },
    #[error("invalid elements for {norad_id}: {message}")]
    InvalidElements { norad_id: u32, message: String },
    #[error("unrecognized line: {line:?}")]
    UnrecognizedLine { line: String },
}
