use crate::ProductId;

/// Why a catalog could not be loaded.
///
/// This is the only failure in the crate: filtering and selection work on
/// already-validated data and cannot fail.
#[derive(Debug, thiserror::Error)]
pub enum LoadFailure {
    #[error("requesting {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("malformed catalog body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid product {id}: {reason}")]
    InvalidProduct { id: ProductId, reason: String },
}
