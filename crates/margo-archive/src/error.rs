use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("archive io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "stale write for highlight {highlight_id} (expected generation {expected:?}, found {found:?})"
    )]
    StaleWrite {
        highlight_id: String,
        expected: Option<u64>,
        found: Option<u64>,
    },

    #[error("archive schema version {0} is newer than this build supports")]
    UnsupportedVersion(u32),

    #[error("no data directory available")]
    NoDataDir,
}
