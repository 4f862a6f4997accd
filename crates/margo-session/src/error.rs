use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no highlight is selected")]
    NoSelection,

    #[error("unknown highlight: {0}")]
    UnknownHighlight(String),

    #[error("a turn is already in flight")]
    AssistantBusy,

    #[error("archive error: {0}")]
    Archive(#[from] margo_archive::error::ArchiveError),
}
