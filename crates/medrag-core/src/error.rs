use thiserror::Error;

/// Error taxonomy shared by every engine crate.
///
/// Embedding, index and rerank failures are fatal to the call that hit
/// them; there is no silent fallback to a degraded result set. Judge
/// failures are recoverable inside batch evaluation only.
#[derive(Debug, Error)]
pub enum Error {
    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("index operation failed: {0}")]
    Index(String),

    #[error("rerank failed: {0}")]
    Rerank(String),

    #[error("judge call failed: {0}")]
    JudgeCall(String),

    /// The message is the diagnostic string written verbatim into the
    /// ledger when a batch recovers from a malformed judge response.
    #[error("{0}")]
    JudgeParse(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("ledger error: {0}")]
    Ledger(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
