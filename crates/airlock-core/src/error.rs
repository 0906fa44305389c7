use thiserror::Error;

pub type TransferResult<T> = Result<T, TransferError>;

#[derive(Debug, Error)]
pub enum TransferError {
    /// Empty file, empty password, or empty transport text.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("frame capacity {requested} is outside 1..={ceiling}")]
    InvalidCapacity { requested: usize, ceiling: usize },

    /// Undecodable or truncated envelope text.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Wrong password or corrupted ciphertext. The two are deliberately
    /// indistinguishable.
    #[error("authentication failed: wrong password or corrupted data")]
    AuthenticationFailed,

    #[error("not an airlock frame: {0}")]
    ForeignData(String),

    #[error(
        "frame belongs to another transmission: expected {expected_filename:?} \
         ({expected_total} frames), got {got_filename:?} ({got_total} frames)"
    )]
    SessionMismatch {
        expected_filename: String,
        expected_total: u64,
        got_filename: String,
        got_total: u64,
    },

    #[error("incomplete transmission: {received}/{total} frames, {} missing", .missing.len())]
    IncompleteTransmission {
        received: u64,
        total: u64,
        missing: Vec<u64>,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TransferError {
    /// True for the wrong-password / tampered-data outcome.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, TransferError::AuthenticationFailed)
    }

    /// Indices still outstanding, if this is an incomplete transmission.
    pub fn missing_indices(&self) -> Option<&[u64]> {
        match self {
            TransferError::IncompleteTransmission { missing, .. } => Some(missing.as_slice()),
            _ => None,
        }
    }
}
