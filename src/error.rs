#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid byte range format: {0}")]
    InvalidByteRange(String),

    #[error("Invalid IV format: {0}")]
    InvalidIv(String),

    #[error("Invalid date-time: {value} - {reason}")]
    InvalidDateTime { value: String, reason: String },

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short machine-readable code, used when reporting diagnostics.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidByteRange(_) => "INVALID_BYTE_RANGE",
            Self::InvalidIv(_) => "INVALID_IV",
            Self::InvalidDateTime { .. } => "INVALID_DATE_TIME",
            Self::InvalidPattern(_) => "INVALID_PATTERN",
            Self::Io(_) => "IO_ERROR",
        }
    }
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Self::InvalidIv(e.to_string())
    }
}
