use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid Amount: {0}")]
    InvalidAmount(String),
    #[error("Not Mature: {0}")]
    NotMature(String),
    #[error("Validator is not jailed")]
    NotJailed,
    #[error("Still Jailed: {0}")]
    StillJailed(String),
    #[error("Invalid Parameters: {0}")]
    InvalidParameters(String),
    #[error("Coins Error: {0}")]
    Coins(String),
    #[error("Store Error: {0}")]
    Store(String),
    #[error("Overflow")]
    Overflow,
    #[error(transparent)]
    Ed(#[from] ed::Error),
    #[error(transparent)]
    Dec(#[from] rust_decimal::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable numeric code reported in transaction results. Zero is reserved
    /// for success.
    pub fn code(&self) -> u32 {
        match self {
            Error::NotFound(_) => 1,
            Error::Conflict(_) => 2,
            Error::InvalidAmount(_) => 3,
            Error::NotMature(_) => 4,
            Error::NotJailed => 5,
            Error::StillJailed(_) => 6,
            Error::InvalidParameters(_) => 7,
            Error::Coins(_) => 8,
            Error::Store(_) => 20,
            Error::Overflow => 21,
            Error::Ed(_) => 22,
            Error::Dec(_) => 23,
            Error::Json(_) => 24,
            Error::Io(_) => 25,
        }
    }
}

/// A result type bound to the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;
