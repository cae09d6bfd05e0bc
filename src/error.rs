// src/error.rs
use core::fmt;

/// Crate-wide error for the digest store.
///
/// Every failure is the direct consequence of invalid caller input or
/// invalid persisted bytes; nothing here is transient and nothing is
/// retried internally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An observation value (or query probe) was NaN/±inf, or a numeric
    /// argument was out of its documented range. `context` pinpoints which
    /// argument (e.g., "observation value", "quantile rank").
    InvalidValue { context: &'static str },

    /// An observation weight was non-finite or not strictly positive.
    InvalidWeight { context: &'static str },

    /// The addressed key does not exist.
    NoSuchKey { key: String },

    /// The addressed key holds a value of a different type.
    WrongType { key: String },

    /// CREATE addressed a key that already holds a digest.
    AlreadyExists { key: String },

    /// A quantile/CDF query ran against a digest with no observations.
    EmptyDigest,

    /// Persisted bytes failed validation on load. Never recovered from
    /// silently; `what` names the first check that failed.
    CorruptEncoding { what: &'static str },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidValue { context } => write!(
                f,
                "invalid value ({}). hint: values must be finite numbers",
                context
            ),
            Error::InvalidWeight { context } => write!(
                f,
                "invalid weight ({}). hint: weights must be finite and > 0",
                context
            ),
            Error::NoSuchKey { key } => write!(f, "no such key: {}", key),
            Error::WrongType { key } => {
                write!(f, "key {} holds a value of the wrong type", key)
            }
            Error::AlreadyExists { key } => {
                write!(f, "key {} already holds a digest", key)
            }
            Error::EmptyDigest => write!(f, "digest holds no observations"),
            Error::CorruptEncoding { what } => {
                write!(f, "corrupt digest encoding: {}", what)
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
