//! Error types for the codec and security layers.
//!
//! Every codec and crypt operation either returns bytes on success or one of
//! these errors identifying the failing filter or algorithm. Wrong passwords
//! are not errors; authentication reports them as a `false` outcome.

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during stream decoding or document decryption.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Filter name is declared but has no working implementation
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Predictor code outside 1, 2, 10..=15
    #[error("Unsupported predictor: {0}")]
    UnsupportedPredictor(i64),

    /// Predictor input is not a whole number of rows
    #[error("Invalid row length: {data_len} bytes is not a multiple of {row_len}")]
    InvalidRowLength {
        /// Total input length in bytes
        data_len: usize,
        /// Expected row length in bytes
        row_len: usize,
    },

    /// Encoder invoked with parameters it does not support
    #[error("Unsupported encoding parameters: {0}")]
    UnsupportedEncodingParameters(String),

    /// Decoding failed for a specific filter
    #[error("{filter}: {reason}")]
    Decode {
        /// Name of the filter that failed
        filter: &'static str,
        /// Short cause
        reason: String,
    },

    /// ASCIIHexDecode encountered a byte that is not a hex digit, whitespace
    /// or the EOD marker
    #[error("Invalid ascii hex character ({0})")]
    InvalidHexCharacter(char),

    /// A required dictionary entry is absent
    #[error("Missing required dictionary entry: {0}")]
    MissingDictEntry(&'static str),

    /// A dictionary entry or object has the wrong type
    #[error("Type mismatch for {entry}: expected {expected}")]
    TypeMismatch {
        /// Entry or object being inspected
        entry: &'static str,
        /// Expected type name
        expected: &'static str,
    },

    /// A key, salt or cipher buffer has an illegal length
    #[error("Malformed {what} length ({len})")]
    MalformedLength {
        /// What was being measured (key, salt, buffer, ...)
        what: &'static str,
        /// Observed length in bytes
        len: usize,
    },

    /// Encryption dictionary declares an algorithm this crate cannot handle
    #[error("Unsupported encryption: {0}")]
    UnsupportedEncryption(String),

    /// A crypt filter name is not present in the registry
    #[error("Unsupported crypt filter ({0})")]
    UnsupportedCryptFilter(String),

    /// Perms entry did not validate against P (revision 6)
    #[error("Permissions validation failed: {0}")]
    PermissionsValidation(&'static str),

    /// Operation requires a successfully authenticated document
    #[error("Document is not authenticated")]
    NotAuthenticated,

    /// IO error from an underlying reader or writer
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a decode failure attributed to a filter.
    pub(crate) fn decode(filter: &'static str, reason: impl Into<String>) -> Self {
        Error::Decode {
            filter,
            reason: reason.into(),
        }
    }
}
