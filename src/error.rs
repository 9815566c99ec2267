use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Why an armored key could not be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyParseReason {
    /// Not valid PEM, or not a key we understand
    Malformed,
    /// The key is passphrase-protected and no passphrase was given
    MissingPassphrase,
    /// The key is passphrase-protected and the passphrase did not unlock it
    WrongPassphrase,
    /// Valid key, but outside the supported profile (e.g. too short)
    Unsupported,
}

impl fmt::Display for KeyParseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KeyParseReason::Malformed => "malformed armor",
            KeyParseReason::MissingPassphrase => "missing passphrase",
            KeyParseReason::WrongPassphrase => "wrong passphrase",
            KeyParseReason::Unsupported => "unsupported key",
        };
        f.write_str(s)
    }
}

/// Main error type for the identity and encryption core
#[derive(Error, Debug)]
pub enum SmaError {
    // Key errors
    #[error("RSA key generation failed: {0}")]
    KeyGenerationError(String),

    #[error("Key parse failed ({reason}): {detail}")]
    KeyParseError {
        reason: KeyParseReason,
        detail: String,
    },

    #[error("Key {fingerprint} has no private half")]
    NotAPrivateKeyError { fingerprint: String },

    // Cipher errors
    #[error("Encryption failed: {0}")]
    EncryptionError(String),

    #[error("Decryption failed: {0}")]
    DecryptionError(String),

    #[error("Payload is not valid transport encoding: {0}")]
    EncodingError(String),

    // Identity errors
    #[error("Identity not found: {0}")]
    IdentityNotFound(String),

    // Persistence errors
    #[error("Config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {}: {reason}", path.display())]
    DecodeError { path: PathBuf, reason: String },

    #[error("Failed to encode config state: {0}")]
    EncodeError(#[source] serde_json::Error),

    // Startup errors
    #[error("Initialization from {} failed: {source}", path.display())]
    FatalInitError {
        path: PathBuf,
        #[source]
        source: Box<SmaError>,
    },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Logging initialization failed: {0}")]
    LoggingError(String),
}

/// Result type alias for core operations
pub type SmaResult<T> = Result<T, SmaError>;

impl SmaError {
    pub(crate) fn key_parse(reason: KeyParseReason, detail: impl Into<String>) -> Self {
        SmaError::KeyParseError {
            reason,
            detail: detail.into(),
        }
    }

    /// True when a config load failed only because the file does not exist yet
    pub fn is_not_found(&self) -> bool {
        matches!(self, SmaError::NotFound { .. })
    }

    /// Errors the user can simply retry from the UI
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SmaError::EncryptionError(_)
                | SmaError::DecryptionError(_)
                | SmaError::EncodingError(_)
                | SmaError::IdentityNotFound(_)
                | SmaError::NotAPrivateKeyError { .. }
                | SmaError::KeyParseError { .. }
        )
    }
}

impl From<base64::DecodeError> for SmaError {
    fn from(err: base64::DecodeError) -> Self {
        SmaError::EncodingError(format!("Base64 decode error: {}", err))
    }
}
