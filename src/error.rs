//! Error kinds for the anonymization engine.
//!
//! Policy summary:
//! - `InputShape` and `UnsupportedType` degrade to the free-text
//!   transformation at the call site; they never abort a run.
//! - `VaultUnavailable` is fatal for reversible modes.
//! - `CryptoKeyMismatch` surfaces as `None` from the failing vault op.
//! - `CollisionExhaustion` emits the last candidate and marks the column.

use crate::detect::DataType;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Value does not match its declared type's shape.
    #[error("value does not match the {0} shape")]
    InputShape(DataType),

    /// The vault could not be opened, read, or written.
    #[error("vault unavailable: {0}")]
    VaultUnavailable(String),

    /// Decryption failed; the in-memory key does not match the vault.
    #[error("vault key mismatch")]
    CryptoKeyMismatch,

    /// 100 candidates were generated without finding a unique one.
    #[error("collision retries exhausted for column {column}")]
    CollisionExhaustion { column: String },

    /// The engine has no handler for this data type.
    #[error("unsupported data type {0}")]
    UnsupportedType(DataType),

    #[error("key file error: {0}")]
    KeyFile(String),
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::VaultUnavailable(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::VaultUnavailable(e.to_string())
    }
}
