//! Error types for the ledger.
//!
//! - [`StorageError`] - failures reported by a wallet store or transaction log
//! - [`LedgerError`] - caller-visible business errors raised by the engine
//!
//! Every `LedgerError` is raised before the failing operation commits anything.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors reported by storage implementations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    /// A record with this id is already stored.
    #[error("Record already exists: {0}")]
    DuplicateId(String),

    /// The reference is already registered to another operation.
    #[error("Reference already registered: {0}")]
    DuplicateReference(String),

    /// A batch mixed records with different references.
    #[error("Batch records must share one reference")]
    MixedReferences,

    /// The backend could not complete the request.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Business errors surfaced to callers of the ledger engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("Wallet with ID {0} not found")]
    WalletNotFound(String),

    #[error("Insufficient balance. Current: {current}, Required: {required}")]
    InsufficientBalance { current: Decimal, required: Decimal },

    #[error("Transaction with reference {0} already exists")]
    DuplicateTransaction(String),

    /// Same-wallet transfer, currency mismatch, or amount outside the configured bounds.
    #[error("{0}")]
    InvalidTransfer(String),

    /// Non-positive funding amount or negative opening balance.
    #[error("{0}")]
    InvalidAmount(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl LedgerError {
    /// Short title for the error kind, used as the `error` field of API responses.
    pub fn title(&self) -> &'static str {
        match self {
            LedgerError::WalletNotFound(_) => "Wallet Not Found",
            LedgerError::InsufficientBalance { .. } => "Insufficient Balance",
            LedgerError::DuplicateTransaction(_) => "Duplicate Transaction",
            LedgerError::InvalidTransfer(_) => "Invalid Transfer",
            LedgerError::InvalidAmount(_) => "Bad Request",
            LedgerError::Storage(_) => "Internal Server Error",
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
