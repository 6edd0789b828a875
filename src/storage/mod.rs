//! Storage ports used by the ledger engine.
//!
//! The engine only talks to these traits; [`memory`] provides the in-process
//! implementation the server runs with. Neither trait promises atomicity across
//! calls, the engine serializes conflicting operations itself.

pub mod memory;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{StorageError, StorageResult};
use crate::models::{Transaction, Wallet, WalletId};

pub use memory::{InMemoryTransactionLog, InMemoryWalletStore};

/// Wallet records keyed by id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Store a new wallet. Fails with `DuplicateId` if the id is taken.
    async fn create(&self, wallet: Wallet) -> StorageResult<Wallet>;

    async fn find_by_id(&self, id: WalletId) -> StorageResult<Option<Wallet>>;

    /// Replace the stored record with `wallet` as a whole. No merging.
    async fn update(&self, wallet: Wallet) -> StorageResult<Wallet>;

    async fn find_all(&self) -> StorageResult<Vec<Wallet>>;
}

/// Append-only transaction records with a unique reference index.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionLog: Send + Sync {
    /// Append the records of one operation, all or nothing.
    ///
    /// Records in a batch must carry the same reference (or none). If that reference is
    /// already registered the whole batch is rejected with `DuplicateReference`.
    async fn append(&self, records: Vec<Transaction>) -> StorageResult<Vec<Transaction>>;

    /// Records owned by `wallet_id`, newest first.
    async fn find_by_wallet_id(&self, wallet_id: WalletId) -> StorageResult<Vec<Transaction>>;

    /// The first record registered under `reference`, if any.
    async fn find_by_reference(&self, reference: &str) -> StorageResult<Option<Transaction>>;

    async fn create(&self, transaction: Transaction) -> StorageResult<Transaction> {
        self.append(vec![transaction])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::Unavailable("append returned no records".to_string()))
    }
}

pub type SharedWalletStore = Arc<dyn WalletStore>;
pub type SharedTransactionLog = Arc<dyn TransactionLog>;

/// Fresh, empty in-memory stores.
pub fn in_memory() -> (SharedWalletStore, SharedTransactionLog) {
    (
        Arc::new(InMemoryWalletStore::new()),
        Arc::new(InMemoryTransactionLog::new()),
    )
}
