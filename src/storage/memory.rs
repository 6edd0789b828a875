//! In-process stores backed by `tokio::sync::RwLock`-guarded maps.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{TransactionLog, WalletStore};
use crate::error::{StorageError, StorageResult};
use crate::models::{Transaction, TransactionId, Wallet, WalletId};

#[derive(Default)]
pub struct InMemoryWalletStore {
    wallets: RwLock<HashMap<WalletId, Wallet>>,
}

impl InMemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    async fn create(&self, wallet: Wallet) -> StorageResult<Wallet> {
        let mut wallets = self.wallets.write().await;
        if wallets.contains_key(&wallet.id) {
            return Err(StorageError::DuplicateId(wallet.id.to_string()));
        }
        wallets.insert(wallet.id, wallet.clone());
        Ok(wallet)
    }

    async fn find_by_id(&self, id: WalletId) -> StorageResult<Option<Wallet>> {
        Ok(self.wallets.read().await.get(&id).cloned())
    }

    async fn update(&self, wallet: Wallet) -> StorageResult<Wallet> {
        self.wallets.write().await.insert(wallet.id, wallet.clone());
        Ok(wallet)
    }

    async fn find_all(&self) -> StorageResult<Vec<Wallet>> {
        let mut all: Vec<Wallet> = self.wallets.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }
}

#[derive(Default)]
struct LogState {
    // Insertion order; positions are stable because records are never removed.
    records: Vec<Transaction>,
    by_id: HashMap<TransactionId, usize>,
    by_wallet: HashMap<WalletId, Vec<usize>>,
    by_reference: HashMap<String, TransactionId>,
}

#[derive(Default)]
pub struct InMemoryTransactionLog {
    state: RwLock<LogState>,
}

impl InMemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TransactionLog for InMemoryTransactionLog {
    async fn append(&self, records: Vec<Transaction>) -> StorageResult<Vec<Transaction>> {
        let reference = records.first().and_then(|r| r.reference.clone());
        if records.iter().any(|r| r.reference != reference) {
            return Err(StorageError::MixedReferences);
        }

        let mut state = self.state.write().await;

        // Validate the whole batch before touching anything.
        if let Some(reference) = &reference {
            if state.by_reference.contains_key(reference) {
                return Err(StorageError::DuplicateReference(reference.clone()));
            }
        }
        for (i, record) in records.iter().enumerate() {
            let repeated_in_batch = records[..i].iter().any(|r| r.id == record.id);
            if repeated_in_batch || state.by_id.contains_key(&record.id) {
                return Err(StorageError::DuplicateId(record.id.to_string()));
            }
        }

        if let (Some(reference), Some(first)) = (reference, records.first()) {
            state.by_reference.insert(reference, first.id);
        }
        for record in &records {
            let position = state.records.len();
            state.by_id.insert(record.id, position);
            state.by_wallet.entry(record.wallet_id).or_default().push(position);
            state.records.push(record.clone());
        }

        Ok(records)
    }

    async fn find_by_wallet_id(&self, wallet_id: WalletId) -> StorageResult<Vec<Transaction>> {
        let state = self.state.read().await;
        let mut found: Vec<Transaction> = state
            .by_wallet
            .get(&wallet_id)
            .map(|positions| {
                positions
                    .iter()
                    .rev()
                    .map(|&p| state.records[p].clone())
                    .collect()
            })
            .unwrap_or_default();
        // Stable sort keeps later insertions first among equal timestamps.
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn find_by_reference(&self, reference: &str) -> StorageResult<Option<Transaction>> {
        let state = self.state.read().await;
        Ok(state
            .by_reference
            .get(reference)
            .and_then(|id| state.by_id.get(id))
            .map(|&p| state.records[p].clone()))
    }
}
