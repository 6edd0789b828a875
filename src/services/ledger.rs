//! Ledger engine: funding, transfers and wallet views on top of the storage ports.
//!
//! Locking discipline for every mutation:
//! 1. the reference lock (when a reference is given), then
//! 2. the wallet locks, in ascending wallet id order.
//!
//! Detail reads take the wallet's shared lock, so they never see a balance without
//! its transaction record or the other way round.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::OwnedRwLockWriteGuard;
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult, StorageError};
use crate::models::{
    Currency, Transaction, TransactionType, TransferView, Wallet, WalletId, WalletView,
};
use crate::services::lock_table::LockTable;
use crate::storage::{SharedTransactionLog, SharedWalletStore};

/// Limits and defaults the engine enforces.
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerSettings {
    pub min_transfer_amount: Decimal,
    pub max_transfer_amount: Decimal,
    pub default_currency: Currency,
    /// Record a `FUND` transaction for a positive opening balance.
    pub audit_initial_balance: bool,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            min_transfer_amount: Decimal::from(10),
            max_transfer_amount: Decimal::from(1_000_000),
            default_currency: Currency::USD,
            audit_initial_balance: false,
        }
    }
}

impl LedgerSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.min_transfer_amount <= Decimal::ZERO {
            return Err("minimum transfer amount must be positive".to_string());
        }
        if self.max_transfer_amount <= Decimal::ZERO {
            return Err("maximum transfer amount must be positive".to_string());
        }
        if self.min_transfer_amount > self.max_transfer_amount {
            return Err(format!(
                "minimum transfer amount {} exceeds maximum {}",
                self.min_transfer_amount, self.max_transfer_amount
            ));
        }
        Ok(())
    }
}

pub struct LedgerEngine {
    wallets: SharedWalletStore,
    transactions: SharedTransactionLog,
    settings: LedgerSettings,
    wallet_locks: LockTable<WalletId>,
    reference_locks: LockTable<String>,
}

impl LedgerEngine {
    pub fn new(
        wallets: SharedWalletStore,
        transactions: SharedTransactionLog,
        settings: LedgerSettings,
    ) -> Self {
        Self {
            wallets,
            transactions,
            settings,
            wallet_locks: LockTable::new(),
            reference_locks: LockTable::new(),
        }
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    /// Open a wallet. Currency falls back to the configured default, balance to zero.
    pub async fn create_wallet(
        &self,
        currency: Option<Currency>,
        initial_balance: Option<Decimal>,
    ) -> LedgerResult<WalletView> {
        let balance = initial_balance.unwrap_or(Decimal::ZERO);
        if balance < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(
                "Initial balance must be non-negative".to_string(),
            ));
        }
        let currency = currency.unwrap_or(self.settings.default_currency);
        let now = Utc::now();
        let wallet = Wallet::new(Uuid::new_v4(), currency, balance, now);

        if self.settings.audit_initial_balance && balance > Decimal::ZERO {
            // Held so no reader sees the wallet before its opening record.
            let _guard = self.wallet_locks.write(&wallet.id).await;
            let opening = build_record(
                wallet.id,
                TransactionType::Fund,
                balance,
                Decimal::ZERO,
                None,
                now,
            )?
            .with_metadata(serde_json::json!({ "source": "initial_balance" }));
            let created = self.wallets.create(wallet).await?;
            if let Err(e) = self.transactions.append(vec![opening]).await {
                tracing::error!("Opening record for wallet {} not logged: {}", created.id, e);
                return Err(e.into());
            }
            tracing::info!("Wallet {} created with audited opening balance {}", created.id, balance);
            return Ok(created.into());
        }

        let created = self.wallets.create(wallet).await?;
        tracing::info!("Wallet {} created ({}, balance {})", created.id, created.currency, created.balance);
        Ok(created.into())
    }

    /// Credit `amount` to a wallet and record a `FUND` transaction.
    pub async fn fund_wallet(
        &self,
        wallet_id: WalletId,
        amount: Decimal,
        reference: Option<String>,
    ) -> LedgerResult<WalletView> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount("Amount must be positive".to_string()));
        }
        let reference = normalize_reference(reference);

        let _reference_guard = self.lock_reference(reference.as_deref()).await;
        self.ensure_reference_unused(reference.as_deref()).await?;

        let _wallet_guard = self.wallet_locks.write(&wallet_id).await;
        let wallet = self.load_wallet(wallet_id).await?;

        let now = Utc::now();
        let record = build_record(
            wallet.id,
            TransactionType::Fund,
            amount,
            wallet.balance,
            reference,
            now,
        )?;
        let mut funded = wallet.clone();
        funded.balance = record.balance_after;
        funded.updated_at = now;

        self.commit(vec![(wallet, funded.clone())], vec![record]).await?;
        tracing::info!("Wallet {} funded with {}, balance now {}", funded.id, amount, funded.balance);
        Ok(funded.into())
    }

    /// Move `amount` from one wallet to another, writing a `TRANSFER_OUT` and a
    /// `TRANSFER_IN` record. Checks run in a fixed order and the first failure wins.
    pub async fn transfer(
        &self,
        from_wallet_id: WalletId,
        to_wallet_id: WalletId,
        amount: Decimal,
        reference: Option<String>,
    ) -> LedgerResult<TransferView> {
        if amount > self.settings.max_transfer_amount {
            return Err(self.reject_transfer(format!(
                "Transfer amount exceeds maximum limit of {}",
                self.settings.max_transfer_amount
            )));
        }
        if amount < self.settings.min_transfer_amount {
            return Err(self.reject_transfer(format!(
                "Transfer amount is below minimum limit of {}",
                self.settings.min_transfer_amount
            )));
        }
        if from_wallet_id == to_wallet_id {
            return Err(self.reject_transfer("Cannot transfer to the same wallet".to_string()));
        }
        let reference = normalize_reference(reference);

        let _reference_guard = self.lock_reference(reference.as_deref()).await;
        self.ensure_reference_unused(reference.as_deref()).await?;

        let _wallet_guards = self
            .wallet_locks
            .write_all(&[from_wallet_id, to_wallet_id])
            .await;
        let sender = self.load_wallet(from_wallet_id).await?;
        let receiver = self.load_wallet(to_wallet_id).await?;

        if sender.currency != receiver.currency {
            return Err(self.reject_transfer("Currency mismatch between wallets".to_string()));
        }
        if sender.balance < amount {
            tracing::warn!(
                "Transfer from {} rejected: balance {} below {}",
                sender.id,
                sender.balance,
                amount
            );
            return Err(LedgerError::InsufficientBalance {
                current: sender.balance,
                required: amount,
            });
        }

        let now = Utc::now();
        let outgoing = build_record(
            sender.id,
            TransactionType::TransferOut,
            amount,
            sender.balance,
            reference.clone(),
            now,
        )?
        .with_counterparty(receiver.id);
        let incoming = build_record(
            receiver.id,
            TransactionType::TransferIn,
            amount,
            receiver.balance,
            reference,
            now,
        )?
        .with_counterparty(sender.id);

        let mut debited = sender.clone();
        debited.balance = outgoing.balance_after;
        debited.updated_at = now;
        let mut credited = receiver.clone();
        credited.balance = incoming.balance_after;
        credited.updated_at = now;

        self.commit(
            vec![(sender, debited.clone()), (receiver, credited.clone())],
            vec![outgoing, incoming],
        )
        .await?;

        tracing::info!("Transferred {} from {} to {}", amount, debited.id, credited.id);
        Ok(TransferView {
            sender_wallet: debited.into(),
            receiver_wallet: credited.into(),
        })
    }

    /// Wallet view together with its full history, newest first.
    pub async fn get_wallet_details(&self, wallet_id: WalletId) -> LedgerResult<WalletView> {
        let _guard = self.wallet_locks.read(&wallet_id).await;
        let wallet = self.load_wallet(wallet_id).await?;
        let history = self.transactions.find_by_wallet_id(wallet_id).await?;

        let mut view = WalletView::from(wallet);
        view.transactions = Some(history);
        Ok(view)
    }

    /// Every wallet, oldest first. Each record is read under its wallet's shared lock.
    pub async fn list_wallets(&self) -> LedgerResult<Vec<WalletView>> {
        let ids: Vec<WalletId> = self.wallets.find_all().await?.iter().map(|w| w.id).collect();
        let mut views = Vec::with_capacity(ids.len());
        for id in ids {
            let _guard = self.wallet_locks.read(&id).await;
            if let Some(wallet) = self.wallets.find_by_id(id).await? {
                views.push(WalletView::from(wallet));
            }
        }
        Ok(views)
    }

    async fn lock_reference(&self, reference: Option<&str>) -> Option<OwnedRwLockWriteGuard<()>> {
        match reference {
            Some(reference) => Some(self.reference_locks.write(&reference.to_string()).await),
            None => None,
        }
    }

    async fn ensure_reference_unused(&self, reference: Option<&str>) -> LedgerResult<()> {
        if let Some(reference) = reference {
            if self.transactions.find_by_reference(reference).await?.is_some() {
                tracing::warn!("Duplicate reference {} rejected", reference);
                return Err(LedgerError::DuplicateTransaction(reference.to_string()));
            }
        }
        Ok(())
    }

    async fn load_wallet(&self, wallet_id: WalletId) -> LedgerResult<Wallet> {
        self.wallets
            .find_by_id(wallet_id)
            .await?
            .ok_or_else(|| LedgerError::WalletNotFound(wallet_id.to_string()))
    }

    fn reject_transfer(&self, reason: String) -> LedgerError {
        tracing::warn!("Transfer rejected: {}", reason);
        LedgerError::InvalidTransfer(reason)
    }

    /// Persist wallet changes, then the transaction records. Callers hold the write locks
    /// of every wallet in `changes`. If any write fails the wallets already replaced are
    /// put back, so nothing from the operation remains.
    async fn commit(
        &self,
        changes: Vec<(Wallet, Wallet)>,
        records: Vec<Transaction>,
    ) -> LedgerResult<()> {
        let mut replaced: Vec<Wallet> = Vec::with_capacity(changes.len());
        for (before, after) in changes {
            if let Err(e) = self.wallets.update(after).await {
                tracing::error!("Wallet update failed for {}: {}", before.id, e);
                self.restore(replaced).await;
                return Err(e.into());
            }
            replaced.push(before);
        }

        match self.transactions.append(records).await {
            Ok(_) => Ok(()),
            Err(e) => {
                self.restore(replaced).await;
                match e {
                    StorageError::DuplicateReference(reference) => {
                        tracing::warn!("Reference {} registered concurrently, rolled back", reference);
                        Err(LedgerError::DuplicateTransaction(reference))
                    }
                    other => {
                        tracing::error!("Transaction log append failed: {}", other);
                        Err(other.into())
                    }
                }
            }
        }
    }

    async fn restore(&self, replaced: Vec<Wallet>) {
        for wallet in replaced.into_iter().rev() {
            let id = wallet.id;
            if let Err(e) = self.wallets.update(wallet).await {
                tracing::error!("Failed to restore wallet {} after aborted commit: {}", id, e);
            }
        }
    }
}

/// Successful record for the change, or `InvalidAmount` when the new balance
/// would leave the `Decimal` range.
fn build_record(
    wallet_id: WalletId,
    kind: TransactionType,
    amount: Decimal,
    balance_before: Decimal,
    reference: Option<String>,
    now: DateTime<Utc>,
) -> LedgerResult<Transaction> {
    Transaction::success(wallet_id, kind, amount, balance_before, reference, now).ok_or_else(|| {
        tracing::warn!("{} of {} on wallet {} rejected: balance out of range", kind, amount, wallet_id);
        LedgerError::InvalidAmount("Resulting balance exceeds supported range".to_string())
    })
}

/// Blank references count as absent.
fn normalize_reference(reference: Option<String>) -> Option<String> {
    reference.filter(|r| !r.trim().is_empty())
}
