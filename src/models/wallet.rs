use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Currency, Transaction, WalletId};

/// Stored wallet record. `balance` is the single source of truth for available funds
/// and never goes below zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: WalletId,
    pub currency: Currency,
    #[serde(with = "crate::utils::amount")]
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(id: WalletId, currency: Currency, balance: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            id,
            currency,
            balance,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Wallet as returned to callers. `transactions` is only filled in by the details view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletView {
    pub id: WalletId,
    pub currency: Currency,
    #[serde(with = "crate::utils::amount")]
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub transactions: Option<Vec<Transaction>>,
}

impl From<&Wallet> for WalletView {
    fn from(wallet: &Wallet) -> Self {
        Self {
            id: wallet.id,
            currency: wallet.currency,
            balance: wallet.balance,
            created_at: wallet.created_at,
            updated_at: wallet.updated_at,
            transactions: None,
        }
    }
}

impl From<Wallet> for WalletView {
    fn from(wallet: Wallet) -> Self {
        WalletView::from(&wallet)
    }
}

/// Both sides of a completed transfer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferView {
    pub sender_wallet: WalletView,
    pub receiver_wallet: WalletView,
}
