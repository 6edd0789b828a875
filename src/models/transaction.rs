use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{TransactionId, WalletId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Fund,
    TransferIn,
    TransferOut,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Fund => "FUND",
            TransactionType::TransferIn => "TRANSFER_IN",
            TransactionType::TransferOut => "TRANSFER_OUT",
        }
    }

    /// True for types that reduce the owning wallet's balance.
    pub fn is_debit(&self) -> bool {
        matches!(self, TransactionType::TransferOut)
    }

    /// Balance after applying `amount` of this type, or `None` when it leaves the
    /// representable `Decimal` range.
    pub fn apply(&self, balance: Decimal, amount: Decimal) -> Option<Decimal> {
        if self.is_debit() {
            balance.checked_sub(amount)
        } else {
            balance.checked_add(amount)
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Only `Success` records reach the log; a failed operation aborts before anything is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Success,
    Failed,
}

/// Immutable audit record of one balance change on one wallet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub wallet_id: WalletId,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(with = "crate::utils::amount")]
    pub amount: Decimal,
    #[serde(with = "crate::utils::amount")]
    pub balance_before: Decimal,
    #[serde(with = "crate::utils::amount")]
    pub balance_after: Decimal,
    pub status: TransactionStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub related_wallet_id: Option<WalletId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Build a successful record for `amount` moving `wallet_id` away from `balance_before`.
    /// `None` if the resulting balance overflows.
    pub fn success(
        wallet_id: WalletId,
        kind: TransactionType,
        amount: Decimal,
        balance_before: Decimal,
        reference: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Option<Self> {
        let balance_after = kind.apply(balance_before, amount)?;
        Some(Self {
            id: Uuid::new_v4(),
            wallet_id,
            kind,
            amount,
            balance_before,
            balance_after,
            status: TransactionStatus::Success,
            reference,
            related_wallet_id: None,
            metadata: None,
            created_at,
        })
    }

    pub fn with_counterparty(mut self, related_wallet_id: WalletId) -> Self {
        let key = if self.kind.is_debit() { "toWalletId" } else { "fromWalletId" };
        self.related_wallet_id = Some(related_wallet_id);
        let mut metadata = serde_json::Map::new();
        metadata.insert(key.to_string(), serde_json::Value::String(related_wallet_id.to_string()));
        self.metadata = Some(serde_json::Value::Object(metadata));
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
