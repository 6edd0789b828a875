//! Ledger types: wallets, transactions, currency, ID aliases. Timestamps are chrono UTC, amounts are `Decimal`.

pub mod currency;
pub mod ids;
pub mod transaction;
pub mod wallet;

pub use currency::Currency;
pub use ids::{TransactionId, WalletId};
pub use transaction::{Transaction, TransactionStatus, TransactionType};
pub use wallet::{TransferView, Wallet, WalletView};
