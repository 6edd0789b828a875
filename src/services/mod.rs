pub mod ledger;
pub mod lock_table;

pub use ledger::{LedgerEngine, LedgerSettings};
pub use lock_table::LockTable;
