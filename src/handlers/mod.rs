pub mod error;
pub mod wallets;

pub use error::ApiError;
pub use wallets::{
    create_wallet,
    fund_wallet,
    get_wallet,
    list_wallets,
    transfer,
    CreateWalletRequest,
    FundWalletRequest,
    TransferRequest,
};
