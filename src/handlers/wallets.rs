use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, State},
    http::StatusCode,
    response::Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::handlers::error::ApiError;
use crate::models::{ids::parse_uuid, Currency, TransferView, WalletId, WalletView};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateWalletRequest {
    pub currency: Option<String>,
    #[serde(default, with = "crate::utils::amount::option")]
    pub initial_balance: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FundWalletRequest {
    #[serde(default, with = "crate::utils::amount::option")]
    pub amount: Option<Decimal>,
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransferRequest {
    pub from_wallet_id: Option<String>,
    pub to_wallet_id: Option<String>,
    #[serde(default, with = "crate::utils::amount::option")]
    pub amount: Option<Decimal>,
    pub reference: Option<String>,
}

impl CreateWalletRequest {
    fn validate(&self) -> Result<(Currency, Option<Decimal>), Vec<String>> {
        let mut errors = Vec::new();
        let currency = self.currency.as_deref().and_then(Currency::parse);
        if currency.is_none() {
            errors.push(format!("Currency must be {}", Currency::supported_codes()));
        }
        if matches!(self.initial_balance, Some(b) if b < Decimal::ZERO) {
            errors.push("Initial balance must be non-negative".to_string());
        }
        match currency {
            Some(currency) if errors.is_empty() => Ok((currency, self.initial_balance)),
            _ => Err(errors),
        }
    }
}

fn validate_amount(amount: Option<Decimal>, errors: &mut Vec<String>) -> Decimal {
    match amount {
        None => {
            errors.push("amount must be a number".to_string());
            Decimal::ZERO
        }
        Some(a) if a <= Decimal::ZERO => {
            errors.push("Amount must be positive".to_string());
            a
        }
        Some(a) => a,
    }
}

fn validate_wallet_id(raw: Option<&str>, field: &str, invalid: &str, errors: &mut Vec<String>) -> Option<WalletId> {
    match raw {
        None => {
            errors.push(format!("{} is required", field));
            None
        }
        Some(raw) => match parse_uuid(raw, field) {
            // Wallet ids are always issued as v4
            Ok(id) if id.get_version_num() == 4 => Some(id),
            _ => {
                errors.push(invalid.to_string());
                None
            }
        },
    }
}

/// Path ids that are not UUIDs cannot name a wallet, so they resolve to "not found".
fn path_wallet_id(raw: &str) -> Result<WalletId, ApiError> {
    parse_uuid(raw, "wallet id")
        .map_err(|_| ApiError::from(crate::error::LedgerError::WalletNotFound(raw.to_string())))
}

/// POST /wallets
pub async fn create_wallet(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    payload: Result<Json<CreateWalletRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WalletView>), ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::from(e).at(&uri))?;
    let (currency, initial_balance) = payload
        .validate()
        .map_err(|errors| ApiError::validation(errors).at(&uri))?;

    let wallet = state
        .engine
        .create_wallet(Some(currency), initial_balance)
        .await
        .map_err(|e| ApiError::from(e).at(&uri))?;

    Ok((StatusCode::CREATED, Json(wallet)))
}

/// GET /wallets
pub async fn list_wallets(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<Vec<WalletView>>, ApiError> {
    let wallets = state
        .engine
        .list_wallets()
        .await
        .map_err(|e| ApiError::from(e).at(&uri))?;
    Ok(Json(wallets))
}

/// POST /wallets/:id/fund
pub async fn fund_wallet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    OriginalUri(uri): OriginalUri,
    payload: Result<Json<FundWalletRequest>, JsonRejection>,
) -> Result<Json<WalletView>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::from(e).at(&uri))?;
    let mut errors = Vec::new();
    let amount = validate_amount(payload.amount, &mut errors);
    if !errors.is_empty() {
        return Err(ApiError::validation(errors).at(&uri));
    }
    let wallet_id = path_wallet_id(&id).map_err(|e| e.at(&uri))?;

    let wallet = state
        .engine
        .fund_wallet(wallet_id, amount, payload.reference)
        .await
        .map_err(|e| ApiError::from(e).at(&uri))?;

    Ok(Json(wallet))
}

/// POST /wallets/transfer
pub async fn transfer(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<TransferView>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::from(e).at(&uri))?;
    let mut errors = Vec::new();
    let from = validate_wallet_id(
        payload.from_wallet_id.as_deref(),
        "fromWalletId",
        "Invalid sender wallet ID",
        &mut errors,
    );
    let to = validate_wallet_id(
        payload.to_wallet_id.as_deref(),
        "toWalletId",
        "Invalid receiver wallet ID",
        &mut errors,
    );
    let amount = validate_amount(payload.amount, &mut errors);
    let (from, to) = match (from, to) {
        (Some(from), Some(to)) if errors.is_empty() => (from, to),
        _ => return Err(ApiError::validation(errors).at(&uri)),
    };

    let result = state
        .engine
        .transfer(from, to, amount, payload.reference)
        .await
        .map_err(|e| ApiError::from(e).at(&uri))?;

    Ok(Json(result))
}

/// GET /wallets/:id
pub async fn get_wallet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<WalletView>, ApiError> {
    let wallet_id = path_wallet_id(&id).map_err(|e| e.at(&uri))?;
    let wallet = state
        .engine
        .get_wallet_details(wallet_id)
        .await
        .map_err(|e| ApiError::from(e).at(&uri))?;
    Ok(Json(wallet))
}
