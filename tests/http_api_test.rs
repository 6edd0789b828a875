// HTTP API tests
// Drive the full router (validation, error mapping, middleware) through axum-test.

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use test_helpers::*;

fn server() -> TestServer {
    TestServer::new(wallet_ledger_api::app(create_test_app_state(0))).unwrap()
}

async fn create_wallet(server: &TestServer, initial_balance: i64) -> String {
    let response = server
        .post("/wallets")
        .json(&json!({ "currency": "USD", "initialBalance": initial_balance }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let server = server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn test_create_wallet() {
    let server = server();
    let response = server
        .post("/wallets")
        .json(&json!({ "currency": "USD", "initialBalance": 1000 }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["currency"], "USD");
    assert_eq!(body["balance"], 1000);
    assert!(Uuid::parse_str(body["id"].as_str().unwrap()).is_ok());
    assert!(body["createdAt"].is_string());
    assert_eq!(body["createdAt"], body["updatedAt"]);
    assert!(body.get("transactions").is_none());
}

#[tokio::test]
async fn test_create_wallet_without_balance() {
    let server = server();
    let response = server.post("/wallets").json(&json!({ "currency": "USD" })).await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["balance"], 0);
}

#[tokio::test]
async fn test_create_wallet_validation() {
    let server = server();

    let response = server
        .post("/wallets")
        .json(&json!({ "currency": "EUR", "initialBalance": -5 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["error"], "Bad Request");
    assert_eq!(body["path"], "/wallets");
    assert_eq!(
        body["message"],
        json!(["Currency must be USD", "Initial balance must be non-negative"])
    );

    // currency is required
    let response = server.post("/wallets").json(&json!({})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_fields_are_rejected() {
    let server = server();
    let response = server
        .post("/wallets")
        .json(&json!({ "currency": "USD", "owner": "alice" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["message"].is_array());
}

#[tokio::test]
async fn test_fund_wallet() {
    let server = server();
    let id = create_wallet(&server, 1000).await;

    let response = server
        .post(&format!("/wallets/{}/fund", id))
        .json(&json!({ "amount": 500, "reference": "fund-001" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["balance"], 1500);

    // replaying the reference is a conflict
    let response = server
        .post(&format!("/wallets/{}/fund", id))
        .json(&json!({ "amount": 500, "reference": "fund-001" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"], "Duplicate Transaction");
    assert_eq!(body["message"], "Transaction with reference fund-001 already exists");
}

#[tokio::test]
async fn test_fund_wallet_decimal_string_amount() {
    let server = server();
    let id = create_wallet(&server, 100).await;

    let response = server
        .post(&format!("/wallets/{}/fund", id))
        .json(&json!({ "amount": "99.99" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["balance"], json!(199.99));
}

#[tokio::test]
async fn test_fund_wallet_validation() {
    let server = server();
    let id = create_wallet(&server, 0).await;

    let response = server
        .post(&format!("/wallets/{}/fund", id))
        .json(&json!({ "amount": 0 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], json!(["Amount must be positive"]));

    let response = server.post(&format!("/wallets/{}/fund", id)).json(&json!({})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], json!(["amount must be a number"]));
}

#[tokio::test]
async fn test_fund_unknown_wallet() {
    let server = server();
    let missing = Uuid::new_v4();
    let response = server
        .post(&format!("/wallets/{}/fund", missing))
        .json(&json!({ "amount": 10 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["statusCode"], 404);
    assert_eq!(body["error"], "Wallet Not Found");
    assert_eq!(body["message"], format!("Wallet with ID {} not found", missing));
}

#[tokio::test]
async fn test_transfer() {
    let server = server();
    let sender = create_wallet(&server, 5000).await;
    let receiver = create_wallet(&server, 1000).await;

    let response = server
        .post("/wallets/transfer")
        .json(&json!({
            "fromWalletId": sender,
            "toWalletId": receiver,
            "amount": 500,
            "reference": "transfer-001"
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["senderWallet"]["id"], sender.as_str());
    assert_eq!(body["senderWallet"]["balance"], 4500);
    assert_eq!(body["receiverWallet"]["id"], receiver.as_str());
    assert_eq!(body["receiverWallet"]["balance"], 1500);

    let details: Value = server.get(&format!("/wallets/{}", sender)).await.json();
    let history = details["transactions"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["type"], "TRANSFER_OUT");
    assert_eq!(history[0]["status"], "SUCCESS");
    assert_eq!(history[0]["relatedWalletId"], receiver.as_str());
    assert_eq!(history[0]["reference"], "transfer-001");
    assert_eq!(history[0]["metadata"]["toWalletId"], receiver.as_str());
}

#[tokio::test]
async fn test_transfer_rejections() {
    let server = server();
    let sender = create_wallet(&server, 100).await;
    let receiver = create_wallet(&server, 0).await;

    let response = server
        .post("/wallets/transfer")
        .json(&json!({ "fromWalletId": sender, "toWalletId": receiver, "amount": 5 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid Transfer");
    assert_eq!(body["message"], "Transfer amount is below minimum limit of 10");

    let response = server
        .post("/wallets/transfer")
        .json(&json!({ "fromWalletId": sender, "toWalletId": sender, "amount": 50 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], "Cannot transfer to the same wallet");

    let response = server
        .post("/wallets/transfer")
        .json(&json!({ "fromWalletId": sender, "toWalletId": receiver, "amount": 10000 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Insufficient Balance");
    assert_eq!(body["message"], "Insufficient balance. Current: 100, Required: 10000");

    let missing = Uuid::new_v4().to_string();
    let response = server
        .post("/wallets/transfer")
        .json(&json!({ "fromWalletId": sender, "toWalletId": missing, "amount": 50 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transfer_validation_messages() {
    let server = server();
    let response = server
        .post("/wallets/transfer")
        .json(&json!({ "fromWalletId": "not-a-uuid", "amount": -1 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["message"],
        json!([
            "Invalid sender wallet ID",
            "toWalletId is required",
            "Amount must be positive"
        ])
    );
}

#[tokio::test]
async fn test_transfer_requires_v4_wallet_ids() {
    let server = server();
    let receiver = create_wallet(&server, 0).await;

    // well-formed, but a time-based (v1) id
    let response = server
        .post("/wallets/transfer")
        .json(&json!({
            "fromWalletId": "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
            "toWalletId": receiver,
            "amount": 50
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], json!(["Invalid sender wallet ID"]));
}

#[tokio::test]
async fn test_get_wallet_details() {
    let server = server();
    let id = create_wallet(&server, 0).await;
    server
        .post(&format!("/wallets/{}/fund", id))
        .json(&json!({ "amount": 100 }))
        .await
        .assert_status_ok();
    server
        .post(&format!("/wallets/{}/fund", id))
        .json(&json!({ "amount": 50 }))
        .await
        .assert_status_ok();

    let response = server.get(&format!("/wallets/{}", id)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["balance"], 150);
    let history = body["transactions"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["amount"], 50);
    assert_eq!(history[0]["balanceBefore"], 100);
    assert_eq!(history[0]["balanceAfter"], 150);
    assert_eq!(history[1]["type"], "FUND");
}

#[tokio::test]
async fn test_invalid_path_id_is_not_found() {
    let server = server();
    let response = server.get("/wallets/not-a-uuid").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["message"], "Wallet with ID not-a-uuid not found");
    assert_eq!(body["path"], "/wallets/not-a-uuid");
}

#[tokio::test]
async fn test_list_wallets() {
    let server = server();
    let first = create_wallet(&server, 10).await;
    let second = create_wallet(&server, 20).await;

    let response = server.get("/wallets").await;
    response.assert_status_ok();
    let wallets = response.json::<Vec<Value>>();
    assert_eq!(wallets.len(), 2);
    let ids: Vec<&str> = wallets.iter().filter_map(|w| w["id"].as_str()).collect();
    assert!(ids.contains(&first.as_str()));
    assert!(ids.contains(&second.as_str()));
    assert!(wallets.iter().all(|w| w.get("transactions").is_none()));
}

#[tokio::test]
async fn test_security_headers() {
    let server = server();
    let response = server.get("/wallets").await;
    assert_eq!(response.header("x-content-type-options").to_str().unwrap(), "nosniff");
    assert_eq!(response.header("x-frame-options").to_str().unwrap(), "DENY");
    assert_eq!(response.header("cache-control").to_str().unwrap(), "no-store");
}

#[tokio::test]
async fn test_rate_limit() {
    let server = TestServer::new(wallet_ledger_api::app(create_test_app_state(2))).unwrap();

    server.get("/wallets").await.assert_status_ok();
    server.get("/wallets").await.assert_status_ok();

    let response = server.get("/wallets").await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.json::<Value>()["statusCode"], 429);

    // health checks are never limited
    server.get("/health").await.assert_status_ok();
}
