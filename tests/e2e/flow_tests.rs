//! Purchase and download flows over real HTTP.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::harness::{BANNER1, KEY_SECRET};
use super::{TestGateway, TestGatewayConfig};
use paydrop::compute_signature;
use reqwest::header;
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_order_reports_checkout_details() {
    let gw = TestGateway::start().await;

    let (status, body) = gw
        .post_json("/order", &json!({"fileId": "banner1", "amount": 500}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["amount"], 500);
    assert_eq!(body["currency"], "INR");
    assert_eq!(body["rzpKeyId"], "rzp_test_e2e");
    assert!(body["orderId"].as_str().unwrap().starts_with("order_e2e"));
    gw.stop().await;
}

#[tokio::test]
async fn test_order_requires_file_id() {
    let gw = TestGateway::start().await;

    let (status, body) = gw.post_json("/order", &json!({"amount": 500})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "fileId required");

    let (status, body) = gw.post_json("/order", &json!({"fileId": "banner9"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_purchase_then_single_download() {
    let gw = TestGateway::start().await;
    let (order_id, payment_id, signature) = gw.buy("banner1").await;

    let (status, verified) = gw
        .post_json(
            "/verify",
            &json!({
                "razorpay_payment_id": payment_id,
                "razorpay_order_id": order_id,
                "razorpay_signature": signature,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verified["success"], true);
    assert_eq!(verified["expiresIn"], 300);
    let token = verified["downloadToken"].as_str().unwrap();
    assert_eq!(token.len(), 32);

    let (status, headers, body) = gw.download(token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, BANNER1);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"banner1-clean.png\""
    );

    let (status, _, body) = gw.download(token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, b"invalid or used token");
    gw.stop().await;
}

#[tokio::test]
async fn test_forged_signature_is_refused() {
    let gw = TestGateway::start().await;
    let (order_id, payment_id, _) = gw.buy("banner1").await;
    let forged = compute_signature(b"not_the_secret", &order_id, &payment_id).unwrap();

    let (status, body) = gw
        .post_json(
            "/verify",
            &json!({"payment_id": payment_id, "order_id": order_id, "signature": forged}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "invalid signature");
}

#[tokio::test]
async fn test_uncaptured_payment_is_refused() {
    let gw = TestGateway::start().await;
    let (status, order) = gw.post_json("/order", &json!({"fileId": "banner2"})).await;
    assert_eq!(status, StatusCode::OK);
    let order_id = order["orderId"].as_str().unwrap();
    let payment_id = gw.processor().pay(order_id, "authorized");
    let signature = compute_signature(KEY_SECRET.as_bytes(), order_id, &payment_id).unwrap();

    let (status, body) = gw
        .post_json(
            "/verify",
            &json!({"payment_id": payment_id, "order_id": order_id, "signature": signature}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "payment not captured");
}

#[tokio::test]
async fn test_verify_requires_all_fields() {
    let gw = TestGateway::start().await;
    let (status, body) = gw
        .post_json("/verify", &json!({"payment_id": "pay_x", "order_id": "order_x"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "missing params");
}

#[tokio::test]
async fn test_expired_token_is_refused() {
    let gw = TestGateway::start_with(TestGatewayConfig {
        download_ttl_secs: 1,
        ..Default::default()
    })
    .await;
    let token = gw.buy_token("banner1").await;

    tokio::time::sleep(Duration::from_millis(2100)).await;

    let (status, _, body) = gw.download(&token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, b"token expired");

    let (status, _, body) = gw.download(&token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, b"invalid or used token");
    gw.stop().await;
}

#[tokio::test]
async fn test_repeat_verification_returns_live_token() {
    let gw = TestGateway::start().await;
    let (order_id, payment_id, signature) = gw.buy("banner1").await;
    let body = json!({"payment_id": payment_id, "order_id": order_id, "signature": signature});

    let (_, first) = gw.post_json("/verify", &body).await;
    let (status, second) = gw.post_json("/verify", &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["downloadToken"], second["downloadToken"]);

    let token = first["downloadToken"].as_str().unwrap();
    let (status, _, _) = gw.download(token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, third) = gw.post_json("/verify", &body).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(third["success"], false);
    gw.stop().await;
}

#[tokio::test]
async fn test_multi_mint_when_configured() {
    let gw = TestGateway::start_with(TestGatewayConfig {
        single_token_per_order: false,
        ..Default::default()
    })
    .await;
    let (order_id, payment_id, signature) = gw.buy("banner2").await;
    let body = json!({"payment_id": payment_id, "order_id": order_id, "signature": signature});

    let (_, first) = gw.post_json("/verify", &body).await;
    let (_, second) = gw.post_json("/verify", &body).await;
    assert_ne!(first["downloadToken"], second["downloadToken"]);

    for verified in [first, second] {
        let (status, _, body) = gw.download(verified["downloadToken"].as_str().unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"jpeg banner two");
    }
    gw.stop().await;
}

#[tokio::test]
async fn test_file_removed_after_purchase() {
    let gw = TestGateway::start().await;
    let token = gw.buy_token("banner1").await;
    std::fs::remove_file(gw.protected_dir().join("banner1-clean.png")).unwrap();

    let (status, _, body) = gw.download(&token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, b"file not found");

    let (status, _, _) = gw.download(&token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    gw.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_downloads_serve_once() {
    let gw = Arc::new(TestGateway::start().await);
    let token = gw.buy_token("banner1").await;

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let gw = Arc::clone(&gw);
            let token = token.clone();
            tokio::spawn(async move { gw.download(&token).await.0 })
        })
        .collect();

    let statuses: Vec<StatusCode> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == StatusCode::FORBIDDEN)
            .count(),
        15
    );
}

#[tokio::test]
async fn test_health() {
    let gw = TestGateway::start().await;
    let (status, body) = {
        let response = reqwest::get(gw.url("/health")).await.unwrap();
        let status = response.status();
        (status, response.json::<serde_json::Value>().await.unwrap())
    };
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    gw.stop().await;
}
