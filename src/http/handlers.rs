//! Route handlers.

use crate::error::Error;
use crate::http::response::{ApiError, ApiSuccess, PlainError};
use crate::http::AppState;
use axum::body::Body;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Deserializer, Serialize};
use tokio_util::io::ReaderStream;

/// `POST /order` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    /// Asset to buy.
    #[serde(default)]
    pub file_id: Option<String>,
    /// Amount in minor units; number or numeric string.
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<u64>,
}

/// `POST /order` success payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    /// Processor order id.
    pub order_id: String,
    /// Amount in minor units.
    pub amount: u64,
    /// ISO currency code.
    pub currency: String,
    /// Public processor key for checkout.
    pub rzp_key_id: String,
}

/// `POST /verify` body. Accepts plain and processor-prefixed field names.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyRequest {
    /// Processor payment id.
    #[serde(default, alias = "razorpay_payment_id")]
    pub payment_id: Option<String>,
    /// Processor order id.
    #[serde(default, alias = "razorpay_order_id")]
    pub order_id: Option<String>,
    /// Hex HMAC of `order_id|payment_id`.
    #[serde(default, alias = "razorpay_signature")]
    pub signature: Option<String>,
}

/// `POST /verify` success payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// Single-use download token.
    pub download_token: String,
    /// Seconds until the token expires.
    pub expires_in: u64,
}

/// `GET /download` query.
#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    /// Token to redeem.
    #[serde(default)]
    pub token: Option<String>,
}

fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(u64),
        Text(String),
    }

    match Option::<Amount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Amount::Number(n)) => Ok(Some(n)),
        Some(Amount::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid amount: {s}"))),
    }
}

fn malformed(rejection: &impl std::fmt::Display) -> Error {
    Error::InvalidRequest(format!("malformed request: {rejection}"))
}

/// Create a processor order for an asset.
pub async fn create_order(
    State(gateway): State<AppState>,
    payload: Result<Json<OrderRequest>, JsonRejection>,
) -> Result<ApiSuccess<OrderResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::new("order", malformed(&e)))?;

    let asset_id = request.file_id.unwrap_or_default();
    let amount = request.amount.unwrap_or_else(|| gateway.default_amount());

    let ticket = gateway
        .orders()
        .create_order(&asset_id, amount)
        .await
        .map_err(|e| ApiError::new("order", e))?;

    Ok(ApiSuccess::new(OrderResponse {
        order_id: ticket.order_id,
        amount: ticket.amount,
        currency: ticket.currency,
        rzp_key_id: ticket.key_id,
    }))
}

/// Verify a completed payment and issue a download token.
pub async fn verify_payment(
    State(gateway): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<ApiSuccess<VerifyResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::new("verify", malformed(&e)))?;

    let issued = gateway
        .payments()
        .verify_payment(
            request.payment_id.as_deref().unwrap_or_default(),
            request.order_id.as_deref().unwrap_or_default(),
            request.signature.as_deref().unwrap_or_default(),
        )
        .await
        .map_err(|e| ApiError::new("verify", e))?;

    Ok(ApiSuccess::new(VerifyResponse {
        download_token: issued.token,
        expires_in: issued.expires_in,
    }))
}

/// Redeem a token and stream its file as an attachment.
pub async fn download(
    State(gateway): State<AppState>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<Response, PlainError> {
    let Query(query) = query.map_err(|e| PlainError(malformed(&e)))?;
    let token = query.token.unwrap_or_default();

    let redemption = gateway
        .redemptions()
        .redeem(&token)
        .await
        .map_err(PlainError)?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        redemption.filename.replace(['"', '\\'], "_")
    );
    let headers = [
        (header::CONTENT_TYPE, content_type_for(&redemption.filename).to_string()),
        (header::CONTENT_DISPOSITION, disposition),
        (header::CONTENT_LENGTH, redemption.file.len.to_string()),
    ];
    let body = Body::from_stream(ReaderStream::new(redemption.file.file));

    Ok((headers, body).into_response())
}

/// Liveness probe.
pub async fn health(State(gateway): State<AppState>) -> impl IntoResponse {
    let stats = gateway.store_stats();
    Json(serde_json::json!({
        "status": "ok",
        "orders": stats.orders,
        "outstandingTokens": stats.tokens,
    }))
}

/// MIME type guessed from the file extension.
#[must_use]
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}
