//! Razorpay REST client.
//!
//! Only the two endpoints the gateway needs are wrapped:
//!
//! ```text
//! POST {api_base}/orders               create order
//! GET  {api_base}/payments/{id}        fetch payment
//! ```
//!
//! Both use HTTP basic auth with `key_id:key_secret`.

use crate::config::ProcessorConfig;
use crate::error::{Error, Result};
use crate::processor::{CreateOrderRequest, PaymentInfo, PaymentProcessor, ProcessorOrder};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Wire body for order creation.
#[derive(Debug, Serialize)]
struct OrderBody<'a> {
    amount: u64,
    currency: &'a str,
    receipt: &'a str,
    payment_capture: u8,
}

/// Error envelope returned on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

/// Client for the Razorpay orders and payments API.
pub struct RazorpayClient {
    http: reqwest::Client,
    api_base: String,
    key_id: String,
    key_secret: String,
    timeout: Duration,
}

impl RazorpayClient {
    /// Create a client from processor configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ProcessorConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("paydrop/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base)
    }

    /// Run a processor call under the configured deadline.
    async fn bounded<T>(&self, what: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Razorpay {what} timed out after {:?}", self.timeout);
                Err(Error::Upstream(format!("{what} timed out")))
            }
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        what: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("{what} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&body).map_or(body, |b| {
                format!("{}: {}", b.error.code, b.error.description)
            });
            warn!("Razorpay {what} rejected ({status}): {detail}");
            return Err(Error::Upstream(format!(
                "{what} rejected with {status}: {detail}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::Upstream(format!("{what} returned malformed body: {e}")))
    }
}

impl PaymentProcessor for RazorpayClient {
    fn create_order(&self, request: CreateOrderRequest) -> BoxFuture<'_, Result<ProcessorOrder>> {
        async move {
            debug!(
                "Creating Razorpay order: amount={} currency={} receipt={}",
                request.amount, request.currency, request.receipt
            );
            let body = OrderBody {
                amount: request.amount,
                currency: &request.currency,
                receipt: &request.receipt,
                payment_capture: u8::from(request.auto_capture),
            };
            let request = self.http.post(self.url("orders")).json(&body);
            let call = self.send("order creation", request);
            self.bounded("order creation", call).await
        }
        .boxed()
    }

    fn fetch_payment<'a>(&'a self, payment_id: &'a str) -> BoxFuture<'a, Result<PaymentInfo>> {
        async move {
            debug!("Fetching Razorpay payment {payment_id}");
            let path = format!("payments/{payment_id}");
            let call = self.send("payment fetch", self.http.get(self.url(&path)));
            self.bounded("payment fetch", call).await
        }
        .boxed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and return the request text.
    async fn one_shot_server(
        status_line: &'static str,
        body: &'static str,
        delay: Duration,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            tokio::time::sleep(delay).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            request
        });
        (format!("http://{addr}"), handle)
    }

    /// Read headers plus a `content-length` body.
    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).into_owned();
            if let Some(end) = text.find("\r\n\r\n") {
                let body_len = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    return text;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn client(api_base: String, timeout_secs: u64) -> RazorpayClient {
        RazorpayClient::new(&ProcessorConfig {
            key_id: "rzp_test_key".to_string(),
            key_secret: "secret".to_string(),
            api_base,
            timeout_secs,
        })
        .unwrap()
    }

    fn order_request() -> CreateOrderRequest {
        CreateOrderRequest {
            amount: 500,
            currency: "INR".to_string(),
            receipt: "rcpt_0011223344556677".to_string(),
            auto_capture: true,
        }
    }

    #[tokio::test]
    async fn test_create_order() {
        let (base, server) = one_shot_server(
            "200 OK",
            r#"{"id":"order_X","entity":"order","amount":500,"currency":"INR","status":"created"}"#,
            Duration::ZERO,
        )
        .await;

        let order = client(base, 5).create_order(order_request()).await.unwrap();
        assert_eq!(order.id, "order_X");
        assert_eq!(order.amount, 500);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /orders"));
        assert!(request.to_ascii_lowercase().contains("authorization: basic"));
        assert!(request.contains(r#""payment_capture":1"#));
        assert!(request.contains(r#""receipt":"rcpt_0011223344556677""#));
    }

    #[tokio::test]
    async fn test_fetch_payment() {
        let (base, server) = one_shot_server(
            "200 OK",
            r#"{"id":"pay_1","status":"captured","order_id":"order_X"}"#,
            Duration::ZERO,
        )
        .await;

        let info = client(base, 5).fetch_payment("pay_1").await.unwrap();
        assert!(info.is_captured());
        assert!(server.await.unwrap().starts_with("GET /payments/pay_1"));
    }

    #[tokio::test]
    async fn test_rejection_is_upstream_error() {
        let (base, _server) = one_shot_server(
            "400 Bad Request",
            r#"{"error":{"code":"BAD_REQUEST_ERROR","description":"amount too low"}}"#,
            Duration::ZERO,
        )
        .await;

        let err = client(base, 5).create_order(order_request()).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(ref m) if m.contains("amount too low")));
    }

    #[tokio::test]
    async fn test_timeout_is_upstream_error() {
        let (base, _server) = one_shot_server(
            "200 OK",
            r#"{"id":"pay_1","status":"captured"}"#,
            Duration::from_secs(3),
        )
        .await;

        let err = client(base, 1).fetch_payment("pay_1").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn test_unreachable_is_upstream_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{addr}"), 2)
            .fetch_payment("pay_1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }
}
