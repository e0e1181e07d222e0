//! Test harness that runs a real paydrop server on a loopback port.
//!
//! The `TestGateway` owns a temporary data directory (sled store and
//! protected files), a fake payment processor, and an HTTP client pointed at
//! the server. The server is shut down when the harness is dropped.

use futures::future::BoxFuture;
use futures::FutureExt;
use paydrop::processor::{CreateOrderRequest, PaymentInfo, PaymentState, ProcessorOrder};
use paydrop::{
    compute_signature, Error, GatewayBuilder, GatewayConfig, PaymentProcessor, ProcessorConfig,
    ShutdownHandle,
};
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// Key secret shared by the harness and the server.
pub const KEY_SECRET: &str = "e2e_key_secret";

/// Contents of the file sold as `banner1`.
pub const BANNER1: &[u8] = b"\x89PNG\r\n\x1a\n e2e banner one";

/// Processor that creates sequential orders and reports whatever payment
/// state the test set.
#[derive(Default)]
pub struct FakeProcessor {
    next_order: AtomicU64,
    next_payment: AtomicU64,
    payments: Mutex<HashMap<String, PaymentInfo>>,
}

impl FakeProcessor {
    /// Record a payment against `order_id` and return its id.
    pub fn pay(&self, order_id: &str, status: &str) -> String {
        let n = self.next_payment.fetch_add(1, Ordering::SeqCst);
        let payment_id = format!("pay_e2e{n}");
        self.payments.lock().insert(
            payment_id.clone(),
            PaymentInfo {
                id: payment_id.clone(),
                status: PaymentState::from(status.to_string()),
                order_id: Some(order_id.to_string()),
            },
        );
        payment_id
    }
}

impl PaymentProcessor for FakeProcessor {
    fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> BoxFuture<'_, paydrop::Result<ProcessorOrder>> {
        async move {
            let n = self.next_order.fetch_add(1, Ordering::SeqCst);
            Ok(ProcessorOrder {
                id: format!("order_e2e{n}"),
                amount: request.amount,
                currency: request.currency,
            })
        }
        .boxed()
    }

    fn fetch_payment<'a>(
        &'a self,
        payment_id: &'a str,
    ) -> BoxFuture<'a, paydrop::Result<PaymentInfo>> {
        async move {
            self.payments
                .lock()
                .get(payment_id)
                .cloned()
                .ok_or_else(|| Error::Upstream(format!("no such payment {payment_id}")))
        }
        .boxed()
    }
}

/// Knobs for a test server.
#[derive(Debug, Clone)]
pub struct TestGatewayConfig {
    /// Token lifetime in seconds.
    pub download_ttl_secs: u64,
    /// Return the live token on repeat verification.
    pub single_token_per_order: bool,
}

impl Default for TestGatewayConfig {
    fn default() -> Self {
        Self {
            download_ttl_secs: 300,
            single_token_per_order: true,
        }
    }
}

/// A running server plus everything needed to talk to it.
pub struct TestGateway {
    base: String,
    client: reqwest::Client,
    processor: Arc<FakeProcessor>,
    shutdown: ShutdownHandle,
    task: Option<JoinHandle<paydrop::Result<()>>>,
    dir: TempDir,
}

impl TestGateway {
    /// Start a server with default settings.
    pub async fn start() -> Self {
        Self::start_with(TestGatewayConfig::default()).await
    }

    /// Start a server with custom settings.
    #[allow(clippy::unwrap_used, clippy::expect_used)]
    pub async fn start_with(options: TestGatewayConfig) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let protected = dir.path().join("protected");
        std::fs::create_dir_all(&protected).unwrap();
        std::fs::write(protected.join("banner1-clean.png"), BANNER1).unwrap();
        std::fs::write(protected.join("banner2-clean.jpg"), b"jpeg banner two").unwrap();

        let config = GatewayConfig {
            listen: "127.0.0.1:0".parse().unwrap(),
            data_dir: dir.path().join("data"),
            protected_dir: protected,
            download_ttl_secs: options.download_ttl_secs,
            single_token_per_order: options.single_token_per_order,
            processor: ProcessorConfig {
                key_id: "rzp_test_e2e".to_string(),
                key_secret: KEY_SECRET.to_string(),
                ..Default::default()
            },
            ..Default::default()
        };

        let processor = Arc::new(FakeProcessor::default());
        let running = GatewayBuilder::new(config)
            .with_processor(processor.clone())
            .build()
            .await
            .expect("build gateway");
        let base = format!("http://{}", running.local_addr());
        let shutdown = running.shutdown_handle();
        let task = tokio::spawn(running.run());

        Self {
            base,
            client: reqwest::Client::new(),
            processor,
            shutdown,
            task: Some(task),
            dir,
        }
    }

    /// Fake processor behind the server.
    pub fn processor(&self) -> &FakeProcessor {
        &self.processor
    }

    /// Directory the protected files live in.
    pub fn protected_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("protected")
    }

    /// Full URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// POST a JSON body and return status plus parsed JSON.
    #[allow(clippy::unwrap_used)]
    pub async fn post_json(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let response = self.client.post(self.url(path)).json(body).send().await.unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    /// GET `/download` and return status, headers and body.
    #[allow(clippy::unwrap_used)]
    pub async fn download(
        &self,
        token: &str,
    ) -> (StatusCode, reqwest::header::HeaderMap, Vec<u8>) {
        let response = self
            .client
            .get(self.url(&format!("/download?token={token}")))
            .send()
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        (status, headers, response.bytes().await.unwrap().to_vec())
    }

    /// Order `file_id`, pay for it, and return `(order_id, payment_id, signature)`.
    #[allow(clippy::unwrap_used)]
    pub async fn buy(&self, file_id: &str) -> (String, String, String) {
        let (status, order) = self
            .post_json("/order", &serde_json::json!({ "fileId": file_id }))
            .await;
        assert_eq!(status, StatusCode::OK, "order failed: {order}");
        let order_id = order["orderId"].as_str().unwrap().to_string();
        let payment_id = self.processor.pay(&order_id, "captured");
        let signature = compute_signature(KEY_SECRET.as_bytes(), &order_id, &payment_id).unwrap();
        (order_id, payment_id, signature)
    }

    /// Buy `file_id` and verify the payment, returning the download token.
    #[allow(clippy::unwrap_used)]
    pub async fn buy_token(&self, file_id: &str) -> String {
        let (order_id, payment_id, signature) = self.buy(file_id).await;
        let (status, verified) = self
            .post_json(
                "/verify",
                &serde_json::json!({
                    "payment_id": payment_id,
                    "order_id": order_id,
                    "signature": signature,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "verify failed: {verified}");
        verified["downloadToken"].as_str().unwrap().to_string()
    }

    /// Stop the server and wait for it to drain.
    #[allow(clippy::unwrap_used)]
    pub async fn stop(mut self) {
        self.shutdown.shutdown();
        if let Some(task) = self.task.take() {
            task.await.unwrap().unwrap();
        }
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
