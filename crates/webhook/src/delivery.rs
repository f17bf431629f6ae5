use std::time::Duration;

use driftwatch_core::{DeliveryResult, WebhookConfig, WebhookPayload};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, instrument, warn};

use crate::error::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Fixed backoff schedule between retry attempts. Four total attempts:
/// one immediate, then one after each of these delays.
const RETRY_DELAYS_SECS: [u64; 3] = [1, 5, 15];

/// Status codes worth retrying. Any other 4xx is treated as a completed
/// delivery: the remote end understood and rejected the request, and
/// retrying it would not help.
const RETRYABLE_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];

fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUS_CODES.contains(&status)
}

/// HMAC-SHA256-signs and delivers webhook notifications, retrying
/// transient failures on a fixed backoff schedule.
pub struct WebhookDelivery {
    client: reqwest::Client,
    dry_run: bool,
}

impl WebhookDelivery {
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            dry_run,
        }
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, dry_run: bool) -> Self {
        Self { client, dry_run }
    }

    /// Deliver `payload` to the target described by `config`.
    ///
    /// In dry-run mode, returns a successful result immediately without
    /// making any network call. Otherwise POSTs the canonical payload
    /// body with up to 4 attempts total, sleeping `[1s, 5s, 15s]` between
    /// attempts that hit a retryable failure.
    #[instrument(skip(self, payload), fields(target = %config.name, source = %payload.source_name))]
    pub async fn deliver(&self, payload: &WebhookPayload, config: &WebhookConfig) -> DeliveryResult {
        if self.dry_run {
            debug!("dry run: skipping webhook delivery");
            return DeliveryResult::dry_run();
        }

        let body = payload.to_canonical_string();
        let headers = match self.build_headers(&body, payload, config) {
            Ok(headers) => headers,
            Err(err) => return DeliveryResult::failed(err.to_string(), 0, 0),
        };

        let start = std::time::Instant::now();
        let mut last_error: Option<String> = None;
        let mut last_status: Option<u16> = None;
        let mut attempts = 0u32;

        let schedule = RETRY_DELAYS_SECS.iter().copied().chain(std::iter::once(0));
        for (index, delay_secs) in schedule.enumerate() {
            attempts = index as u32 + 1;

            let mut request = self
                .client
                .post(&config.url)
                .timeout(Duration::from_secs(config.timeout_seconds))
                .body(body.clone());
            for (name, value) in &headers {
                request = request.header(name, value);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    last_status = Some(status);

                    if status < 400 {
                        return DeliveryResult::ok(status, elapsed_ms(start), attempts);
                    }
                    if !is_retryable_status(status) {
                        return DeliveryResult::ok(status, elapsed_ms(start), attempts);
                    }
                    last_error = Some(format!("HTTP {status}"));
                }
                Err(err) if err.is_timeout() => {
                    last_error = Some("request timed out".to_owned());
                }
                Err(err) => {
                    last_error = Some(format!("connection failed: {err}"));
                }
            }

            let is_last_attempt = index == RETRY_DELAYS_SECS.len();
            if delay_secs > 0 && !is_last_attempt {
                warn!(attempt = attempts, delay_secs, "webhook delivery failed, retrying");
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
            }
        }

        let mut result = DeliveryResult::failed(
            last_error.unwrap_or_else(|| "delivery failed".to_owned()),
            elapsed_ms(start),
            attempts,
        );
        result.status_code = last_status;
        result
    }

    fn build_headers(
        &self,
        body: &str,
        payload: &WebhookPayload,
        config: &WebhookConfig,
    ) -> Result<Vec<(String, String)>, WebhookError> {
        let mut headers = vec![
            ("Content-Type".to_owned(), "application/json".to_owned()),
            ("X-DriftWatch-Event".to_owned(), payload.event_type.as_str().to_owned()),
            ("X-DriftWatch-Timestamp".to_owned(), payload.timestamp.to_rfc3339()),
            ("X-DriftWatch-Event-ID".to_owned(), payload.event_id.to_string()),
        ];

        if let Some(secret) = &config.secret {
            let signature = sign(secret, body)?;
            headers.push(("X-DriftWatch-Signature".to_owned(), format!("sha256={signature}")));
        }

        Ok(headers)
    }
}

fn sign(secret: &str, body: &str) -> Result<String, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| WebhookError::SigningError(e.to_string()))?;
    mac.update(body.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn elapsed_ms(start: std::time::Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use driftwatch_core::{Decision, DecisionStatus, EventType, Metrics};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    struct MockWebhookServer {
        listener: TcpListener,
        base_url: String,
    }

    impl MockWebhookServer {
        async fn start() -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let port = listener.local_addr().unwrap().port();
            Self {
                listener,
                base_url: format!("http://127.0.0.1:{port}"),
            }
        }

        async fn respond_once(self, status: u16, body: &str) -> Vec<u8> {
            let (mut stream, _) = self.listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16384];
            let n = stream.read(&mut buf).await.unwrap();
            buf.truncate(n);

            let response = format!(
                "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            buf
        }
    }

    fn sample_payload() -> WebhookPayload {
        WebhookPayload::new(
            EventType::Anomaly,
            Utc::now(),
            "orders_daily".into(),
            "sql",
            Decision {
                status: DecisionStatus::Anomaly,
                reasons: vec![],
                metrics: Metrics::default(),
                baseline_summary: None,
                confidence: 1.0,
            },
            "driftwatch-agent",
        )
    }

    fn config_for(url: String) -> WebhookConfig {
        WebhookConfig {
            name: "slack".into(),
            url,
            secret: Some("s3cr3t".into()),
            events: vec!["anomaly".into()],
            timeout_seconds: 5,
        }
    }

    #[tokio::test]
    async fn dry_run_never_touches_network() {
        let delivery = WebhookDelivery::new(true);
        let config = config_for("http://127.0.0.1:0/unreachable".into());
        let result = delivery.deliver(&sample_payload(), &config).await;
        assert!(result.success);
        assert_eq!(result.attempts, 0);
        assert_eq!(result.status_code, Some(200));
    }

    #[tokio::test]
    async fn success_response_on_first_attempt() {
        let server = MockWebhookServer::start().await;
        let config = config_for(server.base_url.clone());
        let handle = tokio::spawn(server.respond_once(200, r#"{"ok":true}"#));

        let delivery = WebhookDelivery::new(false);
        let result = delivery.deliver(&sample_payload(), &config).await;
        handle.await.unwrap();

        assert!(result.success);
        assert_eq!(result.status_code, Some(200));
        assert_eq!(result.attempts, 1);
    }

    #[tokio::test]
    async fn non_retryable_4xx_is_reported_as_delivered() {
        let server = MockWebhookServer::start().await;
        let config = config_for(server.base_url.clone());
        let handle = tokio::spawn(server.respond_once(404, r#"{"error":"not found"}"#));

        let delivery = WebhookDelivery::new(false);
        let result = delivery.deliver(&sample_payload(), &config).await;
        handle.await.unwrap();

        assert!(result.success);
        assert_eq!(result.status_code, Some(404));
        assert_eq!(result.attempts, 1);
    }

    #[tokio::test]
    async fn signature_header_present_when_secret_configured() {
        let server = MockWebhookServer::start().await;
        let config = config_for(server.base_url.clone());
        let handle = tokio::spawn(async move {
            let (mut stream, _) = server.listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16384];
            let n = stream.read(&mut buf).await.unwrap();
            buf.truncate(n);
            let response = "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            buf
        });

        let delivery = WebhookDelivery::new(false);
        let _result = delivery.deliver(&sample_payload(), &config).await;
        let request_bytes = handle.await.unwrap();
        let request_text = String::from_utf8_lossy(&request_bytes);
        assert!(request_text.contains("X-DriftWatch-Signature: sha256="));
    }

    #[test]
    fn sign_matches_known_vector() {
        let signature = sign("secret", "body").unwrap();
        assert_eq!(signature.len(), 64);
    }
}
