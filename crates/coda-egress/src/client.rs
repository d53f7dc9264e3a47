// SPDX-FileCopyrightText: 2026 Coda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the ingress webhook endpoint.
//!
//! Provides [`IngressClient`] which handles envelope construction,
//! HMAC signing, bearer authorization, and error-body extraction.

use std::time::Duration;

use coda_config::IngressConfig;
use coda_core::{CodaError, HealthStatus};
use serde::Deserialize;
use tracing::debug;

use crate::envelope::{self, EnvelopePayload, IngressEnvelope, INGRESS_PATH};

/// Parameters for dispatching one persisted message.
#[derive(Debug, Clone)]
pub struct MessageDispatch {
    pub thread_id: String,
    pub client_msg_id: String,
    pub text: String,
    /// Defaults to `"auto"` upstream when the caller gave no hint.
    pub role_hint: String,
    pub message_type: String,
    pub extra: Option<serde_json::Value>,
}

/// 2xx acknowledgement from the ingress endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct IngressAck {
    pub success: bool,
    pub received: String,
    pub thread_id: String,
    pub message_id: String,
    #[serde(default)]
    pub estimated_processing_time: Option<f64>,
}

/// Non-2xx error body from the ingress endpoint.
#[derive(Debug, Deserialize)]
struct IngressErrorBody {
    error: String,
}

/// Client for the signed ingress webhook protocol.
#[derive(Clone)]
pub struct IngressClient {
    client: reqwest::Client,
    base_url: String,
    signing_secret: String,
    auth_token: Option<String>,
}

impl std::fmt::Debug for IngressClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngressClient")
            .field("base_url", &self.base_url)
            .field("signing_secret", &"[redacted]")
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl IngressClient {
    /// Creates a new ingress client from configuration.
    ///
    /// Requires `ingress.signing_secret`; without it no envelope can be
    /// signed and construction fails.
    pub fn new(config: &IngressConfig) -> Result<Self, CodaError> {
        let signing_secret = config
            .signing_secret
            .clone()
            .ok_or_else(|| CodaError::Config("ingress.signing_secret is required".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| CodaError::Egress {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            signing_secret,
            auth_token: config.auth_token.clone(),
        })
    }

    /// Overrides the base URL. Exists for test harnesses pointing the
    /// client at a mock server; production code takes the URL from config.
    #[doc(hidden)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Deliver one persisted message as a `message.created` envelope.
    pub async fn send_message(&self, dispatch: &MessageDispatch) -> Result<IngressAck, CodaError> {
        let envelope = IngressEnvelope::message(
            &dispatch.thread_id,
            &dispatch.client_msg_id,
            &dispatch.role_hint,
            &dispatch.message_type,
            EnvelopePayload {
                text: Some(dispatch.text.clone()),
                extra: dispatch.extra.clone(),
            },
        );
        self.post_envelope(&envelope).await
    }

    /// Deliver a generic event (`blackboard_update`, `task_update`, ...)
    /// sharing the message envelope's wire shape.
    pub async fn send_event(
        &self,
        event_type: &str,
        thread_id: &str,
        client_msg_id: &str,
        payload: EnvelopePayload,
    ) -> Result<IngressAck, CodaError> {
        let envelope = IngressEnvelope::event(event_type, thread_id, client_msg_id, payload);
        self.post_envelope(&envelope).await
    }

    async fn post_envelope(&self, envelope: &IngressEnvelope) -> Result<IngressAck, CodaError> {
        let body = serde_json::to_vec(envelope).map_err(|e| CodaError::Internal(format!(
            "failed to serialize envelope: {e}"
        )))?;
        let signature = envelope::sign(&self.signing_secret, &body);

        let mut request = self
            .client
            .post(format!("{}{INGRESS_PATH}", self.base_url))
            .header("content-type", "application/json")
            .header("x-signature", signature)
            .body(body);
        if let Some(ref token) = self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| CodaError::Egress {
            message: format!("HTTP request failed: {e}"),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        debug!(
            status = %status,
            event_type = %envelope.event_type,
            client_msg_id = %envelope.client_msg_id,
            "ingress response received"
        );

        if status.is_success() {
            let body = response.text().await.map_err(|e| CodaError::Egress {
                message: format!("failed to read ingress response body: {e}"),
                source: Some(Box::new(e)),
            })?;
            let ack: IngressAck =
                serde_json::from_str(&body).map_err(|e| CodaError::Egress {
                    message: format!("failed to parse ingress acknowledgement: {e}"),
                    source: Some(Box::new(e)),
                })?;
            return Ok(ack);
        }

        // Prefer the recipient's reported error message over the status line.
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<IngressErrorBody>(&body) {
            Ok(err_body) => err_body.error,
            Err(_) => format!("ingress returned {status}"),
        };
        Err(CodaError::Egress {
            message,
            source: None,
        })
    }

    /// Probe the ingress endpoint. Any 2xx response means healthy; network
    /// failures and non-2xx statuses report unhealthy rather than erroring.
    pub async fn health_check(&self) -> HealthStatus {
        let result = self
            .client
            .get(format!("{}{INGRESS_PATH}", self.base_url))
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => HealthStatus::Healthy,
            Ok(response) => {
                HealthStatus::Unhealthy(format!("ingress probe returned {}", response.status()))
            }
            Err(e) => HealthStatus::Unhealthy(format!("ingress probe failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

    /// Matcher verifying X-Signature is a valid HMAC of the exact body bytes.
    struct ValidSignature {
        secret: String,
    }

    impl Match for ValidSignature {
        fn matches(&self, request: &Request) -> bool {
            let Some(sig) = request
                .headers
                .get("x-signature")
                .and_then(|v| v.to_str().ok())
            else {
                return false;
            };
            sig == envelope::sign(&self.secret, &request.body)
        }
    }

    fn test_config(secret: &str, token: Option<&str>) -> IngressConfig {
        IngressConfig {
            base_url: "http://unused.invalid".into(),
            signing_secret: Some(secret.into()),
            auth_token: token.map(str::to_string),
            request_timeout_secs: 5,
        }
    }

    fn test_dispatch() -> MessageDispatch {
        MessageDispatch {
            thread_id: "thread-1".into(),
            client_msg_id: "01ARZ3NDEKTSV4RRFFQ69G5FAV".into(),
            text: "hello".into(),
            role_hint: "auto".into(),
            message_type: "user_request".into(),
            extra: None,
        }
    }

    fn ack_body() -> serde_json::Value {
        serde_json::json!({
            "success": true,
            "received": "2026-02-01T00:00:00.000Z",
            "thread_id": "thread-1",
            "message_id": "01ARZ3NDEKTSV4RRFFQ69G5FAV",
            "estimated_processing_time": 4.2
        })
    }

    #[tokio::test]
    async fn send_message_posts_signed_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/webhook/ingress"))
            .and(header("content-type", "application/json"))
            .and(ValidSignature {
                secret: "shared-secret".into(),
            })
            .respond_with(ResponseTemplate::new(200).set_body_json(ack_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = IngressClient::new(&test_config("shared-secret", None))
            .unwrap()
            .with_base_url(server.uri());
        let ack = client.send_message(&test_dispatch()).await.unwrap();
        assert!(ack.success);
        assert_eq!(ack.thread_id, "thread-1");
        assert_eq!(ack.estimated_processing_time, Some(4.2));
    }

    #[tokio::test]
    async fn bearer_token_is_attached_when_configured() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/webhook/ingress"))
            .and(header("authorization", "Bearer recipient-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ack_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = IngressClient::new(&test_config("s", Some("recipient-token")))
            .unwrap()
            .with_base_url(server.uri());
        client.send_message(&test_dispatch()).await.unwrap();
    }

    #[tokio::test]
    async fn non_2xx_propagates_recipient_error_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/webhook/ingress"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(serde_json::json!({"error": "unknown thread"})),
            )
            .mount(&server)
            .await;

        let client = IngressClient::new(&test_config("s", None))
            .unwrap()
            .with_base_url(server.uri());
        let err = client.send_message(&test_dispatch()).await.unwrap_err();
        assert!(err.to_string().contains("unknown thread"), "got: {err}");
    }

    #[tokio::test]
    async fn non_2xx_without_error_body_reports_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/webhook/ingress"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = IngressClient::new(&test_config("s", None))
            .unwrap()
            .with_base_url(server.uri());
        let err = client.send_message(&test_dispatch()).await.unwrap_err();
        assert!(err.to_string().contains("500"), "got: {err}");
    }

    #[tokio::test]
    async fn send_event_uses_custom_event_type() {
        let server = MockServer::start().await;

        struct EventTypeIs(&'static str);
        impl Match for EventTypeIs {
            fn matches(&self, request: &Request) -> bool {
                serde_json::from_slice::<serde_json::Value>(&request.body)
                    .map(|v| v["event_type"] == self.0 && v["spec_version"] == "1.0")
                    .unwrap_or(false)
            }
        }

        Mock::given(method("POST"))
            .and(path("/api/webhook/ingress"))
            .and(EventTypeIs("task_update"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ack_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = IngressClient::new(&test_config("s", None))
            .unwrap()
            .with_base_url(server.uri());
        client
            .send_event(
                "task_update",
                "thread-1",
                "01ARZ3NDEKTSV4RRFFQ69G5FAV",
                EnvelopePayload {
                    text: None,
                    extra: Some(serde_json::json!({"task": "grade-recital"})),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn health_check_maps_status_codes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/webhook/ingress"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = IngressClient::new(&test_config("s", None))
            .unwrap()
            .with_base_url(server.uri());
        assert_eq!(client.health_check().await, HealthStatus::Healthy);

        let down = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/webhook/ingress"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&down)
            .await;

        let client = IngressClient::new(&test_config("s", None))
            .unwrap()
            .with_base_url(down.uri());
        assert!(matches!(
            client.health_check().await,
            HealthStatus::Unhealthy(_)
        ));
    }

    #[tokio::test]
    async fn missing_signing_secret_fails_construction() {
        let config = IngressConfig {
            signing_secret: None,
            ..test_config("unused", None)
        };
        let result = IngressClient::new(&config);
        assert!(matches!(result, Err(CodaError::Config(_))));
    }
}
