//! Telegram Bot API transport.
//!
//! A thin JSON-over-HTTP client: every Bot API method is a POST to
//! `{base}/bot{token}/{method}` answered with an `{ok, result}` envelope.

use std::time::Duration;

use async_trait::async_trait;
use pollcast_config::defaults::DEFAULT_BASE_URL;
use pollcast_core::{OutgoingMessage, Transport, TransportError, Update};
use pollcast_logging::redact_sensitive_data;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Extra HTTP time allowed on top of the long-poll timeout.
const POLL_GRACE: Duration = Duration::from_secs(10);

pub struct TelegramBotApi {
    client: Client,
    token: String,
    base_url: String,
}

impl TelegramBotApi {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.base_url.trim_end_matches('/'),
            self.token,
            method
        )
    }

    /// Call any Bot API method and return its `result`.
    pub async fn call<P: Serialize + ?Sized>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<Value, TransportError> {
        self.call_with_timeout(method, params, None).await
    }

    async fn call_with_timeout<P: Serialize + ?Sized>(
        &self,
        method: &str,
        params: &P,
        timeout: Option<Duration>,
    ) -> Result<Value, TransportError> {
        let mut request = self.client.post(self.method_url(method)).json(params);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        debug!(method, "Calling Bot API");
        let response = request
            .send()
            .await
            .map_err(|e| network_error(method, e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| network_error(method, e))?;

        parse_response(method, status, &body)
    }
}

fn network_error(method: &str, error: reqwest::Error) -> TransportError {
    TransportError::Network {
        method: method.to_string(),
        message: redact_sensitive_data(&error.without_url().to_string()),
    }
}

/// Unwrap a Bot API `{ok, result}` envelope.
pub fn parse_response(method: &str, status: u16, body: &str) -> Result<Value, TransportError> {
    let http_ok = (200..300).contains(&status);

    let envelope: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) if http_ok => {
            return Err(TransportError::Serialization {
                method: method.to_string(),
                message: format!("response is not JSON: {e}"),
            });
        }
        Err(_) => {
            return Err(TransportError::Api {
                method: method.to_string(),
                description: "server error".to_string(),
                http_code: status,
                error_code: None,
                parameters: None,
            });
        }
    };

    let Value::Object(mut envelope) = envelope else {
        return Err(TransportError::Serialization {
            method: method.to_string(),
            message: "response is not a JSON object".to_string(),
        });
    };

    if envelope.get("ok").and_then(Value::as_bool) != Some(true) {
        let description = envelope
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("server error")
            .to_string();
        warn!(method, status, description = %description, "Bot API rejected call");
        return Err(TransportError::Api {
            method: method.to_string(),
            description,
            http_code: status,
            error_code: envelope.get("error_code").and_then(Value::as_i64),
            parameters: envelope.remove("parameters"),
        });
    }

    envelope
        .remove("result")
        .ok_or_else(|| TransportError::Serialization {
            method: method.to_string(),
            message: "response is missing 'result'".to_string(),
        })
}

#[async_trait]
impl Transport for TelegramBotApi {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn fetch_updates(
        &self,
        since: Option<i64>,
        timeout: Duration,
    ) -> Result<Vec<Update>, TransportError> {
        let mut params = json!({ "timeout": timeout.as_secs() });
        if let Some(last) = since {
            params["offset"] = json!(last + 1);
        }

        let result = self
            .call_with_timeout("getUpdates", &params, Some(timeout + POLL_GRACE))
            .await?;
        serde_json::from_value(result).map_err(|e| TransportError::Serialization {
            method: "getUpdates".to_string(),
            message: e.to_string(),
        })
    }

    async fn send_notification(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        self.call("sendMessage", message).await?;
        Ok(())
    }
}
