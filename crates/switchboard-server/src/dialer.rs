//! Outbound dialer backed by the telephony collaborator's REST API.

use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;
use serde_json::json;

use switchboard_flow::{DialError, Dialer};

use crate::config::TelephonyConfig;

/// Places callback calls through the telephony REST API.
///
/// The API contract is small: `POST {api_url}/calls` with the destination,
/// caller-ID, session id, and display name; the response carries the new
/// call-leg id. Status changes come back later through the `/voice/status`
/// webhook.
pub struct HttpDialer {
    client: reqwest::Client,
    config: TelephonyConfig,
}

#[derive(Deserialize)]
struct PlaceCallResponse {
    call_leg_id: String,
}

impl HttpDialer {
    pub fn new(config: TelephonyConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Whether an API endpoint is configured at all.
    pub fn is_enabled(&self) -> bool {
        !self.config.api_url.is_empty()
    }
}

impl Dialer for HttpDialer {
    fn place_call<'a>(
        &'a self,
        to_number: &'a str,
        session_id: &'a str,
        caller_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, DialError>> + Send + 'a>> {
        Box::pin(async move {
            if !self.is_enabled() {
                return Err(DialError::Api(
                    "telephony api_url is not configured".to_string(),
                ));
            }

            let url = format!("{}/calls", self.config.api_url.trim_end_matches('/'));
            let body = json!({
                "to": to_number,
                "from": self.config.from_number,
                "session_id": session_id,
                "caller_name": caller_name,
            });

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| DialError::Transport(e.to_string()))?;

            if !response.status().is_success() {
                return Err(DialError::Api(format!(
                    "telephony api returned {}",
                    response.status()
                )));
            }

            let parsed: PlaceCallResponse = response
                .json()
                .await
                .map_err(|e| DialError::Api(format!("malformed place-call response: {e}")))?;

            Ok(parsed.call_leg_id)
        })
    }
}
