//! reqwest implementation of [`RemoteService`].

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{RemoteService, ACKNOWLEDGE_PATH_PREFIX, LOGIN_PATH, UPLOADS_PATH, VERIFY_CODE_PATH};
use crate::config::{normalize_base_url, normalize_text_option, Settings};
use crate::error::{Error, Result};
use crate::models::Upload;

const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

#[derive(Clone)]
pub struct HttpRemoteClient {
    base_url: String,
    client: Client,
}

impl HttpRemoteClient {
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url.as_ref())?,
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.validated_base_url()?, settings.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.header("Accept", "application/json").send().await?;
        let status = response.status();
        let body = response.text().await?;
        parse_payload(status, &body)
    }
}

impl RemoteService for HttpRemoteClient {
    async fn login(&self, email: &str) -> Result<String> {
        tracing::debug!("requesting login code");
        let payload = serde_json::json!({ "email": email });
        let response: LoginResponse = self
            .send(self.client.post(self.url(LOGIN_PATH)).json(&payload))
            .await?;
        normalize_text_option(response.auth_request_id).ok_or_else(|| {
            Error::Application("Login response did not include auth_request_id".to_string())
        })
    }

    async fn verify_code(&self, auth_request_id: &str, code: &str) -> Result<String> {
        tracing::debug!("verifying login code");
        let payload = serde_json::json!({
            "auth_request_id": auth_request_id,
            "code": code,
        });
        let response: VerifyResponse = self
            .send(self.client.post(self.url(VERIFY_CODE_PATH)).json(&payload))
            .await?;
        normalize_text_option(response.jwt_token).ok_or_else(|| {
            Error::Application("Verification response did not include jwt_token".to_string())
        })
    }

    async fn list_uploads(&self, token: &str) -> Result<Vec<Upload>> {
        tracing::debug!("fetching pending uploads");
        let uploads: Option<Vec<Upload>> = self
            .send(self.client.get(self.url(UPLOADS_PATH)).bearer_auth(token))
            .await?;
        Ok(uploads.unwrap_or_default())
    }

    async fn acknowledge(&self, token: &str, upload_id: &str) -> Result<()> {
        tracing::debug!(upload_id, "acknowledging upload");
        let _: Option<serde_json::Value> = self
            .send(
                self.client
                    .post(self.url(&acknowledge_path(upload_id)))
                    .bearer_auth(token),
            )
            .await?;
        Ok(())
    }
}

pub(crate) fn acknowledge_path(upload_id: &str) -> String {
    format!(
        "{}/{}",
        ACKNOWLEDGE_PATH_PREFIX,
        urlencoding::encode(upload_id)
    )
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    auth_request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    jwt_token: Option<String>,
}

/// `{ "error": true, "message": "..." }`; some deployments send the message
/// in `error` itself.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorEnvelope {
    fn failure_message(self) -> Option<String> {
        let message = normalize_text_option(self.message);
        match self.error? {
            serde_json::Value::Bool(true) => {
                Some(message.unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string()))
            }
            serde_json::Value::String(error) => {
                message.or_else(|| normalize_text_option(Some(error)))
            }
            _ => None,
        }
    }
}

/// Decode a response body, turning structured failures and non-2xx statuses
/// into [`Error::Application`]. An empty success body decodes as JSON `null`.
pub(crate) fn parse_payload<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T> {
    let trimmed = body.trim();

    if trimmed.starts_with('{') {
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(trimmed) {
            if let Some(message) = envelope.failure_message() {
                return Err(Error::Application(message));
            }
        }
    }

    if !status.is_success() {
        return Err(Error::Application(parse_api_error(status, trimmed)));
    }

    let json = if trimmed.is_empty() { "null" } else { trimmed };
    serde_json::from_str(json).map_err(|error| {
        Error::Application(format!(
            "Unexpected response from service: {error} ({})",
            compact_text(trimmed)
        ))
    })
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if body.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", compact_text(body), status.as_u16())
    }
}

fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn login_success_extracts_request_id() {
        let response: LoginResponse =
            parse_payload(StatusCode::OK, r#"{"auth_request_id":"r1"}"#).unwrap();
        assert_eq!(response.auth_request_id.as_deref(), Some("r1"));
    }

    #[test]
    fn error_flag_surfaces_message_even_with_ok_status() {
        let result: Result<LoginResponse> = parse_payload(
            StatusCode::OK,
            r#"{"error":true,"message":"Invalid code"}"#,
        );
        match result {
            Err(Error::Application(message)) => assert_eq!(message, "Invalid code"),
            other => panic!("expected application error, got {other:?}"),
        }
    }

    #[test]
    fn error_flag_without_message_uses_fallback() {
        let result: Result<VerifyResponse> =
            parse_payload(StatusCode::BAD_REQUEST, r#"{"error":true}"#);
        assert!(matches!(result, Err(Error::Application(message)) if message == UNKNOWN_ERROR_MESSAGE));
    }

    #[test]
    fn error_false_is_not_a_failure() {
        let response: VerifyResponse =
            parse_payload(StatusCode::OK, r#"{"error":false,"jwt_token":"t1"}"#).unwrap();
        assert_eq!(response.jwt_token.as_deref(), Some("t1"));
    }

    #[test]
    fn non_success_status_without_envelope_reports_status() {
        let result: Result<Vec<Upload>> = parse_payload(StatusCode::BAD_GATEWAY, "");
        assert!(matches!(result, Err(Error::Application(message)) if message == "HTTP 502"));

        let result: Result<Vec<Upload>> =
            parse_payload(StatusCode::SERVICE_UNAVAILABLE, "maintenance");
        assert!(matches!(result, Err(Error::Application(message)) if message == "maintenance (503)"));
    }

    #[test]
    fn empty_upload_list_decodes() {
        let uploads: Option<Vec<Upload>> = parse_payload(StatusCode::OK, "[]").unwrap();
        assert_eq!(uploads, Some(Vec::new()));
        let uploads: Option<Vec<Upload>> = parse_payload(StatusCode::OK, "").unwrap();
        assert_eq!(uploads, None);
    }

    #[test]
    fn malformed_success_body_is_application_error() {
        let result: Result<Vec<Upload>> = parse_payload(StatusCode::OK, "<html>");
        assert!(matches!(result, Err(Error::Application(_))));
    }

    #[test]
    fn acknowledge_path_encodes_id() {
        assert_eq!(acknowledge_path("42"), "/api/uploads/obsidian/sync/42");
        assert_eq!(
            acknowledge_path("a/b c"),
            "/api/uploads/obsidian/sync/a%2Fb%20c"
        );
    }

    #[test]
    fn client_rejects_invalid_base_url() {
        assert!(HttpRemoteClient::new("api.example.com", Duration::from_secs(5)).is_err());
        let client = HttpRemoteClient::new("https://api.example.com/", Duration::from_secs(5))
            .unwrap();
        assert_eq!(client.base_url(), "https://api.example.com");
        assert_eq!(
            client.url(UPLOADS_PATH),
            "https://api.example.com/api/uploads/obsidian"
        );
    }
}
