//! services/api/src/adapters/supabase.rs
//!
//! The shared HTTP plumbing for the hosted backend. The auth adapter and the
//! REST adapter both hold a clone of `SupabaseClient`.

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use study_assistant_core::ports::PortError;

/// Connection details for one backend project.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/auth/v1/{path}`
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// `{base}/rest/v1/{path}`
    pub fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }

    pub fn get(&self, url: String) -> RequestBuilder {
        self.with_api_key(self.http.get(url))
    }

    pub fn post(&self, url: String) -> RequestBuilder {
        self.with_api_key(self.http.post(url))
    }

    pub fn delete(&self, url: String) -> RequestBuilder {
        self.with_api_key(self.http.delete(url))
    }

    /// Every request carries the project key; user-scoped calls add a bearer token on top.
    fn with_api_key(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("apikey", &self.anon_key)
    }
}

/// The error bodies of the auth and REST services use different field names.
#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
    }
}

/// Sends a request, mapping transport failures to `PortError::Unexpected`.
pub async fn send(request: RequestBuilder, action: &str) -> Result<Response, PortError> {
    request
        .send()
        .await
        .map_err(|e| PortError::Unexpected(format!("Failed to {}: {}", action, e)))
}

/// Turns a non-success response into a `PortError`.
///
/// 401 and 403 mean the caller's token is missing, expired or revoked.
pub async fn error_from_response(response: Response, action: &str) -> PortError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or(text);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized,
        StatusCode::NOT_FOUND => PortError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            PortError::Validation(message)
        }
        _ => PortError::Unexpected(format!("Failed to {} ({}): {}", action, status, message)),
    }
}
