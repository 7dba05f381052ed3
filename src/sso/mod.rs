//! Client for the institutional SSO identity endpoint.
//!
//! `POST /project/getuserdata` with `{"id": <token>}` answers with the user's
//! profile fields, or with an error object.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::errors::{ApiErrorKind, ClientError};
use crate::models::SsoUserData;

/// Path of the identity lookup, relative to the SSO base URL.
pub const USER_DATA_PATH: &str = "/project/getuserdata";

/// Exchange an SSO session token for user data.
#[async_trait]
pub trait SsoClient: Send + Sync {
    async fn fetch_user(&self, token: &str) -> Result<SsoUserData, ClientError>;
}

/// [`SsoClient`] over HTTP.
#[derive(Clone)]
pub struct HttpSsoClient {
    client: Client,
    base_url: String,
}

impl HttpSsoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SsoClient for HttpSsoClient {
    async fn fetch_user(&self, token: &str) -> Result<SsoUserData, ClientError> {
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, USER_DATA_PATH))
            .json(&json!({ "id": token }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Http(status.as_u16()));
        }

        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Err(ClientError::InvalidResponse("empty body".to_string()));
        }

        let value: Value = serde_json::from_str(&body)?;
        interpret_response(value)
    }
}

/// JavaScript-style truthiness, which is what the SSO server's error flag
/// is documented against.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Turn a decoded response body into user data or a classified failure.
pub fn interpret_response(value: Value) -> Result<SsoUserData, ClientError> {
    if value.is_null() {
        return Err(ClientError::InvalidResponse("null body".to_string()));
    }
    if !value.is_object() {
        return Err(ClientError::MalformedResponse(format!(
            "expected an object, got {}",
            value
        )));
    }

    let error_flag = value.get("error").filter(|v| is_truthy(v));
    let status_error = value.get("status").and_then(Value::as_str) == Some("error");
    let invalid = value.get("message").and_then(Value::as_str) == Some("invalid");

    if error_flag.is_some() || status_error || invalid {
        let detail = error_flag
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .or_else(|| {
                value
                    .get("message")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "SSO authentication failed.".to_string());

        let code = value.get("code").and_then(Value::as_str);
        let kind = ApiErrorKind::classify(code, &detail);
        return Err(ClientError::Api { kind, detail });
    }

    Ok(serde_json::from_value(value)?)
}
