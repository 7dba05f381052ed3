//! Re-validation of the cached SSO session token.

use std::sync::Arc;

use serde::Serialize;

use super::SessionContext;
use crate::cache::{keys, read_json, remove_entry, write_json};
use crate::errors::{ClientError, ErrorState};
use crate::models::SsoUserData;
use crate::sso::SsoClient;

/// Result of an SSO status check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SsoStatus {
    pub userdata: Option<SsoUserData>,
    pub error: Option<ErrorState>,
}

impl SsoStatus {
    fn failed(error: &ClientError) -> Self {
        Self {
            userdata: None,
            error: Some(error.to_state()),
        }
    }
}

pub struct SsoStatusCheck {
    session: Arc<SessionContext>,
    sso: Arc<dyn SsoClient>,
}

impl SsoStatusCheck {
    pub fn new(session: Arc<SessionContext>, sso: Arc<dyn SsoClient>) -> Self {
        Self { session, sso }
    }

    /// Ask the SSO endpoint whether the cached token is still good.
    ///
    /// A server-reported failure also drops the cached token so the next
    /// attempt starts clean.
    pub async fn check(&self) -> SsoStatus {
        let cache = self.session.cache();

        let Some(token) = read_json::<String>(cache, keys::SESSION_KEY).await else {
            return SsoStatus::failed(&ClientError::NoSession);
        };

        match self.sso.fetch_user(&token).await {
            Ok(userdata) => {
                write_json(cache, keys::SSO_USER, &userdata).await;
                SsoStatus {
                    userdata: Some(userdata),
                    error: None,
                }
            }
            Err(e @ ClientError::Api { .. }) => {
                tracing::warn!("SSO rejected cached token: {}", e);
                remove_entry(cache, keys::SESSION_KEY).await;
                self.session.forget_token();
                SsoStatus::failed(&e)
            }
            Err(e) => {
                tracing::warn!("SSO status check failed: {}", e);
                SsoStatus::failed(&e)
            }
        }
    }
}
