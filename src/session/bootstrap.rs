//! Page-load session resolution.
//!
//! Two entry points share the same cache and collaborators:
//! [`SessionBootstrapper::bootstrap`] runs on the home page and will follow a
//! fresh SSO token; [`SessionBootstrapper::bootstrap_account_page`] runs on the
//! sign-in page and never replaces a cached identity.

use std::sync::Arc;

use serde::Serialize;

use super::{PageParams, SessionContext};
use crate::cache::{keys, read_json, write_json};
use crate::errors::{ClientError, ErrorState};
use crate::models::{AuthSession, Identity};
use crate::remote::ProfileStore;
use crate::sso::SsoClient;

/// Notice shown when the account page finds an identity already cached.
pub const LOGOUT_FIRST_NOTICE: &str =
    "Please log out of the existing session to log in with another account.";

/// Notice shown when a hosted auth session was restored.
pub const RESTORED_NOTICE: &str = "Restored session.";

/// How the home-page bootstrap resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BootstrapOutcome {
    /// Cached identity adopted without any network call
    Cached,
    /// Fresh SSO login matched a stored profile
    Existing,
    /// Fresh SSO login created a new profile
    Created,
    /// Nothing cached and no token: browsing anonymously
    Anonymous,
    /// Fresh SSO login failed; no identity adopted
    Failed { error: ErrorState },
}

/// How the account-page bootstrap resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AccountOutcome {
    /// An identity is already cached; the user must log out first
    AlreadySignedIn,
    /// A hosted auth session was restored into the cache
    Restored,
    /// Show the sign-in form
    SignInRequired,
}

/// Resolves the current identity on page load.
pub struct SessionBootstrapper {
    session: Arc<SessionContext>,
    sso: Arc<dyn SsoClient>,
    profiles: Arc<dyn ProfileStore>,
}

impl SessionBootstrapper {
    pub fn new(
        session: Arc<SessionContext>,
        sso: Arc<dyn SsoClient>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            session,
            sso,
            profiles,
        }
    }

    /// Home-page resolution: cached identity, else fresh SSO token.
    pub async fn bootstrap(&self, params: &PageParams) -> BootstrapOutcome {
        let cache = self.session.cache();
        let cached: Option<Identity> = read_json(cache, keys::USER).await;
        let cached_token: Option<String> = read_json(cache, keys::SESSION_KEY).await;

        let Some(token) = params.fresh_token() else {
            return match cached {
                Some(identity) => {
                    tracing::debug!("Using cached identity {}", identity.id);
                    self.session.adopt(Some(identity), cached_token);
                    BootstrapOutcome::Cached
                }
                None => {
                    self.session.adopt(None, cached_token);
                    BootstrapOutcome::Anonymous
                }
            };
        };

        match self.resolve_sso(token).await {
            Ok((identity, outcome)) => {
                write_json(cache, keys::USER, &identity).await;
                write_json(cache, keys::SESSION_KEY, token).await;
                self.session.adopt(Some(identity), Some(token.to_string()));
                outcome
            }
            Err(e) => {
                // The cache is left exactly as it was.
                self.session.adopt(None, cached_token);
                BootstrapOutcome::Failed {
                    error: e.to_state(),
                }
            }
        }
    }

    /// Exchange a fresh token for a stored profile, inserting one if needed.
    async fn resolve_sso(&self, token: &str) -> Result<(Identity, BootstrapOutcome), ClientError> {
        let data = self.sso.fetch_user(token).await.map_err(|e| {
            tracing::warn!("SSO lookup failed: {}", e);
            e
        })?;

        let candidate = Identity::from_sso(&data);
        if candidate.roll.trim().is_empty() {
            tracing::warn!("SSO response carried no roll number");
            return Err(ClientError::InvalidResponse(
                "SSO response carried no roll number".to_string(),
            ));
        }

        // A failed lookup must not fall through to an insert: the profile may
        // exist and a second row would be created.
        let existing = self
            .profiles
            .find_by_roll(&candidate.roll)
            .await
            .map_err(|e| {
                tracing::error!("Error checking user {}: {}", candidate.roll, e);
                e
            })?;

        if let Some(profile) = existing {
            tracing::info!("User already exists: {}", profile.id);
            return Ok((profile, BootstrapOutcome::Existing));
        }

        tracing::info!("No existing user found for {}, inserting", candidate.roll);
        let inserted = self.profiles.insert(&candidate).await.map_err(|e| {
            tracing::error!("Profile insert failed: {}", e);
            e
        })?;

        Ok((inserted, BootstrapOutcome::Created))
    }

    /// Account-page resolution: a cached identity always wins, even over a
    /// fresh SSO token, so another signed-in user is never replaced silently.
    pub async fn bootstrap_account_page(&self, params: &PageParams) -> AccountOutcome {
        let cache = self.session.cache();

        if let Some(identity) = read_json::<Identity>(cache, keys::USER).await {
            if params.fresh_token().is_some() {
                tracing::info!("Ignoring fresh SSO token while {} is signed in", identity.id);
            }
            let token: Option<String> = read_json(cache, keys::SESSION_KEY).await;
            self.session.adopt(Some(identity), token);
            self.session
                .set_notice(Some(LOGOUT_FIRST_NOTICE.to_string()));
            return AccountOutcome::AlreadySignedIn;
        }

        let Some(auth) = read_json::<AuthSession>(cache, keys::AUTH_SESSION).await else {
            self.session.set_notice(None);
            return AccountOutcome::SignInRequired;
        };

        match self.profiles.find_by_id(&auth.user_id).await {
            Ok(Some(profile)) => {
                write_json(cache, keys::USER, &profile).await;
                write_json(cache, keys::SESSION_KEY, &auth.access_token).await;
                self.session.adopt(Some(profile), Some(auth.access_token));
                self.session.set_notice(Some(RESTORED_NOTICE.to_string()));
                AccountOutcome::Restored
            }
            Ok(None) => {
                tracing::info!("No profile for auth user {}", auth.user_id);
                self.session.set_notice(None);
                AccountOutcome::SignInRequired
            }
            Err(e) => {
                tracing::warn!("Session restore failed: {}", e);
                self.session.set_notice(None);
                AccountOutcome::SignInRequired
            }
        }
    }
}
