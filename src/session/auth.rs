//! Direct email/password sign-up, sign-in and sign-out.

use std::sync::Arc;

use super::SessionContext;
use crate::cache::{keys, remove_entry, write_json};
use crate::errors::ClientError;
use crate::models::{Credentials, Identity, SignUpForm};
use crate::remote::{AuthService, ProfileStore};

pub const SIGNUP_MESSAGE: &str = "Signup successful! Please verify your email before logging in.";

pub struct DirectAuth {
    session: Arc<SessionContext>,
    auth: Arc<dyn AuthService>,
    profiles: Arc<dyn ProfileStore>,
}

impl DirectAuth {
    pub fn new(
        session: Arc<SessionContext>,
        auth: Arc<dyn AuthService>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            session,
            auth,
            profiles,
        }
    }

    /// Create an auth user and its profile row.
    pub async fn sign_up(&self, form: &SignUpForm) -> Result<&'static str, ClientError> {
        if !form.is_complete() {
            return Err(ClientError::Validation(
                "Please fill in all fields.".to_string(),
            ));
        }

        let user_id = self.auth.sign_up(form.email.trim(), &form.password).await?;

        match user_id {
            Some(user_id) => {
                let profile = Identity::from_signup(&user_id, form);
                self.profiles.insert(&profile).await?;
                tracing::info!("Created profile for auth user {}", user_id);
            }
            None => tracing::warn!("Auth service returned no user id; profile not created"),
        }

        Ok(SIGNUP_MESSAGE)
    }

    /// Sign in and load the caller's profile into the session.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Identity, ClientError> {
        let auth = self
            .auth
            .sign_in(credentials.email.trim(), &credentials.password)
            .await?;

        let profile = self
            .profiles
            .find_by_id(&auth.user_id)
            .await?
            .ok_or_else(|| ClientError::NotFound(format!("No profile for user {}", auth.user_id)))?;

        let cache = self.session.cache();
        write_json(cache, keys::USER, &profile).await;
        write_json(cache, keys::SESSION_KEY, &auth.access_token).await;
        write_json(cache, keys::AUTH_SESSION, &auth).await;

        self.session
            .adopt(Some(profile.clone()), Some(auth.access_token));
        self.session.set_notice(None);
        tracing::info!("Signed in as {}", profile.id);

        Ok(profile)
    }

    /// Drop every trace of the current session. Vote state of the old
    /// partition stays in the cache for the next sign-in with that token.
    pub async fn sign_out(&self) {
        let cache = self.session.cache();
        remove_entry(cache, keys::USER).await;
        remove_entry(cache, keys::SESSION_KEY).await;
        remove_entry(cache, keys::AUTH_SESSION).await;
        self.session.clear();
        tracing::info!("Signed out");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::cache::{read_json, LocalCache, MemoryCache};
    use crate::models::AuthSession;
    use crate::testing::{identity, FakeBackend};

    fn setup() -> (Arc<MemoryCache>, Arc<SessionContext>, Arc<FakeBackend>, DirectAuth) {
        let cache = Arc::new(MemoryCache::new());
        let session = Arc::new(SessionContext::new(cache.clone()));
        let backend = Arc::new(FakeBackend::new());
        let auth = DirectAuth::new(session.clone(), backend.clone(), backend.clone());
        (cache, session, backend, auth)
    }

    fn form() -> SignUpForm {
        SignUpForm {
            email: "asha@example.org".into(),
            password: "secret1".into(),
            name: "Asha Rao".into(),
            roll: "21B0001".into(),
            department: "CSE".into(),
            degree: "BTech".into(),
        }
    }

    #[tokio::test]
    async fn test_sign_up_requires_every_field() {
        let (_, _, backend, auth) = setup();
        let mut incomplete = form();
        incomplete.department = String::new();

        let err = auth.sign_up(&incomplete).await.unwrap_err();

        assert_eq!(err, ClientError::Validation("Please fill in all fields.".to_string()));
        assert_eq!(backend.auth_calls.load(Ordering::SeqCst), 0);
        assert_eq!(backend.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sign_up_creates_profile() {
        let (_, session, backend, auth) = setup();

        let message = auth.sign_up(&form()).await.unwrap();

        assert_eq!(message, SIGNUP_MESSAGE);
        let profiles = backend.profiles.lock().unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].id, "auth-1");
        assert_eq!(profiles[0].role, "STUDENT");
        // Sign-up alone does not sign the user in.
        assert!(session.identity().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_persists_session() {
        let (cache, session, backend, auth) = setup();
        backend.add_account("asha@example.org", "secret1", "auth-3");
        backend.add_profile(identity("auth-3", "21B0001"));

        let profile = auth
            .sign_in(&Credentials {
                email: "asha@example.org".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap();

        assert_eq!(profile.id, "auth-3");
        assert_eq!(session.partition(), "access-auth-3");
        let token: Option<String> = read_json(cache.as_ref(), keys::SESSION_KEY).await;
        assert_eq!(token.as_deref(), Some("access-auth-3"));
        let stored: Option<AuthSession> = read_json(cache.as_ref(), keys::AUTH_SESSION).await;
        assert_eq!(stored.unwrap().user_id, "auth-3");
    }

    #[tokio::test]
    async fn test_sign_in_with_wrong_password() {
        let (cache, session, backend, auth) = setup();
        backend.add_account("asha@example.org", "secret1", "auth-3");

        let err = auth
            .sign_in(&Credentials {
                email: "asha@example.org".into(),
                password: "nope".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Auth(_)));
        assert!(session.identity().is_none());
        assert!(cache.get(keys::USER).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_session() {
        let (cache, session, backend, auth) = setup();
        backend.add_account("asha@example.org", "secret1", "auth-3");
        backend.add_profile(identity("auth-3", "21B0001"));
        auth.sign_in(&Credentials {
            email: "asha@example.org".into(),
            password: "secret1".into(),
        })
        .await
        .unwrap();

        auth.sign_out().await;

        assert!(session.identity().is_none());
        assert_eq!(session.partition(), keys::ANON_PARTITION);
        assert!(cache.get(keys::USER).await.unwrap().is_none());
        assert!(cache.get(keys::SESSION_KEY).await.unwrap().is_none());
        assert!(cache.get(keys::AUTH_SESSION).await.unwrap().is_none());
    }
}
