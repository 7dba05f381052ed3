//! Direct sign-up and sign-in endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use super::{success, ApiResult};
use crate::models::{Credentials, Identity, SignUpForm};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SignUpResult {
    pub message: &'static str,
}

/// POST /api/auth/signup - Create an account.
pub async fn sign_up(
    State(state): State<AppState>,
    Json(form): Json<SignUpForm>,
) -> ApiResult<SignUpResult> {
    let message = state.auth.sign_up(&form).await?;
    success(SignUpResult { message })
}

/// POST /api/auth/login - Sign in with email and password.
pub async fn log_in(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> ApiResult<Identity> {
    let identity = state.auth.sign_in(&credentials).await?;
    state.votes.reload_votes().await;
    success(identity)
}

/// POST /api/auth/logout - Forget the current session.
pub async fn log_out(State(state): State<AppState>) -> ApiResult<()> {
    state.auth.sign_out().await;
    state.votes.reload_votes().await;
    success(())
}
