//! Session API endpoints.

use axum::extract::{Query, State};
use serde::Serialize;

use super::{success, ApiResult};
use crate::errors::ErrorState;
use crate::models::{Post, VoteState};
use crate::session::{AccountOutcome, BootstrapOutcome, PageParams, SessionState, SsoStatus};
use crate::AppState;

/// Everything the home page needs after load.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePage {
    pub outcome: BootstrapOutcome,
    pub session: SessionState,
    pub search: String,
    pub posts: Vec<Post>,
    pub posts_error: Option<ErrorState>,
    pub votes: VoteState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPage {
    pub outcome: AccountOutcome,
    pub session: SessionState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    #[serde(flatten)]
    pub session: SessionState,
    pub partition: String,
}

/// POST /api/session/bootstrap - Resolve the session and load the feed.
pub async fn bootstrap_home(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<HomePage> {
    let outcome = state.bootstrapper.bootstrap(&params).await;
    state.votes.reload_votes().await;

    let (posts, posts_error) = match state.feed.load(params.search()).await {
        Ok(posts) => (posts, None),
        Err(e) => (Vec::new(), Some(e.to_state())),
    };

    success(HomePage {
        outcome,
        session: state.session.snapshot(),
        search: params.search().to_string(),
        posts,
        posts_error,
        votes: state.votes.votes().await,
    })
}

/// POST /api/session/account - Resolve the session for the sign-in page.
pub async fn bootstrap_account(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<AccountPage> {
    let outcome = state.bootstrapper.bootstrap_account_page(&params).await;
    state.votes.reload_votes().await;

    success(AccountPage {
        outcome,
        session: state.session.snapshot(),
    })
}

/// GET /api/session - Current identity and notice.
pub async fn get_session(State(state): State<AppState>) -> ApiResult<SessionView> {
    success(SessionView {
        session: state.session.snapshot(),
        partition: state.session.partition(),
    })
}

/// GET /api/session/sso - Re-validate the cached SSO token.
pub async fn sso_status(State(state): State<AppState>) -> ApiResult<SsoStatus> {
    success(state.sso_status.check().await)
}
