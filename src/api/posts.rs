//! Post feed and vote endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{success, ApiResponse, ApiResult};
use crate::errors::{codes, ClientError, ErrorResponse, ErrorState};
use crate::models::{Post, PostId, VoteDirection, VoteState};
use crate::votes::{VoteOutcome, VOTE_FAILED_MESSAGE};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub direction: VoteDirection,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VotesView {
    pub votes: VoteState,
    pub vote_error: Option<String>,
}

/// GET /api/posts - List posts, newest first, optionally filtered by title.
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<Post>> {
    let posts = state
        .feed
        .load(query.search.as_deref().unwrap_or(""))
        .await?;
    success(posts)
}

/// POST /api/posts/:id/vote - Toggle an up or down vote.
pub async fn cast_vote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<VoteRequest>,
) -> Response {
    let post_id = PostId::parse(&id);

    // Detached from the request: a dropped connection must not abandon a
    // store write that already landed.
    let votes = state.votes.clone();
    let task_id = post_id.clone();
    let outcome =
        tokio::spawn(async move { votes.cast_vote(&task_id, request.direction).await }).await;

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Vote task on {} did not finish: {}", post_id, e);
            let error = ErrorState::new(codes::STORE_ERROR, VOTE_FAILED_MESSAGE);
            return failure(StatusCode::INTERNAL_SERVER_ERROR, error);
        }
    };

    match outcome {
        outcome @ VoteOutcome::Applied { .. } => ApiResponse::new(outcome).into_response(),
        VoteOutcome::Busy => {
            let error = ErrorState::new(
                codes::VOTE_IN_FLIGHT,
                format!("A vote on post {} is still being saved", post_id),
            );
            failure(StatusCode::CONFLICT, error)
        }
        VoteOutcome::PostMissing => {
            ClientError::NotFound(format!("Post {} not found", post_id)).into_response()
        }
        VoteOutcome::Failed { error } => failure(StatusCode::BAD_GATEWAY, error),
    }
}

/// GET /api/votes - The session's votes and the vote-failure banner.
pub async fn get_votes(State(state): State<AppState>) -> ApiResult<VotesView> {
    success(VotesView {
        votes: state.votes.votes().await,
        vote_error: state.votes.vote_error(),
    })
}

fn failure(status: StatusCode, error: ErrorState) -> Response {
    let body = ErrorResponse {
        success: false,
        error,
    };
    (status, Json(body)).into_response()
}
