//! Comment endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::models::{Comment, CreateCommentRequest, PostId};
use crate::AppState;

/// GET /api/posts/:id/comments - List a post's comments.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Comment>> {
    let comments = state.comments.list(&PostId::parse(&id)).await?;
    success(comments)
}

/// POST /api/posts/:id/comments - Comment as the signed-in user.
pub async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CreateCommentRequest>,
) -> ApiResult<Comment> {
    let comment = state
        .comments
        .add(&PostId::parse(&id), &request.content)
        .await?;
    success(comment)
}
