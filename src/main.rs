//! Campus Forum client core
//!
//! Resolves who is signed in (SSO token, cached identity or direct auth) and
//! keeps per-session votes in step with the hosted post store. A local REST
//! API exposes both to the UI.

mod api;
mod cache;
mod comments;
mod config;
mod errors;
mod feed;
mod models;
mod remote;
mod session;
mod sso;
mod votes;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cache::{LocalCache, SqliteCache};
use comments::Comments;
use config::Config;
use feed::PostFeed;
use remote::{AuthService, CommentStore, PostStore, ProfileStore, RestBackend};
use session::{DirectAuth, SessionBootstrapper, SessionContext, SsoStatusCheck};
use sso::{HttpSsoClient, SsoClient};
use votes::VoteReconciler;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionContext>,
    pub bootstrapper: Arc<SessionBootstrapper>,
    pub auth: Arc<DirectAuth>,
    pub sso_status: Arc<SsoStatusCheck>,
    pub feed: Arc<PostFeed>,
    pub votes: Arc<VoteReconciler>,
    pub comments: Arc<Comments>,
}

/// External services the client talks to.
pub struct Collaborators {
    pub cache: Arc<dyn LocalCache>,
    pub posts: Arc<dyn PostStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub comments: Arc<dyn CommentStore>,
    pub auth: Arc<dyn AuthService>,
    pub sso: Arc<dyn SsoClient>,
}

impl AppState {
    /// Wire every component around one session context restored from the cache.
    pub async fn new(collaborators: Collaborators, vote_error_ttl: Duration) -> Self {
        let Collaborators {
            cache,
            posts,
            profiles,
            comments,
            auth,
            sso,
        } = collaborators;

        let session = Arc::new(SessionContext::restore(cache).await);
        let feed = Arc::new(PostFeed::new(posts.clone()));
        let votes = Arc::new(VoteReconciler::new(
            session.clone(),
            posts,
            feed.clone(),
            vote_error_ttl,
        ));
        votes.reload_votes().await;

        Self {
            bootstrapper: Arc::new(SessionBootstrapper::new(
                session.clone(),
                sso.clone(),
                profiles.clone(),
            )),
            auth: Arc::new(DirectAuth::new(session.clone(), auth, profiles)),
            sso_status: Arc::new(SsoStatusCheck::new(session.clone(), sso)),
            comments: Arc::new(Comments::new(session.clone(), comments)),
            feed,
            votes,
            session,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting campus forum client");
    tracing::info!("Backend: {}", config.backend_url);
    tracing::info!("SSO: {}", config.sso_url);
    tracing::info!("Cache path: {:?}", config.cache_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.backend_key.is_empty() {
        tracing::warn!("No backend key configured (FORUM_BACKEND_KEY). Requests may be rejected!");
    }

    // Initialize local cache
    let cache = Arc::new(SqliteCache::open(&config.cache_path).await?);

    let backend = Arc::new(RestBackend::new(&config.backend_url, &config.backend_key));
    let sso = Arc::new(HttpSsoClient::new(&config.sso_url));

    let state = AppState::new(
        Collaborators {
            cache,
            posts: backend.clone(),
            profiles: backend.clone(),
            comments: backend.clone(),
            auth: backend,
            sso,
        },
        config.vote_error_ttl,
    )
    .await;

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Session
        .route("/session", get(api::get_session))
        .route("/session/bootstrap", post(api::bootstrap_home))
        .route("/session/account", post(api::bootstrap_account))
        .route("/session/sso", get(api::sso_status))
        // Direct auth
        .route("/auth/signup", post(api::sign_up))
        .route("/auth/login", post(api::log_in))
        .route("/auth/logout", post(api::log_out))
        // Posts and votes
        .route("/posts", get(api::list_posts))
        .route("/posts/{id}/vote", post(api::cast_vote))
        .route(
            "/posts/{id}/comments",
            get(api::list_comments).post(api::add_comment),
        )
        .route("/votes", get(api::get_votes));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod testing;
