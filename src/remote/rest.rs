//! HTTP adapter for a PostgREST-style data API and its companion auth API.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::{AuthService, CommentStore, PostStore, ProfileStore};
use crate::errors::ClientError;
use crate::models::{AuthSession, Comment, Identity, NewComment, Post, PostId, VoteCounts};

/// Hosted backend reached over REST.
#[derive(Clone)]
pub struct RestBackend {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestBackend {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ClientError> {
        let resp = self
            .request(Method::GET, self.table_url(table))
            .query(query)
            .send()
            .await
            .map_err(store_error)?;

        rows_from(resp).await
    }

    async fn find_profile(&self, column: &str, value: &str) -> Result<Option<Identity>, ClientError> {
        let rows = self
            .fetch_rows(
                "users",
                &[("select", "*".to_string()), (column, format!("eq.{}", value))],
            )
            .await?;

        maybe_single(rows)
    }
}

/// Map a transport failure to a store error.
fn store_error(err: reqwest::Error) -> ClientError {
    tracing::error!("Data store request failed: {:?}", err);
    ClientError::Store(format!("Data store unreachable: {}", err))
}

async fn rows_from<T: DeserializeOwned>(resp: Response) -> Result<Vec<T>, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Store(format!(
            "Data store responded with status {}: {}",
            status.as_u16(),
            body
        )));
    }

    resp.json::<Vec<T>>()
        .await
        .map_err(|e| ClientError::Store(format!("Malformed data store response: {}", e)))
}

/// Zero rows is "not found"; more than one is an error.
fn maybe_single<T>(mut rows: Vec<T>) -> Result<Option<T>, ClientError> {
    match rows.len() {
        0 => Ok(None),
        1 => Ok(rows.pop()),
        n => Err(ClientError::Store(format!(
            "Expected at most one row, got {}",
            n
        ))),
    }
}

/// Pull the most specific message out of an auth error body.
fn auth_error_message(body: &Value) -> String {
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|field| body.get(*field).and_then(Value::as_str))
        .unwrap_or("Something went wrong.")
        .to_string()
}

async fn auth_json(resp: Response) -> Result<Value, ClientError> {
    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or(Value::Null);

    if !status.is_success() {
        return Err(ClientError::Auth(auth_error_message(&body)));
    }
    Ok(body)
}

#[async_trait]
impl PostStore for RestBackend {
    async fn list_posts(&self, search: &str) -> Result<Vec<Post>, ClientError> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        if !search.is_empty() {
            query.push(("title", format!("ilike.*{}*", search)));
        }

        self.fetch_rows("posts", &query).await
    }

    async fn update_vote_counts(&self, id: &PostId, counts: VoteCounts) -> Result<(), ClientError> {
        let resp = self
            .request(Method::PATCH, self.table_url("posts"))
            .query(&[("id", format!("eq.{}", id))])
            .json(&counts)
            .send()
            .await
            .map_err(store_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Store(format!(
                "Vote update rejected with status {}: {}",
                status.as_u16(),
                body
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for RestBackend {
    async fn find_by_roll(&self, roll: &str) -> Result<Option<Identity>, ClientError> {
        self.find_profile("roll", roll).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Identity>, ClientError> {
        self.find_profile("id", id).await
    }

    async fn insert(&self, profile: &Identity) -> Result<Identity, ClientError> {
        let resp = self
            .request(Method::POST, self.table_url("users"))
            .header("Prefer", "return=representation")
            .json(&[profile])
            .send()
            .await
            .map_err(store_error)?;

        maybe_single(rows_from(resp).await?)?
            .ok_or_else(|| ClientError::Store("Insert returned no row".to_string()))
    }
}

#[async_trait]
impl CommentStore for RestBackend {
    async fn list_comments(&self, post_id: &PostId) -> Result<Vec<Comment>, ClientError> {
        self.fetch_rows(
            "comments",
            &[
                ("select", "*".to_string()),
                ("post_id", format!("eq.{}", post_id)),
                ("order", "created_at.asc".to_string()),
            ],
        )
        .await
    }

    async fn add_comment(&self, comment: &NewComment) -> Result<Comment, ClientError> {
        let resp = self
            .request(Method::POST, self.table_url("comments"))
            .header("Prefer", "return=representation")
            .json(&[comment])
            .send()
            .await
            .map_err(store_error)?;

        maybe_single(rows_from(resp).await?)?
            .ok_or_else(|| ClientError::Store("Insert returned no row".to_string()))
    }
}

#[async_trait]
impl AuthService for RestBackend {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<String>, ClientError> {
        let resp = self
            .request(Method::POST, self.auth_url("signup"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| ClientError::Auth(format!("Auth service unreachable: {}", e)))?;

        let body = auth_json(resp).await?;

        // Depending on email confirmation settings the body is either a user
        // or a session wrapping one.
        let user_id = body
            .pointer("/user/id")
            .or_else(|| body.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(user_id)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, ClientError> {
        let resp = self
            .request(Method::POST, self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| ClientError::Auth(format!("Auth service unreachable: {}", e)))?;

        let body = auth_json(resp).await?;

        let access_token = body.get("access_token").and_then(Value::as_str);
        let user_id = body.pointer("/user/id").and_then(Value::as_str);

        match (access_token, user_id) {
            (Some(access_token), Some(user_id)) => Ok(AuthSession {
                access_token: access_token.to_string(),
                user_id: user_id.to_string(),
            }),
            _ => Err(ClientError::Auth(
                "Auth service returned no session.".to_string(),
            )),
        }
    }
}
