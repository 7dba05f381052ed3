//! In-memory collaborators shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Map};
use tokio::sync::{Notify, Semaphore};

use crate::errors::ClientError;
use crate::models::{
    AuthSession, Comment, Identity, NewComment, Post, PostId, RowId, SsoUserData, VoteCounts,
};
use crate::remote::{AuthService, CommentStore, PostStore, ProfileStore};
use crate::sso::SsoClient;

pub fn identity(id: &str, roll: &str) -> Identity {
    Identity {
        id: id.to_string(),
        name: "Asha Rao".to_string(),
        roll: roll.to_string(),
        department: "CSE".to_string(),
        degree: "BTech".to_string(),
        role: "student".to_string(),
        extra: Map::new(),
    }
}

pub fn post(id: i64, title: &str, upvotes: i64, downvotes: i64) -> Post {
    Post {
        id: RowId::Int(id),
        title: title.to_string(),
        content: format!("{} content", title),
        flair: Some("General".to_string()),
        image_url: None,
        upvotes,
        downvotes,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap() + chrono::Duration::minutes(id),
    }
}

pub fn sso_user(roll: &str) -> SsoUserData {
    serde_json::from_value(json!({
        "name": "Asha Rao",
        "roll": roll,
        "department": "CSE",
        "degree": "BTech"
    }))
    .unwrap()
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap()
}

/// Fake hosted backend: posts, profiles, comments and auth in memory.
pub struct FakeBackend {
    pub posts: Mutex<Vec<Post>>,
    pub profiles: Mutex<Vec<Identity>>,
    pub comments: Mutex<Vec<Comment>>,
    accounts: Mutex<HashMap<String, (String, String)>>,

    pub update_calls: AtomicUsize,
    pub profile_reads: AtomicUsize,
    pub inserts: AtomicUsize,
    pub auth_calls: AtomicUsize,

    pub fail_list: AtomicBool,
    pub fail_updates: AtomicBool,
    pub fail_profile_reads: AtomicBool,
    pub fail_inserts: AtomicBool,

    hold_updates: AtomicBool,
    pub update_started: Notify,
    update_permits: Semaphore,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            posts: Mutex::default(),
            profiles: Mutex::default(),
            comments: Mutex::default(),
            accounts: Mutex::default(),
            update_calls: AtomicUsize::new(0),
            profile_reads: AtomicUsize::new(0),
            inserts: AtomicUsize::new(0),
            auth_calls: AtomicUsize::new(0),
            fail_list: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
            fail_profile_reads: AtomicBool::new(false),
            fail_inserts: AtomicBool::new(false),
            hold_updates: AtomicBool::new(false),
            update_started: Notify::new(),
            update_permits: Semaphore::new(0),
        }
    }

    pub fn with_posts(posts: Vec<Post>) -> Self {
        let backend = Self::new();
        *lock(&backend.posts) = posts;
        backend
    }

    pub fn add_profile(&self, profile: Identity) {
        lock(&self.profiles).push(profile);
    }

    pub fn add_account(&self, email: &str, password: &str, user_id: &str) {
        lock(&self.accounts).insert(
            email.to_string(),
            (password.to_string(), user_id.to_string()),
        );
    }

    /// Park every counter update until [`FakeBackend::release_update`].
    pub fn hold_updates(&self) {
        self.hold_updates.store(true, Ordering::SeqCst);
    }

    pub fn release_update(&self) {
        self.update_permits.add_permits(1);
    }

    pub fn stored_post(&self, id: i64) -> Option<Post> {
        lock(&self.posts)
            .iter()
            .find(|p| p.id == RowId::Int(id))
            .cloned()
    }
}

#[async_trait]
impl PostStore for FakeBackend {
    async fn list_posts(&self, search: &str) -> Result<Vec<Post>, ClientError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ClientError::Store("list failed".to_string()));
        }
        let needle = search.to_lowercase();
        let mut posts: Vec<Post> = lock(&self.posts)
            .iter()
            .filter(|p| p.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn update_vote_counts(&self, id: &PostId, counts: VoteCounts) -> Result<(), ClientError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        if self.hold_updates.load(Ordering::SeqCst) {
            self.update_started.notify_one();
            let permit = self
                .update_permits
                .acquire()
                .await
                .map_err(|e| ClientError::Store(e.to_string()))?;
            permit.forget();
        }

        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(ClientError::Store("update rejected".to_string()));
        }

        let mut posts = lock(&self.posts);
        let post = posts
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| ClientError::Store("no such post".to_string()))?;
        post.upvotes = counts.upvotes;
        post.downvotes = counts.downvotes;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for FakeBackend {
    async fn find_by_roll(&self, roll: &str) -> Result<Option<Identity>, ClientError> {
        self.profile_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_profile_reads.load(Ordering::SeqCst) {
            return Err(ClientError::Store("read failed".to_string()));
        }
        Ok(lock(&self.profiles).iter().find(|p| p.roll == roll).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Identity>, ClientError> {
        self.profile_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_profile_reads.load(Ordering::SeqCst) {
            return Err(ClientError::Store("read failed".to_string()));
        }
        Ok(lock(&self.profiles).iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, profile: &Identity) -> Result<Identity, ClientError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(ClientError::Store("insert failed".to_string()));
        }
        let mut stored = profile.clone();
        stored
            .extra
            .insert("created_at".to_string(), json!("2024-05-01T10:00:00+00:00"));
        lock(&self.profiles).push(stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl CommentStore for FakeBackend {
    async fn list_comments(&self, post_id: &PostId) -> Result<Vec<Comment>, ClientError> {
        Ok(lock(&self.comments)
            .iter()
            .filter(|c| &c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn add_comment(&self, comment: &NewComment) -> Result<Comment, ClientError> {
        let mut comments = lock(&self.comments);
        let stored = Comment {
            id: RowId::Int(comments.len() as i64 + 1),
            post_id: comment.post_id.clone(),
            content: comment.content.clone(),
            author_id: Some(comment.author_id.clone()),
            author_name: Some(comment.author_name.clone()),
            created_at: Utc::now(),
        };
        comments.push(stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl AuthService for FakeBackend {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<String>, ClientError> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        let mut accounts = lock(&self.accounts);
        if accounts.contains_key(email) {
            return Err(ClientError::Auth("User already registered".to_string()));
        }
        let user_id = format!("auth-{}", accounts.len() + 1);
        accounts.insert(email.to_string(), (password.to_string(), user_id.clone()));
        Ok(Some(user_id))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, ClientError> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        match lock(&self.accounts).get(email) {
            Some((stored, user_id)) if stored == password => Ok(AuthSession {
                access_token: format!("access-{}", user_id),
                user_id: user_id.clone(),
            }),
            _ => Err(ClientError::Auth("Invalid login credentials".to_string())),
        }
    }
}

/// Fake SSO endpoint returning a canned answer.
pub struct FakeSso {
    response: Mutex<Result<SsoUserData, ClientError>>,
    pub calls: AtomicUsize,
}

impl FakeSso {
    pub fn answering(response: Result<SsoUserData, ClientError>) -> Self {
        Self {
            response: Mutex::new(response),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SsoClient for FakeSso {
    async fn fetch_user(&self, _token: &str) -> Result<SsoUserData, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.response).clone()
    }
}
