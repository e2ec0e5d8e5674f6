#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use localserve_api::auth::{generate_jwt, hash_password, Claims};
use localserve_api::database::models::{ConversationSummary, Message, Profile, ProfileUpdate, User};
use localserve_api::database::store::{Store, StoreError};
use localserve_api::services::AssistClient;
use localserve_api::{app, config, AppState};

static INIT: Once = Once::new();

/// Pin the environment before the config singleton is first touched.
pub fn setup() {
    INIT.call_once(|| {
        std::env::set_var("JWT_SECRET", "test-secret");
        std::env::remove_var("GEMINI_API_KEY");
        let _ = config::config();
    });
}

/// In-memory Store used to drive the router without Postgres. Mirrors the
/// SQL semantics: either-direction thread symmetry, ascending order, and the
/// per-peer latest-message rollup.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    seq: AtomicI64,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    profiles: HashMap<Uuid, Profile>,
    messages: Vec<(i64, Message)>,
}

impl MemoryStore {
    pub fn message_count(&self) -> usize {
        self.inner.lock().unwrap().messages.len()
    }

    fn next_seq(&self) -> i64 {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.iter().any(|u| u.email == email) {
            return Err(StoreError::Duplicate("email already exists".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.profiles.get(&user_id).cloned())
    }

    async fn upsert_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<Profile, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let profile = Profile {
            id: user_id,
            name: update.name,
            avatar_url: update.avatar_url,
            bio: update.bio,
            updated_at: Utc::now(),
        };
        inner.profiles.insert(user_id, profile.clone());
        Ok(profile)
    }

    async fn insert_message(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        content: &str,
    ) -> Result<Message, StoreError> {
        let seq = self.next_seq();
        let message = Message {
            id: Uuid::new_v4(),
            sender_id,
            recipient_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().messages.push((seq, message.clone()));
        Ok(message)
    }

    async fn message_thread(
        &self,
        caller_id: Uuid,
        peer_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Message>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<(i64, Message)> = inner
            .messages
            .iter()
            .filter(|(_, m)| {
                (m.sender_id == caller_id && m.recipient_id == peer_id)
                    || (m.sender_id == peer_id && m.recipient_id == caller_id)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|(seq, m)| (m.created_at, *seq));
        Ok(rows
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|(_, m)| m)
            .collect())
    }

    async fn conversations(&self, caller_id: Uuid) -> Result<Vec<ConversationSummary>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut latest: HashMap<Uuid, (i64, Message)> = HashMap::new();
        for (seq, m) in &inner.messages {
            let peer = if m.sender_id == caller_id {
                m.recipient_id
            } else if m.recipient_id == caller_id {
                m.sender_id
            } else {
                continue;
            };
            let newer = match latest.get(&peer) {
                Some((prev_seq, prev)) => (m.created_at, *seq) > (prev.created_at, *prev_seq),
                None => true,
            };
            if newer {
                latest.insert(peer, (*seq, m.clone()));
            }
        }

        let mut summaries: Vec<(i64, ConversationSummary)> = latest
            .into_iter()
            .map(|(peer_id, (seq, m))| {
                (
                    seq,
                    ConversationSummary {
                        peer_id,
                        last_message: m.content,
                        last_message_at: m.created_at,
                    },
                )
            })
            .collect();
        summaries.sort_by_key(|(seq, s)| std::cmp::Reverse((s.last_message_at, *seq)));
        Ok(summaries.into_iter().map(|(_, s)| s).collect())
    }
}

/// A store whose every query fails, for asserting upstream-error passthrough.
pub struct FailingStore;

#[async_trait]
impl Store for FailingStore {
    async fn health(&self) -> Result<(), StoreError> {
        Err(StoreError::Query("store offline".to_string()))
    }

    async fn create_user(&self, _: &str, _: &str) -> Result<User, StoreError> {
        Err(StoreError::Query("store offline".to_string()))
    }

    async fn user_by_email(&self, _: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Query("store offline".to_string()))
    }

    async fn profile(&self, _: Uuid) -> Result<Option<Profile>, StoreError> {
        Err(StoreError::Query("store offline".to_string()))
    }

    async fn upsert_profile(&self, _: Uuid, _: ProfileUpdate) -> Result<Profile, StoreError> {
        Err(StoreError::Query("store offline".to_string()))
    }

    async fn insert_message(&self, _: Uuid, _: Uuid, _: &str) -> Result<Message, StoreError> {
        Err(StoreError::Query("store offline".to_string()))
    }

    async fn message_thread(&self, _: Uuid, _: Uuid, _: i64) -> Result<Vec<Message>, StoreError> {
        Err(StoreError::Query("store offline".to_string()))
    }

    async fn conversations(&self, _: Uuid) -> Result<Vec<ConversationSummary>, StoreError> {
        Err(StoreError::Query("store offline".to_string()))
    }
}

pub fn test_app() -> (Router, Arc<MemoryStore>) {
    setup();
    let store = Arc::new(MemoryStore::default());
    let state = AppState {
        store: store.clone(),
        assist: AssistClient::from_config(&config::config().assist),
    };
    (app(state), store)
}

pub fn failing_app() -> Router {
    setup();
    let state = AppState {
        store: Arc::new(FailingStore),
        assist: AssistClient::from_config(&config::config().assist),
    };
    app(state)
}

pub async fn seed_user(store: &MemoryStore, email: &str) -> User {
    store
        .create_user(email, &hash_password("password123"))
        .await
        .expect("seed user")
}

pub fn bearer_for(user: &User) -> String {
    generate_jwt(Claims::new(user.id, user.email.clone())).expect("mint token")
}

/// Drive one request through the router and decode the JSON body (Null for
/// empty bodies).
pub async fn send_request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.clone().oneshot(request).await.expect("response");
    decode_response(response).await
}

/// Like [`send_request`] but with a verbatim body, for payloads that are not
/// valid JSON.
pub async fn send_raw_request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = builder.body(Body::from(body.to_string())).expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    decode_response(response).await
}

async fn decode_response(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
