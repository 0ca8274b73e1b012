//! In-memory store adapters and request helpers for driving the router in tests.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use feedback_coach_core::domain::{
    Document, DocumentSummary, NewTrainingSample, NewUser, TrainingSample, User, UserCredentials,
};
use feedback_coach_core::ports::{
    CredentialStore, DocumentStore, PortError, PortResult, TrainingCorpusStore,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

use api_lib::adapters::{Argon2PasswordService, JwtTokenService};
use api_lib::web::{router, AppState};

pub const SECRET: &str = "integration-secret";

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    documents: Vec<(u64, Document)>,
    training: Vec<TrainingSample>,
    sequence: u64,
}

/// Mirrors the PostgreSQL adapter's semantics, including the unique constraints.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn training_samples(&self) -> Vec<TrainingSample> {
        self.tables.lock().unwrap().training.clone()
    }

    pub fn last_login(&self, email: &str) -> Option<DateTime<Utc>> {
        let tables = self.tables.lock().unwrap();
        tables
            .users
            .iter()
            .find(|c| c.user.email == email)
            .and_then(|c| c.user.last_login)
    }

    /// Removes an account and, like the foreign key, its documents.
    pub fn delete_user(&self, email: &str) {
        let mut tables = self.tables.lock().unwrap();
        let ids: Vec<Uuid> = tables
            .users
            .iter()
            .filter(|c| c.user.email == email)
            .map(|c| c.user.id)
            .collect();
        tables.users.retain(|c| c.user.email != email);
        tables.documents.retain(|(_, d)| !ids.contains(&d.user_id));
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn create(&self, user: &NewUser) -> PortResult<Uuid> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|c| c.user.email == user.email) {
            return Err(PortError::Conflict("Email already registered".to_string()));
        }
        let id = Uuid::new_v4();
        tables.users.push(UserCredentials {
            user: User {
                id,
                email: user.email.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                created_at: Utc::now(),
                last_login: None,
            },
            password_hash: user.password_hash.clone(),
        });
        Ok(id)
    }

    async fn find_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|c| c.user.email == email).cloned())
    }

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(c) = tables.users.iter_mut().find(|c| c.user.id == user_id) {
            c.user.last_login = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn exists_title_for_user(&self, user_id: Uuid, title: &str) -> PortResult<bool> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .documents
            .iter()
            .any(|(_, d)| d.user_id == user_id && d.title == title))
    }

    async fn insert(&self, user_id: Uuid, title: &str, content: &str) -> PortResult<Uuid> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .documents
            .iter()
            .any(|(_, d)| d.user_id == user_id && d.title == title)
        {
            return Err(PortError::Conflict("Duplicate document title".to_string()));
        }
        tables.sequence += 1;
        let seq = tables.sequence;
        let id = Uuid::new_v4();
        tables.documents.push((
            seq,
            Document {
                id,
                user_id,
                title: title.to_string(),
                content: content.to_string(),
                created_at: Utc::now(),
            },
        ));
        Ok(id)
    }

    async fn list_for_user(&self, user_id: Uuid) -> PortResult<Vec<DocumentSummary>> {
        let tables = self.tables.lock().unwrap();
        let mut owned: Vec<&(u64, Document)> = tables
            .documents
            .iter()
            .filter(|(_, d)| d.user_id == user_id)
            .collect();
        owned.sort_by(|(sa, a), (sb, b)| b.created_at.cmp(&a.created_at).then(sb.cmp(sa)));
        Ok(owned
            .into_iter()
            .map(|(_, d)| DocumentSummary {
                id: d.id,
                title: d.title.clone(),
                created_at: d.created_at,
            })
            .collect())
    }

    async fn get(&self, document_id: Uuid, user_id: Uuid) -> PortResult<Option<Document>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .documents
            .iter()
            .find(|(_, d)| d.id == document_id && d.user_id == user_id)
            .map(|(_, d)| d.clone()))
    }

    async fn update_content(
        &self,
        document_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> PortResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        match tables
            .documents
            .iter_mut()
            .find(|(_, d)| d.id == document_id && d.user_id == user_id)
        {
            Some((_, d)) => {
                d.content = content.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn rename(&self, document_id: Uuid, user_id: Uuid, new_title: &str) -> PortResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .documents
            .iter()
            .any(|(_, d)| d.user_id == user_id && d.title == new_title && d.id != document_id)
        {
            return Err(PortError::Conflict("Duplicate document title".to_string()));
        }
        match tables
            .documents
            .iter_mut()
            .find(|(_, d)| d.id == document_id && d.user_id == user_id)
        {
            Some((_, d)) => {
                d.title = new_title.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, document_id: Uuid, user_id: Uuid) -> PortResult<Option<Document>> {
        let mut tables = self.tables.lock().unwrap();
        let position = tables
            .documents
            .iter()
            .position(|(_, d)| d.id == document_id && d.user_id == user_id);
        Ok(position.map(|i| tables.documents.remove(i).1))
    }
}

#[async_trait]
impl TrainingCorpusStore for InMemoryStore {
    async fn append(&self, sample: &NewTrainingSample) -> PortResult<TrainingSample> {
        let stored = TrainingSample {
            id: Uuid::new_v4(),
            original_text: sample.original_text.clone(),
            teacher_correction: sample.teacher_correction.clone(),
            cbc_feedback: sample.cbc_feedback.clone(),
            submitted_at: Utc::now(),
        };
        self.tables.lock().unwrap().training.push(stored.clone());
        Ok(stored)
    }
}

/// The full router wired to an in-memory store and the real crypto adapters.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::default());
        let state = AppState::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(Argon2PasswordService::new()),
            Arc::new(JwtTokenService::new(SECRET, Duration::minutes(30))),
        );
        Self {
            router: router(Arc::new(state)),
            store,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn upload(
        &self,
        token: &str,
        filename: &str,
        content_type: &str,
        content: &[u8],
    ) -> (StatusCode, Value) {
        let boundary = "cbc-test-boundary";
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/documents/upload")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Signs up and logs in, returning the access token.
    pub async fn register(&self, email: &str, password: &str) -> String {
        let (status, _) = self
            .json(
                Method::POST,
                "/auth/signup",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "password": password,
                    "first_name": "A",
                    "last_name": "B",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self
            .json(
                Method::POST,
                "/auth/login",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().unwrap().to_string()
    }
}
