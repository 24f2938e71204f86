//! Identity: sessions, sign-in, and session change notifications.
//!
//! The hosted backend's identity service issues a JWT per session. The role
//! that gates admin operations is read from a verified claim on that token
//! (`app_metadata.role`), set server-side at provisioning time; the
//! [`admin_email_hint`] check exists only so the UI can pre-select the admin
//! sign-in tab and grants nothing.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::{RwLock, broadcast};

use crate::config::BackendConfig;
use crate::types::UserId;

/// Capacity of the session event channel. Slow observers drop old events.
const EVENT_CAPACITY: usize = 16;

/// Email domains that hint at an admin account, for UI pre-selection only.
const ADMIN_EMAIL_DOMAINS: &[&str] = &["@admin.com", "@matchday.ke"];

/// Errors from the identity boundary.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email or password did not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The operation requires an admin session.
    #[error("admin role required")]
    Forbidden,

    /// No session is active.
    #[error("not signed in")]
    NotAuthenticated,

    /// The identity service rejected the request.
    #[error("identity error: {0}")]
    Backend(String),

    /// The request never completed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Authorization role carried by a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular supporter account.
    #[default]
    Fan,
    /// Back-office account.
    Admin,
}

/// An authenticated session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    /// The signed-in account.
    pub user_id: UserId,
    /// Sign-in email.
    pub email: String,
    /// Role from the verified token claim.
    pub role: UserRole,
    /// Bearer token for data requests under this user's policies.
    pub access_token: String,
}

impl Session {
    /// Whether this session may perform admin operations.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Session lifecycle notifications.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    /// A session became active.
    SignedIn(Session),
    /// The active session ended.
    SignedOut,
}

/// The identity boundary.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Register a new account and sign it in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Sign in with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// End the active session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The active session, if any.
    async fn current_session(&self) -> Option<Session>;

    /// Subscribe to session changes. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

/// Whether an email address looks like an admin account.
///
/// UI hint only: the server decides the actual role from the token claim.
#[must_use]
pub fn admin_email_hint(email: &str) -> bool {
    let lowered = email.to_lowercase();
    ADMIN_EMAIL_DOMAINS
        .iter()
        .any(|domain| lowered.ends_with(domain))
}

/// Wire shape of a GoTrue token grant.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: WireUser,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: UserId,
    email: String,
    #[serde(default)]
    app_metadata: WireAppMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct WireAppMetadata {
    #[serde(default)]
    role: Option<UserRole>,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        Session {
            user_id: self.user.id,
            email: self.user.email,
            role: self.user.app_metadata.role.unwrap_or_default(),
            access_token: self.access_token,
        }
    }
}

/// [`AuthProvider`] against the hosted backend's GoTrue-style identity
/// service at `/auth/v1`.
pub struct GotrueProvider {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl GotrueProvider {
    /// Build a provider for the configured backend.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            http: reqwest::Client::new(),
            base_url: config.url.trim_end_matches('/').to_owned(),
            anon_key: config.anon_key.clone(),
            session: RwLock::new(None),
            events,
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    async fn grant(&self, url: String, email: &str, password: &str) -> Result<Session, AuthError> {
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::BAD_REQUEST
            || response.status() == reqwest::StatusCode::UNAUTHORIZED
        {
            return Err(AuthError::InvalidCredentials);
        }
        if !response.status().is_success() {
            return Err(AuthError::Backend(response.status().to_string()));
        }

        let session = response.json::<TokenResponse>().await?.into_session();
        *self.session.write().await = Some(session.clone());
        let _ = self.events.send(SessionEvent::SignedIn(session.clone()));
        tracing::info!(user = %session.user_id, "signed in");
        Ok(session)
    }
}

#[async_trait]
impl AuthProvider for GotrueProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.grant(self.auth_url("signup"), email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.grant(self.auth_url("token?grant_type=password"), email, password)
            .await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let previous = self.session.write().await.take();
        if let Some(session) = previous {
            let response = self
                .http
                .post(self.auth_url("logout"))
                .header("apikey", &self.anon_key)
                .bearer_auth(&session.access_token)
                .send()
                .await?;
            // The local session is gone either way; a failed revoke only
            // means the token lives until expiry.
            if !response.status().is_success() {
                tracing::warn!(status = %response.status(), "token revocation failed");
            }
            let _ = self.events.send(SessionEvent::SignedOut);
        }
        Ok(())
    }

    async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

/// In-memory [`AuthProvider`] for tests: accounts are registered up front
/// with a fixed role.
pub struct MockAuthProvider {
    accounts: RwLock<Vec<MockAccount>>,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

struct MockAccount {
    email: String,
    password: String,
    role: UserRole,
    user_id: UserId,
}

impl MockAuthProvider {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            accounts: RwLock::new(Vec::new()),
            session: RwLock::new(None),
            events,
        }
    }

    /// Register an account that [`AuthProvider::sign_in`] will accept.
    pub async fn register(&self, email: &str, password: &str, role: UserRole) -> UserId {
        let user_id = UserId::new();
        self.accounts.write().await.push(MockAccount {
            email: email.to_owned(),
            password: password.to_owned(),
            role,
            user_id,
        });
        user_id
    }
}

impl Default for MockAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.register(email, password, UserRole::Fan).await;
        self.sign_in(email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let accounts = self.accounts.read().await;
        let account = accounts
            .iter()
            .find(|a| a.email == email && a.password == password)
            .ok_or(AuthError::InvalidCredentials)?;
        let session = Session {
            user_id: account.user_id,
            email: account.email.clone(),
            role: account.role,
            access_token: format!("mock-token-{}", account.user_id),
        };
        drop(accounts);
        *self.session.write().await = Some(session.clone());
        let _ = self.events.send(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if self.session.write().await.take().is_some() {
            let _ = self.events.send(SessionEvent::SignedOut);
        }
        Ok(())
    }

    async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
