//! Session context - who is signed in
//!
//! One `SessionContext` is created at startup and handed to whatever needs
//! identity. The composition code only ever asks `is_signed_in()`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::{json, BackendClient};
use crate::error::BackendError;
use crate::task::Task;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: Identity,
    #[serde(flatten)]
    pub tokens: Tokens,
}

/// The identity service.
pub trait AuthBackend: Send + Sync {
    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError>;
    fn refresh(&self, refresh_token: &str) -> Result<AuthSession, BackendError>;
    fn sign_out(&self, access_token: &str) -> Result<(), BackendError>;
}

pub struct SupabaseAuth {
    client: BackendClient,
}

impl SupabaseAuth {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

impl AuthBackend for SupabaseAuth {
    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let resp = self
            .client
            .request(reqwest::Method::POST, "auth/v1/token?grant_type=password", None)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()?;
        json(resp)
    }

    fn refresh(&self, refresh_token: &str) -> Result<AuthSession, BackendError> {
        let resp = self
            .client
            .request(reqwest::Method::POST, "auth/v1/token?grant_type=refresh_token", None)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()?;
        json(resp)
    }

    fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let resp = self
            .client
            .request(reqwest::Method::POST, "auth/v1/logout", Some(access_token))
            .send()?;
        crate::backend::check(resp)?;
        Ok(())
    }
}

pub struct SessionContext {
    backend: Option<Arc<dyn AuthBackend>>,
    current: Option<AuthSession>,
    /// Where the refresh token is kept between runs.
    store: Option<PathBuf>,
}

impl SessionContext {
    pub fn new(backend: Arc<dyn AuthBackend>, store: Option<PathBuf>) -> Self {
        Self { backend: Some(backend), current: None, store }
    }

    /// No identity service: nobody can sign in.
    pub fn offline() -> Self {
        Self { backend: None, current: None, store: None }
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_user(&self) -> Option<&Identity> {
        self.current.as_ref().map(|s| &s.user)
    }

    pub fn access_token(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.tokens.access_token.as_str())
    }

    fn backend(&self) -> Result<Arc<dyn AuthBackend>, BackendError> {
        self.backend.clone().ok_or(BackendError::NotConfigured)
    }

    /// Password sign-in on a worker; hand the result to `finish_sign_in`.
    pub fn begin_sign_in(&self, email: &str, password: &str) -> Task<Result<AuthSession, BackendError>> {
        let backend = self.backend();
        let (email, password) = (email.to_string(), password.to_string());
        Task::spawn(move || backend?.sign_in(&email, &password))
    }

    pub fn finish_sign_in(&mut self, result: Result<AuthSession, BackendError>) -> Result<(), BackendError> {
        let session = result?;
        self.adopt(session);
        Ok(())
    }

    pub fn sign_in(&mut self, email: &str, password: &str) -> Result<(), BackendError> {
        let result = self.backend()?.sign_in(email, password);
        self.finish_sign_in(result)
    }

    /// Local state is cleared even when the remote call fails.
    pub fn sign_out(&mut self) -> Result<(), BackendError> {
        match self.clear_local() {
            Some((backend, token)) => backend.sign_out(&token),
            None => Ok(()),
        }
    }

    /// Clear local state now and revoke the token on a worker. `None` when
    /// nobody was signed in or there is no backend to tell.
    pub fn begin_sign_out(&mut self) -> Option<Task<Result<(), BackendError>>> {
        let (backend, token) = self.clear_local()?;
        Some(Task::spawn(move || backend.sign_out(&token)))
    }

    fn clear_local(&mut self) -> Option<(Arc<dyn AuthBackend>, String)> {
        let session = self.current.take()?;
        log::info!("signing out {}", session.user.id);
        self.forget_tokens();
        let backend = self.backend.clone()?;
        Some((backend, session.tokens.access_token))
    }

    /// Refresh a stored session on a worker. `None` when there is nothing
    /// to restore.
    pub fn begin_restore(&self) -> Option<Task<Result<AuthSession, BackendError>>> {
        let backend = self.backend.clone()?;
        let tokens = self.stored_tokens()?;
        Some(Task::spawn(move || backend.refresh(&tokens.refresh_token)))
    }

    pub fn finish_restore(&mut self, result: Result<AuthSession, BackendError>) {
        match result {
            Ok(session) => self.adopt(session),
            Err(e) => {
                log::warn!("could not restore session: {}", e);
                self.forget_tokens();
            }
        }
    }

    pub fn adopt(&mut self, session: AuthSession) {
        log::info!("signed in as {}", session.user.email.as_deref().unwrap_or(&session.user.id));
        self.save_tokens(&session.tokens);
        self.current = Some(session);
    }

    fn stored_tokens(&self) -> Option<Tokens> {
        let path = self.store.as_ref()?;
        let contents = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    fn save_tokens(&self, tokens: &Tokens) {
        let Some(path) = &self.store else {
            return;
        };
        let written = serde_json::to_string(tokens)
            .map_err(BackendError::from)
            .and_then(|s| {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                write_private(path, s.as_bytes()).map_err(BackendError::from)
            });
        if let Err(e) = written {
            log::warn!("could not save session to {}: {}", path.display(), e);
        }
    }

    fn forget_tokens(&self) {
        if let Some(path) = &self.store {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Write a file only the owner can read; it holds a refresh token.
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(0o600);
        // mode() only applies on create
        if path.exists() {
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }
    }
    let mut file = options.open(path)?;
    file.write_all(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct FakeAuth {
        fail_sign_out: AtomicBool,
        slow_sign_out: AtomicBool,
        signed_out: AtomicBool,
    }

    fn session_for(email: &str) -> AuthSession {
        AuthSession {
            user: Identity { id: format!("id-{email}"), email: Some(email.to_string()) },
            tokens: Tokens { access_token: "access".into(), refresh_token: "refresh".into() },
        }
    }

    impl AuthBackend for FakeAuth {
        fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
            if password == "hunter2" {
                Ok(session_for(email))
            } else {
                Err(BackendError::Status { status: 400, body: "invalid_grant".into() })
            }
        }

        fn refresh(&self, refresh_token: &str) -> Result<AuthSession, BackendError> {
            if refresh_token == "refresh" {
                Ok(session_for("restored@slow.computer"))
            } else {
                Err(BackendError::Status { status: 401, body: String::new() })
            }
        }

        fn sign_out(&self, _access_token: &str) -> Result<(), BackendError> {
            if self.slow_sign_out.load(Ordering::SeqCst) {
                std::thread::sleep(std::time::Duration::from_secs(2));
            }
            self.signed_out.store(true, Ordering::SeqCst);
            if self.fail_sign_out.load(Ordering::SeqCst) {
                Err(BackendError::Status { status: 500, body: "down".into() })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_offline_never_signed_in() {
        let mut ctx = SessionContext::offline();
        assert!(!ctx.is_signed_in());
        assert!(matches!(ctx.sign_in("a@b.c", "hunter2"), Err(BackendError::NotConfigured)));
        assert!(ctx.begin_restore().is_none());
        assert!(ctx.sign_out().is_ok());
    }

    #[test]
    fn test_sign_in_and_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("session.json");
        let mut ctx = SessionContext::new(Arc::new(FakeAuth::default()), Some(store.clone()));
        ctx.sign_in("me@slow.computer", "hunter2").unwrap();
        assert!(ctx.is_signed_in());
        assert_eq!(ctx.current_user().unwrap().email.as_deref(), Some("me@slow.computer"));
        assert!(store.exists());
        ctx.sign_out().unwrap();
        assert!(!ctx.is_signed_in());
        assert!(!store.exists());
    }

    #[test]
    fn test_wrong_password_stays_signed_out() {
        let mut ctx = SessionContext::new(Arc::new(FakeAuth::default()), None);
        assert!(ctx.sign_in("me@slow.computer", "nope").is_err());
        assert!(!ctx.is_signed_in());
    }

    #[test]
    fn test_sign_out_clears_even_on_failure() {
        let backend = Arc::new(FakeAuth::default());
        backend.fail_sign_out.store(true, Ordering::SeqCst);
        let mut ctx = SessionContext::new(backend.clone(), None);
        ctx.sign_in("me@slow.computer", "hunter2").unwrap();
        assert!(ctx.sign_out().is_err());
        assert!(backend.signed_out.load(Ordering::SeqCst));
        assert!(!ctx.is_signed_in());
    }

    #[test]
    fn test_background_sign_out_clears_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("session.json");
        let backend = Arc::new(FakeAuth::default());
        backend.slow_sign_out.store(true, Ordering::SeqCst);
        backend.fail_sign_out.store(true, Ordering::SeqCst);
        let mut ctx = SessionContext::new(backend.clone(), Some(store.clone()));
        ctx.sign_in("me@slow.computer", "hunter2").unwrap();

        let started = std::time::Instant::now();
        let task = ctx.begin_sign_out().expect("remote logout task");
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        assert!(!ctx.is_signed_in());
        assert!(ctx.access_token().is_none());
        assert!(!store.exists());

        assert!(task.wait().unwrap().is_err());
        assert!(backend.signed_out.load(Ordering::SeqCst));
        assert!(ctx.begin_sign_out().is_none());
    }

    #[test]
    fn test_background_sign_out_offline_is_none() {
        let mut ctx = SessionContext::offline();
        assert!(ctx.begin_sign_out().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("session.json");
        std::fs::write(&store, "{}").unwrap();
        std::fs::set_permissions(&store, std::fs::Permissions::from_mode(0o644)).unwrap();

        let mut ctx = SessionContext::new(Arc::new(FakeAuth::default()), Some(store.clone()));
        ctx.sign_in("me@slow.computer", "hunter2").unwrap();
        let mode = std::fs::metadata(&store).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let fresh = dir.path().join("fresh/session.json");
        let mut ctx = SessionContext::new(Arc::new(FakeAuth::default()), Some(fresh.clone()));
        ctx.sign_in("me@slow.computer", "hunter2").unwrap();
        assert_eq!(std::fs::metadata(&fresh).unwrap().permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn test_restore_from_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("session.json");
        let backend: Arc<dyn AuthBackend> = Arc::new(FakeAuth::default());
        let mut first = SessionContext::new(backend.clone(), Some(store.clone()));
        first.sign_in("me@slow.computer", "hunter2").unwrap();

        let mut second = SessionContext::new(backend, Some(store));
        let task = second.begin_restore().expect("stored session");
        second.finish_restore(task.wait().unwrap());
        assert_eq!(
            second.current_user().and_then(|u| u.email.as_deref()),
            Some("restored@slow.computer")
        );
    }

    #[test]
    fn test_failed_restore_forgets_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("session.json");
        std::fs::write(&store, r#"{"access_token":"a","refresh_token":"stale"}"#).unwrap();
        let mut ctx = SessionContext::new(Arc::new(FakeAuth::default()), Some(store.clone()));
        let task = ctx.begin_restore().unwrap();
        ctx.finish_restore(task.wait().unwrap());
        assert!(!ctx.is_signed_in());
        assert!(!store.exists());
    }

    #[test]
    fn test_token_response_parses() {
        let body = r#"{
            "access_token": "jwt", "token_type": "bearer", "expires_in": 3600,
            "refresh_token": "r1",
            "user": { "id": "5b1c", "email": "me@slow.computer", "role": "authenticated" }
        }"#;
        let session: AuthSession = serde_json::from_str(body).unwrap();
        assert_eq!(session.user.id, "5b1c");
        assert_eq!(session.tokens.refresh_token, "r1");
    }
}
