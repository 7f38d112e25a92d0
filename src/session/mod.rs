//! Session guard: the single owner of the token and its permission.
//!
//! The guard is the only writer of the session. Views get a
//! [`SessionReader`] and can look at the token and permission but never
//! change them. Whenever the token cannot be decoded the guard wipes both
//! values, in memory and in durable storage, exactly as a logout does.

mod permission;
pub mod store;
mod token;

pub use permission::{Action, Permission, UnknownPermission};
pub use store::{FileStore, MemoryStore, SessionStore, StoreError, PERMISSION_KEY, TOKEN_KEY};
pub use token::{decode_claims, decode_permission, Claims, TokenError};

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::{AdminApi, ApiError, Credentials};
use crate::models::validation::{ValidationErrorBuilder, ValidationErrors, REQUIRED_MESSAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

/// Token plus the permission derived from it. Both or neither.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
    permission: Option<Permission>,
}

impl Session {
    fn authenticated(token: String, permission: Permission) -> Self {
        Self {
            token: Some(token),
            permission: Some(permission),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn permission(&self) -> Option<Permission> {
        self.permission
    }

    pub fn state(&self) -> SessionState {
        if self.token.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Username or password left blank; nothing was sent
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The server could not be reached or refused the credentials
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The server issued a token the client cannot read
    #[error("Token de acesso inválido: {0}")]
    InvalidToken(#[from] TokenError),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Read-only view of the session handed to views and renderers
#[derive(Debug, Clone)]
pub struct SessionReader {
    session: Arc<RwLock<Session>>,
}

impl SessionReader {
    pub fn token(&self) -> Option<String> {
        self.session.read().token.clone()
    }

    pub fn permission(&self) -> Option<Permission> {
        self.session.read().permission
    }

    pub fn state(&self) -> SessionState {
        self.session.read().state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Capability check for presentation decisions. Always false when
    /// nobody is logged in.
    pub fn can(&self, action: Action) -> bool {
        self.permission().is_some_and(|p| p.can(action))
    }

    pub fn snapshot(&self) -> Session {
        self.session.read().clone()
    }
}

pub struct SessionGuard {
    session: Arc<RwLock<Session>>,
    store: Box<dyn SessionStore>,
}

impl SessionGuard {
    /// Restore the session persisted by a previous run.
    ///
    /// A stored token that no longer decodes (malformed, expired, unknown
    /// permission) is wiped together with the stored permission.
    pub fn initialize(store: Box<dyn SessionStore>) -> Self {
        let guard = Self {
            session: Arc::new(RwLock::new(Session::default())),
            store,
        };

        match guard.store.get(TOKEN_KEY) {
            Some(token) => match guard.adopt(token) {
                Ok(permission) => info!(permission = %permission, "Session restored"),
                Err(SessionError::InvalidToken(e)) => {
                    warn!(error = %e, "Stored token discarded")
                }
                Err(e) => warn!(error = %e, "Failed to persist restored session"),
            },
            None => {
                // A permission without a token is stale
                if guard.store.get(PERMISSION_KEY).is_some() {
                    guard.wipe();
                }
                debug!("No stored session");
            }
        }

        guard
    }

    pub fn reader(&self) -> SessionReader {
        SessionReader {
            session: Arc::clone(&self.session),
        }
    }

    pub fn state(&self) -> SessionState {
        self.session.read().state()
    }

    pub fn permission(&self) -> Option<Permission> {
        self.session.read().permission
    }

    /// Authenticate against the API.
    ///
    /// Rejections and network failures leave the session untouched. A token
    /// that cannot be decoded leaves no trace, as if the user logged out.
    pub async fn login(
        &self,
        api: &dyn AdminApi,
        credentials: &Credentials,
    ) -> Result<Permission, SessionError> {
        let mut errors = ValidationErrorBuilder::new();
        if credentials.nome_usuario.trim().is_empty() {
            errors.add("nome_usuario", REQUIRED_MESSAGE);
        }
        if credentials.senha.is_empty() {
            errors.add("senha", REQUIRED_MESSAGE);
        }
        errors.finish()?;

        let token = api.login(credentials).await.map_err(|e| {
            warn!(user = %credentials.nome_usuario, error = %e, "Login failed");
            e
        })?;

        let permission = self.adopt(token)?;
        info!(user = %credentials.nome_usuario, permission = %permission, "Logged in");
        Ok(permission)
    }

    /// End the session explicitly
    pub fn logout(&self) {
        self.wipe();
        info!("Logged out");
    }

    /// End the session because the server stopped accepting the token
    pub fn expire(&self) {
        self.wipe();
        warn!("Session expired, credentials cleared");
    }

    /// Decode `token`, then install and persist it with its permission.
    /// On decode failure everything is wiped.
    fn adopt(&self, token: String) -> Result<Permission, SessionError> {
        let permission = match decode_permission(&token) {
            Ok(permission) => permission,
            Err(e) => {
                self.wipe();
                return Err(e.into());
            }
        };

        *self.session.write() = Session::authenticated(token.clone(), permission);

        let persisted = self
            .store
            .set(TOKEN_KEY, token.as_str())
            .and_then(|_| self.store.set(PERMISSION_KEY, permission.as_str()));
        if let Err(e) = persisted {
            // Memory and storage must agree; a half-written session is dropped
            self.wipe();
            return Err(e.into());
        }

        Ok(permission)
    }

    fn wipe(&self) {
        *self.session.write() = Session::default();
        for key in [TOKEN_KEY, PERMISSION_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "Failed to clear stored session key");
            }
        }
    }
}
