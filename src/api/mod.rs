//! Access to the maintenance API.
//!
//! [`AdminApi`] is the only seam through which the rest of the crate talks
//! to the server. [`HttpApi`] implements it over HTTP; tests substitute an
//! in-memory implementation.

mod client;
pub mod error;

pub use client::{HttpApi, TOKEN_HEADER};
pub use error::ApiError;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::models::{RecordId, ResourceKind};

/// Body of `POST /login`
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub nome_usuario: String,
    pub senha: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            nome_usuario: username.into(),
            senha: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("nome_usuario", &self.nome_usuario)
            .field("senha", &"[redacted]")
            .finish()
    }
}

#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Exchange credentials for a session token
    async fn login(&self, credentials: &Credentials) -> Result<String, ApiError>;

    /// Fetch a whole collection, in whichever shape the server sends it
    async fn list(&self, kind: ResourceKind, token: &str) -> Result<Value, ApiError>;

    async fn create(&self, kind: ResourceKind, token: &str, body: &Value) -> Result<(), ApiError>;

    async fn update(
        &self,
        kind: ResourceKind,
        id: RecordId,
        token: &str,
        body: &Value,
    ) -> Result<(), ApiError>;

    async fn delete(&self, kind: ResourceKind, id: RecordId, token: &str) -> Result<(), ApiError>;
}
