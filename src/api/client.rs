//! HTTP implementation of [`AdminApi`] on top of reqwest.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{AdminApi, ApiError, Credentials};
use crate::config::ApiConfig;
use crate::models::{RecordId, ResourceKind};

/// Header the API reads the session token from
pub const TOKEN_HEADER: &str = "x-access-token";

const LOGIN_FALLBACK_MESSAGE: &str = "Erro ao fazer login";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

/// Maintenance API client.
pub struct HttpApi {
    base_url: String,
    client: Client,
}

impl HttpApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("clinica-admin/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, kind: ResourceKind) -> String {
        format!("{}{}", self.base_url, kind.path())
    }

    fn record_url(&self, kind: ResourceKind, id: RecordId) -> String {
        format!("{}{}/{}", self.base_url, kind.path(), id)
    }

    /// Send an authenticated request and turn failures into [`ApiError`].
    async fn send_authenticated(&self, request: RequestBuilder, token: &str) -> Result<Response, ApiError> {
        let response = request.header(TOKEN_HEADER, token).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            warn!("Server rejected the session token");
            return Err(ApiError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = %status, body = %body, "Request rejected");
        Err(ApiError::rejected(status, &body))
    }
}

#[async_trait]
impl AdminApi for HttpApi {
    async fn login(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let url = format!("{}/login", self.base_url);
        debug!(user = %credentials.nome_usuario, "Logging in");

        let response = self.client.post(&url).json(credentials).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::rejected_or(status, &body, LOGIN_FALLBACK_MESSAGE));
        }

        let login: LoginResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(login.token)
    }

    async fn list(&self, kind: ResourceKind, token: &str) -> Result<Value, ApiError> {
        let request = self.client.get(self.collection_url(kind));
        let response = self.send_authenticated(request, token).await?;
        Ok(response.json().await?)
    }

    async fn create(&self, kind: ResourceKind, token: &str, body: &Value) -> Result<(), ApiError> {
        let request = self.client.post(self.collection_url(kind)).json(body);
        self.send_authenticated(request, token).await?;
        Ok(())
    }

    async fn update(
        &self,
        kind: ResourceKind,
        id: RecordId,
        token: &str,
        body: &Value,
    ) -> Result<(), ApiError> {
        let request = self.client.put(self.record_url(kind, id)).json(body);
        self.send_authenticated(request, token).await?;
        Ok(())
    }

    async fn delete(&self, kind: ResourceKind, id: RecordId, token: &str) -> Result<(), ApiError> {
        let request = self.client.delete(self.record_url(kind, id));
        self.send_authenticated(request, token).await?;
        Ok(())
    }
}
