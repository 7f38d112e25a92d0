//! Transport-level errors for calls to the maintenance API.
//!
//! Every failure the client can observe is mapped to one of these variants.
//! The `Display` output is what the end user sees, so messages reported by
//! the server are carried verbatim.

use reqwest::StatusCode;
use serde::Deserialize;

/// Message shown whenever the server could not be reached.
pub const CONNECT_ERROR_MESSAGE: &str = "Erro ao conectar ao servidor";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never completed (refused, DNS, timeout, TLS)
    #[error("{}", CONNECT_ERROR_MESSAGE)]
    Network(String),

    /// The server answered 401 to a request carrying a token
    #[error("Sessão expirada. Faça login novamente")]
    Unauthorized,

    /// The server answered with a non-success status
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// A success response whose body could not be understood
    #[error("Resposta inesperada do servidor")]
    Decode(String),
}

/// Error envelope returned by the API. Older endpoints use `error`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ApiError {
    /// Build a rejection from a status and raw body.
    ///
    /// The server's `message` (or `error`) field wins; otherwise the
    /// canonical reason phrase for the status is used.
    pub fn rejected(status: StatusCode, body: &str) -> Self {
        let fallback = status.canonical_reason().unwrap_or("Erro desconhecido");
        Self::rejected_or(status, body, fallback)
    }

    /// Same as [`ApiError::rejected`] but with a caller-chosen fallback
    /// when the body carries no message.
    pub fn rejected_or(status: StatusCode, body: &str, fallback: &str) -> Self {
        let message = server_message(body).unwrap_or_else(|| fallback.to_string());
        ApiError::Rejected {
            status: status.as_u16(),
            message,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    /// HTTP status of a rejection, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Unauthorized => Some(401),
            _ => None,
        }
    }
}

fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty())
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
