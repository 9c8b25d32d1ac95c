use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::store::StoreError;

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

/// Failures surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{error}")]
    Validation {
        error: String,
        details: Option<String>,
    },
    #[error("{0}")]
    Authentication(String),
    #[error("Acesso negado")]
    Authorization,
    #[error("{0}")]
    NotFound(String),
    #[error("{error}")]
    Dependency {
        error: String,
        details: Option<String>,
    },
}

impl ApiError {
    pub fn validation(error: impl Into<String>) -> Self {
        ApiError::Validation {
            error: error.into(),
            details: None,
        }
    }

    pub fn validation_with(error: impl Into<String>, details: impl Into<String>) -> Self {
        ApiError::Validation {
            error: error.into(),
            details: Some(details.into()),
        }
    }

    pub fn unauthenticated(error: impl Into<String>) -> Self {
        ApiError::Authentication(error.into())
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        ApiError::NotFound(error.into())
    }

    pub fn dependency(error: impl Into<String>) -> Self {
        ApiError::Dependency {
            error: error.into(),
            details: None,
        }
    }

    fn details(&self) -> Option<&str> {
        match self {
            ApiError::Validation { details, .. } | ApiError::Dependency { details, .. } => {
                details.as_deref()
            }
            _ => None,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Dependency { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: &message,
            details: self.details(),
        })
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        log::error!("Database error: {}", e);
        ApiError::Dependency {
            error: e.to_string(),
            details: None,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidToken(_) => ApiError::unauthenticated("Token inválido"),
            AuthError::Hashing(_) => {
                log::error!("Password hashing failed: {}", e);
                ApiError::dependency("Erro ao processar senha")
            }
            AuthError::Signing(_) => {
                log::error!("Failed to encode token: {}", e);
                ApiError::dependency("Erro ao gerar token")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn renders_error_and_details() {
        let resp = ApiError::validation_with("Dados inválidos", "missing field `nome`").error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Dados inválidos");
        assert_eq!(body["details"], "missing field `nome`");
    }

    #[actix_web::test]
    async fn omits_details_when_absent() {
        let resp = ApiError::Authorization.error_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let bytes = to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Acesso negado");
        assert!(body.get("details").is_none());
    }

    #[test]
    fn maps_statuses() {
        assert_eq!(ApiError::unauthenticated("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(StoreError::Backend("down".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
