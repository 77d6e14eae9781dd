

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use validator::ValidationErrors;

/// Type de résultat standard pour l'application
pub type AppResult<T> = Result<T, AppError>;

/// Erreurs principales de l'application
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Requête mal formée (400 Bad Request)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Données invalides (422 Unprocessable Entity)
    #[error("Validation failed: {0}")]
    ValidationError(ValidationErrors),

    /// Ressource non trouvée (404 Not Found)
    #[error("{0} not found")]
    NotFound(String),

    /// Crédits épuisés (402 Payment Required)
    #[error("No credits left")]
    NoCredits,

    /// Réponse invalide ou erreur renvoyée par le fournisseur (502 Bad Gateway)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Budget de polling épuisé sans statut terminal (504 Gateway Timeout)
    #[error("Provider timeout: {0}")]
    PollTimeout(String),

    /// Erreur de l'API Bot Telegram (502 Bad Gateway)
    #[error("Telegram API error: {0}")]
    Telegram(String),

    /// Erreur de base de données (500 Internal Server Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Erreur de sérialisation/désérialisation (500 Internal Server Error)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Erreur de configuration (500 Internal Server Error)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Erreur interne du serveur (500 Internal Server Error)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Convertit l'erreur en code HTTP approprié
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NoCredits => StatusCode::PAYMENT_REQUIRED,
            AppError::Provider(_) => StatusCode::BAD_GATEWAY,
            AppError::PollTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Telegram(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Code d'erreur stable exposé dans les réponses JSON
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::ValidationError(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::NoCredits => "no_credits",
            AppError::Provider(_) => "provider_error",
            AppError::PollTimeout(_) => "provider_timeout",
            AppError::Telegram(_) => "telegram_error",
            AppError::Database(_) => "database_error",
            AppError::Serialization(_) => "serialization_error",
            AppError::Configuration(_) => "configuration_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("❌ {}", self);
        }

        // Le détail brut n'est exposé que pour le diagnostic côté client
        let body = match self {
            AppError::NoCredits => json!({
                "ok": false,
                "error": "no_credits",
            }),
            AppError::Provider(detail) => json!({
                "ok": false,
                "error": "provider_error",
                "detail": detail,
            }),
            AppError::PollTimeout(detail) => json!({
                "ok": false,
                "error": "provider_timeout",
                "detail": detail,
            }),
            other => json!({
                "ok": false,
                "error": other.error_code(),
                "detail": other.to_string(),
            }),
        };

        HttpResponse::build(status).json(body)
    }
}

// Implémentations From pour les conversions automatiques

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::ValidationError(errors)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        // Pas de retry: un échec de transport remonte immédiatement
        AppError::Provider(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(
            AppError::NoCredits.status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            AppError::Provider("boom".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::PollTimeout("late".to_string()).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::BadRequest("missing".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn poll_timeout_is_distinct_from_provider_error() {
        let timeout = AppError::PollTimeout("image job abc".to_string());
        let provider = AppError::Provider("image job abc".to_string());
        assert_ne!(timeout.error_code(), provider.error_code());
        assert_ne!(timeout.status_code(), provider.status_code());
    }
}
