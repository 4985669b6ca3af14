use actix_web::HttpResponse;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    Validation(String),
    Conflict(String),
    NotFound(String),
    Forbidden(String),
    Database(String),
    Io(String),
    InvalidFormat(String),
    Mail(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
            AppError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            AppError::Mail(msg) => write!(f, "Mail error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Converte o erro para a resposta HTTP correspondente.
    /// Corpo no formato padrão `{"success": false, "error": "..."}`.
    pub fn to_http_response(&self) -> HttpResponse {
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });
        match self {
            AppError::Validation(_) | AppError::InvalidFormat(_) => {
                HttpResponse::BadRequest().json(body)
            }
            AppError::Forbidden(_) => HttpResponse::Forbidden().json(body),
            AppError::NotFound(_) => HttpResponse::NotFound().json(body),
            AppError::Conflict(_) => HttpResponse::Conflict().json(body),
            AppError::Database(_) | AppError::Io(_) | AppError::Mail(_) => {
                HttpResponse::InternalServerError().json(body)
            }
        }
    }
}

/// Detecta violação de índice único (duplicate key, código 11000).
pub fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref write_err)) => write_err.code == 11000,
        ErrorKind::Command(ref command_err) => command_err.code == 11000,
        _ => false,
    }
}

/// Mapeia erros do driver MongoDB para a taxonomia do serviço.
/// Duplicate key vira `Conflict` para que o pre-check e a violação de
/// constraint sejam indistinguíveis para o chamador.
pub fn map_mongo_error(err: mongodb::error::Error, conflict_msg: &str) -> AppError {
    if is_duplicate_key_error(&err) {
        AppError::Conflict(conflict_msg.to_string())
    } else {
        AppError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_detail() {
        let err = AppError::Conflict("a collaborator with this email or CPF already exists".into());
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation("x".into()).to_http_response().status(),
            actix_web::http::StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Forbidden("x".into()).to_http_response().status(),
            actix_web::http::StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("x".into()).to_http_response().status(),
            actix_web::http::StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("x".into()).to_http_response().status(),
            actix_web::http::StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Database("x".into()).to_http_response().status(),
            actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
