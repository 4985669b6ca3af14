use crate::{database::MongoDB, services::auth_service};
use crate::services::auth_service::{AuthResponse, LoginRequest};
use actix_web::{web, HttpRequest, HttpResponse};

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    db: web::Data<MongoDB>,
    request: web::Json<auth_service::LoginRequest>,
) -> HttpResponse {
    log::info!("🔐 POST /auth/login - email: {}", request.email);

    match auth_service::login(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", request.email);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.email, e);
            HttpResponse::Unauthorized().json(serde_json::json!({
                "success": false,
                "error": "Unauthorized"
            }))
        }
    }
}

/// Logout: invalida o token apresentado no header Authorization.
pub async fn logout(req: HttpRequest) -> HttpResponse {
    log::info!("🔓 POST /auth/logout");

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match token {
        Some(token) => match auth_service::logout(token) {
            Ok(()) => HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "Successfully logged out"
            })),
            Err(e) => {
                log::warn!("❌ Logout failed: {}", e);
                HttpResponse::Unauthorized().json(serde_json::json!({
                    "success": false,
                    "error": "Invalid token"
                }))
            }
        },
        None => HttpResponse::Unauthorized().json(serde_json::json!({
            "success": false,
            "error": "Missing authorization token"
        })),
    }
}
