use crate::{
    database::MongoDB,
    models::{CreateUserRequest, UserListResponse, UserResponse},
    services::user_service,
};
use actix_web::{web, HttpResponse};

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "User already exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    db: web::Data<MongoDB>,
    request: web::Json<CreateUserRequest>,
) -> HttpResponse {
    log::info!("📝 POST /users - email: {}", request.email);

    match user_service::create(&db, &request).await {
        Ok(user) => {
            log::info!("✅ User created: {}", user.user_id);
            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "message": "User created successfully",
                "user": UserResponse::from(user),
            }))
        }
        Err(e) => {
            log::warn!("❌ Failed to create user: {}", e);
            e.to_http_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    responses(
        (status = 200, description = "List of registered users", body = UserListResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(db: web::Data<MongoDB>) -> HttpResponse {
    log::info!("📋 GET /users");

    match user_service::list(&db).await {
        Ok(users) => {
            let count = users.len();
            HttpResponse::Ok().json(UserListResponse {
                success: true,
                users,
                count,
            })
        }
        Err(e) => {
            log::error!("❌ Error listing users: {}", e);
            e.to_http_response()
        }
    }
}
