use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Collaborator Service API",
        version = "1.0.0",
        description = "API de gerenciamento de usuários e colaboradores.\n\n**Authentication:** endpoints under /api/v1 require a JWT Bearer token obtained via /api/v1/auth/login.\n\n**Features:**\n- Manager accounts (create, list)\n- Collaborator CRUD scoped to the authenticated manager\n- Asynchronous CSV bulk import with email report",
        contact(
            name = "Collaborator Service Team",
            email = "support@collaborator-service.com"
        )
    ),
    paths(
        // Auth endpoints
        crate::api::auth::login,

        // Health
        crate::api::health::health_check,

        // Users
        crate::api::users::create_user,
        crate::api::users::list_users,

        // Collaborators
        crate::api::collaborators::create_collaborator,
        crate::api::collaborators::list_collaborators,
        crate::api::collaborators::update_collaborator,
        crate::api::collaborators::delete_collaborator,
        crate::api::collaborators::upload_csv,
    ),
    components(
        schemas(
            // Auth
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::AuthResponse,

            // Health
            crate::api::health::HealthResponse,

            // Users
            crate::models::CreateUserRequest,
            crate::models::UserResponse,
            crate::models::UserListResponse,

            // Collaborators
            crate::models::CollaboratorInput,
            crate::models::UpdateCollaboratorRequest,
            crate::models::CollaboratorResponse,
            crate::models::CollaboratorListResponse,
            crate::models::UploadResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Authentication endpoints. Email/password login returning a JWT bearer token."),
        (name = "Health", description = "Health check endpoint for monitoring service status."),
        (name = "Users", description = "Manager account endpoints. Create and list manager users."),
        (name = "Collaborators", description = "Collaborator management endpoints, scoped to the authenticated manager. Includes asynchronous CSV bulk import."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}
