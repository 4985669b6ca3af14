use crate::{
    database::MongoDB,
    jobs::csv_import,
    models::{
        CollaboratorInput, CollaboratorListResponse, CollaboratorResponse,
        UpdateCollaboratorRequest, UploadResponse,
    },
    services::auth_service::Claims,
    services::collaborator_service,
};
use actix_web::{web, HttpResponse};
use std::path::PathBuf;
use uuid::Uuid;

/// Limite de upload de CSV (2 MB)
pub const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

#[utoipa::path(
    post,
    path = "/api/v1/collaborators",
    tag = "Collaborators",
    request_body = CollaboratorInput,
    responses(
        (status = 201, description = "Collaborator created successfully", body = CollaboratorResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "A collaborator with this email or CPF already exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_collaborator(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<CollaboratorInput>,
) -> HttpResponse {
    let user_id = &user.sub;
    log::info!("📝 POST /collaborators - user {}", user_id);

    match collaborator_service::create(&db, user_id, &request).await {
        Ok(collaborator) => {
            log::info!("✅ Collaborator created: {}", collaborator.collaborator_id);
            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "message": "Collaborator created successfully",
                "collaborator": CollaboratorResponse::from(collaborator),
            }))
        }
        Err(e) => {
            log::warn!("❌ Failed to create collaborator: {}", e);
            e.to_http_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/collaborators",
    tag = "Collaborators",
    responses(
        (status = 200, description = "Collaborators owned by the authenticated manager", body = CollaboratorListResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_collaborators(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
) -> HttpResponse {
    let user_id = &user.sub;
    log::info!("📋 GET /collaborators - user {}", user_id);

    match collaborator_service::list(&db, user_id).await {
        Ok(collaborators) => {
            let collaborators: Vec<CollaboratorResponse> = collaborators
                .into_iter()
                .map(CollaboratorResponse::from)
                .collect();
            let count = collaborators.len();
            HttpResponse::Ok().json(CollaboratorListResponse {
                success: true,
                collaborators,
                count,
            })
        }
        Err(e) => {
            log::error!("❌ Error listing collaborators: {}", e);
            e.to_http_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/collaborators/{id}",
    tag = "Collaborators",
    request_body = UpdateCollaboratorRequest,
    params(("id" = String, Path, description = "Collaborator id")),
    responses(
        (status = 200, description = "Collaborator updated successfully", body = CollaboratorResponse),
        (status = 403, description = "Collaborator belongs to another manager"),
        (status = 404, description = "Collaborator not found"),
        (status = 409, description = "A collaborator with this email or CPF already exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_collaborator(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    request: web::Json<UpdateCollaboratorRequest>,
) -> HttpResponse {
    let user_id = &user.sub;
    let collaborator_id = path.into_inner();
    log::info!("🔧 PUT /collaborators/{} - user {}", collaborator_id, user_id);

    match collaborator_service::update(&db, user_id, &collaborator_id, &request).await {
        Ok(collaborator) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Collaborator updated successfully",
            "collaborator": CollaboratorResponse::from(collaborator),
        })),
        Err(e) => {
            log::warn!("❌ Failed to update collaborator {}: {}", collaborator_id, e);
            e.to_http_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/collaborators/{id}",
    tag = "Collaborators",
    params(("id" = String, Path, description = "Collaborator id")),
    responses(
        (status = 200, description = "Collaborator deleted successfully"),
        (status = 403, description = "Collaborator belongs to another manager"),
        (status = 404, description = "Collaborator not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_collaborator(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> HttpResponse {
    let user_id = &user.sub;
    let collaborator_id = path.into_inner();
    log::info!("🗑️  DELETE /collaborators/{} - user {}", collaborator_id, user_id);

    match collaborator_service::delete(&db, user_id, &collaborator_id).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Collaborator deleted successfully"
        })),
        Err(e) => {
            log::warn!("❌ Failed to delete collaborator {}: {}", collaborator_id, e);
            e.to_http_response()
        }
    }
}

fn upload_dir() -> PathBuf {
    PathBuf::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()))
}

#[utoipa::path(
    post,
    path = "/api/v1/collaborators/upload",
    tag = "Collaborators",
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 202, description = "Import scheduled", body = UploadResponse),
        (status = 200, description = "Import for this file already in progress", body = UploadResponse),
        (status = 400, description = "Empty or oversized file")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_csv(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    body: web::Bytes,
) -> HttpResponse {
    let user_id = user.sub.clone();
    log::info!("📤 POST /collaborators/upload - user {} ({} bytes)", user_id, body.len());

    if body.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "uploaded file is empty"
        }));
    }
    if body.len() > MAX_UPLOAD_BYTES {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "uploaded file exceeds the 2MB limit"
        }));
    }

    // Nome derivado do conteúdo: o mesmo arquivo reenviado cai na mesma
    // chave de deduplicação do pipeline.
    let file_name = format!("{}.csv", Uuid::new_v5(&Uuid::NAMESPACE_OID, &body));
    let dir = upload_dir();
    let path = dir.join(file_name);

    if let Err(e) = tokio::fs::create_dir_all(&dir).await {
        log::error!("❌ Failed to create upload dir {}: {}", dir.display(), e);
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": "failed to store uploaded file"
        }));
    }

    // Grava apenas se ainda não existe: o nome é derivado do conteúdo,
    // então um arquivo presente já tem exatamente estes bytes.
    if !path.exists() {
        if let Err(e) = tokio::fs::write(&path, &body).await {
            log::error!("❌ Failed to store upload at {}: {}", path.display(), e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": "failed to store uploaded file"
            }));
        }
    }

    match csv_import::enqueue(db.get_ref().clone(), path, user_id) {
        csv_import::EnqueueOutcome::Accepted => HttpResponse::Accepted().json(UploadResponse {
            success: true,
            message: "Import scheduled; you will be notified by email".to_string(),
        }),
        csv_import::EnqueueOutcome::Deduped => HttpResponse::Ok().json(UploadResponse {
            success: true,
            message: "An import for this file was already accepted recently".to_string(),
        }),
    }
}
