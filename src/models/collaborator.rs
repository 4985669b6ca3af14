use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

/// Colaborador gerenciado por um gestor (coleção: collaborators)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collaborator {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Identificador público (ObjectId em hex, igual ao padrão de user_id)
    pub collaborator_id: String,

    pub name: String,

    /// Único entre todos os colaboradores (índice único)
    pub email: String,

    /// CPF normalizado para 11 dígitos (índice único)
    pub cpf: String,

    pub city: String,

    /// Sigla de estado com 2 letras, maiúscula
    pub state: String,

    /// Gestor dono do registro. Imutável após a criação.
    pub user_id: String,

    pub created_at: Option<BsonDateTime>,
    pub updated_at: Option<BsonDateTime>,
}

/// Campos de entrada de um colaborador, usados tanto pelo POST síncrono
/// quanto pela montagem de linhas do CSV.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CollaboratorInput {
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub city: String,
    pub state: String,
}

/// Request de atualização parcial
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateCollaboratorRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub cpf: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CollaboratorResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub city: String,
    pub state: String,
    pub user_id: String,
}

impl From<Collaborator> for CollaboratorResponse {
    fn from(collaborator: Collaborator) -> Self {
        CollaboratorResponse {
            id: collaborator.collaborator_id,
            name: collaborator.name,
            email: collaborator.email,
            cpf: collaborator.cpf,
            city: collaborator.city,
            state: collaborator.state,
            user_id: collaborator.user_id,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CollaboratorListResponse {
    pub success: bool,
    pub collaborators: Vec<CollaboratorResponse>,
    pub count: usize,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
}
