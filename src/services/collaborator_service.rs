use crate::{
    database::MongoDB,
    models::{Collaborator, CollaboratorInput, UpdateCollaboratorRequest},
    policies,
    utils::{cache, error::AppError, error::map_mongo_error, validation},
};
use futures::stream::StreamExt;
use mongodb::bson::{doc, Document, DateTime as BsonDateTime};
use mongodb::bson::oid::ObjectId;

const COLLECTION: &str = "collaborators";
const DUPLICATE_MSG: &str = "a collaborator with this email or CPF already exists";

/// Cria um colaborador para o gestor. O pre-check por `email OR cpf` é
/// check-then-act; uma corrida de inserção concorrente estoura o índice
/// único e chega ao chamador como o mesmo `Conflict`.
pub async fn create(
    db: &MongoDB,
    owner_id: &str,
    input: &CollaboratorInput,
) -> Result<Collaborator, AppError> {
    let normalized = validation::validate_collaborator(input).map_err(AppError::Validation)?;

    let collection = db.collection::<Collaborator>(COLLECTION);

    let existing = collection
        .find_one(doc! {
            "$or": [
                { "email": &normalized.email },
                { "cpf": &normalized.cpf }
            ]
        })
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    if existing.is_some() {
        return Err(AppError::Conflict(DUPLICATE_MSG.to_string()));
    }

    let now = BsonDateTime::now();
    let collaborator = Collaborator {
        id: None,
        collaborator_id: ObjectId::new().to_hex(),
        name: normalized.name,
        email: normalized.email,
        cpf: normalized.cpf,
        city: normalized.city,
        state: normalized.state,
        user_id: owner_id.to_string(),
        created_at: Some(now),
        updated_at: Some(now),
    };

    collection
        .insert_one(&collaborator)
        .await
        .map_err(|e| map_mongo_error(e, DUPLICATE_MSG))?;

    // Toda mutação invalida a lista do dono na mesma operação
    cache::invalidate(&cache::collaborators_key(owner_id));

    log::info!(
        "✅ Collaborator created: {} ({}) for user {}",
        collaborator.collaborator_id,
        collaborator.email,
        owner_id
    );

    Ok(collaborator)
}

/// Lista os colaboradores do gestor (read-through, TTL 600s).
pub async fn list(db: &MongoDB, owner_id: &str) -> Result<Vec<Collaborator>, AppError> {
    if !policies::can_view(owner_id) {
        return Err(AppError::Forbidden("listing is not allowed".to_string()));
    }

    let key = cache::collaborators_key(owner_id);
    cache::get_or_compute(&key, cache::LIST_TTL_SECONDS, || async {
        let collection = db.collection::<Collaborator>(COLLECTION);
        let mut cursor = collection
            .find(doc! { "user_id": owner_id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut collaborators = Vec::new();
        while let Some(result) = cursor.next().await {
            match result {
                Ok(collaborator) => collaborators.push(collaborator),
                Err(e) => log::error!("❌ Error reading collaborator document: {}", e),
            }
        }
        Ok(collaborators)
    })
    .await
}

async fn find_by_collaborator_id(
    db: &MongoDB,
    collaborator_id: &str,
) -> Result<Option<Collaborator>, AppError> {
    let collection = db.collection::<Collaborator>(COLLECTION);
    collection
        .find_one(doc! { "collaborator_id": collaborator_id })
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Atualização parcial. `NotFound` antes de `Forbidden`; campos passam
/// pelas mesmas regras do create; `owner_id` nunca muda.
pub async fn update(
    db: &MongoDB,
    acting_user_id: &str,
    collaborator_id: &str,
    request: &UpdateCollaboratorRequest,
) -> Result<Collaborator, AppError> {
    let collaborator = find_by_collaborator_id(db, collaborator_id)
        .await?
        .ok_or_else(|| AppError::NotFound("collaborator not found".to_string()))?;

    if !policies::can_modify(acting_user_id, &collaborator) {
        return Err(AppError::Forbidden(
            "you can only modify your own collaborators".to_string(),
        ));
    }

    // Valida o registro resultante da mesclagem, não só os campos enviados
    let merged = CollaboratorInput {
        name: request.name.clone().unwrap_or_else(|| collaborator.name.clone()),
        email: request.email.clone().unwrap_or_else(|| collaborator.email.clone()),
        cpf: request.cpf.clone().unwrap_or_else(|| collaborator.cpf.clone()),
        city: request.city.clone().unwrap_or_else(|| collaborator.city.clone()),
        state: request.state.clone().unwrap_or_else(|| collaborator.state.clone()),
    };
    let normalized = validation::validate_collaborator(&merged).map_err(AppError::Validation)?;

    let update_doc: Document = doc! {
        "$set": {
            "name": &normalized.name,
            "email": &normalized.email,
            "cpf": &normalized.cpf,
            "city": &normalized.city,
            "state": &normalized.state,
            "updated_at": BsonDateTime::now(),
        }
    };

    let collection = db.collection::<Collaborator>(COLLECTION);
    collection
        .update_one(doc! { "collaborator_id": collaborator_id }, update_doc)
        .await
        .map_err(|e| map_mongo_error(e, DUPLICATE_MSG))?;

    cache::invalidate(&cache::collaborators_key(acting_user_id));

    log::info!("✅ Collaborator updated: {} by user {}", collaborator_id, acting_user_id);

    find_by_collaborator_id(db, collaborator_id)
        .await?
        .ok_or_else(|| AppError::NotFound("collaborator not found".to_string()))
}

/// Remoção com o mesmo gating not-found/forbidden do update.
pub async fn delete(
    db: &MongoDB,
    acting_user_id: &str,
    collaborator_id: &str,
) -> Result<(), AppError> {
    let collaborator = find_by_collaborator_id(db, collaborator_id)
        .await?
        .ok_or_else(|| AppError::NotFound("collaborator not found".to_string()))?;

    if !policies::can_modify(acting_user_id, &collaborator) {
        return Err(AppError::Forbidden(
            "you can only delete your own collaborators".to_string(),
        ));
    }

    let collection = db.collection::<Collaborator>(COLLECTION);
    collection
        .delete_one(doc! { "collaborator_id": collaborator_id })
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    cache::invalidate(&cache::collaborators_key(acting_user_id));

    log::info!("🗑️  Collaborator deleted: {} by user {}", collaborator_id, acting_user_id);

    Ok(())
}

/// Existe colaborador com este email? Usado pelo pipeline de importação;
/// cada chamada re-consulta o banco, então inserções de linhas anteriores
/// da mesma execução já são visíveis.
pub async fn email_exists(db: &MongoDB, email: &str) -> Result<bool, AppError> {
    let collection = db.collection::<Collaborator>(COLLECTION);
    let found = collection
        .find_one(doc! { "email": email })
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(found.is_some())
}

pub async fn cpf_exists(db: &MongoDB, cpf: &str) -> Result<bool, AppError> {
    let collection = db.collection::<Collaborator>(COLLECTION);
    let found = collection
        .find_one(doc! { "cpf": cpf })
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(found.is_some())
}

/// Insere uma linha validada do CSV em nome do gestor. Não faz pre-check:
/// o chamador já checou email/cpf e trata a corrida de duplicate key.
pub async fn insert_imported(
    db: &MongoDB,
    owner_id: &str,
    normalized: CollaboratorInput,
) -> Result<Collaborator, mongodb::error::Error> {
    let now = BsonDateTime::now();
    let collaborator = Collaborator {
        id: None,
        collaborator_id: ObjectId::new().to_hex(),
        name: normalized.name,
        email: normalized.email,
        cpf: normalized.cpf,
        city: normalized.city,
        state: normalized.state,
        user_id: owner_id.to_string(),
        created_at: Some(now),
        updated_at: Some(now),
    };

    let collection = db.collection::<Collaborator>(COLLECTION);
    collection.insert_one(&collaborator).await?;
    Ok(collaborator)
}
