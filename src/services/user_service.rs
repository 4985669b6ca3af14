use crate::{
    database::MongoDB,
    models::{CreateUserRequest, User, UserResponse},
    services::auth_service,
    utils::{cache, error::AppError, error::map_mongo_error, validation},
};
use futures::stream::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};

const COLLECTION: &str = "users";

/// Cria um gestor. Pre-check de email + índice único como backstop:
/// os dois caminhos produzem o mesmo `Conflict`.
pub async fn create(db: &MongoDB, request: &CreateUserRequest) -> Result<User, AppError> {
    let name = request.name.trim();
    if name.is_empty() || name.chars().count() > 255 {
        return Err(AppError::Validation(
            "name must be a non-empty string of at most 255 characters".to_string(),
        ));
    }
    let email = request.email.trim();
    if !validation::is_valid_email(email) {
        return Err(AppError::Validation(format!(
            "'{}' is not a valid email address",
            request.email
        )));
    }
    if request.password.len() < 8 {
        return Err(AppError::Validation(
            "password must have at least 8 characters".to_string(),
        ));
    }

    let collection = db.collection::<User>(COLLECTION);

    let existing = collection
        .find_one(doc! { "email": email })
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "a user with this email already exists".to_string(),
        ));
    }

    let now = BsonDateTime::now();
    let new_user = User {
        id: None,
        user_id: ObjectId::new().to_hex(),
        name: name.to_string(),
        email: email.to_string(),
        password: auth_service::hash_password(&request.password)?,
        created_at: Some(now),
        updated_at: Some(now),
    };

    collection
        .insert_one(&new_user)
        .await
        .map_err(|e| map_mongo_error(e, "a user with this email already exists"))?;

    // Limpa o cache da lista de usuários
    cache::invalidate(cache::USERS_LIST_KEY);

    log::info!("✅ User created: {} ({})", new_user.user_id, new_user.email);

    Ok(new_user)
}

/// Lista global de usuários (read-through, TTL 600s). O cache guarda a
/// projeção sem senha.
pub async fn list(db: &MongoDB) -> Result<Vec<UserResponse>, AppError> {
    cache::get_or_compute(cache::USERS_LIST_KEY, cache::LIST_TTL_SECONDS, || async {
        let collection = db.collection::<User>(COLLECTION);
        let mut cursor = collection
            .find(doc! {})
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut users = Vec::new();
        while let Some(result) = cursor.next().await {
            match result {
                Ok(user) => users.push(UserResponse::from(user)),
                Err(e) => log::error!("❌ Error reading user document: {}", e),
            }
        }
        Ok(users)
    })
    .await
}

pub async fn find_by_user_id(db: &MongoDB, user_id: &str) -> Result<Option<User>, AppError> {
    let collection = db.collection::<User>(COLLECTION);
    collection
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}
