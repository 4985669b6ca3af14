use crate::database::MongoDB;
use crate::models::User;
use crate::services::auth_service;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};

/// Seed do gestor inicial. Só insere se o email configurado ainda não
/// existe; sem SEED_USER_EMAIL/SEED_USER_PASSWORD o seed é ignorado.
pub async fn seed_default_user(db: &MongoDB) {
    let (email, password) = match (
        std::env::var("SEED_USER_EMAIL"),
        std::env::var("SEED_USER_PASSWORD"),
    ) {
        (Ok(email), Ok(password)) => (email, password),
        _ => {
            log::debug!("🌱 Seed user not configured — skipping");
            return;
        }
    };

    let collection = db.collection::<User>("users");

    let count = collection
        .count_documents(doc! { "email": &email })
        .await
        .unwrap_or(0);

    if count > 0 {
        log::info!("🌱 Seed user {} already in DB — skipping", email);
        return;
    }

    let hashed = match auth_service::hash_password(&password) {
        Ok(hashed) => hashed,
        Err(e) => {
            log::error!("   ❌ Failed to hash seed user password: {}", e);
            return;
        }
    };

    let now = BsonDateTime::now();
    let user = User {
        id: None,
        user_id: ObjectId::new().to_hex(),
        name: std::env::var("SEED_USER_NAME").unwrap_or_else(|_| "Gestor Inicial".to_string()),
        email,
        password: hashed,
        created_at: Some(now),
        updated_at: Some(now),
    };

    match collection.insert_one(&user).await {
        Ok(_) => log::info!("   ✅ Seed user created: {}", user.email),
        Err(e) => log::error!("   ❌ Failed to seed user: {}", e),
    }
}
