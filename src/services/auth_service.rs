use crate::{
    database::MongoDB,
    models::{User, UserResponse},
    utils::error::AppError,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use lazy_static::lazy_static;
use mongodb::bson::doc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::RwLock;
use uuid::Uuid;

const TOKEN_TTL_HOURS: i64 = 24;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // user_id
    pub email: String,
    pub name: String,
    pub iat: usize,            // issued at
    pub exp: usize,            // expiration
    pub jti: String,           // JWT ID, usado na revogação
    pub aud: String,           // audience
    pub iss: String,           // issuer
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

lazy_static! {
    // Tokens invalidados via logout (por jti). O middleware rejeita
    // qualquer token cujo jti esteja aqui até ele expirar sozinho.
    static ref REVOKED_TOKENS: RwLock<HashSet<String>> = RwLock::new(HashSet::new());
}

fn get_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "default-secret-change-me".to_string())
}

fn get_jwt_issuer() -> String {
    std::env::var("JWT_ISSUER").unwrap_or_else(|_| "collaborator-service".to_string())
}

fn get_jwt_audience() -> String {
    std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "collaborator-api".to_string())
}

/// Hash bcrypt da senha. A senha em claro nunca é persistida nem logada.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Database(format!("Failed to hash password: {}", e)))
}

pub fn check_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    verify(password, stored_hash)
        .map_err(|e| AppError::Database(format!("Password verification error: {}", e)))
}

// Generate JWT token
pub fn generate_jwt(user: &User) -> Result<String, String> {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize;
    let jti = Uuid::new_v4().to_string();

    let claims = Claims {
        sub: user.user_id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        iat,
        exp,
        jti,
        aud: get_jwt_audience(),
        iss: get_jwt_issuer(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| format!("Failed to generate token: {}", e))
}

// Verify JWT token
pub fn verify_token(token: &str) -> Result<Claims, String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[get_jwt_audience()]);

    let mut issuers = HashSet::new();
    issuers.insert(get_jwt_issuer());
    validation.iss = Some(issuers);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_jwt_secret().as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))?;

    let revoked = REVOKED_TOKENS
        .read()
        .map(|set| set.contains(&claims.jti))
        .unwrap_or(false);
    if revoked {
        return Err("Token has been invalidated".to_string());
    }

    Ok(claims)
}

// User login
pub async fn login(db: &MongoDB, request: &LoginRequest) -> Result<AuthResponse, AppError> {
    let collection = db.collection::<User>("users");

    let filter = doc! { "email": &request.email };

    let user = collection
        .find_one(filter)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::Forbidden("Invalid credentials".to_string()))?;

    let valid = check_password(&request.password, &user.password)?;
    if !valid {
        return Err(AppError::Forbidden("Invalid credentials".to_string()));
    }

    let token = generate_jwt(&user).map_err(AppError::Database)?;

    Ok(AuthResponse {
        success: true,
        token,
        token_type: "bearer".to_string(),
        expires_in: TOKEN_TTL_HOURS * 3600,
        user: UserResponse::from(user),
    })
}

/// Logout: revoga o jti do token apresentado.
pub fn logout(token: &str) -> Result<(), AppError> {
    let claims = verify_token(token).map_err(AppError::Forbidden)?;
    if let Ok(mut revoked) = REVOKED_TOKENS.write() {
        revoked.insert(claims.jti);
    }
    log::info!("🔒 Token invalidated for user {}", claims.sub);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: None,
            user_id: "u-test".to_string(),
            name: "Gestor".to_string(),
            email: "gestor@empresa.com".to_string(),
            password: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hashed = hash_password("senha123").unwrap();
        assert_ne!(hashed, "senha123");
        assert!(check_password("senha123", &hashed).unwrap());
        assert!(!check_password("senha456", &hashed).unwrap());
    }

    #[test]
    fn test_jwt_roundtrip() {
        let token = generate_jwt(&test_user()).unwrap();
        let claims = verify_token(&token).unwrap();
        assert_eq!(claims.sub, "u-test");
        assert_eq!(claims.email, "gestor@empresa.com");
    }

    #[test]
    fn test_logout_revokes_token() {
        let token = generate_jwt(&test_user()).unwrap();
        assert!(verify_token(&token).is_ok());
        logout(&token).unwrap();
        assert!(verify_token(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(verify_token("not-a-jwt").is_err());
    }
}
