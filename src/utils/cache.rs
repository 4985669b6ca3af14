// Cache em memória com TTL, compartilhado entre os serviços.
// O cache é apenas otimização: todo caminho de escrita que altera o conjunto
// espelhado deve invalidar a chave correspondente na mesma operação.
use crate::utils::error::AppError;
use lazy_static::lazy_static;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;
use std::time::{Duration, Instant};

pub const LIST_TTL_SECONDS: u64 = 600;
pub const USERS_LIST_KEY: &str = "users-list";

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

lazy_static! {
    static ref CACHE: RwLock<HashMap<String, CacheEntry>> = RwLock::new(HashMap::new());
}

/// Chave da lista de colaboradores de um gestor.
pub fn collaborators_key(user_id: &str) -> String {
    format!("collaborators_user_{}", user_id)
}

pub fn get_cached<T: DeserializeOwned>(key: &str) -> Option<T> {
    let cache = CACHE.read().ok()?;
    let entry = cache.get(key)?;
    if entry.expires_at <= Instant::now() {
        return None;
    }
    serde_json::from_str(&entry.value).ok()
}

pub fn set_cached<T: Serialize>(key: &str, value: &T, ttl_seconds: u64) {
    let serialized = match serde_json::to_string(value) {
        Ok(s) => s,
        Err(e) => {
            log::error!("❌ Failed to serialize cache entry '{}': {}", key, e);
            return;
        }
    };
    if let Ok(mut cache) = CACHE.write() {
        let now = Instant::now();
        cache.retain(|_, entry| entry.expires_at > now);
        cache.insert(
            key.to_string(),
            CacheEntry {
                value: serialized,
                expires_at: now + Duration::from_secs(ttl_seconds),
            },
        );
    }
}

pub fn invalidate(key: &str) {
    if let Ok(mut cache) = CACHE.write() {
        if cache.remove(key).is_some() {
            log::debug!("🧹 Cache invalidated: {}", key);
        }
    }
}

/// Read-through: no miss calcula, guarda com TTL e retorna.
pub async fn get_or_compute<T, F, Fut>(
    key: &str,
    ttl_seconds: u64,
    producer: F,
) -> Result<T, AppError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    if let Some(hit) = get_cached::<T>(key) {
        log::debug!("📦 Cache hit: {}", key);
        return Ok(hit);
    }
    let value = producer().await?;
    set_cached(key, &value, ttl_seconds);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        set_cached("cache-test-roundtrip", &vec![1u32, 2, 3], 600);
        let hit: Option<Vec<u32>> = get_cached("cache-test-roundtrip");
        assert_eq!(hit, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        set_cached("cache-test-expired", &"value".to_string(), 0);
        let hit: Option<String> = get_cached("cache-test-expired");
        assert!(hit.is_none());
    }

    #[test]
    fn test_invalidate_removes_entry() {
        set_cached("cache-test-invalidate", &42u32, 600);
        invalidate("cache-test-invalidate");
        let hit: Option<u32> = get_cached("cache-test-invalidate");
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn test_get_or_compute_only_computes_on_miss() {
        let first = get_or_compute("cache-test-compute", 600, || async {
            Ok::<u32, AppError>(7)
        })
        .await
        .unwrap();
        assert_eq!(first, 7);

        // Segundo producer nunca roda: valor vem do cache
        let second = get_or_compute("cache-test-compute", 600, || async {
            Err::<u32, AppError>(AppError::Database("should not run".into()))
        })
        .await
        .unwrap();
        assert_eq!(second, 7);
    }

    #[tokio::test]
    async fn test_get_or_compute_propagates_producer_error() {
        let result = get_or_compute::<u32, _, _>("cache-test-error", 600, || async {
            Err(AppError::Database("boom".into()))
        })
        .await;
        assert!(result.is_err());
        // Erro não é cacheado
        let hit: Option<u32> = get_cached("cache-test-error");
        assert!(hit.is_none());
    }

    #[test]
    fn test_collaborators_key_format() {
        assert_eq!(collaborators_key("abc123"), "collaborators_user_abc123");
    }
}
