use std::future::Future;

use chrono::Local;
use redis::{aio::MultiplexedConnection, AsyncCommands, FromRedisValue, ToRedisArgs};
use redis_macros::{FromRedisValue, ToRedisArgs};
use serde::{Deserialize, Serialize};

use crate::database::error::CacheError;
use crate::error::ApiError;

// Caching - keys

/// One shared generation marker covers both catalogs. Any catalog write
/// bumps it and every cached copy goes stale at once.
const CATALOG_GENERATION_KEY: &str = "catalog-generation";

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub enum CatalogKey {
    Tags,
    Ingredients,
}

impl CatalogKey {
    pub fn key(&self) -> &'static str {
        match self {
            CatalogKey::Tags => "catalog-tags",
            CatalogKey::Ingredients => "catalog-ingredients",
        }
    }
}

// Cache - wrappers

#[derive(Serialize, Deserialize, FromRedisValue, ToRedisArgs, Clone)]
pub struct CachedList<T: Serialize + Send + Sync + Clone> {
    rows: Vec<T>,
    generation: Option<String>,
}

impl<T: Serialize + Send + Sync + Clone + for<'a> Deserialize<'a>> CachedList<T> {
    async fn validate(
        &self,
        cache: &mut MultiplexedConnection,
    ) -> Result<bool, ApiError> {
        let generation =
            get_cache_value::<&str, String>(CATALOG_GENERATION_KEY, cache).await?;
        Ok(self.generation == generation)
    }

    pub async fn get_or_list<'a, F, Fut>(
        key: CatalogKey,
        cache: &mut MultiplexedConnection,
        callback: F,
    ) -> Result<Vec<T>, ApiError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<T>, ApiError>> + Send + 'a,
    {
        let value = get_cache_value::<&str, CachedList<T>>(key.key(), cache)
            .await
            .unwrap_or_else(|_| {
                let mut c = cache.clone();
                tokio::spawn(async move {
                    log::error!("> Failed to deserialize cached value. Deleting {}", key.key());
                    if let Err(e) = delete_cache_value(key.key(), &mut c).await {
                        log::error!("> Failed to delete cached value! {e}");
                    }
                });
                None
            });

        let value = match value {
            Some(value) => {
                log::trace!("> Found {}", key.key());
                match value.validate(cache).await? {
                    true => Some(value),
                    false => {
                        log::trace!("> Invalidated {}", key.key());
                        None
                    }
                }
            }
            None => None,
        };

        match value {
            Some(value) => Ok(value.rows),
            None => {
                log::trace!("> Fetching {}", key.key());
                let rows = callback().await?;
                let generation =
                    get_cache_value::<&str, String>(CATALOG_GENERATION_KEY, cache).await?;
                let value = CachedList {
                    rows: rows.clone(),
                    generation,
                };

                if let Err(e) =
                    set_cache_value::<&str, CachedList<T>>(key.key(), value, cache).await
                {
                    log::error!("{e:?}");
                }

                Ok(rows)
            }
        }
    }
}

/// Bumps the shared generation marker after a catalog write.
pub async fn invalidate_catalog(cache: &mut MultiplexedConnection) -> Result<(), ApiError> {
    let generation = Local::now().timestamp_micros().to_string();
    set_cache_value(CATALOG_GENERATION_KEY, generation, cache).await
}

// Cache - raw handlers

pub async fn set_cache_value<K: ToRedisArgs + Send + Sync, V: ToRedisArgs + Send + Sync>(
    key: K,
    value: V,
    cache: &mut MultiplexedConnection,
) -> Result<(), ApiError> {
    let _: () = cache
        .set(key, value)
        .await
        .map_err(|e| ApiError::from(CacheError::from(e)))?;

    Ok(())
}

pub async fn delete_cache_value<K: ToRedisArgs + Send + Sync>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<(), ApiError> {
    let _: () = cache
        .del(key)
        .await
        .map_err(|e| ApiError::from(CacheError::from(e)))?;

    Ok(())
}

pub async fn get_cache_value<K: ToRedisArgs + Send + Sync, V: FromRedisValue>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<Option<V>, ApiError> {
    let value: Option<V> = cache
        .get(key)
        .await
        .map_err(|e| ApiError::from(CacheError::from(e)))?;

    Ok(value)
}
