//! API Handlers
//!
//! HTTP request handlers over the generic and media caches.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::cache::{hash_key, GenericCacheStore, MediaCacheStore, ShapeRegistry};
use crate::config::{Backend, Config};
use crate::error::{CacheError, Result};
use crate::models::requests::validate_key;
use crate::models::{
    ContainsResponse, DeleteResponse, GetValueResponse, HealthResponse, MediaPath, SetResponse,
    SetValueRequest, SizeResponse, StatsResponse, VariantPath,
};
use crate::store::{HashStore, MemoryStore, RedisStore};

/// Application state shared across all handlers.
///
/// Both stores share one connection pool.
#[derive(Clone, Debug)]
pub struct AppState {
    pub generic: GenericCacheStore,
    pub media: MediaCacheStore,
}

impl AppState {
    /// Creates a new AppState over the given store.
    pub fn new(store: Arc<dyn HashStore>, registry: ShapeRegistry) -> Self {
        Self {
            generic: GenericCacheStore::new(store.clone(), registry),
            media: MediaCacheStore::new(store),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the connection pool for the configured backend; an invalid
    /// endpoint fails here rather than on first use.
    pub fn from_config(config: &Config, registry: ShapeRegistry) -> Result<Self> {
        let store: Arc<dyn HashStore> = match config.backend {
            Backend::Redis => Arc::new(RedisStore::from_config(config)?),
            Backend::Memory => Arc::new(MemoryStore::with_pool(
                config.pool_size,
                config.pool_timeout,
            )),
        };
        Ok(Self::new(store, registry))
    }
}

fn check_key(key: &str) -> Result<()> {
    match validate_key(key) {
        Some(msg) => Err(CacheError::InvalidRequest(msg)),
        None => Ok(()),
    }
}

/// Handler for GET /cache/:key
///
/// Returns the stored value with its shape, 404 on a miss.
pub async fn get_value_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetValueResponse>> {
    check_key(&key)?;

    let value = state
        .generic
        .get(&key)
        .await?
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    let shape = value.shape();
    let json = value.to_json()?;
    Ok(Json(GetValueResponse::new(key, shape, json)))
}

/// Handler for PUT /cache/:key
///
/// Decodes the body value as the named shape and stores it.
pub async fn put_value_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<SetValueRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate(&key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let registry = state.generic.registry();
    if !registry.contains(&req.shape) {
        return Err(CacheError::InvalidRequest(format!(
            "Unknown shape '{}'",
            req.shape
        )));
    }
    let value = registry.decode(&req.shape, &req.value.to_string())?;

    state.generic.set_value(&key, &*value).await?;

    Ok(Json(SetResponse::new(key)))
}

/// Handler for DELETE /cache/:key
///
/// Succeeds whether or not the key existed.
pub async fn delete_value_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    check_key(&key)?;
    state.generic.remove(&key).await?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /cache/:key/exists
pub async fn contains_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ContainsResponse>> {
    check_key(&key)?;
    let exists = state.generic.contains(&key).await?;

    Ok(Json(ContainsResponse { key, exists }))
}

/// Handler for GET /media/:category/:id/:state/:width[/:height]
///
/// Returns the raw variant bytes, 404 on a miss.
pub async fn get_variant_handler(
    State(state): State<AppState>,
    Path(path): Path<VariantPath>,
) -> Result<Response> {
    let category = path.category()?;
    let variant = path.variant()?;

    let data = state
        .media
        .get_variant(path.id, variant, category)
        .await?
        .ok_or_else(|| {
            CacheError::NotFound(format!(
                "{} {}",
                hash_key(category, &path.id),
                variant.item_key()
            ))
        })?;

    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], data).into_response())
}

/// Handler for PUT /media/:category/:id/:state/:width[/:height]
///
/// Stores the raw request body as the addressed variant.
pub async fn put_variant_handler(
    State(state): State<AppState>,
    Path(path): Path<VariantPath>,
    body: Bytes,
) -> Result<Json<SetResponse>> {
    let category = path.category()?;
    let variant = path.variant()?;

    state
        .media
        .put_variant(path.id, &body, variant, category)
        .await?;

    Ok(Json(SetResponse::new(format!(
        "{} {}",
        hash_key(category, &path.id),
        variant.item_key()
    ))))
}

/// Handler for DELETE /media/:category/:id
///
/// Drops every cached variant of the item in that category.
pub async fn delete_media_handler(
    State(state): State<AppState>,
    Path(path): Path<MediaPath>,
) -> Result<Json<DeleteResponse>> {
    let category = path.category()?;
    state.media.delete(path.id, category).await?;

    Ok(Json(DeleteResponse::new(hash_key(category, &path.id))))
}

/// Handler for GET /media/:category/:id/size
pub async fn media_size_handler(
    State(state): State<AppState>,
    Path(path): Path<MediaPath>,
) -> Result<Json<SizeResponse>> {
    let category = path.category()?;
    let total_bytes = state.media.get_total_size(path.id, category).await?;

    Ok(Json(SizeResponse {
        id: path.id,
        category,
        total_bytes,
    }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(
        state.generic.stats(),
        state.media.stats(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
