//! API Module
//!
//! HTTP handlers and routing exposing both caches to a host application.
//!
//! # Endpoints
//! - `/cache/:key` - Generic cache entries
//! - `/media/:category/:id/...` - Media variants and per-item totals
//! - `GET /stats` - Store counters
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
