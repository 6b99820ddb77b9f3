/*
 * Responsibility
 * - Public interface of the middleware layers
 * - Each module exposes `apply(router, ..)`; auth gates hang off AuthMiddleware
 */
pub mod auth;
pub mod body_dump;
pub mod context_logger;
pub mod database;
pub mod http;
pub mod request_logger;

pub use auth::{Access, AuthError, AuthMiddleware};
pub use context_logger::ContextLogger;
