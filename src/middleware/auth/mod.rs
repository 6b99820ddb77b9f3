pub mod access;

pub use access::{Access, AuthError, AuthMiddleware, BEARER_PREFIX, LOGGED_USER_ID_HEADER};
