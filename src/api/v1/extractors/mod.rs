/*
 * Responsibility
 * - Handler-side access to what the middleware stored in the request context
 * - Request binding + validation
 */
mod db;
mod logged_user;
mod validated_json;

pub use db::Db;
pub use logged_user::LoggedUser;
pub use validated_json::{VALIDATION_FAILED, ValidatedJson, ValidatedJsonRejection, validate};
