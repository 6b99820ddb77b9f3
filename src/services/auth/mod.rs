pub mod factory;
pub mod jwt;
pub mod token;
pub mod verifier;

pub use factory::build_verifier;
pub use jwt::JwtVerifier;
pub use token::IdentityToken;
pub use verifier::{TokenVerifier, VerifyError};
