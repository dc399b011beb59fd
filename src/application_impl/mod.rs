mod auth_service_impl;
mod credential_hasher_argon2;
mod token_issuer_jwt;

pub use auth_service_impl::*;
pub use credential_hasher_argon2::*;
pub use token_issuer_jwt::*;
