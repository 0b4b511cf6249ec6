pub mod dto;
pub mod extractors;
pub mod jwt;
pub mod password;
pub mod services;

pub use extractors::AuthUser;
pub use jwt::JwtKeys;
