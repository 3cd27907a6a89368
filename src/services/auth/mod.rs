pub mod factory;
pub mod identity;
pub mod jwt;
pub mod password;

pub use factory::build_token_service;
pub use identity::{AuthSession, IdentityService};
pub use jwt::{IdentityClaims, JwtTokenService, TokenService};
pub use password::PasswordHasher;
