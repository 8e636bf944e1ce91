//! Authentication and authorization for genseqdid
//!
//! Provides:
//! - JWT token generation and validation
//! - Password hashing with Argon2
//! - The user/role directory
//! - Access requirements and the guards that enforce them

pub mod identity;
pub mod jwt;
pub mod password;
pub mod roles;

pub use identity::{IdentityStore, UserSummary};
pub use jwt::{extract_token_from_header, Claims, JwtValidator, TokenInput, TokenValidationResult};
pub use password::SecretHasher;
pub use roles::{authorize, Access, Identity};
