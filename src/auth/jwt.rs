//! JWT Token Handling
//!
//! Session tokens carry the user id, username and role names. They are
//! stateless: the server keeps no registry, so a token stays valid until
//! its `exp` claim passes.
//!
//! Security notes:
//! - Tokens are signed with HS256 (HMAC-SHA256)
//! - Default expiry is 1 hour
//! - In production, JWT_SECRET should be a strong random value from environment

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::roles::{ADMIN, DEMO};
use crate::types::ServiceError;

/// Payload stored in JWT token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id (or "demo" for demo tokens)
    pub sub: String,
    /// Username
    pub username: String,
    /// Names of every role assigned to the user
    pub roles: Vec<String>,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

impl Claims {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// True if at least one of `allowed` is among the claimed roles
    pub fn has_any_role(&self, allowed: &[&str]) -> bool {
        allowed.iter().any(|role| self.has_role(role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN)
    }
}

/// Input for creating a new token
#[derive(Debug, Clone)]
pub struct TokenInput {
    pub user_id: String,
    pub username: String,
    pub roles: Vec<String>,
}

impl TokenInput {
    /// Fixed identity handed out without credentials. It carries only the
    /// `demo` role: routes open to any authenticated caller accept it,
    /// role-restricted ones do not.
    pub fn demo() -> Self {
        Self {
            user_id: DEMO.into(),
            username: DEMO.into(),
            roles: vec![DEMO.into()],
        }
    }
}

/// Result of token validation
#[derive(Debug)]
pub struct TokenValidationResult {
    pub valid: bool,
    pub claims: Option<Claims>,
    pub error: Option<String>,
}

impl TokenValidationResult {
    pub fn valid(claims: Claims) -> Self {
        Self {
            valid: true,
            claims: Some(claims),
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            claims: None,
            error: Some(error.into()),
        }
    }
}

/// JWT validator and generator
#[derive(Clone)]
pub struct JwtValidator {
    secret: String,
    expiry_seconds: u64,
}

impl JwtValidator {
    /// Create a new JWT validator
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self, ServiceError> {
        if secret.is_empty() {
            return Err(ServiceError::Config(
                "JWT_SECRET is required in production mode".into(),
            ));
        }

        if secret.len() < 32 {
            return Err(ServiceError::Config(
                "JWT_SECRET must be at least 32 characters".into(),
            ));
        }

        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    pub fn expiry_seconds(&self) -> u64 {
        self.expiry_seconds
    }

    /// Generate a signed token for an identity
    pub fn generate_token(&self, input: TokenInput) -> Result<String, ServiceError> {
        let now = unix_now()?;

        let claims = Claims {
            sub: input.user_id,
            username: input.username,
            roles: input.roles,
            iat: now,
            exp: now + self.expiry_seconds,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ServiceError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verify and decode a JWT token
    pub fn verify_token(&self, token: &str) -> TokenValidationResult {
        let validation = Validation::default();

        match decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        ) {
            Ok(token_data) => TokenValidationResult::valid(token_data.claims),
            Err(err) => {
                use jsonwebtoken::errors::ErrorKind;
                let error_msg = match err.kind() {
                    ErrorKind::ExpiredSignature => "Token expired",
                    ErrorKind::InvalidToken => "Invalid token",
                    ErrorKind::InvalidSignature => "Invalid signature",
                    _ => "Token validation failed",
                };
                TokenValidationResult::invalid(error_msg)
            }
        }
    }
}

fn unix_now() -> Result<u64, ServiceError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| ServiceError::Internal(format!("System time error: {}", e)))
}

/// Extract token from Authorization header.
/// Supports "Bearer <token>" format and raw tokens.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;

    if let Some(token) = header.strip_prefix("Bearer ") {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    if !header.contains(' ') {
        let token = header.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_validator() -> JwtValidator {
        JwtValidator::new(
            "test-secret-that-is-at-least-32-characters-long".into(),
            3600,
        )
        .unwrap()
    }

    fn teacher_input() -> TokenInput {
        TokenInput {
            user_id: "1".into(),
            username: "enseignant".into(),
            roles: vec!["enseignant".into()],
        }
    }

    #[test]
    fn test_generate_and_verify_token() {
        let validator = test_validator();

        let token = validator.generate_token(teacher_input()).unwrap();
        assert!(!token.is_empty());

        let result = validator.verify_token(&token);
        assert!(result.valid);

        let claims = result.claims.unwrap();
        assert_eq!(claims.sub, "1");
        assert_eq!(claims.username, "enseignant");
        assert!(claims.has_role("enseignant"));
        assert!(!claims.is_admin());
        assert_eq!(claims.exp, claims.iat + 3600);
    }

    #[test]
    fn test_invalid_token() {
        let result = test_validator().verify_token("invalid-token");
        assert!(!result.valid);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_wrong_secret() {
        let other = JwtValidator::new(
            "different-secret-that-is-at-least-32-characters".into(),
            3600,
        )
        .unwrap();

        let token = test_validator().generate_token(teacher_input()).unwrap();
        assert!(!other.verify_token(&token).valid);
    }

    #[test]
    fn test_expired_token_rejected() {
        let validator = test_validator();
        let claims = Claims {
            sub: "1".into(),
            username: "old".into(),
            roles: vec![],
            iat: 1_000,
            exp: 2_000,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(validator.secret.as_bytes()),
        )
        .unwrap();

        let result = validator.verify_token(&token);
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("Token expired"));
    }

    #[test]
    fn test_demo_token_claims() {
        let validator = test_validator();
        let token = validator.generate_token(TokenInput::demo()).unwrap();
        let claims = validator.verify_token(&token).claims.unwrap();
        assert_eq!(claims.sub, "demo");
        assert_eq!(claims.roles, vec!["demo".to_string()]);
    }

    #[test]
    fn test_has_any_role() {
        let claims = Claims {
            sub: "3".into(),
            username: "admin".into(),
            roles: vec!["admin".into()],
            iat: 0,
            exp: 0,
        };
        assert!(claims.has_any_role(&["admin", "enseignant"]));
        assert!(!claims.has_any_role(&["chercheur"]));
        assert!(!claims.has_any_role(&[]));
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(
            extract_token_from_header(Some("Bearer abc123")),
            Some("abc123")
        );
        assert_eq!(extract_token_from_header(Some("abc123")), Some("abc123"));
        assert_eq!(extract_token_from_header(None), None);
        assert_eq!(extract_token_from_header(Some("")), None);
        assert_eq!(extract_token_from_header(Some("Bearer ")), None);
        assert_eq!(extract_token_from_header(Some("Basic abc123")), None);
    }

    #[test]
    fn test_secret_validation() {
        assert!(JwtValidator::new("short".into(), 3600).is_err());
        assert!(JwtValidator::new("".into(), 3600).is_err());
        assert!(JwtValidator::new("this-secret-is-at-least-32-chars-long".into(), 3600).is_ok());
    }
}
