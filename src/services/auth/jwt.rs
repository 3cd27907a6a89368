use std::{error::Error as StdError, fmt};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Identity carried inside an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    pub id: String,
    pub email: String,
}

// Errors returned by token issuance / verification.
#[derive(Debug)]
pub enum TokenError {
    Jwt(jsonwebtoken::errors::Error),
    EmptyClaim(&'static str),
    ExpiryOutOfRange,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jwt(e) => write!(f, "jwt operation failed: {}", e),
            Self::EmptyClaim(name) => write!(f, "empty '{}' claim", name),
            Self::ExpiryOutOfRange => write!(f, "token expiry out of range"),
        }
    }
}

impl StdError for TokenError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Jwt(e) => Some(e),
            _ => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Self::Jwt(e)
    }
}

/// Signs and verifies identity tokens.
///
/// Claims returned by `verify` are only produced after signature and expiry
/// checks have passed.
pub trait TokenService: Send + Sync {
    fn issue(&self, claims: &IdentityClaims) -> Result<String, TokenError>;
    fn verify(&self, token: &str) -> Result<IdentityClaims, TokenError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessTokenClaims {
    id: String,
    email: String,
    iat: i64,
    exp: i64,
}

/// HS256 tokens signed with the process-wide secret.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: u64,
}

impl fmt::Debug for JwtTokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("JwtTokenService")
            .field("validation", &self.validation)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl JwtTokenService {
    pub fn new(secret: &[u8], ttl_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, claims: &IdentityClaims) -> Result<String, TokenError> {
        let now = chrono::Utc::now().timestamp();
        let exp = i64::try_from(self.ttl_seconds)
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or(TokenError::ExpiryOutOfRange)?;
        let payload = AccessTokenClaims {
            id: claims.id.clone(),
            email: claims.email.clone(),
            iat: now,
            exp,
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());
        Ok(jsonwebtoken::encode(&header, &payload, &self.encoding_key)?)
    }

    fn verify(&self, token: &str) -> Result<IdentityClaims, TokenError> {
        let data = jsonwebtoken::decode::<AccessTokenClaims>(
            token,
            &self.decoding_key,
            &self.validation,
        )?;
        let claims = data.claims;

        if claims.id.trim().is_empty() {
            return Err(TokenError::EmptyClaim("id"));
        }
        if claims.email.trim().is_empty() {
            return Err(TokenError::EmptyClaim("email"));
        }

        Ok(IdentityClaims {
            id: claims.id,
            email: claims.email,
        })
    }
}
