//! HS256 bearer tokens

use anyhow::Result;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User mail
    pub sub: String,
    pub role: String,
    pub username: String,
    /// Expiry as a unix timestamp
    pub exp: i64,
}

/// Issues and verifies signed access tokens
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: chrono::Duration::minutes(ttl_minutes),
        }
    }

    pub fn issue(&self, mail: &str, username: &str, role: &str) -> Result<String> {
        let claims = Claims {
            sub: mail.to_string(),
            role: role.to_string(),
            username: username.to_string(),
            exp: (chrono::Utc::now() + self.ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Verify signature and expiry
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_then_verify() {
        let codec = TokenCodec::new("secret", 120);
        let token = codec.issue("asha@example.com", "asha", "Admin").unwrap();

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.sub, "asha@example.com");
        assert_eq!(claims.username, "asha");
        assert_eq!(claims.role, "Admin");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenCodec::new("secret", 120)
            .issue("asha@example.com", "asha", "Admin")
            .unwrap();
        assert!(TokenCodec::new("other", 120).verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = TokenCodec::new("secret", -10);
        let token = codec.issue("asha@example.com", "asha", "User").unwrap();
        assert!(codec.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(TokenCodec::new("secret", 120).verify("not.a.token").is_err());
    }
}
