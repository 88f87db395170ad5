//! Auth gate - registration, login and bearer token checks

pub mod password;
pub mod token;

use crate::config::AuthConfig;
use crate::contract::{AccessToken, InventoryError, NewUser, Principal, User};
use crate::domain::{storage_error, DuplicateKey, UserRepository};
use std::sync::Arc;

use token::TokenCodec;

const DEFAULT_ROLE: &str = "User";

pub struct AuthGate {
    users: Arc<dyn UserRepository>,
    tokens: TokenCodec,
}

impl AuthGate {
    pub fn new(users: Arc<dyn UserRepository>, config: &AuthConfig) -> Self {
        Self {
            users,
            tokens: TokenCodec::new(&config.jwt_secret, config.token_ttl_minutes),
        }
    }

    /// Create an account; mail and username must both be unused
    pub async fn register(&self, new_user: NewUser) -> Result<User, InventoryError> {
        let username = new_user.username.trim().to_string();
        let mail = new_user.mail.trim().to_string();

        if username.is_empty() {
            return Err(InventoryError::validation("Username is required"));
        }
        if !is_plausible_mail(&mail) {
            return Err(InventoryError::validation("A valid email is required"));
        }
        if new_user.password.is_empty() {
            return Err(InventoryError::validation("Password is required"));
        }

        if self
            .users
            .find_by_mail(&mail)
            .await
            .map_err(storage_error("user lookup failed"))?
            .is_some()
        {
            return Err(InventoryError::conflict("Email already registered"));
        }

        let hashed_password = password::hash_password(&new_user.password)
            .map_err(|e| InventoryError::internal("password hashing failed", e))?;

        let role = match new_user.role.trim() {
            "" => DEFAULT_ROLE.to_string(),
            role => role.to_string(),
        };

        let user = User {
            username,
            mail,
            role,
            hashed_password,
        };

        self.users.create(&user).await.map_err(|e| {
            if e.downcast_ref::<DuplicateKey>().is_some() {
                InventoryError::conflict("Username or email already registered")
            } else {
                InventoryError::internal("user insert failed", e)
            }
        })?;

        tracing::info!(username = %user.username, role = %user.role, "user registered");
        Ok(user)
    }

    /// Exchange credentials for a bearer token
    pub async fn login(&self, mail: &str, password: &str) -> Result<AccessToken, InventoryError> {
        let user = self
            .users
            .find_by_mail(mail.trim())
            .await
            .map_err(storage_error("user lookup failed"))?;

        let Some(user) = user.filter(|u| password::verify_password(&u.hashed_password, password))
        else {
            tracing::warn!("failed login attempt");
            return Err(InventoryError::Unauthorized {
                reason: "Invalid credentials".to_string(),
            });
        };

        let access_token = self
            .tokens
            .issue(&user.mail, &user.username, &user.role)
            .map_err(|e| InventoryError::internal("token signing failed", e))?;

        tracing::debug!(username = %user.username, "token issued");
        Ok(AccessToken {
            access_token,
            token_type: "bearer".to_string(),
            role: user.role,
        })
    }

    /// Resolve a bearer token to a known user
    pub async fn authenticate(&self, token: &str) -> Result<Principal, InventoryError> {
        let claims = self.tokens.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            InventoryError::Unauthorized {
                reason: "Could not validate credentials".to_string(),
            }
        })?;

        let user = self
            .users
            .find_by_mail(&claims.sub)
            .await
            .map_err(storage_error("user lookup failed"))?
            .ok_or_else(|| InventoryError::Unauthorized {
                reason: "Could not validate credentials".to_string(),
            })?;

        Ok(Principal {
            mail: user.mail,
            username: user.username,
            role: user.role,
        })
    }

    /// Like [`AuthGate::authenticate`], but the user must hold the admin role
    pub async fn authorize_admin(&self, token: &str) -> Result<Principal, InventoryError> {
        let principal = self.authenticate(token).await?;
        if !principal.is_admin() {
            return Err(InventoryError::Forbidden {
                reason: "Admin access required".to_string(),
            });
        }
        Ok(principal)
    }
}

fn is_plausible_mail(mail: &str) -> bool {
    match mail.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_plausible_mail() {
        assert!(is_plausible_mail("asha@example.com"));
        assert!(!is_plausible_mail("asha"));
        assert!(!is_plausible_mail("@example.com"));
        assert!(!is_plausible_mail("asha@localhost"));
    }
}
