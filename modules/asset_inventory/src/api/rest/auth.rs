//! Bearer token extractors
//!
//! `AdminUser` requires a valid token carrying the admin role. It reads
//! the [`AuthGate`] from request extensions and rejects before the
//! handler body runs.

use crate::contract::{InventoryError, Principal};
use crate::infra::auth::AuthGate;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::sync::Arc;

use super::error::{map_domain_error, Problem};

/// Authenticated user with the admin role
#[derive(Debug, Clone)]
pub struct AdminUser(pub Principal);

fn unauthorized(reason: &str) -> Problem {
    map_domain_error(InventoryError::Unauthorized {
        reason: reason.to_string(),
    })
}

fn bearer_token(parts: &Parts) -> Result<&str, Problem> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| unauthorized("Not authenticated"))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(unauthorized("Not authenticated")),
    }
}

fn auth_gate(parts: &Parts) -> Result<Arc<AuthGate>, Problem> {
    parts.extensions.get::<Arc<AuthGate>>().cloned().ok_or_else(|| {
        tracing::error!("auth gate missing from request extensions");
        map_domain_error(InventoryError::Internal)
    })
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = Problem;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let gate = auth_gate(parts)?;
        let token = bearer_token(parts)?;
        let principal = gate.authorize_admin(token).await.map_err(map_domain_error)?;
        Ok(Self(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc"))).unwrap(), "abc");
        assert_eq!(bearer_token(&parts_with(Some("bearer abc"))).unwrap(), "abc");
        assert!(bearer_token(&parts_with(Some("Basic abc"))).is_err());
        assert!(bearer_token(&parts_with(Some("Bearer "))).is_err());
        assert!(bearer_token(&parts_with(None)).is_err());
    }
}
