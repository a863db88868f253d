/// Authentication extractors and utilities
use crate::{
    admin::Actor,
    api::middleware::extract_bearer_token,
    config::AuthConfig,
    context::AppContext,
    error::RelmonError,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
}

/// Authenticated context - extracts and validates the bearer token
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub actor: Actor,
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthContext {
    type Rejection = RelmonError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| RelmonError::Authentication("Missing authorization header".to_string()))?;

        let actor = actor_from_token(&token, &state.config.authentication)?;
        tracing::debug!("AuthContext: {} (admin: {})", actor.username, actor.is_admin);

        Ok(AuthContext { actor })
    }
}

/// Validate a token and resolve the acting identity
pub fn actor_from_token(token: &str, auth: &AuthConfig) -> Result<Actor, RelmonError> {
    let claims = verify_jwt_token(token, &auth.jwt_secret)?.claims;

    if claims.sub.is_empty() {
        return Err(RelmonError::Authentication(
            "Invalid JWT: empty 'sub' claim".to_string(),
        ));
    }

    let is_admin = auth.is_admin(&claims.sub);
    Ok(Actor::new(&claims.sub, claims.email.as_deref(), is_admin))
}

/// Verify a JWT token with full validation
///
/// This performs:
/// 1. JWT signature verification
/// 2. Expiration checking
/// 3. Claims validation
pub fn verify_jwt_token(
    token: &str,
    jwt_secret: &str,
) -> Result<jsonwebtoken::TokenData<Claims>, RelmonError> {
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    // Allow some clock skew (5 minutes)
    validation.leeway = 300;

    decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::warn!("JWT verification failed: {}", e);
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                RelmonError::Authentication("Token has expired".to_string())
            }
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                RelmonError::Authentication("Invalid token signature".to_string())
            }
            _ => RelmonError::Authentication(format!("Invalid token: {}", e)),
        }
    })
}

/// Mint a token for tests
#[cfg(test)]
pub(crate) fn test_token(secret: &str, sub: &str, email: Option<&str>) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        sub: sub.to_string(),
        email: email.map(String::from),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn test_actor_from_admin_token() {
        let config = test_config();
        let token = test_token(&config.authentication.jwt_secret, "admin", None);

        let actor = actor_from_token(&token, &config.authentication).unwrap();
        assert_eq!(actor.username, "admin");
        assert!(actor.is_admin);
    }

    #[test]
    fn test_actor_from_user_token_keeps_email() {
        let config = test_config();
        let token = test_token(
            &config.authentication.jwt_secret,
            "alice",
            Some("alice@example.org"),
        );

        let actor = actor_from_token(&token, &config.authentication).unwrap();
        assert!(!actor.is_admin);
        assert_eq!(actor.email.as_deref(), Some("alice@example.org"));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let config = test_config();
        let token = test_token("another-secret-another-secret-xx", "admin", None);

        assert!(matches!(
            actor_from_token(&token, &config.authentication),
            Err(RelmonError::Authentication(_))
        ));
    }
}
