use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use sea_orm::EntityTrait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    entity::Users,
    error::{AppError, AppResult},
    state::AppState,
};

/// Claims of a session token issued by the identity provider.
#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    /// Active plan, e.g. `u:plus` for a user-level subscription.
    #[serde(default)]
    pub pla: Option<String>,
}

/// Verifies bearer tokens issued by the identity provider.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn from_config(config: &AuthConfig) -> anyhow::Result<Self> {
        let (key, algorithm) = match config {
            AuthConfig::SharedSecret(secret) => (
                DecodingKey::from_secret(secret.expose_secret().as_bytes()),
                Algorithm::HS256,
            ),
            AuthConfig::PublicKey(pem) => {
                (DecodingKey::from_rsa_pem(pem.as_bytes())?, Algorithm::RS256)
            }
        };
        Ok(Self {
            key,
            validation: Validation::new(algorithm),
        })
    }

    pub fn verify(&self, token: &str) -> AppResult<AuthUser> {
        let decoded = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;
        if decoded.claims.sub.is_empty() {
            return Err(AppError::Unauthorized("Token has no subject".into()));
        }
        Ok(AuthUser {
            user_id: decoded.claims.sub,
            plan: decoded.claims.pla,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub plan: Option<String>,
}

impl AuthUser {
    /// Membership entitlement: the token's plan names the member plan.
    pub fn is_member(&self, member_plan: &str) -> bool {
        self.plan
            .as_deref()
            .map(|plan| plan.strip_prefix("u:").unwrap_or(plan))
            .is_some_and(|plan| plan.eq_ignore_ascii_case(member_plan))
    }
}

/// Admin identity is an exact match of the stored email against `ADMIN_EMAIL`.
pub async fn ensure_admin(state: &AppState, user: &AuthUser) -> AppResult<()> {
    let record = Users::find_by_id(user.user_id.clone())
        .one(&state.orm)
        .await?;
    match record {
        Some(u) if !u.email.is_empty() && u.email == state.config.admin_email => Ok(()),
        _ => Err(AppError::Forbidden("admin access required".into())),
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?;

        state.tokens.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use secrecy::SecretString;

    fn verifier() -> TokenVerifier {
        TokenVerifier::from_config(&AuthConfig::SharedSecret(SecretString::from(
            "test-secret".to_string(),
        )))
        .expect("verifier")
    }

    fn token(sub: &str, pla: Option<&str>, secret: &str) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp: (chrono::Utc::now().timestamp() + 600) as usize,
            pla: pla.map(String::from),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encode")
    }

    #[test]
    fn verifies_subject_and_plan() {
        let user = verifier()
            .verify(&token("user_123", Some("u:plus"), "test-secret"))
            .expect("valid token");
        assert_eq!(user.user_id, "user_123");
        assert!(user.is_member("plus"));
        assert!(!user.is_member("pro"));
    }

    #[test]
    fn rejects_foreign_signature() {
        let result = verifier().verify(&token("user_123", None, "other-secret"));
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn no_plan_means_no_membership() {
        let user = AuthUser {
            user_id: "user_1".into(),
            plan: None,
        };
        assert!(!user.is_member("plus"));
    }
}
