use crate::application_port::{AuthError, SessionService};
use crate::domain_model::UserId;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub audience: String,
    pub issuer: Option<String>,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String, // user id as string
    pub exp: i64,
    pub aud: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

fn decode_access(token: &str, cfg: &JwtConfig) -> Result<AccessClaims, AuthError> {
    let mut v = Validation::new(Algorithm::HS256);
    v.validate_exp = true;
    v.set_audience(&[cfg.audience.clone()]);
    if let Some(issuer) = &cfg.issuer {
        v.set_issuer(&[issuer.clone()]);
    }
    let data = decode::<AccessClaims>(token, &DecodingKey::from_secret(&cfg.signing_key), &v)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })?;
    Ok(data.claims)
}

/// Session backed by the hosted auth provider's HS256 access token.
pub struct JwtSessionService {
    cfg: JwtConfig,
    access_token: RwLock<Option<String>>,
}

impl JwtSessionService {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtSessionService {
            cfg,
            access_token: RwLock::new(None),
        }
    }

    pub fn sign_in(&self, access_token: impl Into<String>) {
        if let Ok(mut slot) = self.access_token.write() {
            *slot = Some(access_token.into());
        }
    }

    pub fn sign_out(&self) {
        if let Ok(mut slot) = self.access_token.write() {
            *slot = None;
        }
    }
}

#[async_trait::async_trait]
impl SessionService for JwtSessionService {
    async fn current_user(&self) -> Result<UserId, AuthError> {
        let token = self
            .access_token
            .read()
            .map_err(|_| AuthError::NotSignedIn)?
            .clone()
            .ok_or(AuthError::NotSignedIn)?;
        let claims = decode_access(&token, &self.cfg)?;
        claims.sub.parse::<UserId>().map_err(|_| AuthError::TokenInvalid)
    }
}
