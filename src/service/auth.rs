use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rsa::pkcs8::DecodePrivateKey;
use rsa::{Oaep, RsaPrivateKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::error::Error;
use std::fs;
use uuid::Uuid;

use crate::cli::Args;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// Claims carried by issued tokens and threaded to handlers after
/// validation. `role` gates the cross-user listing paths.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub role: String,
    pub jti: String,
    pub iss: String,
    pub aud: String,
    pub nbf: i64,
    pub exp: i64,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct CredentialData {
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: String,
}

/// Issues HS256 JWTs from pre-verified external credentials: a base64,
/// RSA-OAEP(SHA-256) encrypted `{email, role}` blob produced by the identity
/// front end.
pub struct TokenService {
    key: RsaPrivateKey,
    secret: String,
    issuer: String,
    audience: String,
    expire_minutes: i64,
}

impl TokenService {
    pub fn new(
        key: RsaPrivateKey,
        secret: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        expire_minutes: i64,
    ) -> Self {
        Self {
            key,
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            expire_minutes,
        }
    }

    pub fn from_args(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let pem = fs::read_to_string(&args.rsa_key_path)?;
        let key = RsaPrivateKey::from_pkcs8_pem(&pem)?;
        Ok(Self::new(
            key,
            args.jwt_secret.clone(),
            args.jwt_issuer.clone(),
            args.jwt_audience.clone(),
            args.jwt_expire_minutes,
        ))
    }

    /// Decrypts the credential, validates it and signs a token. Returns the
    /// token with its expiry instant.
    pub fn issue_token(
        &self,
        credential: &str,
    ) -> Result<(String, chrono::DateTime<Utc>), Box<dyn Error + Send + Sync>> {
        if credential.trim().is_empty() {
            return Err("La credencial no puede ser nula o vacía.".into());
        }

        let encrypted = BASE64.decode(credential)?;
        let decrypted = self.key.decrypt(Oaep::new::<Sha256>(), &encrypted)?;
        let mut data: CredentialData = serde_json::from_slice(&decrypted)?;
        data.email = data.email.trim().to_string();
        data.role = data.role.trim().to_string();

        if data.email.is_empty() {
            return Err("Los datos del token no son válidos o el email está vacío.".into());
        }

        let now = Utc::now();
        let expires = now + Duration::minutes(self.expire_minutes);
        let claims = Claims {
            email: data.email,
            role: data.role,
            jti: Uuid::new_v4().to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            nbf: now.timestamp(),
            exp: expires.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok((token, expires))
    }
}

/// Validates a bearer token against the configured secret, issuer and
/// audience.
pub fn decode_claims(
    token: &str,
    secret: &str,
    issuer: &str,
    audience: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.set_issuer(&[issuer]);
    validation.set_audience(&[audience]);
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(decoded.claims)
}
