//! Purpose-scoped capability tokens
//!
//! Two token families share one HS256 secret: `stream` tokens grant playback
//! of a single video for a few minutes, `session` tokens identify a subject
//! and role for days. Verification is exact (zero leeway) and never reports
//! which check failed.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::errors::{AppError, AppResult};
use crate::models::Role;

pub const PURPOSE_STREAM: &str = "stream";
pub const PURPOSE_SESSION: &str = "session";

/// Claims of a single-video playback token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamClaims {
    pub vid: Uuid,
    pub purpose: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims of a subject session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub role: Role,
    pub purpose: String,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    /// Subject id parsed as a UUID, when it is one
    pub fn subject_uuid(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    stream_ttl: Duration,
    session_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.token_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.token_secret.as_bytes()),
            stream_ttl: Duration::minutes(config.stream_token_ttl_minutes),
            session_ttl: Duration::days(config.session_token_ttl_days),
        }
    }

    /// Expiry instant a stream token minted now would carry
    pub fn stream_expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.stream_ttl
    }

    pub fn mint_stream_token(&self, video_id: Uuid) -> AppResult<String> {
        let now = Utc::now();
        let claims = StreamClaims {
            vid: video_id,
            purpose: PURPOSE_STREAM.to_string(),
            iat: now.timestamp(),
            exp: (now + self.stream_ttl).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    pub fn mint_session_token(&self, subject: &str, role: Role) -> AppResult<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: subject.to_string(),
            role,
            purpose: PURPOSE_SESSION.to_string(),
            iat: now.timestamp(),
            exp: (now + self.session_ttl).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verify a stream token against the video it must be scoped to
    pub fn verify_stream_token(&self, token: &str, video_id: Uuid) -> AppResult<StreamClaims> {
        let claims: StreamClaims = self.decode_claims(token)?;
        if claims.purpose != PURPOSE_STREAM || claims.vid != video_id {
            return Err(AppError::Unauthorized);
        }
        Ok(claims)
    }

    pub fn verify_session_token(&self, token: &str) -> AppResult<SessionClaims> {
        let claims: SessionClaims = self.decode_claims(token)?;
        if claims.purpose != PURPOSE_SESSION {
            return Err(AppError::Unauthorized);
        }
        Ok(claims)
    }

    fn decode_claims<T: serde::de::DeserializeOwned>(&self, token: &str) -> AppResult<T> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<T>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }
}
