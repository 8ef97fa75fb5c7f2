//! Request extractors and header helpers
//!
//! Admin endpoints authenticate through [`AdminClaims`]; the analytics
//! surface reads its identity hints straight from headers and never fails
//! on a bad bearer token.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use uuid::Uuid;

use crate::auth::{SessionClaims, TokenService};
use crate::errors::AppError;
use crate::models::Role;
use crate::services::analytics::hash_client_ip;
use crate::web::AppState;

pub const SESSION_ID_HEADER: &str = "x-session-id";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Claims of a verified admin bearer token.
///
/// Rejects with 401 when the token is absent or does not verify as a
/// `session` token, 403 when it verifies but the role is not admin.
#[derive(Debug, Clone)]
pub struct AdminClaims(pub SessionClaims);

#[async_trait]
impl FromRequestParts<AppState> for AdminClaims {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token =
            bearer_token(&parts.headers).ok_or_else(|| AppError::Unauthorized.into_response())?;
        let claims = state
            .token_service
            .verify_session_token(&token)
            .map_err(IntoResponse::into_response)?;
        if claims.role != Role::Admin {
            return Err(AppError::Forbidden.into_response());
        }
        Ok(Self(claims))
    }
}

/// Token from an `authorization: Bearer ...` header
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Raw `x-session-id` header value, if readable
pub fn session_id_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
}

/// User agent, empty when absent
pub fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Visitor hash from the forwarded-for header or the socket peer
pub fn client_ip_hash(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|value| value.to_str().ok());
    let peer_ip = peer.map(|addr| addr.ip().to_string());
    hash_client_ip(forwarded, peer_ip.as_deref())
}

/// Subject attached to an optional bearer session token. Analytics treats
/// identity as a hint, so an invalid token yields no subject instead of a
/// rejection.
pub fn optional_subject(headers: &HeaderMap, tokens: &TokenService) -> Option<Uuid> {
    let token = bearer_token(headers)?;
    let claims = tokens.verify_session_token(&token).ok()?;
    claims.subject_uuid()
}
