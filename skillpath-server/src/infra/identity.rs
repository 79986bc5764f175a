//! Trusted identity headers.
//!
//! Authentication happens upstream; the identity provider forwards the
//! learner in request headers and this middleware turns them into a
//! [`LearnerIdentity`] extension for the handlers.

use std::str::FromStr;

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use skillpath_core::domain::LearnerId;

use super::errors::AppError;

pub const LEARNER_ID_HEADER: &str = "x-learner-id";
pub const LEARNER_ROLE_HEADER: &str = "x-learner-role";
pub const LEARNER_NAME_HEADER: &str = "x-learner-name";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LearnerRole {
    #[default]
    Learner,
    Instructor,
    Admin,
}

impl FromStr for LearnerRole {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "learner" | "student" => Ok(LearnerRole::Learner),
            "instructor" => Ok(LearnerRole::Instructor),
            "admin" => Ok(LearnerRole::Admin),
            other => Err(IdentityError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnerIdentity {
    pub learner_id: LearnerId,
    pub role: LearnerRole,
    pub display_name: Option<String>,
}

impl LearnerIdentity {
    /// Name printed on certificates; falls back to the learner id.
    pub fn display_name(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| self.learner_id.to_string())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("missing {0} header")]
    Missing(&'static str),

    #[error("{0} header is not valid UTF-8")]
    NotUtf8(&'static str),

    #[error("malformed learner id")]
    MalformedId,

    #[error("unknown learner role {0:?}")]
    UnknownRole(String),
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        AppError::unauthorized(err.to_string())
    }
}

fn header_str<'a>(
    headers: &'a HeaderMap,
    name: &'static str,
) -> Result<Option<&'a str>, IdentityError> {
    headers
        .get(name)
        .map(|value| value.to_str().map_err(|_| IdentityError::NotUtf8(name)))
        .transpose()
}

pub fn identity_from_headers(
    headers: &HeaderMap,
) -> Result<LearnerIdentity, IdentityError> {
    let raw_id = header_str(headers, LEARNER_ID_HEADER)?
        .ok_or(IdentityError::Missing(LEARNER_ID_HEADER))?;
    let learner_id: LearnerId =
        raw_id.parse().map_err(|_| IdentityError::MalformedId)?;

    let role = match header_str(headers, LEARNER_ROLE_HEADER)? {
        Some(raw) => raw.parse()?,
        None => LearnerRole::default(),
    };

    let display_name = header_str(headers, LEARNER_NAME_HEADER)?
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    Ok(LearnerIdentity {
        learner_id,
        role,
        display_name,
    })
}

pub async fn identity_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = identity_from_headers(request.headers())?;
    debug!(
        learner_id = %identity.learner_id,
        role = ?identity.role,
        "request identity"
    );

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
