// app/src/web/extractors.rs

//! Caller identity, as handed over by the authentication layer in front of
//! this service.

use std::str::FromStr;

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-ID";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  Admin,
  User,
}

impl FromStr for Role {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "admin" => Ok(Role::Admin),
      "user" => Ok(Role::User),
      other => Err(AppError::Auth(format!("unknown role '{}'", other))),
    }
  }
}

#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
  pub role: Role,
}

impl AuthenticatedUser {
  fn from_headers(req: &HttpRequest) -> Result<Self, AppError> {
    let header = |name: &str| req.headers().get(name).and_then(|value| value.to_str().ok());

    let user_id = header(USER_ID_HEADER)
      .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
      .ok_or_else(|| AppError::Auth(format!("missing or invalid {} header", USER_ID_HEADER)))?;
    let role = header(USER_ROLE_HEADER)
      .ok_or_else(|| AppError::Auth(format!("missing {} header", USER_ROLE_HEADER)))?
      .parse()?;

    Ok(Self { user_id, role })
  }
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let result = Self::from_headers(req);
    if let Err(err) = &result {
      warn!(error = %err, "AuthenticatedUser extractor rejected request.");
    }
    ready(result)
  }
}

/// An [`AuthenticatedUser`] whose role is [`Role::Admin`].
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthenticatedUser);

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let result = AuthenticatedUser::from_headers(req).and_then(|user| match user.role {
      Role::Admin => Ok(AdminUser(user)),
      Role::User => Err(AppError::Forbidden("admin role required".to_string())),
    });
    if let Err(err) = &result {
      warn!(error = %err, "AdminUser extractor rejected request.");
    }
    ready(result)
  }
}
