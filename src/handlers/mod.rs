pub mod cart;
pub mod dto;
pub mod orders;
pub mod promo;
pub mod tables;

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use uuid::Uuid;

use crate::errors::AppError;

pub const SESSION_HEADER: &str = "X-Session-Id";
pub const USER_HEADER: &str = "X-User-Id";

/// Cart session the request belongs to, from the `X-Session-Id` header.
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

/// Customer or staff member acting on the request, from `X-User-Id`.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub Uuid);

fn header<'a>(req: &'a HttpRequest, name: &str) -> Result<&'a str, AppError> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{name} header is required")))
}

impl FromRequest for SessionId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(header(req, SESSION_HEADER).map(|v| SessionId(v.to_string())))
    }
}

impl FromRequest for Actor {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(header(req, USER_HEADER).and_then(|v| {
            Uuid::parse_str(v)
                .map(Actor)
                .map_err(|_| AppError::BadRequest(format!("{USER_HEADER} must be a UUID")))
        }))
    }
}
