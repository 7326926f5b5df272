use actix_web::{web, HttpResponse};

use crate::domain::errors::DomainError;
use crate::errors::AppError;
use crate::state::AppState;

use super::dto::{ApplyPromoRequest, ApplyPromoResponse, CartBreakdownResponse};
use super::{Actor, SessionId};

/// POST /cart/promo/apply
///
/// Validates the code against the cart and attaches it. A code that does not
/// apply is not an HTTP error: the body carries `success: false` and the
/// reason to show the customer.
#[utoipa::path(
    post,
    path = "/cart/promo/apply",
    request_body = ApplyPromoRequest,
    params(
        ("X-Session-Id" = String, Header, description = "Cart session"),
        ("X-User-Id" = uuid::Uuid, Header, description = "Customer"),
    ),
    responses(
        (status = 200, description = "Outcome of the promo code", body = ApplyPromoResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "promo"
)]
pub async fn apply_promo(
    state: web::Data<AppState>,
    session: SessionId,
    actor: Actor,
    body: web::Json<ApplyPromoRequest>,
) -> Result<HttpResponse, AppError> {
    let code = body.into_inner().code;

    let outcome = web::block(move || state.promos.apply(&session.0, actor.0, &code))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let response = match outcome {
        Ok(breakdown) => ApplyPromoResponse {
            success: true,
            message: "Promo code applied!".to_string(),
            cart_breakdown: Some(CartBreakdownResponse::from(&breakdown)),
        },
        Err(e @ (DomainError::Promo(_) | DomainError::CartEmpty)) => ApplyPromoResponse {
            success: false,
            message: e.to_string(),
            cart_breakdown: None,
        },
        Err(e) => return Err(e.into()),
    };
    Ok(HttpResponse::Ok().json(response))
}

/// POST /cart/promo/remove
///
/// Detaches any promo code. Idempotent.
#[utoipa::path(
    post,
    path = "/cart/promo/remove",
    params(("X-Session-Id" = String, Header, description = "Cart session")),
    responses(
        (status = 200, description = "Breakdown without a promo", body = CartBreakdownResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "promo"
)]
pub async fn remove_promo(
    state: web::Data<AppState>,
    session: SessionId,
) -> Result<HttpResponse, AppError> {
    let breakdown = web::block(move || state.promos.remove(&session.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartBreakdownResponse::from(&breakdown)))
}
