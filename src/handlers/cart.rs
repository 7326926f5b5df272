use actix_web::{web, HttpResponse};

use crate::application::cart_store::CartUpdate;
use crate::errors::AppError;
use crate::state::AppState;

use super::dto::{
    AddCartItemRequest, CartBreakdownResponse, CartConflictResponse, CartResponse,
    CartViewResponse, RemoveCartItemRequest, UpdateCartItemRequest,
};
use super::{Actor, SessionId};

fn cart_update_response(update: CartUpdate) -> HttpResponse {
    match update {
        CartUpdate::Applied(cart) => HttpResponse::Ok().json(CartResponse::from(&cart)),
        CartUpdate::Rejected { current } => HttpResponse::Conflict().json(CartConflictResponse {
            error: "Cart was modified elsewhere; refresh and retry".to_string(),
            current: CartResponse::from(&current),
        }),
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /cart
///
/// Returns the session's cart with its money breakdown. A promo code that no
/// longer applies to the cart is dropped here.
#[utoipa::path(
    get,
    path = "/cart",
    params(
        ("X-Session-Id" = String, Header, description = "Cart session"),
        ("X-User-Id" = uuid::Uuid, Header, description = "Customer"),
    ),
    responses(
        (status = 200, description = "Current cart", body = CartViewResponse),
        (status = 400, description = "Missing or malformed headers"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn get_cart(
    state: web::Data<AppState>,
    session: SessionId,
    actor: Actor,
) -> Result<HttpResponse, AppError> {
    let view = web::block(move || {
        let breakdown = state.promos.breakdown(&session.0, actor.0)?;
        let ctx = state.carts.snapshot(&session.0);
        Ok::<_, AppError>(CartViewResponse {
            cart: CartResponse::from(&ctx.cart),
            cart_breakdown: CartBreakdownResponse::from(&breakdown),
        })
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(view))
}

/// POST /cart/items
///
/// Adds a menu item to the cart, or increases its quantity if already there.
#[utoipa::path(
    post,
    path = "/cart/items",
    request_body = AddCartItemRequest,
    params(("X-Session-Id" = String, Header, description = "Cart session")),
    responses(
        (status = 200, description = "Item added", body = CartResponse),
        (status = 400, description = "Invalid quantity, unavailable item or another restaurant"),
        (status = 409, description = "Stale cart version", body = CartConflictResponse),
    ),
    tag = "cart"
)]
pub async fn add_item(
    state: web::Data<AppState>,
    session: SessionId,
    body: web::Json<AddCartItemRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let update = web::block(move || {
        state.carts.add(
            &session.0,
            body.menu_item_id,
            body.quantity,
            body.notes,
            body.expected_version,
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(cart_update_response(update))
}

/// POST /cart/update
///
/// Sets the quantity of a cart line. A quantity of 0 removes the line.
#[utoipa::path(
    post,
    path = "/cart/update",
    request_body = UpdateCartItemRequest,
    params(("X-Session-Id" = String, Header, description = "Cart session")),
    responses(
        (status = 200, description = "Cart updated", body = CartResponse),
        (status = 400, description = "Negative quantity"),
        (status = 404, description = "Item not in cart"),
        (status = 409, description = "Stale cart version", body = CartConflictResponse),
    ),
    tag = "cart"
)]
pub async fn update_item(
    state: web::Data<AppState>,
    session: SessionId,
    body: web::Json<UpdateCartItemRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let update = web::block(move || {
        state.carts.update_quantity(
            &session.0,
            body.menu_item_id,
            body.quantity,
            body.expected_version,
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(cart_update_response(update))
}

/// POST /cart/remove
#[utoipa::path(
    post,
    path = "/cart/remove",
    request_body = RemoveCartItemRequest,
    params(("X-Session-Id" = String, Header, description = "Cart session")),
    responses(
        (status = 200, description = "Line removed", body = CartResponse),
        (status = 409, description = "Stale cart version", body = CartConflictResponse),
    ),
    tag = "cart"
)]
pub async fn remove_item(
    state: web::Data<AppState>,
    session: SessionId,
    body: web::Json<RemoveCartItemRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let update = web::block(move || {
        state
            .carts
            .remove(&session.0, body.menu_item_id, body.expected_version)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(cart_update_response(update))
}
