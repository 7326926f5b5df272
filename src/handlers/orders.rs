use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::application::order_factory::{Fulfillment, LineRequest};
use crate::domain::order::{OrderStatus, OrderType, PaymentMethod};
use crate::errors::AppError;
use crate::state::AppState;

use super::dto::{
    AddItemsRequest, CheckoutRequest, OrderResponse, RestaurantOrdersParams, TableOrderRequest,
    TransitionRequest,
};
use super::{Actor, SessionId};

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders/checkout
///
/// Places an order from the session's cart. The cart is emptied only when
/// the order (and any promo redemption) is committed.
#[utoipa::path(
    post,
    path = "/orders/checkout",
    request_body = CheckoutRequest,
    params(
        ("X-Session-Id" = String, Header, description = "Cart session"),
        ("X-User-Id" = Uuid, Header, description = "Customer"),
    ),
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Empty cart, bad fulfillment details or promo no longer valid"),
        (status = 404, description = "Table not found"),
        (status = 409, description = "A cart item changed price or availability (remove and re-add it), or the promo code ran out"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn checkout(
    state: web::Data<AppState>,
    session: SessionId,
    actor: Actor,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let payment_method: PaymentMethod = body.payment_method.parse()?;
    let fulfillment = Fulfillment {
        order_type: body.order_type.parse()?,
        table_id: body.table_id,
        qr_identifier: body.qr_identifier,
        delivery_address: body.delivery_address,
        special_instructions: body.special_instructions,
    };

    let order = web::block(move || {
        state
            .factory
            .checkout(&session.0, actor.0, &fulfillment, payment_method)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    log::info!("Order {} placed by {} ({})", order.id, actor.0, order.order_type);
    Ok(HttpResponse::Created().json(OrderResponse::from(&order)))
}

/// POST /orders/table
///
/// Places a dine-in, QR code or staff order for a table from explicit lines.
#[utoipa::path(
    post,
    path = "/orders/table",
    request_body = TableOrderRequest,
    params(("X-User-Id" = Uuid, Header, description = "Guest or staff member")),
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Invalid lines or order type"),
        (status = 404, description = "Table not found"),
        (status = 409, description = "The promo code ran out"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_table_order(
    state: web::Data<AppState>,
    actor: Actor,
    body: web::Json<TableOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let order_type = match body.order_type.as_deref() {
        Some(raw) => raw.parse()?,
        None if body.qr_identifier.is_some() => OrderType::QrCode,
        None => OrderType::Staff,
    };
    let payment_method: PaymentMethod = body.payment_method.parse()?;
    let lines: Vec<LineRequest> = body.lines.iter().map(LineRequest::from).collect();
    let fulfillment = Fulfillment {
        order_type,
        table_id: body.table_id,
        qr_identifier: body.qr_identifier,
        delivery_address: None,
        special_instructions: body.special_instructions,
    };
    let promo_code = body.promo_code;

    let order = web::block(move || {
        state.factory.create_table_order(
            actor.0,
            &fulfillment,
            &lines,
            payment_method,
            promo_code.as_deref(),
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    log::info!(
        "Table order {} placed by {} for table {:?}",
        order.id,
        actor.0,
        order.table_id
    );
    Ok(HttpResponse::Created().json(OrderResponse::from(&order)))
}

/// POST /orders/status
///
/// Moves an order to a new status if the lifecycle allows it.
#[utoipa::path(
    post,
    path = "/orders/status",
    request_body = TransitionRequest,
    params(("X-User-Id" = Uuid, Header, description = "Staff member")),
    responses(
        (status = 200, description = "Status changed", body = OrderResponse),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Order not found"),
        (status = 422, description = "Transition not allowed from the current status"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn transition_status(
    state: web::Data<AppState>,
    actor: Actor,
    body: web::Json<TransitionRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let new_status: OrderStatus = body.new_status.parse()?;

    let order = web::block(move || state.orders.transition(body.order_id, new_status, actor.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(&order)))
}

/// POST /orders/{id}/items
///
/// Appends items to an order that is still in progress.
#[utoipa::path(
    post,
    path = "/orders/{id}/items",
    request_body = AddItemsRequest,
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
        ("X-User-Id" = Uuid, Header, description = "Guest or staff member"),
    ),
    responses(
        (status = 200, description = "Items added", body = OrderResponse),
        (status = 400, description = "Invalid or unavailable items"),
        (status = 404, description = "Order not found"),
        (status = 422, description = "Order is delivered or cancelled"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn add_items(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
    body: web::Json<AddItemsRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let lines: Vec<LineRequest> = body.lines.iter().map(LineRequest::from).collect();

    let order = web::block(move || state.orders.add_items(order_id, &lines, actor.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(&order)))
}

/// GET /orders/{id}
///
/// Returns the order with its items and modification history.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || state.orders.get_order(order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    match order {
        Some(order) => Ok(HttpResponse::Ok().json(OrderResponse::from(&order))),
        None => Err(AppError::NotFound("Order not found".to_string())),
    }
}

/// GET /restaurants/{id}/orders
///
/// Orders of a restaurant, newest first.
#[utoipa::path(
    get,
    path = "/restaurants/{id}/orders",
    params(
        ("id" = Uuid, Path, description = "Restaurant UUID"),
        ("active_only" = Option<bool>, Query, description = "Skip delivered and cancelled orders"),
    ),
    responses(
        (status = 200, description = "Orders of the restaurant", body = [OrderResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_restaurant_orders(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<RestaurantOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let restaurant_id = path.into_inner();
    let active_only = query.into_inner().active_only;

    let orders = web::block(move || state.orders.list_for_restaurant(restaurant_id, active_only))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<OrderResponse> = orders.iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}
