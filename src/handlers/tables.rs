use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

use super::dto::{RestaurantTablesResponse, TableStatusParams, TableStatusResponse};

/// GET /tables/status
///
/// Occupancy of every active table in the restaurant, derived from the
/// orders open at the time of the call. Clients poll this endpoint.
#[utoipa::path(
    get,
    path = "/tables/status",
    params(
        ("restaurant_id" = Uuid, Query, description = "Restaurant UUID"),
    ),
    responses(
        (status = 200, description = "Per-table occupancy", body = RestaurantTablesResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "tables"
)]
pub async fn restaurant_tables_status(
    state: web::Data<AppState>,
    query: web::Query<TableStatusParams>,
) -> Result<HttpResponse, AppError> {
    let restaurant_id = query.into_inner().restaurant_id;

    let report = web::block(move || state.tables.restaurant_status(restaurant_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok()
        .insert_header((
            "Cache-Control",
            format!("max-age={}", report.poll_interval.as_secs()),
        ))
        .json(RestaurantTablesResponse::from(&report)))
}

/// GET /tables/{id}/status
#[utoipa::path(
    get,
    path = "/tables/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Table UUID"),
    ),
    responses(
        (status = 200, description = "Occupancy of the table", body = TableStatusResponse),
        (status = 404, description = "Table not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "tables"
)]
pub async fn table_status(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let table_id = path.into_inner();

    let occupancy = web::block(move || state.tables.status(table_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(TableStatusResponse::from(&occupancy)))
}
