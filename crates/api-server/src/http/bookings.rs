use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use shared::bookings::{BookingRecord, NewBooking};

use super::AppState;

const DEFAULT_LIST_LIMIT: usize = 10;
const DEFAULT_CANCEL_REASON: &str = "Customer requested cancellation";

pub(super) async fn create(
    State(state): State<AppState>,
    Json(request): Json<NewBooking>,
) -> (StatusCode, Json<BookingRecord>) {
    let record = state.bookings.create(request).await;
    (StatusCode::CREATED, Json(record))
}

pub(super) async fn get(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
) -> Result<Json<BookingRecord>, (StatusCode, Json<Value>)> {
    state
        .bookings
        .get(&booking_id)
        .await
        .map(Json)
        .ok_or_else(|| not_found(&booking_id))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListParams {
    email: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BookingListResponse {
    count: usize,
    bookings: Vec<BookingRecord>,
}

pub(super) async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<BookingListResponse> {
    let bookings = state
        .bookings
        .list(
            params.email.as_deref(),
            params.limit.unwrap_or(DEFAULT_LIST_LIMIT),
        )
        .await;
    Json(BookingListResponse {
        count: bookings.len(),
        bookings,
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct CancelRequest {
    reason: Option<String>,
}

pub(super) async fn cancel(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
    Json(request): Json<CancelRequest>,
) -> Result<Json<BookingRecord>, (StatusCode, Json<Value>)> {
    let reason = request
        .reason
        .unwrap_or_else(|| DEFAULT_CANCEL_REASON.to_string());
    state
        .bookings
        .cancel(&booking_id, &reason)
        .await
        .map(Json)
        .ok_or_else(|| not_found(&booking_id))
}

fn not_found(booking_id: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "code": "booking_not_found",
            "message": format!("Booking {booking_id} not found"),
        })),
    )
}
