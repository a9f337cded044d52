//! HTTP handlers for purchase receipts

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::ReceiptResult;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::PurchaseService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReceiveQuery {
    pub received_date: String,
}

/// Mark a purchase entry's items as physically received, folding them into
/// the ledger
pub async fn mark_items_received(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(purchase_id): Path<Uuid>,
    Query(query): Query<ReceiveQuery>,
) -> AppResult<Json<ReceiptResult>> {
    let service = PurchaseService::new(state.db);
    let result = service
        .mark_items_received(purchase_id, &query.received_date)
        .await?;
    Ok(Json(result))
}
