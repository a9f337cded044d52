//! HTTP handlers for stock transfers

use axum::{extract::State, Json};

use shared::{CreateTransferInput, StockTransfer};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::TransferService;
use crate::AppState;

/// Create a stock transfer between two locations
pub async fn create_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateTransferInput>,
) -> AppResult<Json<StockTransfer>> {
    let service = TransferService::new(state.db);
    let transfer = service
        .create_transfer(current_user.0.user_id, input)
        .await?;
    Ok(Json(transfer))
}
