//! HTTP handlers for pharmacy sales

use axum::{extract::State, Json};

use shared::{CreateSaleInput, PharmacySale};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::SaleService;
use crate::AppState;

/// Create a pharmacy sale with FEFO batch attribution
pub async fn create_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<Json<PharmacySale>> {
    let service = SaleService::new(state.db);
    let sale = service.create_sale(current_user.0.user_id, input).await?;
    Ok(Json(sale))
}
