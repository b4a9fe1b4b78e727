//! Portfolio Routes
//!
//! - GET /api/v1/portfolio - Synchronized portfolio with valuation
//! - PUT /api/v1/portfolio/holdings/:coin - Set the amount held of a coin

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{PortfolioResponse, SetHoldingRequest};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::portfolio::valuate;
use crate::services::PORTFOLIO;

/// GET /api/v1/portfolio
pub async fn get_portfolio(State(state): State<Arc<AppState>>) -> ApiResult<Json<PortfolioResponse>> {
    let view = state.sync.view(PORTFOLIO).await?;
    let valuation = valuate(&view, &state.holdings.load());
    Ok(Json(PortfolioResponse { view, valuation }))
}

/// PUT /api/v1/portfolio/holdings/:coin
///
/// A positive amount also adds the coin to the portfolio list.
pub async fn set_holding(
    State(state): State<Arc<AppState>>,
    Path(coin): Path<String>,
    Json(request): Json<SetHoldingRequest>,
) -> ApiResult<Json<PortfolioResponse>> {
    let holdings = state.holdings.set_amount(&coin, request.amount)?;

    let view = if request.amount > 0.0 {
        state.sync.add_and_refresh(PORTFOLIO, &coin).await?
    } else {
        state.sync.view(PORTFOLIO).await?
    };

    let valuation = valuate(&view, &holdings);
    Ok(Json(PortfolioResponse { view, valuation }))
}
