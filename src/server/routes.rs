use crate::dca::group_id::{assign_group_id, GroupLink};
use crate::errors::JournalError;
use crate::state::{AppState, RequestCounters};
use crate::store::SortSpec;
use crate::trade::lifecycle::{close_position, ClosePosition};
use crate::trade::{TradeInput, TradePatch};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use std::sync::Arc;

type ApiResponse = (StatusCode, Json<serde_json::Value>);

#[derive(serde::Deserialize)]
pub struct ListQuery {
    pub sort: Option<String>,
}

#[derive(serde::Deserialize)]
pub struct CreateQuery {
    /// `new` starts a group for DCA strategies; anything else is an existing
    /// group id to link the leg to.
    pub link: Option<String>,
}

/// GET /api/trades -- full snapshot, optionally sorted (`?sort=-entry_date`)
pub async fn list_trades(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> ApiResponse {
    let sort = match params.sort.as_deref().map(str::parse::<SortSpec>).transpose() {
        Ok(sort) => sort,
        Err(e) => return error_response(&state, e),
    };
    match state.store.list(sort) {
        Ok(trades) => {
            RequestCounters::bump(&state.counters.trades_listed);
            (StatusCode::OK, Json(serde_json::json!({ "trades": trades })))
        }
        Err(e) => error_response(&state, e),
    }
}

/// POST /api/trades -- add a leg
pub async fn create_trade(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CreateQuery>,
    Json(mut input): Json<TradeInput>,
) -> ApiResponse {
    if let Some(link) = params.link.as_deref() {
        match link.parse::<GroupLink>() {
            Ok(link) => input.dca_group_id = assign_group_id(input.strategy, &link),
            Err(e) => return error_response(&state, e),
        }
    }
    match state.store.create(input) {
        Ok(trade) => {
            RequestCounters::bump(&state.counters.trades_created);
            (StatusCode::CREATED, Json(serde_json::json!(trade)))
        }
        Err(e) => error_response(&state, e),
    }
}

/// PATCH /api/trades/{id} -- apply a partial update (closing a position)
pub async fn update_trade(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<TradePatch>,
) -> ApiResponse {
    match state.store.update(&id, &patch) {
        Ok(trade) => {
            RequestCounters::bump(&state.counters.trades_updated);
            (StatusCode::OK, Json(serde_json::json!(trade)))
        }
        Err(e) => error_response(&state, e),
    }
}

/// POST /api/trades/{id}/close -- compute pnl/percentage from the exit and close the leg
pub async fn close_trade(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(exit): Json<ClosePosition>,
) -> ApiResponse {
    let closed = state
        .store
        .get(&id)
        .and_then(|trade| close_position(&trade, &exit))
        .and_then(|patch| state.store.update(&id, &patch));

    match closed {
        Ok(trade) => {
            RequestCounters::bump(&state.counters.trades_updated);
            (StatusCode::OK, Json(serde_json::json!(trade)))
        }
        Err(e) => error_response(&state, e),
    }
}

/// GET /api/counters -- request counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    use portable_atomic::Ordering::Relaxed;
    Json(serde_json::json!({
        "trades_listed": state.counters.trades_listed.load(Relaxed),
        "trades_created": state.counters.trades_created.load(Relaxed),
        "trades_updated": state.counters.trades_updated.load(Relaxed),
        "requests_failed": state.counters.requests_failed.load(Relaxed),
    }))
}

fn error_response(state: &AppState, e: JournalError) -> ApiResponse {
    RequestCounters::bump(&state.counters.requests_failed);
    let status = match &e {
        JournalError::InvalidRecord(_) | JournalError::Parse(_) | JournalError::EmptyGroup => {
            StatusCode::BAD_REQUEST
        }
        JournalError::NotFound(_) => StatusCode::NOT_FOUND,
        JournalError::InvalidTransition(_) => StatusCode::CONFLICT,
        JournalError::Database(_) | JournalError::Config(_) | JournalError::Io(_) => {
            tracing::error!("request failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(serde_json::json!({ "error": e.to_string() })))
}
