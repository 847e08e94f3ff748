use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{
    services::catalog::{self, CatalogPort, DEFAULT_SEARCH_LIMIT},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/ports/search", get(search_ports))
}

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    q: Option<String>,
    region: Option<String>,
    limit: Option<usize>,
}

/// Searches the built-in port catalog. Unscoped: the catalog is shared
/// reference data, not device state.
async fn search_ports(
    State(_state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<&'static CatalogPort>> {
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    Json(catalog::search(
        params.q.as_deref(),
        params.region.as_deref(),
        limit,
    ))
}
