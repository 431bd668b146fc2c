use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::shops::{ShopDto, ShopSearchQuery},
    error::AppResult,
    response::ApiResponse,
    services::shop_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/shops", get(list_shops))
}

#[utoipa::path(
    get,
    path = "/api/public/shops",
    params(ShopSearchQuery),
    responses(
        (status = 200, description = "Approved, active shops", body = ApiResponse<Vec<ShopDto>>)
    ),
    tag = "Public"
)]
pub async fn list_shops(
    State(state): State<AppState>,
    Query(query): Query<ShopSearchQuery>,
) -> AppResult<Json<ApiResponse<Vec<ShopDto>>>> {
    let resp = match (query.city.as_deref(), query.q.as_deref()) {
        (Some(city), None) => shop_service::list_shops_by_city(&state, city).await?,
        (None, Some(name)) => shop_service::search_shops_by_name(&state, name).await?,
        _ => shop_service::list_approved_shops(&state, query).await?,
    };
    Ok(Json(resp))
}
