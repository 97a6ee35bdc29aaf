use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
            CONTENT_TYPE,
        },
        HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    aggregate,
    cache::PriceCache,
    model::{self, NewPrice, PriceQuery},
    upstream::{Lookup, PriceSheet, RecordReply},
    Error,
};

/// Shared by every request: the sheet adapter picked at start-up and the
/// process-local price cache.
#[derive(Clone)]
pub struct AppState {
    pub sheet: Arc<dyn PriceSheet>,
    pub cache: PriceCache,
}

impl AppState {
    pub fn new(sheet: Arc<dyn PriceSheet>, cache: PriceCache) -> Self {
        Self { sheet, cache }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/index",
            get(get_prices)
                .post(record_price)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/health",
            get(health).options(preflight).fallback(method_not_allowed),
        )
        .fallback(fallback)
        // 5xx are already logged by `Error::into_response`.
        .layer(TraceLayer::new_for_http().on_failure(()))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ))
        .with_state(state)
}

/// GET /api/index?product=&city=&shop=
async fn get_prices(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response, Error> {
    let Query(pairs) = query.map_err(|_| Error::InvalidQuery)?;
    let query = PriceQuery::from_pairs(&pairs).normalized();

    match state.sheet.lookup(&query).await? {
        Lookup::Rows(rows) => {
            let cached = state.cache.prices(&query.product).await;
            let summary = aggregate::summarize(&cached, &rows)?;
            Ok(Json(summary).into_response())
        }
        Lookup::Raw(body) => Ok(Json(body).into_response()),
    }
}

/// POST /api/index
async fn record_price(State(state): State<AppState>, body: Bytes) -> Result<Response, Error> {
    let observation = NewPrice::from_body(&body).into_observation(model::timestamp_now())?;

    let prices = state.cache.append(&observation.product, observation.price).await;
    info!(
        product = %observation.product,
        city = %observation.city,
        shop = %observation.shop,
        price = observation.price,
        "recording price"
    );

    let reply = match state.sheet.record(&observation).await? {
        RecordReply::RunningAverage => {
            let avg = aggregate::mean(&prices).map(aggregate::fixed);
            json!({ "avg": avg })
        }
        RecordReply::Upstream(body) => body,
        RecordReply::Acknowledged => json!({ "status": "ok" }),
    };

    Ok(Json(reply).into_response())
}

async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn method_not_allowed() -> Error {
    Error::MethodNotAllowed
}

async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    Error::NotFound.into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
