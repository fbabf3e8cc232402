use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Local, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::config::DashboardConfig;
use crate::login;
use crate::report;
use crate::rows::RawRow;
use crate::sheets::{RangeSource, SheetsClient};

pub struct AppState {
    pub config: DashboardConfig,
    pub source: Box<dyn RangeSource + Send + Sync>,
}

#[derive(Deserialize)]
struct ScopeQuery {
    sm: Option<String>,
}

#[derive(Deserialize)]
struct UnderperformerQuery {
    sm: Option<String>,
    threshold: Option<f64>,
}

#[derive(Deserialize)]
struct FunnelQuery {
    name: Option<String>,
    role: Option<String>,
}

pub async fn run(config: DashboardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let source = SheetsClient::new(&config)?;
    let bind_addr = config.bind_addr.clone();

    // Setup app state
    let state = Arc::new(AppState {
        config,
        source: Box::new(source),
    });

    let app = router(state);

    // Start server
    let listener = TcpListener::bind(&bind_addr).await?;
    log::info!("Listening on http://{bind_addr}");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the API router. Every data route is behind the session middleware;
/// login/logout and the cron probe stay public (the probe carries its own
/// bearer secret).
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/login", post(login::handle_login))
        .route("/api/logout", post(login::handle_logout))
        .route("/api/hierarchy", get(get_hierarchy))
        .route("/api/revenue", get(get_revenue))
        .route("/api/quality", get(get_quality))
        .route("/api/customer-rating", get(get_customer_rating))
        .route("/api/dietitian-gaps", get(get_dietitian_gaps))
        .route("/api/underperformers", get(get_underperformers))
        .route("/api/funnel", get(get_funnel))
        .route("/api/key-mapping", get(get_key_mapping))
        .route("/api/data", get(get_data))
        .route("/api/cron/refresh-data", get(cron_refresh))
        .layer(axum::middleware::from_fn(login::require_auth))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Fetch one range, or produce the error response for the whole request. A
/// failed fetch fails the request outright - no partial hierarchy, per the
/// consistency-over-availability policy.
async fn fetch(state: &AppState, range: &str) -> Result<Vec<RawRow>, Response> {
    state.source.fetch_range(range).await.map_err(|error| {
        log::error!("{error}");
        (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "ok": false, "error": error.to_string() })),
        )
            .into_response()
    })
}

/// Sub-targets drift daily; every request re-derives them from the current
/// date.
fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn get_hierarchy(State(state): State<Arc<AppState>>) -> Response {
    let targets = match fetch(&state, &state.config.ranges.targets).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };
    let revenue = match fetch(&state, &state.config.ranges.revenue).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };

    Json(report::hierarchy_report(&targets, &revenue, today())).into_response()
}

async fn get_revenue(
    Query(params): Query<ScopeQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let targets = match fetch(&state, &state.config.ranges.targets).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };
    let revenue = match fetch(&state, &state.config.ranges.revenue).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };

    let data = report::revenue_report(&targets, &revenue, today(), params.sm.as_deref());
    Json(json!({
        "ok": true,
        "lastFetched": Utc::now().to_rfc3339(),
        "data": data,
    }))
    .into_response()
}

async fn get_quality(State(state): State<Arc<AppState>>) -> Response {
    let rows = match fetch(&state, &state.config.ranges.quality).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };

    Json(json!({ "quality": report::quality_report(&rows) })).into_response()
}

async fn get_customer_rating(State(state): State<Arc<AppState>>) -> Response {
    let rows = match fetch(&state, &state.config.ranges.quality).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };

    Json(json!({ "customerRating": report::customer_rating_report(&rows) })).into_response()
}

async fn get_dietitian_gaps(
    Query(params): Query<ScopeQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let gaps_rows = match fetch(&state, &state.config.ranges.gaps).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };
    let key_mapping = match fetch(&state, &state.config.ranges.key_mapping).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };

    let gaps = report::gaps_report(
        &gaps_rows,
        &key_mapping,
        state.config.thresholds,
        params.sm.as_deref(),
    );
    Json(json!({ "dietitianGaps": gaps })).into_response()
}

async fn get_underperformers(
    Query(params): Query<UnderperformerQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let targets = match fetch(&state, &state.config.ranges.targets).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };
    let revenue = match fetch(&state, &state.config.ranges.revenue).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };

    let threshold = params.threshold.unwrap_or(state.config.underperformer_pct);
    let underperformers = report::underperformers_report(
        &targets,
        &revenue,
        today(),
        threshold,
        params.sm.as_deref(),
    );
    Json(json!({ "underperformers": underperformers })).into_response()
}

async fn get_funnel(
    Query(params): Query<FunnelQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let rows = match fetch(&state, &state.config.ranges.funnel).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };

    let name = params.name.unwrap_or_default();
    let role = params.role.unwrap_or_else(|| "admin".to_string());
    Json(report::funnel_scope_report(&rows, &name, &role, today())).into_response()
}

async fn get_key_mapping(State(state): State<Arc<AppState>>) -> Response {
    let rows = match fetch(&state, &state.config.ranges.key_mapping).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };

    Json(json!({ "excludedNames": crate::gaps::excluded_names(&rows) })).into_response()
}

async fn get_data(State(state): State<Arc<AppState>>) -> Response {
    let rows = match fetch(&state, &state.config.ranges.data).await {
        Ok(rows) => rows,
        Err(response) => return response,
    };

    Json(json!({
        "ok": true,
        "rows": report::data_records(&rows),
        "fetchedAt": Utc::now().to_rfc3339(),
    }))
    .into_response()
}

/// Liveness probe for the external refresh scheduler. Refresh itself is an
/// operational concern; nothing is cached in-process, so there is nothing to
/// invalidate here.
async fn cron_refresh(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(secret) = &state.config.cron_secret {
        let expected = format!("Bearer {secret}");
        let authorized = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            == Some(expected.as_str());
        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Unauthorized" })),
            )
                .into_response();
        }
    }

    Json(json!({
        "success": true,
        "message": "Cron route is working!",
        "timestamp": Utc::now().to_rfc3339(),
    }))
    .into_response()
}
