use crate::server::AppState;
use axum::routing::get;
use axum::{Extension, Json};
use chrono::Utc;
use std::sync::Arc;

pub fn router() -> axum::Router {
    axum::Router::new().route("/api/v1/health", get(get_health))
}

#[tracing::instrument(level = "debug", skip_all)]
async fn get_health(Extension(state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    let database_ok = state.store.count_teams().is_ok();

    Json(serde_json::json!({
        "status": if database_ok { "ok" } else { "degraded" },
        "ready": database_ok,
        "checked_at": Utc::now(),
        "checks": {
            "database": { "ok": database_ok },
        }
    }))
}
