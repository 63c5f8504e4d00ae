use axum::{
    extract::{Extension, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::db::services::stats_service::{self, StatsSummary};
use crate::web::models::AuthenticatedUser;
use crate::web::{error::AppError, AppState};

/// Dashboard totals aggregated from the performance counters the sync layer
/// maintains on each program.
async fn stats_summary_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<StatsSummary>, AppError> {
    let summary =
        stats_service::get_stats_summary(&app_state.db, authenticated_user.id).await?;
    Ok(Json(summary))
}

pub fn stats_router() -> Router<Arc<AppState>> {
    Router::new().route("/summary", get(stats_summary_handler))
}
