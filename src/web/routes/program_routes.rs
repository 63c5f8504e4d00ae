use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::db::entities::program;
use crate::db::services::program_service::{self, NewProgram, ProgramUpdate};
use crate::sync::models::{CredentialBundle, SyncResult};
use crate::web::models::AuthenticatedUser;
use crate::web::{error::AppError, AppState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProgramRequest {
    name: String,
    network: String,
    #[serde(default = "default_status")]
    status: String,
    #[serde(default)]
    credentials: Option<CredentialBundle>,
    #[serde(default)]
    sync_enabled: bool,
    #[serde(default = "default_sync_frequency")]
    sync_frequency: String,
}

fn default_status() -> String {
    "pending".to_string()
}

fn default_sync_frequency() -> String {
    "daily".to_string()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgramRequest {
    name: Option<String>,
    network: Option<String>,
    status: Option<String>,
    /// Replaces the stored bundle wholesale when present.
    #[serde(default)]
    credentials: Option<CredentialBundle>,
    sync_enabled: Option<bool>,
    sync_frequency: Option<String>,
}

/// Program view returned to the dashboard. The credential bundle is never
/// serialized back out; only its presence is reported.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramResponse {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub network: String,
    pub status: String,
    pub has_credentials: bool,
    pub sync_enabled: bool,
    pub sync_frequency: String,
    pub last_synced_at: Option<String>,
    pub total_clicks: i64,
    pub total_conversions: i64,
    pub total_earnings: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<program::Model> for ProgramResponse {
    fn from(model: program::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            network: model.network,
            status: model.status,
            has_credentials: !model.credentials.is_empty(),
            sync_enabled: model.sync_enabled,
            sync_frequency: model.sync_frequency,
            last_synced_at: model.last_synced_at.map(|dt| dt.to_rfc3339()),
            total_clicks: model.total_clicks,
            total_conversions: model.total_conversions,
            total_earnings: model.total_earnings,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

fn encrypt_bundle(
    app_state: &AppState,
    bundle: &Option<CredentialBundle>,
) -> Result<Vec<u8>, AppError> {
    match bundle {
        Some(bundle) => app_state
            .encryption
            .encrypt(&serde_json::to_vec(bundle)?)
            .map_err(|e| {
                AppError::InternalServerError(format!("Failed to encrypt credentials: {e}"))
            }),
        None => Ok(Vec::new()),
    }
}

async fn create_program_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateProgramRequest>,
) -> Result<(StatusCode, Json<ProgramResponse>), AppError> {
    if payload.name.trim().is_empty() || payload.network.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Program name and network must not be empty.".to_string(),
        ));
    }

    let credentials = encrypt_bundle(&app_state, &payload.credentials)?;
    let input = NewProgram {
        name: payload.name,
        network: payload.network,
        status: payload.status,
        credentials,
        sync_enabled: payload.sync_enabled,
        sync_frequency: payload.sync_frequency,
    };

    match program_service::create_program(&app_state.db, authenticated_user.id, input).await {
        Ok(model) => Ok((StatusCode::CREATED, Json(model.into()))),
        Err(db_err) => {
            error!(error = ?db_err, "Failed to create program.");
            Err(AppError::DatabaseError(db_err.to_string()))
        }
    }
}

async fn list_programs_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProgramResponse>>, AppError> {
    let programs =
        program_service::get_programs_by_user_id(&app_state.db, authenticated_user.id).await?;
    Ok(Json(programs.into_iter().map(Into::into).collect()))
}

async fn get_program_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(program_id): Path<i32>,
) -> Result<Json<ProgramResponse>, AppError> {
    let program = program_service::get_program_by_id(&app_state.db, program_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Program not found".to_string()))?;

    if program.user_id != authenticated_user.id {
        return Err(AppError::Unauthorized("Access denied".to_string()));
    }

    Ok(Json(program.into()))
}

async fn update_program_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(program_id): Path<i32>,
    Json(payload): Json<UpdateProgramRequest>,
) -> Result<Json<ProgramResponse>, AppError> {
    let credentials = match &payload.credentials {
        Some(_) => Some(encrypt_bundle(&app_state, &payload.credentials)?),
        None => None,
    };

    let update = ProgramUpdate {
        name: payload.name,
        network: payload.network,
        status: payload.status,
        credentials,
        sync_enabled: payload.sync_enabled,
        sync_frequency: payload.sync_frequency,
    };

    match program_service::update_program(&app_state.db, program_id, authenticated_user.id, update)
        .await
    {
        Ok(model) => Ok(Json(model.into())),
        Err(sea_orm::DbErr::RecordNotFound(_)) => {
            Err(AppError::NotFound("Program not found".to_string()))
        }
        Err(db_err) => Err(AppError::DatabaseError(db_err.to_string())),
    }
}

async fn delete_program_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(program_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let rows_affected =
        program_service::delete_program(&app_state.db, program_id, authenticated_user.id).await?;

    if rows_affected > 0 {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Program not found".to_string()))
    }
}

/// Triggers one synchronization attempt for a single program. Sync outcomes
/// are values, not errors: the handler returns 200 with the result whether or
/// not the sync succeeded, and the UI surfaces the carried message.
async fn sync_program_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(program_id): Path<i32>,
) -> Result<Json<SyncResult>, AppError> {
    if let Some(program) = program_service::get_program_by_id(&app_state.db, program_id).await? {
        if program.user_id != authenticated_user.id {
            return Err(AppError::Unauthorized("Access denied".to_string()));
        }
    }

    Ok(Json(app_state.sync_service.sync_program(program_id).await))
}

/// Runs sync for every sync-enabled, active program of the current user,
/// sequentially, returning one result per program in load order.
pub async fn sync_all_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<SyncResult>>, AppError> {
    let results = app_state
        .sync_service
        .sync_all_programs(authenticated_user.id)
        .await?;
    Ok(Json(results))
}

pub fn programs_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_program_handler).get(list_programs_handler))
        .route("/{program_id}", get(get_program_handler))
        .route("/{program_id}", put(update_program_handler))
        .route("/{program_id}", delete(delete_program_handler))
        .route("/{program_id}/sync", post(sync_program_handler))
}
