use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::entities::affiliate_link;
use crate::db::services::{link_service, program_service};
use crate::web::models::AuthenticatedUser;
use crate::web::{error::AppError, AppState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    program_id: i32,
    name: String,
    destination_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLinkRequest {
    name: Option<String>,
    destination_url: Option<String>,
}

async fn create_link_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<affiliate_link::Model>), AppError> {
    if payload.name.trim().is_empty() || payload.destination_url.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Link name and destination URL must not be empty.".to_string(),
        ));
    }

    // Links hang off a program the user owns.
    let program = program_service::get_program_by_id(&app_state.db, payload.program_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Program not found".to_string()))?;
    if program.user_id != authenticated_user.id {
        return Err(AppError::Unauthorized("Access denied".to_string()));
    }

    let link = link_service::create_link(
        &app_state.db,
        authenticated_user.id,
        payload.program_id,
        &payload.name,
        &payload.destination_url,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(link)))
}

async fn list_links_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<affiliate_link::Model>>, AppError> {
    let links = link_service::get_links_by_user_id(&app_state.db, authenticated_user.id).await?;
    Ok(Json(links))
}

async fn get_link_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(link_id): Path<i32>,
) -> Result<Json<affiliate_link::Model>, AppError> {
    let link = link_service::get_link_by_id(&app_state.db, link_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Link not found".to_string()))?;

    if link.user_id != authenticated_user.id {
        return Err(AppError::Unauthorized("Access denied".to_string()));
    }

    Ok(Json(link))
}

async fn update_link_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(link_id): Path<i32>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<affiliate_link::Model>, AppError> {
    match link_service::update_link(
        &app_state.db,
        link_id,
        authenticated_user.id,
        payload.name,
        payload.destination_url,
    )
    .await
    {
        Ok(link) => Ok(Json(link)),
        Err(sea_orm::DbErr::RecordNotFound(_)) => {
            Err(AppError::NotFound("Link not found".to_string()))
        }
        Err(db_err) => Err(AppError::DatabaseError(db_err.to_string())),
    }
}

async fn delete_link_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(link_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let rows_affected =
        link_service::delete_link(&app_state.db, link_id, authenticated_user.id).await?;

    if rows_affected > 0 {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Link not found".to_string()))
    }
}

pub fn links_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_link_handler).get(list_links_handler))
        .route("/{link_id}", get(get_link_handler))
        .route("/{link_id}", put(update_link_handler))
        .route("/{link_id}", delete(delete_link_handler))
}
