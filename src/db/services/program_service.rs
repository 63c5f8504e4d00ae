use chrono::Utc;
use sea_orm::{
    prelude::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, UpdateResult,
};

use crate::db::entities::program;

/// Normalized performance counters produced by one successful sync, added onto
/// the program's stored totals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceDelta {
    pub clicks: i64,
    pub conversions: i64,
    pub earnings: f64,
}

/// Fields accepted when creating a program. The credential bundle arrives
/// already encrypted; this layer never sees plaintext secrets.
#[derive(Debug, Clone)]
pub struct NewProgram {
    pub name: String,
    pub network: String,
    pub status: String,
    pub credentials: Vec<u8>,
    pub sync_enabled: bool,
    pub sync_frequency: String,
}

/// Optional fields accepted when updating a program. `None` leaves the stored
/// value unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProgramUpdate {
    pub name: Option<String>,
    pub network: Option<String>,
    pub status: Option<String>,
    pub credentials: Option<Vec<u8>>,
    pub sync_enabled: Option<bool>,
    pub sync_frequency: Option<String>,
}

/// Creates a new affiliate program entry.
pub async fn create_program(
    db: &DatabaseConnection,
    user_id: i32,
    input: NewProgram,
) -> Result<program::Model, DbErr> {
    let now = Utc::now();
    let new_program = program::ActiveModel {
        user_id: Set(user_id),
        name: Set(input.name),
        network: Set(input.network),
        status: Set(input.status),
        credentials: Set(input.credentials),
        sync_enabled: Set(input.sync_enabled),
        sync_frequency: Set(input.sync_frequency),
        last_synced_at: Set(None),
        total_clicks: Set(0),
        total_conversions: Set(0),
        total_earnings: Set(0.0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    new_program.insert(db).await
}

/// Retrieves a program by its ID.
pub async fn get_program_by_id(
    db: &DatabaseConnection,
    program_id: i32,
) -> Result<Option<program::Model>, DbErr> {
    program::Entity::find_by_id(program_id).one(db).await
}

/// Retrieves all programs for a given user in insertion order. Batch sync
/// relies on this ordering to produce results in a stable sequence.
pub async fn get_programs_by_user_id(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<program::Model>, DbErr> {
    program::Entity::find()
        .filter(program::Column::UserId.eq(user_id))
        .order_by_asc(program::Column::Id)
        .all(db)
        .await
}

/// Updates a program's editable fields. The user filter enforces ownership at
/// the query level; a non-owned or missing program yields `RecordNotFound`.
pub async fn update_program(
    db: &DatabaseConnection,
    program_id: i32,
    user_id: i32,
    update: ProgramUpdate,
) -> Result<program::Model, DbErr> {
    let program_model = program::Entity::find_by_id(program_id)
        .filter(program::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("Program not found or access denied".to_string()))?;

    let mut active_model = program_model.into_active_model();
    if let Some(name) = update.name {
        active_model.name = Set(name);
    }
    if let Some(network) = update.network {
        active_model.network = Set(network);
    }
    if let Some(status) = update.status {
        active_model.status = Set(status);
    }
    if let Some(credentials) = update.credentials {
        active_model.credentials = Set(credentials);
    }
    if let Some(sync_enabled) = update.sync_enabled {
        active_model.sync_enabled = Set(sync_enabled);
    }
    if let Some(sync_frequency) = update.sync_frequency {
        active_model.sync_frequency = Set(sync_frequency);
    }
    active_model.updated_at = Set(Utc::now());
    active_model.update(db).await
}

/// Deletes a program owned by the given user. Returns the number of rows
/// removed (0 when the program does not exist or is not owned by the user).
pub async fn delete_program(
    db: &DatabaseConnection,
    program_id: i32,
    user_id: i32,
) -> Result<u64, DbErr> {
    let result = program::Entity::delete_many()
        .filter(program::Column::Id.eq(program_id))
        .filter(program::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Applies a successful sync: increments the performance counters by the
/// fetched delta and stamps `last_synced_at`. Called only on adapter success,
/// so a failed sync never touches the row.
pub async fn record_sync_success(
    db: &DatabaseConnection,
    program_id: i32,
    delta: &PerformanceDelta,
) -> Result<UpdateResult, DbErr> {
    let now = Utc::now();
    program::Entity::update_many()
        .col_expr(
            program::Column::TotalClicks,
            Expr::col(program::Column::TotalClicks).add(delta.clicks),
        )
        .col_expr(
            program::Column::TotalConversions,
            Expr::col(program::Column::TotalConversions).add(delta.conversions),
        )
        .col_expr(
            program::Column::TotalEarnings,
            Expr::col(program::Column::TotalEarnings).add(delta.earnings),
        )
        .col_expr(program::Column::LastSyncedAt, Expr::value(now))
        .col_expr(program::Column::UpdatedAt, Expr::value(now))
        .filter(program::Column::Id.eq(program_id))
        .exec(db)
        .await
}
