use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::db::entities::affiliate_link;

/// Base URL for generated tracking links.
const TRACKING_BASE_URL: &str = "https://go.afftrack.io/l";

/// Creates a tracking link for a program. A short random slug is generated so
/// destination URLs are never exposed in shared links.
pub async fn create_link(
    db: &DatabaseConnection,
    user_id: i32,
    program_id: i32,
    name: &str,
    destination_url: &str,
) -> Result<affiliate_link::Model, DbErr> {
    let now = Utc::now();
    let slug = Uuid::new_v4().simple().to_string();
    let tracking_url = format!("{}/{}", TRACKING_BASE_URL, &slug[..12]);

    let new_link = affiliate_link::ActiveModel {
        user_id: Set(user_id),
        program_id: Set(program_id),
        name: Set(name.to_owned()),
        destination_url: Set(destination_url.to_owned()),
        tracking_url: Set(tracking_url),
        clicks: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    new_link.insert(db).await
}

/// Retrieves a link by its ID.
pub async fn get_link_by_id(
    db: &DatabaseConnection,
    link_id: i32,
) -> Result<Option<affiliate_link::Model>, DbErr> {
    affiliate_link::Entity::find_by_id(link_id).one(db).await
}

/// Retrieves all links for a given user in insertion order.
pub async fn get_links_by_user_id(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<affiliate_link::Model>, DbErr> {
    affiliate_link::Entity::find()
        .filter(affiliate_link::Column::UserId.eq(user_id))
        .order_by_asc(affiliate_link::Column::Id)
        .all(db)
        .await
}

/// Updates a link's name and/or destination. The tracking slug is immutable
/// once issued so previously shared links keep resolving.
pub async fn update_link(
    db: &DatabaseConnection,
    link_id: i32,
    user_id: i32,
    name: Option<String>,
    destination_url: Option<String>,
) -> Result<affiliate_link::Model, DbErr> {
    let link_model = affiliate_link::Entity::find_by_id(link_id)
        .filter(affiliate_link::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("Link not found or access denied".to_string()))?;

    let mut active_model = link_model.into_active_model();
    if let Some(name) = name {
        active_model.name = Set(name);
    }
    if let Some(destination_url) = destination_url {
        active_model.destination_url = Set(destination_url);
    }
    active_model.updated_at = Set(Utc::now());
    active_model.update(db).await
}

/// Deletes a link owned by the given user. Returns the number of rows removed.
pub async fn delete_link(
    db: &DatabaseConnection,
    link_id: i32,
    user_id: i32,
) -> Result<u64, DbErr> {
    let result = affiliate_link::Entity::delete_many()
        .filter(affiliate_link::Column::Id.eq(link_id))
        .filter(affiliate_link::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
