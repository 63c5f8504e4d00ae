use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "programs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    /// Free-text network label, e.g. "ShareASale" or "Amazon Associates".
    /// Routing to a sync adapter is derived from this at dispatch time.
    pub network: String,
    pub status: String, // "active" | "pending" | "rejected" | "inactive"
    /// Encrypted JSON credential bundle (AES-256-GCM, nonce-prefixed).
    #[serde(skip_serializing)]
    pub credentials: Vec<u8>,
    pub sync_enabled: bool,
    pub sync_frequency: String,
    pub last_synced_at: Option<ChronoDateTimeUtc>,
    pub total_clicks: i64,
    pub total_conversions: i64,
    pub total_earnings: f64,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade",
        on_update = "Cascade"
    )]
    User,

    #[sea_orm(has_many = "super::affiliate_link::Entity")]
    AffiliateLinks,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::affiliate_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AffiliateLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
