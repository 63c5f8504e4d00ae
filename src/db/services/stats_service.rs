use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;

use crate::db::entities::{affiliate_link, program};

/// Aggregated dashboard totals for one user, computed from the performance
/// counters the sync layer maintains on each program.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_programs: u64,
    pub active_programs: u64,
    pub total_links: u64,
    pub total_clicks: i64,
    pub total_conversions: i64,
    pub total_earnings: f64,
}

/// Computes the dashboard summary for a user.
pub async fn get_stats_summary(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<StatsSummary, DbErr> {
    let programs = program::Entity::find()
        .filter(program::Column::UserId.eq(user_id))
        .all(db)
        .await?;

    let total_links = affiliate_link::Entity::find()
        .filter(affiliate_link::Column::UserId.eq(user_id))
        .count(db)
        .await?;

    let mut summary = StatsSummary {
        total_programs: programs.len() as u64,
        active_programs: 0,
        total_links,
        total_clicks: 0,
        total_conversions: 0,
        total_earnings: 0.0,
    };

    for p in &programs {
        if p.status == "active" {
            summary.active_programs += 1;
        }
        summary.total_clicks += p.total_clicks;
        summary.total_conversions += p.total_conversions;
        summary.total_earnings += p.total_earnings;
    }

    Ok(summary)
}
