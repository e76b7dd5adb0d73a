//! Raw click event entity, one row per successful redirect

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "click_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub link_id: String,
    pub clicked_at: DateTimeUtc,
    /// Country name or ISO code as delivered by the edge header
    pub country: Option<String>,
    /// Desktop | Mobile | Tablet
    pub device_type: String,
    pub browser: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub referrer: Option<String>,
    pub ip_hash: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
