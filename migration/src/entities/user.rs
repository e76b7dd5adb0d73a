//! Dashboard account entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    /// Stored lowercased, unique
    pub email: String,
    pub password_hash: String,
    /// JSON array of role names, e.g. `["admin","user"]`
    #[sea_orm(column_type = "Text")]
    pub roles: String,
    /// active | suspended | inactive
    pub status: String,
    pub custom_domain: Option<String>,
    pub notifications_enabled: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
