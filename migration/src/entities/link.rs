use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    #[sea_orm(column_type = "Text")]
    pub original_url: String,
    #[sea_orm(unique)]
    pub short_code: String,
    #[sea_orm(unique)]
    pub alias: Option<String>,
    pub clicks: i64,
    pub max_clicks: Option<i64>,
    pub password: Option<String>,
    pub is_private: bool,
    pub created_at: DateTimeUtc,
    pub expires_at: Option<DateTimeUtc>,
    #[sea_orm(column_type = "Text", nullable)]
    pub qr_code: Option<String>,
    /// JSON array of tags
    #[sea_orm(column_type = "Text")]
    pub tags: String,
    pub category: Option<String>,
    /// Free-form JSON object
    #[sea_orm(column_type = "Text")]
    pub metadata: String,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub mobile_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub tablet_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub desktop_url: Option<String>,
    pub og_title: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub og_description: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub og_image: Option<String>,
    pub og_type: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
