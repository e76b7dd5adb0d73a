use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::{InsertOutcome, SeaOrmStorage};
pub use models::{
    ClickRow, DeviceTargets, Link, LinkListQuery, LinkSortBy, LinkTotals, NewClickEvent,
    OpenGraph, ROLE_ADMIN, ROLE_USER, SortOrder, User, UserStatus, Utm,
};

pub struct StorageFactory;

impl StorageFactory {
    /// Connect using `database.database_url`, inferring the backend from the URL
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<SeaOrmStorage>> {
        let backend_type = backend::infer_backend_from_url(&config.database_url)?;
        let storage = SeaOrmStorage::new(config, &backend_type).await?;
        Ok(Arc::new(storage))
    }
}
