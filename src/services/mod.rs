//! Service layer for business logic
//!
//! HTTP handlers stay thin: they extract the caller and request body, then
//! call into these services, which own validation and storage access.

use serde::{Deserialize, Deserializer};

mod analytics_service;
mod link_service;
mod redirect;
mod user_service;

pub use analytics_service::*;
pub use link_service::*;
pub use redirect::*;
pub use user_service::*;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
