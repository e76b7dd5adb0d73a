pub mod click_event;
pub mod link;
pub mod user;

pub use click_event::Entity as ClickEventEntity;
pub use link::Entity as LinkEntity;
pub use user::Entity as UserEntity;
