pub mod auth_service;
pub mod donation_service;
pub mod overlay_player;
pub mod queue_store;

pub use auth_service::*;
pub use donation_service::*;
pub use overlay_player::*;
pub use queue_store::*;
