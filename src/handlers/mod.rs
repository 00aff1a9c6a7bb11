pub mod auth;
pub mod donation;
pub mod overlay;
pub mod voice;

pub use auth::auth_config;
pub use donation::donation_config;
pub use overlay::overlay_config;
pub use voice::voice_config;
