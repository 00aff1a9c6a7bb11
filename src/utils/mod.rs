pub mod donation_id;
pub mod jwt;
pub mod password;

pub use donation_id::*;
pub use jwt::*;
pub use password::*;
