pub mod common;
pub mod donation;
pub mod playback;
pub mod session;
pub mod voice;

pub use common::*;
pub use donation::*;
pub use playback::*;
pub use session::*;
pub use voice::*;
