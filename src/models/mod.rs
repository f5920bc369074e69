pub mod auth;
pub mod common;
pub mod lottery;
pub mod pagination;
pub mod prize;
pub mod record;
pub mod settings;

pub use auth::*;
pub use common::*;
pub use lottery::*;
pub use pagination::*;
pub use prize::*;
pub use record::*;
pub use settings::*;
