pub mod auth_service;
pub mod lottery_service;
pub mod prize_service;
pub mod record_service;
pub mod settings_service;

pub use auth_service::*;
pub use lottery_service::*;
pub use prize_service::*;
pub use record_service::*;
pub use settings_service::*;
