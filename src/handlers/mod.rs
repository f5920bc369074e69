pub mod auth;
pub mod health;
pub mod lottery;
pub mod prize;
pub mod record;
pub mod settings;

pub use auth::auth_config;
pub use health::health_config;
pub use lottery::lottery_config;
pub use prize::prize_config;
pub use record::record_config;
pub use settings::settings_config;
