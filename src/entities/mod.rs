pub mod admins;
pub mod prizes;
pub mod records;
pub mod settings;

pub use admins as admin_entity;
pub use prizes as prize_entity;
pub use records as record_entity;
pub use records::{InvalidTransition, RecordStatus, RecordType};
pub use settings as setting_entity;
pub use settings::REDEEM_PASSWORD_KEY;
