use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 设置兑奖密码
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedeemPasswordRequest {
    #[serde(default)]
    pub redeem_password: String,
}

/// 当前兑奖密码
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RedeemPasswordResponse {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingUpdatedResponse {
    pub message: String,
    pub updated_at: DateTime<Utc>,
}
