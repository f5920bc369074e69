use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 管理员登录
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LoginResponse {
    pub username: String,
    pub token: String,
    /// token 有效期（秒）
    pub expires_in: i64,
}

/// 创建管理员
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateAdminRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// 修改当前管理员密码
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// token 校验结果
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct AdminIdentity {
    pub id: i32,
    pub username: String,
}
