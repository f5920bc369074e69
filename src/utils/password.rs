use bcrypt::{hash, verify, DEFAULT_COST};
use crate::error::{AppError, AppResult};

const MIN_PASSWORD_LEN: usize = 4;
const MAX_PASSWORD_LEN: usize = 72; // bcrypt 只使用前 72 字节

/// 验证密码长度（管理员密码与兑奖密码共用）
pub fn validate_password(password: &str) -> AppResult<()> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(AppError::ValidationError(
            "密码长度不能少于4位".to_string()
        ));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::ValidationError(
            "密码长度不能超过72字节".to_string()
        ));
    }

    Ok(())
}

/// 对密码进行哈希
pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::InternalError(format!("密码哈希失败: {}", e)))
}

/// 验证密码
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    verify(password, hash)
        .map_err(|e| AppError::InternalError(format!("密码验证失败: {}", e)))
}
