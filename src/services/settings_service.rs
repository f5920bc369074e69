use crate::entities::{REDEEM_PASSWORD_KEY, setting_entity as settings};
use crate::error::AppResult;
use crate::models::{RedeemPasswordResponse, SettingUpdatedResponse};
use crate::utils::validate_password;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};

/// 系统设置，目前只有兑奖密码
#[derive(Clone)]
pub struct SettingsService {
    pool: DatabaseConnection,
}

impl SettingsService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn get_redeem_password(&self) -> AppResult<RedeemPasswordResponse> {
        let value = self
            .find(REDEEM_PASSWORD_KEY)
            .await?
            .and_then(|s| s.setting_value)
            .unwrap_or_default();
        Ok(RedeemPasswordResponse { value })
    }

    /// 设置兑奖密码（不存在时插入）
    pub async fn set_redeem_password(&self, password: &str) -> AppResult<SettingUpdatedResponse> {
        validate_password(password)?;
        let now = Utc::now();

        match self.find(REDEEM_PASSWORD_KEY).await? {
            Some(existing) => {
                let mut am = existing.into_active_model();
                am.setting_value = Set(Some(password.to_string()));
                am.updated_at = Set(now);
                am.update(&self.pool).await?;
            }
            None => {
                settings::ActiveModel {
                    setting_key: Set(REDEEM_PASSWORD_KEY.to_string()),
                    setting_value: Set(Some(password.to_string())),
                    description: Set(Some("兑奖密码".to_string())),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&self.pool)
                .await?;
            }
        }

        log::info!("Redeem password updated");
        Ok(SettingUpdatedResponse {
            message: "兑奖密码设置成功".to_string(),
            updated_at: now,
        })
    }

    async fn find(&self, key: &str) -> AppResult<Option<settings::Model>> {
        Ok(settings::Entity::find()
            .filter(settings::Column::SettingKey.eq(key))
            .one(&self.pool)
            .await?)
    }
}
