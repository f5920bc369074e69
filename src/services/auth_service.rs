use crate::config::AdminConfig;
use crate::entities::admin_entity as admins;
use crate::error::{AppError, AppResult};
use crate::models::{AdminIdentity, LoginResponse};
use crate::utils::{JwtService, hash_password, validate_password, verify_password};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set,
};

const MSG_BAD_CREDENTIALS: &str = "用户名或密码错误";

/// 管理员认证
#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService) -> Self {
        Self { pool, jwt_service }
    }

    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginResponse> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::ValidationError("用户名和密码不能为空".to_string()));
        }

        let admin = self
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::AuthError(MSG_BAD_CREDENTIALS.to_string()))?;

        if !verify_password(password, &admin.password)? {
            log::warn!("Admin login failed for {username}");
            return Err(AppError::AuthError(MSG_BAD_CREDENTIALS.to_string()));
        }

        let token = self
            .jwt_service
            .generate_access_token(admin.id, &admin.username)?;
        log::info!("Admin {} logged in", admin.id);

        Ok(LoginResponse {
            username: admin.username,
            token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }

    pub async fn create_admin(&self, username: &str, password: &str) -> AppResult<AdminIdentity> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::ValidationError("用户名不能为空".to_string()));
        }
        validate_password(password)?;

        if self.find_by_username(username).await?.is_some() {
            return Err(AppError::Conflict("用户名已存在".to_string()));
        }

        let now = Utc::now();
        let admin = admins::ActiveModel {
            username: Set(username.to_string()),
            password: Set(hash_password(password)?),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Admin {} created", admin.id);
        Ok(AdminIdentity {
            id: admin.id,
            username: admin.username,
        })
    }

    pub async fn change_password(
        &self,
        admin_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        if current_password.is_empty() || new_password.is_empty() {
            return Err(AppError::ValidationError("当前密码和新密码不能为空".to_string()));
        }
        validate_password(new_password)?;

        let admin = admins::Entity::find_by_id(admin_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("管理员不存在".to_string()))?;

        if !verify_password(current_password, &admin.password)? {
            return Err(AppError::AuthError("当前密码错误".to_string()));
        }

        let mut am = admin.into_active_model();
        am.password = Set(hash_password(new_password)?);
        am.updated_at = Set(Utc::now());
        am.update(&self.pool).await?;

        log::info!("Admin {admin_id} changed password");
        Ok(())
    }

    /// 管理员表为空且配置了初始密码时创建初始管理员
    pub async fn ensure_initial_admin(&self, cfg: &AdminConfig) -> AppResult<bool> {
        if cfg.initial_password.is_empty() {
            return Ok(false);
        }
        if admins::Entity::find().count(&self.pool).await? > 0 {
            return Ok(false);
        }

        self.create_admin(&cfg.initial_username, &cfg.initial_password)
            .await?;
        log::info!("Initial admin '{}' created", cfg.initial_username);
        Ok(true)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<admins::Model>> {
        Ok(admins::Entity::find()
            .filter(admins::Column::Username.eq(username))
            .one(&self.pool)
            .await?)
    }
}
