use crate::entities::prize_entity as prizes;
use crate::error::{AppError, AppResult};
use crate::models::{CreatePrizeRequest, PrizeResponse, UpdatePrizeRequest};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait, QueryOrder,
    Set,
};

/// 奖品管理（后台）
#[derive(Clone)]
pub struct PrizeService {
    pool: DatabaseConnection,
}

impl PrizeService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> AppResult<Vec<PrizeResponse>> {
        let list = prizes::Entity::find()
            .order_by_asc(prizes::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn create(&self, req: CreatePrizeRequest) -> AppResult<PrizeResponse> {
        let name = req.name.trim();
        let supplier = req.supplier.trim();
        if name.is_empty() || supplier.is_empty() {
            return Err(AppError::ValidationError(
                "缺少必填字段: name, quantity, supplier".into(),
            ));
        }
        validate_quantity(req.quantity)?;

        let now = Utc::now();
        let model = prizes::ActiveModel {
            name: Set(name.to_string()),
            image: Set(req.image.filter(|s| !s.is_empty())),
            quantity: Set(req.quantity),
            supplier: Set(Some(supplier.to_string())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Prize {} created ({}, quantity {})", model.id, model.name, model.quantity);
        Ok(model.into())
    }

    pub async fn update(&self, id: i32, req: UpdatePrizeRequest) -> AppResult<PrizeResponse> {
        if req.is_empty() {
            return Err(AppError::ValidationError("没有需要更新的字段".into()));
        }

        let model = self.find(id).await?;
        let mut am = model.into_active_model();

        if let Some(name) = req.name {
            if name.trim().is_empty() {
                return Err(AppError::ValidationError("奖品名称不能为空".into()));
            }
            am.name = Set(name.trim().to_string());
        }
        if let Some(image) = req.image {
            am.image = Set(Some(image).filter(|s| !s.is_empty()));
        }
        if let Some(quantity) = req.quantity {
            validate_quantity(quantity)?;
            am.quantity = Set(quantity);
        }
        if let Some(supplier) = req.supplier {
            am.supplier = Set(Some(supplier));
        }
        am.updated_at = Set(Utc::now());

        let updated = am.update(&self.pool).await?;
        Ok(updated.into())
    }

    /// 删除奖品；关联记录的 prize_id 由外键置空
    pub async fn delete(&self, id: i32) -> AppResult<PrizeResponse> {
        let model = self.find(id).await?;
        model.clone().delete(&self.pool).await?;
        log::info!("Prize {} deleted", model.id);
        Ok(model.into())
    }

    async fn find(&self, id: i32) -> AppResult<prizes::Model> {
        prizes::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("奖品不存在".into()))
    }
}

fn validate_quantity(quantity: i32) -> AppResult<()> {
    if quantity < 0 {
        return Err(AppError::ValidationError("奖品数量不能为负数".into()));
    }
    Ok(())
}
