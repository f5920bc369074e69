use crate::entities::{RecordStatus, prize_entity as prizes, record_entity as records};
use crate::error::{AppError, AppResult};
use crate::models::{
    PaginatedResponse, PaginationParams, RecordPageResponse, RecordQuery, RecordResponse,
    UpdateRecordRequest,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    PaginatorTrait, QueryOrder, QuerySelect, Set,
};

/// 中奖记录管理（后台）
#[derive(Clone)]
pub struct RecordService {
    pool: DatabaseConnection,
}

impl RecordService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 分页查询，最新的记录在前
    pub async fn list(&self, query: RecordQuery) -> AppResult<RecordPageResponse> {
        let params = PaginationParams::new(query.page, query.per_page);

        let total = records::Entity::find().count(&self.pool).await?;
        let rows = records::Entity::find()
            .find_also_related(prizes::Entity)
            .order_by_desc(records::Column::CreatedAt)
            .order_by_desc(records::Column::Id)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(&self.pool)
            .await?;

        let data = rows
            .into_iter()
            .map(|(record, prize)| RecordResponse::new(record, prize))
            .collect();
        Ok(PaginatedResponse::new(data, params, total))
    }

    pub async fn update(&self, id: i32, req: UpdateRecordRequest) -> AppResult<RecordResponse> {
        if req.is_empty() {
            return Err(AppError::ValidationError("没有需要更新的字段".into()));
        }

        let record = self.find(id).await?;
        let current = record.status;
        let mut am = record.into_active_model();

        if let Some(quantity) = req.quantity {
            if quantity < 1 {
                return Err(AppError::ValidationError("数量必须大于 0".into()));
            }
            am.quantity = Set(quantity);
        }
        if let Some(record_type) = req.record_type {
            am.record_type = Set(record_type);
        }
        if let Some(code) = req.status {
            let target = RecordStatus::from_code(code)
                .ok_or_else(|| AppError::ValidationError(format!("无效的记录状态: {code}")))?;
            let next = current
                .transition_to(target)
                .map_err(|e| AppError::ValidationError(e.to_string()))?;
            am.status = Set(next);
        }
        am.updated_at = Set(Utc::now());

        let updated = am.update(&self.pool).await?;
        log::info!("Record {} updated by admin", updated.id);

        let prize = updated.find_related(prizes::Entity).one(&self.pool).await?;
        Ok(RecordResponse::new(updated, prize))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = records::Entity::delete_by_id(id).exec(&self.pool).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("记录不存在".into()));
        }
        log::info!("Record {id} deleted");
        Ok(())
    }

    async fn find(&self, id: i32) -> AppResult<records::Model> {
        records::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("记录不存在".into()))
    }
}
