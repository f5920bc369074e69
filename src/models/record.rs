use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{RecordType, prize_entity, record_entity};

use super::PaginatedResponse;

/// 记录查询参数
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct RecordQuery {
    /// 页码 (默认 1)
    pub page: Option<u32>,
    /// 每页数量 (默认 20)
    pub per_page: Option<u32>,
}

/// 中奖记录响应（附带奖品名称）
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordResponse {
    pub id: i32,
    pub prize_id: Option<i32>,
    /// 奖品已删除时为空
    pub prize_name: Option<String>,
    pub phone: String,
    pub vipcard: String,
    pub quantity: i32,
    pub record_type: RecordType,
    /// 0 未兑奖, 1 已兑奖
    pub status: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecordResponse {
    pub fn new(m: record_entity::Model, prize: Option<prize_entity::Model>) -> Self {
        RecordResponse {
            id: m.id,
            prize_id: m.prize_id,
            prize_name: prize.map(|p| p.name),
            phone: m.phone,
            vipcard: m.vipcard,
            quantity: m.quantity,
            record_type: m.record_type,
            status: m.status.code(),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<record_entity::Model> for RecordResponse {
    fn from(m: record_entity::Model) -> Self {
        RecordResponse::new(m, None)
    }
}

/// 后台修改记录
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateRecordRequest {
    pub quantity: Option<i32>,
    pub record_type: Option<RecordType>,
    /// 0 / 1，只允许 0 -> 1
    pub status: Option<i32>,
}

impl UpdateRecordRequest {
    pub fn is_empty(&self) -> bool {
        self.quantity.is_none() && self.record_type.is_none() && self.status.is_none()
    }
}

/// 记录分页响应
pub type RecordPageResponse = PaginatedResponse<RecordResponse>;
