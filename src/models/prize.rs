use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::prize_entity;

/// 奖品信息响应
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PrizeResponse {
    pub id: i32,
    pub name: String,
    /// base64 图片或图标字符
    pub image: Option<String>,
    /// 剩余数量（即抽奖权重）
    pub quantity: i32,
    pub supplier: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<prize_entity::Model> for PrizeResponse {
    fn from(m: prize_entity::Model) -> Self {
        PrizeResponse {
            id: m.id,
            name: m.name,
            image: m.image,
            quantity: m.quantity,
            supplier: m.supplier,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// 创建奖品
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreatePrizeRequest {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub quantity: i32,
    pub supplier: String,
}

/// 修改奖品（仅更新提供的字段）
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdatePrizeRequest {
    pub name: Option<String>,
    pub image: Option<String>,
    pub quantity: Option<i32>,
    pub supplier: Option<String>,
}

impl UpdatePrizeRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.image.is_none() && self.quantity.is_none() && self.supplier.is_none()
    }
}
