use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 记录类型
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    #[sea_orm(string_value = "draw")]
    Draw,
    #[sea_orm(string_value = "redeem")]
    Redeem,
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordType::Draw => write!(f, "draw"),
            RecordType::Redeem => write!(f, "redeem"),
        }
    }
}

/// 兑奖状态，数据库中存 0 / 1
///
/// 只存在 Unclaimed -> Claimed 一个方向的转换。
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[sea_orm(num_value = 0)]
    Unclaimed,
    #[sea_orm(num_value = 1)]
    Claimed,
}

/// 非法的状态转换
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid record status transition: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: RecordStatus,
    pub to: RecordStatus,
}

impl RecordStatus {
    /// 兑奖: 仅允许从 Unclaimed 出发
    pub fn claim(self) -> Result<RecordStatus, InvalidTransition> {
        match self {
            RecordStatus::Unclaimed => Ok(RecordStatus::Claimed),
            RecordStatus::Claimed => Err(InvalidTransition {
                from: self,
                to: RecordStatus::Claimed,
            }),
        }
    }

    /// 校验任意目标状态（后台修改记录时使用）。保持原状态视为合法。
    pub fn transition_to(self, to: RecordStatus) -> Result<RecordStatus, InvalidTransition> {
        if self == to {
            return Ok(to);
        }
        match to {
            RecordStatus::Claimed => self.claim(),
            RecordStatus::Unclaimed => Err(InvalidTransition { from: self, to }),
        }
    }

    /// 对外接口中使用的整数编码
    pub fn code(self) -> i32 {
        match self {
            RecordStatus::Unclaimed => 0,
            RecordStatus::Claimed => 1,
        }
    }

    pub fn from_code(code: i32) -> Option<RecordStatus> {
        match code {
            0 => Some(RecordStatus::Unclaimed),
            1 => Some(RecordStatus::Claimed),
            _ => None,
        }
    }
}

/// 中奖记录实体
/// 说明:
/// - (phone, vipcard) 唯一，一个会员身份只会产生一条记录
/// - prize_id 在奖品被删除后置空
/// - status 只能由兑奖流程从 Unclaimed 改为 Claimed
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 奖品ID (指向 prizes.id)
    pub prize_id: Option<i32>,
    pub phone: String,
    /// 年卡号
    pub vipcard: String,
    pub quantity: i32,
    pub record_type: RecordType,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::prizes::Entity",
        from = "Column::PrizeId",
        to = "super::prizes::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Prize,
}

impl Related<super::prizes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Prize.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
