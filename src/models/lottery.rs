use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 抽奖请求 (JSON 或表单)
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct DrawRequest {
    /// 手机号
    #[serde(default)]
    pub phone: Option<String>,
    /// 年卡号
    #[serde(default)]
    pub vipcard: Option<String>,
}

/// 兑奖请求
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct RedeemRequest {
    /// 兑奖密码（旧版客户端字段名）
    #[serde(default)]
    pub parssword: Option<String>,
    /// 兑奖密码
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub vipcard: Option<String>,
}

impl RedeemRequest {
    /// 兑奖密码，两个字段同时出现时以 parssword 为准
    pub fn secret(&self) -> &str {
        self.parssword
            .as_deref()
            .or(self.password.as_deref())
            .unwrap_or_default()
    }
}

/// 抽奖结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOutcome {
    /// 本次抽中
    Won {
        prize_name: String,
        prize_image: Option<String>,
        record_id: i32,
        prize_id: i32,
        phone: String,
        card: String,
    },
    /// 已中奖，尚未兑奖
    AlreadyWonUnclaimed {
        prize_name: String,
        record_id: i32,
        prize_id: Option<i32>,
        won_at: DateTime<Utc>,
    },
    /// 已中奖且已兑奖
    AlreadyClaimed {
        prize_name: String,
        record_id: i32,
        claimed_at: DateTime<Utc>,
    },
    /// 参数缺失或会员校验未通过
    Rejected { reason: String },
    /// 无可用奖品
    SystemError,
}

impl DrawOutcome {
    /// 对外状态码: 1 中奖, 2 拒绝/异常, 3 已中奖待兑奖, 4 已兑奖
    pub fn status_code(&self) -> i32 {
        match self {
            DrawOutcome::Won { .. } => 1,
            DrawOutcome::Rejected { .. } | DrawOutcome::SystemError => 2,
            DrawOutcome::AlreadyWonUnclaimed { .. } => 3,
            DrawOutcome::AlreadyClaimed { .. } => 4,
        }
    }
}

pub const SYSTEM_BUSY_MESSAGE: &str = "抽奖系统异常，请稍后重试";
pub const SYSTEM_ERROR_MESSAGE: &str = "系统错误，请稍后重试";

fn local_time(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// 抽奖接口响应（兼容原 H5 客户端字段）
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DrawResponse {
    /// 1 中奖, 2 拒绝/异常, 3 已中奖待兑奖, 4 已兑奖
    pub status: i32,
    /// 奖品名称；status = 2 时为提示语
    pub prizename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prizeimg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardno: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lottery_id: Option<i32>,
}

impl DrawResponse {
    fn message(status: i32, text: impl Into<String>) -> Self {
        DrawResponse {
            status,
            prizename: text.into(),
            msg: None,
            prizeimg: None,
            cardno: None,
            phone: None,
            record_id: None,
            lottery_id: None,
        }
    }

    /// 未预期的故障
    pub fn system_error() -> Self {
        Self::message(2, SYSTEM_ERROR_MESSAGE)
    }
}

impl From<DrawOutcome> for DrawResponse {
    fn from(outcome: DrawOutcome) -> Self {
        let status = outcome.status_code();
        match outcome {
            DrawOutcome::Won {
                prize_name,
                prize_image,
                record_id,
                prize_id,
                phone,
                card,
            } => DrawResponse {
                status,
                prizename: prize_name,
                msg: None,
                prizeimg: Some(prize_image.unwrap_or_default()),
                cardno: Some(card),
                phone: Some(phone),
                record_id: Some(record_id),
                lottery_id: Some(prize_id),
            },
            DrawOutcome::AlreadyWonUnclaimed {
                prize_name,
                record_id,
                prize_id,
                won_at,
            } => DrawResponse {
                status,
                msg: Some(format!(
                    "亲~已经中奖!请兑奖~[{prize_name}]{}",
                    local_time(&won_at)
                )),
                prizename: prize_name,
                prizeimg: None,
                cardno: None,
                phone: None,
                record_id: Some(record_id),
                lottery_id: prize_id,
            },
            DrawOutcome::AlreadyClaimed {
                prize_name,
                record_id,
                claimed_at,
            } => DrawResponse {
                status,
                msg: Some(format!(
                    "亲~已经中奖!已兑奖~[{prize_name}]{}",
                    local_time(&claimed_at)
                )),
                prizename: prize_name,
                prizeimg: None,
                cardno: None,
                phone: None,
                record_id: Some(record_id),
                lottery_id: None,
            },
            DrawOutcome::Rejected { reason } => Self::message(status, reason),
            DrawOutcome::SystemError => Self::message(status, SYSTEM_BUSY_MESSAGE),
        }
    }
}

/// 兑奖结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeemOutcome {
    Success,
    Failure(String),
}

/// 兑奖接口响应: error = 0 表示成功
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RedeemResponse {
    pub error: i32,
    pub msg: String,
}

impl RedeemResponse {
    pub fn system_error() -> Self {
        RedeemResponse {
            error: 1,
            msg: SYSTEM_ERROR_MESSAGE.to_string(),
        }
    }
}

impl From<RedeemOutcome> for RedeemResponse {
    fn from(outcome: RedeemOutcome) -> Self {
        match outcome {
            RedeemOutcome::Success => RedeemResponse {
                error: 0,
                msg: "兑奖成功".to_string(),
            },
            RedeemOutcome::Failure(msg) => RedeemResponse { error: 1, msg },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_won_response_fields() {
        let resp = DrawResponse::from(DrawOutcome::Won {
            prize_name: "熊猫绘本".into(),
            prize_image: None,
            record_id: 7,
            prize_id: 2,
            phone: "555".into(),
            card: "A1".into(),
        });
        assert_eq!(resp.status, 1);
        assert_eq!(resp.prizename, "熊猫绘本");
        assert_eq!(resp.prizeimg.as_deref(), Some(""));
        assert_eq!(resp.record_id, Some(7));
        assert_eq!(resp.lottery_id, Some(2));
        assert_eq!(resp.cardno.as_deref(), Some("A1"));
    }

    #[test]
    fn test_repeat_responses_keep_prize_name() {
        let now = Utc::now();
        let unclaimed = DrawResponse::from(DrawOutcome::AlreadyWonUnclaimed {
            prize_name: "小本".into(),
            record_id: 1,
            prize_id: Some(3),
            won_at: now,
        });
        assert_eq!(unclaimed.status, 3);
        assert_eq!(unclaimed.prizename, "小本");
        assert!(unclaimed.msg.unwrap().contains("请兑奖~[小本]"));

        let claimed = DrawResponse::from(DrawOutcome::AlreadyClaimed {
            prize_name: "小本".into(),
            record_id: 1,
            claimed_at: now,
        });
        assert_eq!(claimed.status, 4);
        assert!(claimed.msg.unwrap().contains("已兑奖~[小本]"));
        assert_eq!(claimed.lottery_id, None);
    }

    #[test]
    fn test_rejections_use_status_two() {
        let resp = DrawResponse::from(DrawOutcome::Rejected {
            reason: "会员验证失败。".into(),
        });
        assert_eq!(resp.status, 2);
        assert_eq!(resp.prizename, "会员验证失败。");

        let resp = DrawResponse::from(DrawOutcome::SystemError);
        assert_eq!(resp.status, 2);
        assert_eq!(resp.prizename, SYSTEM_BUSY_MESSAGE);
    }

    #[test]
    fn test_redeem_request_accepts_legacy_field() {
        let req: RedeemRequest =
            serde_json::from_str(r#"{"parssword":"1234","phone":"555","vipcard":"A1"}"#).unwrap();
        assert_eq!(req.secret(), "1234");

        let req: RedeemRequest =
            serde_json::from_str(r#"{"password":"1234","phone":"555"}"#).unwrap();
        assert_eq!(req.secret(), "1234");
        assert_eq!(req.vipcard, None);

        let req: RedeemRequest = serde_json::from_str(r#"{"phone":"555"}"#).unwrap();
        assert_eq!(req.secret(), "");
    }

    #[test]
    fn test_redeem_request_with_both_password_fields() {
        let req: RedeemRequest = serde_json::from_str(
            r#"{"parssword":"8888","password":"0000","phone":"555","vipcard":"A1"}"#,
        )
        .unwrap();
        assert_eq!(req.secret(), "8888");
    }
}
