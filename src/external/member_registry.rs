use crate::config::MemberRegistryConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 会员身份校验结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    /// 有效会员
    Active,
    /// 接口正常返回，但不是有效会员
    NotMember,
}

/// 会员身份校验能力，抽奖流程通过它确认 (手机号, 年卡号) 是否为有效会员。
///
/// 传输失败、超时或响应无法识别时返回 `Err`。
#[async_trait]
pub trait IdentityOracle: Send + Sync {
    async fn verify(&self, phone: &str, card: &str) -> AppResult<MemberStatus>;
}

/// 请求外层签名信封
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a> {
    /// JSON 编码后的 {cardNo, mobile}
    content: String,
    merchant_no: &'a str,
    merextend: &'a str,
    method: &'a str,
    sign: &'a str,
    sign_type: &'a str,
    version: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CardQuery<'a> {
    card_no: &'a str,
    mobile: &'a str,
}

#[derive(Debug, Deserialize)]
struct RegistryResponse {
    #[serde(rename = "Code")]
    code: serde_json::Value,
    #[serde(rename = "Content", default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardInfo {
    sub_code: serde_json::Value,
}

/// 兼容字符串 "200" 与数字 200
fn code_eq(value: &serde_json::Value, expected: &str) -> bool {
    match value {
        serde_json::Value::String(s) => s == expected,
        serde_json::Value::Number(n) => n.to_string() == expected,
        _ => false,
    }
}

/// 解析会员系统响应体
pub fn parse_registry_response(body: &str) -> AppResult<MemberStatus> {
    let resp: RegistryResponse = serde_json::from_str(body)?;

    if !code_eq(&resp.code, "200") {
        return Err(AppError::ExternalApiError(format!(
            "会员系统返回异常状态码: {}",
            resp.code
        )));
    }

    let content = resp
        .content
        .ok_or_else(|| AppError::ExternalApiError("会员系统响应缺少 Content".to_string()))?;
    let info: CardInfo = serde_json::from_str(&content)?;

    if code_eq(&info.sub_code, "1") {
        Ok(MemberStatus::Active)
    } else {
        Ok(MemberStatus::NotMember)
    }
}

/// 会员系统 HTTP 客户端
#[derive(Clone)]
pub struct MemberRegistryClient {
    http: Client,
    cfg: MemberRegistryConfig,
}

impl MemberRegistryClient {
    pub fn new(cfg: MemberRegistryConfig) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent("zooluck-backend/member-registry")
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self { http, cfg })
    }

    fn envelope(&self, phone: &str, card: &str) -> AppResult<Envelope<'_>> {
        let content = serde_json::to_string(&CardQuery {
            card_no: card.trim(),
            mobile: phone.trim(),
        })?;
        Ok(Envelope {
            content,
            merchant_no: &self.cfg.merchant_no,
            merextend: "",
            method: &self.cfg.method,
            sign: &self.cfg.sign,
            sign_type: &self.cfg.sign_type,
            version: &self.cfg.version,
        })
    }
}

#[async_trait]
impl IdentityOracle for MemberRegistryClient {
    async fn verify(&self, phone: &str, card: &str) -> AppResult<MemberStatus> {
        let envelope = self.envelope(phone, card)?;

        let resp = self.http.post(&self.cfg.url).json(&envelope).send().await?;

        let status = resp.status();
        let body = resp.text().await?;
        log::debug!("Member registry response: HTTP {} {}", status.as_u16(), body);

        if !status.is_success() {
            return Err(AppError::ExternalApiError(format!(
                "会员系统请求失败: HTTP {}",
                status.as_u16()
            )));
        }

        parse_registry_response(&body)
    }
}
