use actix_web::{HttpResponse, Result, ResponseError, web};
use crate::models::*;
use crate::services::SettingsService;

#[utoipa::path(
    get,
    path = "/api/settings/redeem-password",
    tag = "settings",
    responses(
        (status = 200, description = "当前兑奖密码", body = RedeemPasswordResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_redeem_password(service: web::Data<SettingsService>) -> Result<HttpResponse> {
    match service.get_redeem_password().await {
        Ok(resp) => Ok(HttpResponse::Ok().json(ApiResponse::success(resp))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/settings/redeem-password",
    tag = "settings",
    request_body = RedeemPasswordRequest,
    responses(
        (status = 200, description = "兑奖密码设置成功", body = SettingUpdatedResponse),
        (status = 400, description = "密码长度不能少于4位")
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_redeem_password(
    service: web::Data<SettingsService>,
    request: web::Json<RedeemPasswordRequest>,
) -> Result<HttpResponse> {
    match service.set_redeem_password(&request.redeem_password).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(ApiResponse::success(resp))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn settings_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/settings")
            .route("/redeem-password", web::get().to(get_redeem_password))
            .route("/redeem-password", web::put().to(set_redeem_password)),
    );
}
