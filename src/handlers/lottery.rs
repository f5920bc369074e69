use actix_web::error::InternalError;
use actix_web::{HttpRequest, HttpResponse, Result, web};
use crate::models::*;
use crate::services::{LotteryService, MSG_MISSING_IDENTITY, MSG_MISSING_PARAMS};
use std::fmt::{Debug, Display};

fn into_inner<T>(body: web::Either<web::Json<T>, web::Form<T>>) -> T {
    match body {
        web::Either::Left(json) => json.into_inner(),
        web::Either::Right(form) => form.into_inner(),
    }
}

#[utoipa::path(
    post,
    path = "/api/lottery/draw",
    tag = "lottery",
    request_body = DrawRequest,
    responses(
        (status = 200, description = "抽奖结果 (status: 1 中奖, 2 拒绝, 3 已中奖待兑奖, 4 已兑奖)", body = DrawResponse),
        (status = 500, description = "系统错误", body = DrawResponse)
    )
)]
/// 会员抽奖，每个 (手机号, 年卡号) 只有一次机会
pub async fn draw(
    service: web::Data<LotteryService>,
    body: web::Either<web::Json<DrawRequest>, web::Form<DrawRequest>>,
) -> Result<HttpResponse> {
    let req = into_inner(body);
    let phone = req.phone.unwrap_or_default();
    let card = req.vipcard.unwrap_or_default();

    match service.draw(&phone, &card).await {
        Ok(outcome) => Ok(HttpResponse::Ok().json(DrawResponse::from(outcome))),
        Err(e) => {
            log::error!("Draw failed: {e}");
            Ok(HttpResponse::InternalServerError().json(DrawResponse::system_error()))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/lottery/exchange",
    tag = "lottery",
    request_body = RedeemRequest,
    responses(
        (status = 200, description = "兑奖结果 (error: 0 成功, 1 失败)", body = RedeemResponse),
        (status = 500, description = "系统错误", body = RedeemResponse)
    )
)]
/// 现场工作人员输入兑奖密码完成兑奖
pub async fn exchange(
    service: web::Data<LotteryService>,
    body: web::Either<web::Json<RedeemRequest>, web::Form<RedeemRequest>>,
) -> Result<HttpResponse> {
    let req = into_inner(body);
    let password = req.secret().to_string();
    let phone = req.phone.unwrap_or_default();
    let card = req.vipcard.unwrap_or_default();

    match service.redeem(&password, &phone, &card).await {
        Ok(outcome) => Ok(HttpResponse::Ok().json(RedeemResponse::from(outcome))),
        Err(e) => {
            log::error!("Redeem failed: {e}");
            Ok(HttpResponse::InternalServerError().json(RedeemResponse::system_error()))
        }
    }
}

/// 请求体无法解析时按旧接口格式返回参数缺失
fn legacy_body_error<E>(err: E, response: HttpResponse) -> actix_web::Error
where
    E: Debug + Display + 'static,
{
    log::info!("Malformed lottery request body: {err}");
    InternalError::from_response(err, response).into()
}

fn draw_body_rejected() -> HttpResponse {
    HttpResponse::Ok().json(DrawResponse::from(DrawOutcome::Rejected {
        reason: MSG_MISSING_IDENTITY.to_string(),
    }))
}

fn exchange_body_rejected() -> HttpResponse {
    HttpResponse::Ok().json(RedeemResponse::from(RedeemOutcome::Failure(
        MSG_MISSING_PARAMS.to_string(),
    )))
}

pub fn lottery_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/lottery")
            .service(
                web::resource("/draw")
                    .app_data(web::JsonConfig::default().error_handler(
                        |err, _req: &HttpRequest| legacy_body_error(err, draw_body_rejected()),
                    ))
                    .app_data(web::FormConfig::default().error_handler(
                        |err, _req: &HttpRequest| legacy_body_error(err, draw_body_rejected()),
                    ))
                    .route(web::post().to(draw)),
            )
            .service(
                web::resource("/exchange")
                    .app_data(web::JsonConfig::default().error_handler(
                        |err, _req: &HttpRequest| legacy_body_error(err, exchange_body_rejected()),
                    ))
                    .app_data(web::FormConfig::default().error_handler(
                        |err, _req: &HttpRequest| legacy_body_error(err, exchange_body_rejected()),
                    ))
                    .route(web::post().to(exchange)),
            ),
    );
}
