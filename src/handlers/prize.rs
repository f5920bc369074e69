use actix_web::{HttpResponse, Result, ResponseError, web};
use crate::models::*;
use crate::services::PrizeService;

#[utoipa::path(
    get,
    path = "/api/prizes",
    tag = "prizes",
    responses(
        (status = 200, description = "奖品列表", body = [PrizeResponse])
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_prizes(service: web::Data<PrizeService>) -> Result<HttpResponse> {
    match service.list().await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/prizes",
    tag = "prizes",
    request_body = CreatePrizeRequest,
    responses(
        (status = 201, description = "奖品创建成功", body = PrizeResponse),
        (status = 400, description = "请求参数错误")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_prize(
    service: web::Data<PrizeService>,
    request: web::Json<CreatePrizeRequest>,
) -> Result<HttpResponse> {
    match service.create(request.into_inner()).await {
        Ok(prize) => Ok(HttpResponse::Created().json(ApiResponse::success(prize))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/prizes/{id}",
    tag = "prizes",
    params(("id" = i32, Path, description = "奖品ID")),
    request_body = UpdatePrizeRequest,
    responses(
        (status = 200, description = "奖品更新成功", body = PrizeResponse),
        (status = 400, description = "没有需要更新的字段"),
        (status = 404, description = "奖品不存在")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_prize(
    service: web::Data<PrizeService>,
    path: web::Path<i32>,
    request: web::Json<UpdatePrizeRequest>,
) -> Result<HttpResponse> {
    match service.update(path.into_inner(), request.into_inner()).await {
        Ok(prize) => Ok(HttpResponse::Ok().json(ApiResponse::success(prize))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/prizes/{id}",
    tag = "prizes",
    params(("id" = i32, Path, description = "奖品ID")),
    responses(
        (status = 200, description = "奖品已删除", body = PrizeResponse),
        (status = 404, description = "奖品不存在")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_prize(
    service: web::Data<PrizeService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match service.delete(path.into_inner()).await {
        Ok(prize) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            prize,
            "奖品删除成功",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn prize_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/prizes")
            .route("", web::get().to(list_prizes))
            .route("", web::post().to(create_prize))
            .route("/{id}", web::put().to(update_prize))
            .route("/{id}", web::delete().to(delete_prize)),
    );
}
