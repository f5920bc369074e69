use actix_web::{HttpResponse, Result, ResponseError, web};
use crate::models::*;
use crate::services::RecordService;

#[utoipa::path(
    get,
    path = "/api/records",
    tag = "records",
    params(
        ("page" = Option<u32>, Query, description = "页码 (默认 1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认 20)")
    ),
    responses(
        (status = 200, description = "中奖记录（最新在前）")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_records(
    service: web::Data<RecordService>,
    query: web::Query<RecordQuery>,
) -> Result<HttpResponse> {
    match service.list(query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/records/{id}",
    tag = "records",
    params(("id" = i32, Path, description = "记录ID")),
    request_body = UpdateRecordRequest,
    responses(
        (status = 200, description = "记录更新成功", body = RecordResponse),
        (status = 400, description = "参数错误或非法的状态变更"),
        (status = 404, description = "记录不存在")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_record(
    service: web::Data<RecordService>,
    path: web::Path<i32>,
    request: web::Json<UpdateRecordRequest>,
) -> Result<HttpResponse> {
    match service.update(path.into_inner(), request.into_inner()).await {
        Ok(record) => Ok(HttpResponse::Ok().json(ApiResponse::success(record))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/records/{id}",
    tag = "records",
    params(("id" = i32, Path, description = "记录ID")),
    responses(
        (status = 200, description = "记录已删除"),
        (status = 404, description = "记录不存在")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_record(
    service: web::Data<RecordService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match service.delete(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::message("记录删除成功"))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn record_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/records")
            .route("", web::get().to(list_records))
            .route("/{id}", web::put().to(update_record))
            .route("/{id}", web::delete().to(delete_record)),
    );
}
