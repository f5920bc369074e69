use actix_web::{HttpRequest, HttpResponse, Result, ResponseError, web};
use crate::error::AppError;
use crate::middlewares::current_claims;
use crate::models::*;
use crate::services::AuthService;
use crate::utils::Claims;

fn require_admin(req: &HttpRequest) -> Result<(i32, Claims), AppError> {
    let claims =
        current_claims(req).ok_or_else(|| AppError::AuthError("缺少访问令牌".to_string()))?;
    let id = claims
        .admin_id()
        .ok_or_else(|| AppError::AuthError("token无效或已过期".to_string()))?;
    Ok((id, claims))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "登录成功", body = LoginResponse),
        (status = 400, description = "请求参数错误"),
        (status = 401, description = "用户名或密码错误")
    )
)]
pub async fn login(
    auth_service: web::Data<AuthService>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    match auth_service.login(&request.username, &request.password).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/verify",
    tag = "auth",
    responses(
        (status = 200, description = "token 有效", body = AdminIdentity),
        (status = 401, description = "token无效或已过期")
    ),
    security(("bearer_auth" = []))
)]
pub async fn verify(req: HttpRequest) -> Result<HttpResponse> {
    match require_admin(&req) {
        Ok((id, claims)) => Ok(HttpResponse::Ok().json(ApiResponse::success(AdminIdentity {
            id,
            username: claims.username,
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    tag = "auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "密码修改成功"),
        (status = 400, description = "请求参数错误"),
        (status = 401, description = "当前密码错误")
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    auth_service: web::Data<AuthService>,
    req: HttpRequest,
    request: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse> {
    let (admin_id, _) = match require_admin(&req) {
        Ok(v) => v,
        Err(e) => return Ok(e.error_response()),
    };

    match auth_service
        .change_password(admin_id, &request.current_password, &request.new_password)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::message("密码修改成功"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/create",
    tag = "auth",
    request_body = CreateAdminRequest,
    responses(
        (status = 200, description = "管理员创建成功", body = AdminIdentity),
        (status = 400, description = "请求参数错误"),
        (status = 409, description = "用户名已存在")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_admin(
    auth_service: web::Data<AuthService>,
    request: web::Json<CreateAdminRequest>,
) -> Result<HttpResponse> {
    match auth_service
        .create_admin(&request.username, &request.password)
        .await
    {
        Ok(admin) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            admin,
            "管理员创建成功",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/login", web::post().to(login))
            .route("/verify", web::get().to(verify))
            .route("/change-password", web::post().to(change_password))
            .route("/create", web::post().to(create_admin)),
    );
}
