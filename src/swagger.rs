use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::RecordType;
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::lottery::draw,
        handlers::lottery::exchange,
        handlers::auth::login,
        handlers::auth::verify,
        handlers::auth::change_password,
        handlers::auth::create_admin,
        handlers::prize::list_prizes,
        handlers::prize::create_prize,
        handlers::prize::update_prize,
        handlers::prize::delete_prize,
        handlers::record::list_records,
        handlers::record::update_record,
        handlers::record::delete_record,
        handlers::settings::get_redeem_password,
        handlers::settings::set_redeem_password,
        handlers::health::health,
    ),
    components(
        schemas(
            DrawRequest,
            DrawResponse,
            RedeemRequest,
            RedeemResponse,
            LoginRequest,
            LoginResponse,
            CreateAdminRequest,
            ChangePasswordRequest,
            AdminIdentity,
            PrizeResponse,
            CreatePrizeRequest,
            UpdatePrizeRequest,
            RecordResponse,
            RecordQuery,
            UpdateRecordRequest,
            RecordType,
            RedeemPasswordRequest,
            RedeemPasswordResponse,
            SettingUpdatedResponse,
            HealthResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "lottery", description = "会员抽奖与兑奖"),
        (name = "auth", description = "管理员认证"),
        (name = "prizes", description = "奖品管理"),
        (name = "records", description = "中奖记录管理"),
        (name = "settings", description = "系统设置"),
        (name = "health", description = "健康检查"),
    ),
    info(
        title = "Zooluck Lottery API",
        version = "1.0.0",
        description = "动物园年卡会员抽奖与兑奖 REST API"
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
