use actix_web::{App, HttpServer, middleware::Logger, web};
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use chrono::Local;  // timestamp in log lines
use std::sync::Arc;
use std::time::Duration;

use zooluck_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{IdentityOracle, MemberRegistryClient},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    // 会员系统
    let member_registry = MemberRegistryClient::new(config.member_registry.clone())
        .expect("Failed to create member registry client");
    let oracle: Arc<dyn IdentityOracle> = Arc::new(member_registry);

    // 创建服务
    let auth_service = AuthService::new(pool.clone(), jwt_service.clone());
    if let Err(e) = auth_service.ensure_initial_admin(&config.admin).await {
        log::error!("Failed to create initial admin: {e}");
    }

    let lottery_service = LotteryService::new(pool.clone(), oracle)
        .with_decrement_on_draw(config.lottery.decrement_on_draw)
        .with_oracle_timeout(Duration::from_secs(config.member_registry.timeout_secs));
    let prize_service = PrizeService::new(pool.clone());
    let record_service = RecordService::new(pool.clone());
    let settings_service = SettingsService::new(pool.clone());

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(lottery_service.clone()))
            .app_data(web::Data::new(prize_service.clone()))
            .app_data(web::Data::new(record_service.clone()))
            .app_data(web::Data::new(settings_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api")
                    .configure(handlers::lottery_config)
                    .configure(handlers::auth_config)
                    .configure(handlers::prize_config)
                    .configure(handlers::record_config)
                    .configure(handlers::settings_config)
                    .configure(handlers::health_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
