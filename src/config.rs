use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub member_registry: MemberRegistryConfig,
    #[serde(default)]
    pub lottery: LotteryConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

/// 会员系统（身份校验）接口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRegistryConfig {
    pub url: String,
    pub merchant_no: String,
    #[serde(default = "default_registry_method")]
    pub method: String,
    pub sign: String,
    #[serde(default = "default_sign_type")]
    pub sign_type: String,
    #[serde(default = "default_registry_version")]
    pub version: String,
    #[serde(default = "default_registry_timeout")]
    pub timeout_secs: u64,
}

fn default_registry_method() -> String {
    "scenic.checkcardinfo".to_string()
}

fn default_sign_type() -> String {
    "MD5".to_string()
}

fn default_registry_version() -> String {
    "1.0".to_string()
}

fn default_registry_timeout() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LotteryConfig {
    /// 抽中后是否扣减奖品数量。默认不扣减：quantity 代表奖池权重而非实时库存
    #[serde(default)]
    pub decrement_on_draw: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub initial_username: String,
    /// 为空时不自动创建管理员
    #[serde(default)]
    pub initial_password: String,
}

fn default_admin_username() -> String {
    "admin".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            initial_username: default_admin_username(),
            initial_password: String::new(),
        }
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                // 有配置文件：先解析再用环境变量覆盖
                toml::from_str(&config_str).map_err(|e| format!("解析配置文件失败: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_env()?,
            Err(e) => {
                return Err(format!("无法读取配置文件 {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// 无配置文件：使用环境变量与默认值构建
    fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // 无配置文件时数据库 URL 使用本地 SQLite
        let database_url = get_env("DATABASE_URL")
            .unwrap_or_else(|| "sqlite://data/zooluck.db?mode=rwc".to_string());

        let member_registry_url = get_env("MEMBER_REGISTRY_URL")
            .ok_or("缺少 MEMBER_REGISTRY_URL 环境变量，且未找到配置文件 config.toml")?;

        Ok(Config {
            server: ServerConfig {
                host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get_env_parse("SERVER_PORT", 3001u16),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET").unwrap_or_else(|| "change-me-in-production".to_string()),
                access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 86_400i64),
            },
            member_registry: MemberRegistryConfig {
                url: member_registry_url,
                merchant_no: get_env("MEMBER_REGISTRY_MERCHANT_NO").unwrap_or_default(),
                method: get_env("MEMBER_REGISTRY_METHOD").unwrap_or_else(default_registry_method),
                sign: get_env("MEMBER_REGISTRY_SIGN").unwrap_or_default(),
                sign_type: get_env("MEMBER_REGISTRY_SIGN_TYPE").unwrap_or_else(default_sign_type),
                version: get_env("MEMBER_REGISTRY_VERSION")
                    .unwrap_or_else(default_registry_version),
                timeout_secs: get_env_parse("MEMBER_REGISTRY_TIMEOUT_SECS", default_registry_timeout()),
            },
            lottery: LotteryConfig {
                decrement_on_draw: get_env_parse("LOTTERY_DECREMENT_ON_DRAW", false),
            },
            admin: AdminConfig {
                initial_username: get_env("ADMIN_INITIAL_USERNAME")
                    .unwrap_or_else(default_admin_username),
                initial_password: get_env("ADMIN_INITIAL_PASSWORD").unwrap_or_default(),
            },
        })
    }

    /// 环境变量覆盖（即便文件存在时也覆盖）
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }

        // 会员系统
        if let Ok(v) = env::var("MEMBER_REGISTRY_URL") {
            self.member_registry.url = v;
        }
        if let Ok(v) = env::var("MEMBER_REGISTRY_MERCHANT_NO") {
            self.member_registry.merchant_no = v;
        }
        if let Ok(v) = env::var("MEMBER_REGISTRY_METHOD") {
            self.member_registry.method = v;
        }
        if let Ok(v) = env::var("MEMBER_REGISTRY_SIGN") {
            self.member_registry.sign = v;
        }
        if let Ok(v) = env::var("MEMBER_REGISTRY_SIGN_TYPE") {
            self.member_registry.sign_type = v;
        }
        if let Ok(v) = env::var("MEMBER_REGISTRY_VERSION") {
            self.member_registry.version = v;
        }
        if let Ok(v) = env::var("MEMBER_REGISTRY_TIMEOUT_SECS")
            && let Ok(n) = v.parse()
        {
            self.member_registry.timeout_secs = n;
        }

        if let Ok(v) = env::var("LOTTERY_DECREMENT_ON_DRAW")
            && let Ok(b) = v.parse()
        {
            self.lottery.decrement_on_draw = b;
        }

        if let Ok(v) = env::var("ADMIN_INITIAL_USERNAME") {
            self.admin.initial_username = v;
        }
        if let Ok(v) = env::var("ADMIN_INITIAL_PASSWORD") {
            self.admin.initial_password = v;
        }
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
