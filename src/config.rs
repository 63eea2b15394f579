use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub concurrency_limit: usize,
    pub body_limit_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        // JWT_SECRET is required even though only auth reads it.
        jwt_secret()?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000);
        let max_connections = parse_or("MAX_CONNECTIONS", 10);
        let concurrency_limit = parse_or("CONCURRENCY_LIMIT", 100);
        let body_limit_bytes = parse_or("BODY_LIMIT_BYTES", 1024 * 1024);
        Ok(Self {
            port,
            database_url,
            host,
            max_connections,
            concurrency_limit,
            body_limit_bytes,
        })
    }
}

pub fn jwt_secret() -> anyhow::Result<String> {
    env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))
}

pub fn jwt_ttl_hours() -> i64 {
    parse_or("JWT_TTL_HOURS", 24)
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
