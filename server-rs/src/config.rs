use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub node_env: String,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub store_backend: StoreBackend,
    pub db: DbConfig,
    pub jwt: JwtConfig,
    pub auth: AuthConfig,
}

#[derive(Clone, Debug)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub pool_min: u32,
    pub pool_max: u32,
}

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub access_expiry_secs: i64,
    pub refresh_expiry_secs: i64,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub bcrypt_cost: u32,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

/// Which data-access implementation to hand to the handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
    /// Postgres when reachable, otherwise the in-memory store.
    Auto,
}

impl StoreBackend {
    fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Self::Postgres,
            "memory" | "mock" => Self::Memory,
            _ => Self::Auto,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env_or_parse("PORT", 3000),
            node_env: env_or("NODE_ENV", "development"),
            cors_origins: env_or("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            request_timeout_secs: env_or_parse("REQUEST_TIMEOUT_SECS", 30),
            store_backend: StoreBackend::parse(&env_or("STORE_BACKEND", "auto")),
            db: DbConfig {
                host: env_or("DB_HOST", "localhost"),
                port: env_or_parse("DB_PORT", 5432),
                database: env_or("DB_NAME", "esports_arena"),
                user: env_or("DB_USER", "postgres"),
                password: env_or("DB_PASSWORD", ""),
                pool_min: env_or_parse("DB_POOL_MIN", 1),
                pool_max: env_or_parse("DB_POOL_MAX", 10),
            },
            jwt: JwtConfig {
                secret: env_or("JWT_SECRET", "change-me-to-a-secure-random-string"),
                access_expiry_secs: parse_duration_to_secs(&env_or("JWT_ACCESS_EXPIRY", "1h")),
                refresh_expiry_secs: parse_duration_to_secs(&env_or("JWT_REFRESH_EXPIRY", "7d")),
            },
            auth: AuthConfig {
                bcrypt_cost: env_or_parse("BCRYPT_COST", 10),
                admin_email: env_opt("ADMIN_EMAIL"),
                admin_password: env_opt("ADMIN_PASSWORD"),
            },
        }
    }

    /// A configuration suitable for tests: in-memory store, cheap hashing.
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            node_env: "test".to_string(),
            cors_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
            store_backend: StoreBackend::Memory,
            db: DbConfig {
                host: "localhost".to_string(),
                port: 5432,
                database: "esports_arena_test".to_string(),
                user: "postgres".to_string(),
                password: String::new(),
                pool_min: 1,
                pool_max: 2,
            },
            jwt: JwtConfig {
                secret: "test-secret".to_string(),
                access_expiry_secs: 3600,
                refresh_expiry_secs: 7 * 86400,
            },
            auth: AuthConfig {
                bcrypt_cost: 4,
                admin_email: None,
                admin_password: None,
            },
        }
    }

    pub fn is_development(&self) -> bool {
        self.node_env == "development"
    }

    pub fn database_url(&self) -> String {
        if let Ok(url) = env::var("DATABASE_URL") {
            return url;
        }
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db.user, self.db.password, self.db.host, self.db.port, self.db.database
        )
    }
}

fn parse_duration_to_secs(s: &str) -> i64 {
    let s = s.trim();
    if s.is_empty() {
        return 3600;
    }
    let Some((split, unit)) = s.char_indices().last() else {
        return 3600;
    };
    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 86400,
        _ => return s.parse().unwrap_or(3600),
    };
    let num: i64 = s[..split].parse().unwrap_or(1);
    num.checked_mul(multiplier).unwrap_or(3600)
}
