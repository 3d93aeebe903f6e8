/// Configuration management for Blog Service
///
/// This module handles loading and managing configuration from environment variables.
/// `.env` files are loaded by the binary before [`Config::from_env`] runs.
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Page cache configuration
    pub cache: CacheConfig,
    /// Session / login configuration
    pub auth: AuthConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// Where posts, groups, comments and follows are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
    /// Connections kept open while idle
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

/// Where rendered index pages are cached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    Memory,
}

/// Page cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Redis URL
    pub url: String,
    /// Lifetime of a cached index page
    pub index_ttl_secs: u64,
}

/// Session token and login redirect configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret used to verify session tokens
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    /// Cookie carrying the session token
    pub session_cookie: String,
    /// Anonymous callers of protected views are sent here with `?next=`
    pub login_url: String,
}

pub const DEFAULT_INDEX_TTL_SECS: u64 = 20;
pub const DEFAULT_LOGIN_URL: &str = "/auth/login/";
pub const DEFAULT_SESSION_COOKIE: &str = "sessionid";
const DEVELOPMENT_JWT_SECRET: &str = "yatube-development-secret";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_env = lookup("APP_ENV").unwrap_or_else(|| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        Ok(Config {
            app: AppConfig {
                host: lookup("BLOG_SERVICE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or_default(&lookup, "BLOG_SERVICE_PORT", 8000)?,
                env: app_env.clone(),
            },
            database: DatabaseConfig {
                backend: match lookup("BLOG_STORAGE").as_deref().map(str::trim) {
                    None | Some("") | Some("postgres") => StorageBackend::Postgres,
                    Some("memory") => StorageBackend::Memory,
                    Some(other) => {
                        return Err(format!(
                            "BLOG_STORAGE must be 'postgres' or 'memory', got '{}'",
                            other
                        ))
                    }
                },
                url: lookup("DATABASE_URL")
                    .unwrap_or_else(|| "postgres://localhost/yatube".to_string()),
                max_connections: parse_or_default(&lookup, "DB_MAX_CONNECTIONS", 10)?,
                min_connections: parse_or_default(&lookup, "DB_MIN_CONNECTIONS", 2)?,
                acquire_timeout_secs: parse_or_default(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 10)?,
            },
            cache: CacheConfig {
                backend: match lookup("PAGE_CACHE_BACKEND").as_deref().map(str::trim) {
                    None | Some("") | Some("redis") => CacheBackend::Redis,
                    Some("memory") => CacheBackend::Memory,
                    Some(other) => {
                        return Err(format!(
                            "PAGE_CACHE_BACKEND must be 'redis' or 'memory', got '{}'",
                            other
                        ))
                    }
                },
                url: lookup("REDIS_URL").unwrap_or_else(|| "redis://localhost:6379".to_string()),
                index_ttl_secs: parse_or_default(
                    &lookup,
                    "INDEX_CACHE_TTL_SECS",
                    DEFAULT_INDEX_TTL_SECS,
                )?,
            },
            auth: AuthConfig {
                jwt_secret: match lookup("JWT_SECRET") {
                    Some(secret) if !secret.trim().is_empty() => secret,
                    _ if production => {
                        return Err("JWT_SECRET must be set in production".to_string())
                    }
                    _ => DEVELOPMENT_JWT_SECRET.to_string(),
                },
                session_cookie: lookup("SESSION_COOKIE_NAME")
                    .unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string()),
                login_url: lookup("LOGIN_URL").unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string()),
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env.eq_ignore_ascii_case("production")
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, String>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        None => Ok(default),
    }
}
