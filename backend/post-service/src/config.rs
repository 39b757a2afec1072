/// Configuration management for Post Service
///
/// Loaded from environment variables (a `.env` file is honoured through
/// `dotenvy` in `main`). Production refuses weak secrets and open CORS.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MIN_PRODUCTION_SECRET_BYTES: usize = 32;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub store: StoreBackend,
    pub security: SecurityConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Where posts and comments are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("Unknown STORE_BACKEND '{}'", other)),
        }
    }
}

/// Secrets for the auth and CSRF gates
#[derive(Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub csrf_secret: String,
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("csrf_secret", &"[REDACTED]")
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let app = AppConfig {
            env: app_env,
            host: std::env::var("POST_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("POST_SERVICE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8082),
            workers: std::env::var("POST_SERVICE_WORKERS")
                .ok()
                .and_then(|w| w.parse().ok())
                .filter(|w| *w > 0)
                .unwrap_or(4),
        };

        let cors = {
            let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                Ok(value) => value,
                Err(_) if production => {
                    return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                }
                Err(_) => "http://localhost:3000".to_string(),
            };

            if production && allowed_origins.trim() == "*" {
                return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
            }

            CorsConfig { allowed_origins }
        };

        let store = match std::env::var("STORE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => StoreBackend::Postgres,
        };
        if production && store == StoreBackend::Memory {
            return Err("STORE_BACKEND=memory is not allowed in production".to_string());
        }

        let security = SecurityConfig {
            jwt_secret: require_secret("JWT_SECRET", production)?,
            csrf_secret: require_secret("CSRF_SECRET", production)?,
        };

        Ok(Config {
            app,
            cors,
            store,
            security,
        })
    }
}

fn require_secret(key: &str, production: bool) -> Result<String, String> {
    let value = std::env::var(key).map_err(|_| format!("{} must be set", key))?;
    if value.trim().is_empty() {
        return Err(format!("{} must not be empty", key));
    }
    if production && value.len() < MIN_PRODUCTION_SECRET_BYTES {
        return Err(format!(
            "{} must be at least {} bytes in production",
            key, MIN_PRODUCTION_SECRET_BYTES
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: &[&str] = &[
        "APP_ENV",
        "POST_SERVICE_HOST",
        "POST_SERVICE_PORT",
        "POST_SERVICE_WORKERS",
        "CORS_ALLOWED_ORIGINS",
        "STORE_BACKEND",
        "JWT_SECRET",
        "CSRF_SECRET",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn set_secrets(value: &str) {
        env::set_var("JWT_SECRET", value);
        env::set_var("CSRF_SECRET", value);
    }

    #[test]
    #[serial]
    fn test_development_defaults() {
        clear_env();
        set_secrets("dev-secret");

        let config = Config::from_env().unwrap();
        assert_eq!(config.app.port, 8082);
        assert_eq!(config.app.workers, 4);
        assert_eq!(config.cors.allowed_origins, "http://localhost:3000");
        assert_eq!(config.store, StoreBackend::Postgres);
        assert!(!config.app.is_production());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_secrets_are_required() {
        clear_env();
        env::set_var("JWT_SECRET", "only-jwt");

        let err = Config::from_env().unwrap_err();
        assert!(err.contains("CSRF_SECRET"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_production_rejects_short_secrets_and_open_cors() {
        clear_env();
        env::set_var("APP_ENV", "production");
        env::set_var("CORS_ALLOWED_ORIGINS", "https://app.example.com");
        set_secrets("short");
        assert!(Config::from_env().unwrap_err().contains("at least 32 bytes"));

        set_secrets(&"s".repeat(32));
        env::set_var("CORS_ALLOWED_ORIGINS", "*");
        assert!(Config::from_env().is_err());

        env::set_var("CORS_ALLOWED_ORIGINS", "https://app.example.com");
        env::set_var("STORE_BACKEND", "memory");
        assert!(Config::from_env().is_err());

        env::set_var("STORE_BACKEND", "postgres");
        assert!(Config::from_env().unwrap().app.is_production());

        clear_env();
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("Memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert_eq!("postgresql".parse::<StoreBackend>(), Ok(StoreBackend::Postgres));
        assert!("mongo".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_security_config_debug_redacts() {
        let security = SecurityConfig {
            jwt_secret: "jwt-value".into(),
            csrf_secret: "csrf-value".into(),
        };
        let printed = format!("{:?}", security);
        assert!(!printed.contains("jwt-value"));
        assert!(!printed.contains("csrf-value"));
    }
}
