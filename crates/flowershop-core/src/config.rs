use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing is decoupled from the process environment so tests can drive it
/// with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("FLOWERSHOP_ENV", "development"))?;

    let bind_addr = parse_addr("FLOWERSHOP_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("FLOWERSHOP_LOG_LEVEL", "info");
    let catalog_path = PathBuf::from(or_default(
        "FLOWERSHOP_CATALOG_PATH",
        "./config/catalog.yaml",
    ));

    let public_base_url = or_default("FLOWERSHOP_PUBLIC_BASE_URL", "http://127.0.0.1:3000")
        .trim_end_matches('/')
        .to_string();
    if !(public_base_url.starts_with("http://") || public_base_url.starts_with("https://")) {
        return Err(invalid(
            "FLOWERSHOP_PUBLIC_BASE_URL",
            format!("expected an http(s) URL, got '{public_base_url}'"),
        ));
    }

    let media_root = PathBuf::from(or_default("FLOWERSHOP_MEDIA_ROOT", "./media"));
    let media_url = normalize_media_url(&or_default("FLOWERSHOP_MEDIA_URL", "/media/"));
    let max_upload_bytes = parse_usize("FLOWERSHOP_MAX_UPLOAD_BYTES", "10485760")?;

    let bot_secret = lookup("FLOWERSHOP_BOT_SECRET")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let cart_ttl_days = parse_u32("FLOWERSHOP_CART_TTL_DAYS", "30")?;
    if cart_ttl_days == 0 {
        return Err(invalid(
            "FLOWERSHOP_CART_TTL_DAYS",
            "must be at least 1".to_string(),
        ));
    }

    let db_max_connections = parse_u32("FLOWERSHOP_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("FLOWERSHOP_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("FLOWERSHOP_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        catalog_path,
        public_base_url,
        media_root,
        media_url,
        max_upload_bytes,
        bot_secret,
        cart_ttl_days,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FLOWERSHOP_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

/// Ensure the media prefix starts and ends with a single `/`.
fn normalize_media_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
