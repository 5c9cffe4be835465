//! Application configuration loaded from the environment.

use std::path::PathBuf;

use anyhow::Result;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub jwt_secret: String,
    /// Access token lifetime in minutes.
    pub token_ttl_minutes: i64,
    /// bcrypt cost factor for newly stored credentials.
    pub bcrypt_cost: u32,
    /// Login attempts allowed per IP within the rate window.
    pub login_rate_limit: u32,
    pub login_rate_window_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);

        let database_path = resolve_data_path(std::env::var("DATABASE_PATH").ok(), "innkeep.db");

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            "dev-secret-change-in-production-minimum-32-characters".to_string()
        });

        let token_ttl_minutes = std::env::var("TOKEN_TTL_MINUTES")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        let bcrypt_cost = std::env::var("BCRYPT_COST")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&c| (4..=16).contains(&c))
            .unwrap_or(bcrypt::DEFAULT_COST);

        let login_rate_limit = std::env::var("LOGIN_RATE_LIMIT")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        let login_rate_window_secs = std::env::var("LOGIN_RATE_WINDOW_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .unwrap_or(60);

        Ok(Self {
            port,
            database_path,
            jwt_secret,
            token_ttl_minutes,
            bcrypt_cost,
            login_rate_limit,
            login_rate_window_secs,
        })
    }
}

/// Resolve a data file path from an optional env value.
///
/// Relative paths are anchored to the crate directory, not the caller's cwd,
/// so running from elsewhere doesn't create a second empty database.
pub fn resolve_data_path(env_value: Option<String>, default_filename: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let Some(raw) = env_value.filter(|v| !v.trim().is_empty()) else {
        return base.join(default_filename).to_string_lossy().to_string();
    };

    let p = PathBuf::from(raw);
    if p.is_absolute() {
        return p.to_string_lossy().to_string();
    }

    base.join(p).to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_data_path_defaults_to_crate_dir() {
        let resolved = resolve_data_path(None, "innkeep.db");
        assert!(resolved.ends_with("innkeep.db"));
        assert!(PathBuf::from(&resolved).is_absolute());
    }

    #[test]
    fn test_resolve_data_path_keeps_absolute() {
        let resolved = resolve_data_path(Some("/tmp/custom.db".to_string()), "innkeep.db");
        assert_eq!(resolved, "/tmp/custom.db");
    }

    #[test]
    fn test_resolve_data_path_ignores_blank() {
        let resolved = resolve_data_path(Some("   ".to_string()), "innkeep.db");
        assert!(resolved.ends_with("innkeep.db"));
    }
}
