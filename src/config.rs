// ABOUTME: Environment-driven configuration for the server, database, tokens and uploads
// ABOUTME: Missing variables fall back to development defaults with a logged warning

use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expires_hours: i64,
    pub upload_dir: String,
    pub max_file_size: usize,
    pub max_files_per_registration: usize,
    pub allowed_file_types: Vec<String>,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("PORT", "3000"),
            database_url: try_load("DATABASE_URL", "sqlite:edecomer.db?mode=rwc"),
            jwt_secret: load_secret("JWT_SECRET"),
            jwt_expires_hours: try_load("JWT_EXPIRES_HOURS", "168"),
            upload_dir: try_load("UPLOAD_DIR", "uploads"),
            max_file_size: try_load("MAX_FILE_SIZE", "5242880"),
            max_files_per_registration: try_load("MAX_FILES_PER_REGISTRATION", "5"),
            allowed_file_types: try_load::<String>(
                "ALLOWED_FILE_TYPES",
                "image/jpeg,image/png,image/gif",
            )
            .split(',')
            .map(|t| t.trim().to_string())
            .collect(),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn load_secret(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        warn!("{key} not set, falling back to an insecure development secret");
        "edecomer_dev_secret_change_in_production".to_string()
    })
}
