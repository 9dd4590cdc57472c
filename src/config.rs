// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Number of questions drawn when a start request does not say.
pub const DEFAULT_QUESTION_COUNT: u32 = 20;

/// Session time limit (seconds) when a start request does not say.
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 1800;

/// How many sessions `recentSessions` shows in the stats view.
pub const RECENT_SESSIONS_LIMIT: usize = 5;

/// Topic analysis keeps at most this many strong and weak topics.
pub const TOPIC_SLICE: usize = 3;
pub const STRONG_TOPIC_ACCURACY: f64 = 70.0;
pub const WEAK_TOPIC_ACCURACY: f64 = 60.0;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. `None` runs the service on in-memory storage.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub rust_log: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(5000);

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Self {
            database_url,
            jwt_secret,
            rust_log,
            port,
            cors_origins,
        }
    }
}
