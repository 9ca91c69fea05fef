use std::path::PathBuf;

pub const DEFAULT_API_BASE: &str = "https://engine.prod.bria-api.com/v1";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub default_api_key: Option<String>,
    pub api_base: String,
    pub static_dir: PathBuf,
    pub session_ttl_secs: i64,
    pub keep_uploads: bool,
    pub max_upload_mb: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: parse_env("PORT", 5000),
            default_api_key: std::env::var("BRIA_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            api_base: env_or("BRIA_API_BASE", DEFAULT_API_BASE)
                .trim_end_matches('/')
                .to_owned(),
            static_dir: PathBuf::from(env_or("STATIC_DIR", "static")),
            session_ttl_secs: parse_env("SESSION_TTL_SECS", 86_400),
            keep_uploads: std::env::var("KEEP_UPLOADS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            max_upload_mb: parse_env("MAX_UPLOAD_MB", 25),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            default_api_key: None,
            api_base: DEFAULT_API_BASE.to_owned(),
            static_dir: PathBuf::from("static"),
            session_ttl_secs: 86_400,
            keep_uploads: false,
            max_upload_mb: 25,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
