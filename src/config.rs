// timegate-service/src/config.rs
use log::{info, warn};
use std::env;
use std::path::PathBuf;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:9090";
const DEFAULT_JWT_SECRET: &str = "timegate_development_secret";
const DEFAULT_DIRECTORY_PATH: &str = "./storage/directory.json";
// IST, +05:30
const DEFAULT_DISPLAY_OFFSET_MINUTES: i32 = 330;

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: String,
    pub jwt_secret: String,
    pub directory_path: PathBuf,
    pub display_offset_minutes: i32,
    pub cors_allowed_origin: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            directory_path: PathBuf::from(DEFAULT_DIRECTORY_PATH),
            display_offset_minutes: DEFAULT_DISPLAY_OFFSET_MINUTES,
            cors_allowed_origin: None,
        }
    }
}

impl Config {
    // Load from the environment, reading .env first if present
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let defaults = Config::default();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using the development secret");
            defaults.jwt_secret.clone()
        });

        let display_offset_minutes = match env::var("DISPLAY_UTC_OFFSET_MINUTES") {
            Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
                warn!("Invalid DISPLAY_UTC_OFFSET_MINUTES '{}': {}, using default", raw, e);
                defaults.display_offset_minutes
            }),
            Err(_) => defaults.display_offset_minutes,
        };

        let config = Config {
            bind_address: get_env_or("BIND_ADDRESS", &defaults.bind_address),
            jwt_secret,
            directory_path: PathBuf::from(get_env_or("DIRECTORY_PATH", DEFAULT_DIRECTORY_PATH)),
            display_offset_minutes,
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN").ok().filter(|o| !o.trim().is_empty()),
        };

        info!(
            "Loaded config: bind={}, directory={}, display offset={}min",
            config.bind_address,
            config.directory_path.display(),
            config.display_offset_minutes
        );
        config
    }
}

fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("{} not set, using default: {}", key, default);
        default.to_string()
    })
}
