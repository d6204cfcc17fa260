use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub storage_dir: String,
    pub api_rps: u32,
    pub max_upload_mb: usize,
    pub zoom: ZoomConfig,
}

#[derive(Debug, Clone)]
pub struct ZoomConfig {
    pub account_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub webhook_secret: Option<String>,
    pub api_base: String,
    pub oauth_url: String,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            storage_dir: env::var("STORAGE_DIR").unwrap_or_else(|_| "./storage".to_string()),
            api_rps: get_env_parse_or("API_RPS", 50)?,
            max_upload_mb: get_env_parse_or("MAX_UPLOAD_MB", 50)?,
            zoom: ZoomConfig {
                account_id: get_env("ZOOM_ACCOUNT_ID")?,
                client_id: get_env("ZOOM_CLIENT_ID")?,
                client_secret: get_env("ZOOM_CLIENT_SECRET")?,
                webhook_secret: env::var("ZOOM_WEBHOOK_SECRET").ok(),
                api_base: env::var("ZOOM_API_BASE")
                    .unwrap_or_else(|_| "https://api.zoom.us/v2".to_string()),
                oauth_url: env::var("ZOOM_OAUTH_URL")
                    .unwrap_or_else(|_| "https://zoom.us/oauth/token".to_string()),
            },
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
