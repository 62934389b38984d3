use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub log_json: bool,
    pub upload_limit_mb: usize,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub cloudinary: Option<CloudinaryConfig>,
    pub azure_speech: Option<AzureSpeechConfig>,
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Clone)]
pub struct AzureSpeechConfig {
    pub key: String,
    pub region: String,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let cloudinary = match (
            get_optional("CLOUDINARY_CLOUD_NAME"),
            get_optional("CLOUDINARY_API_KEY"),
            get_optional("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => None,
        };

        let azure_speech = match (
            get_optional("AZURE_SPEECH_KEY"),
            get_optional("AZURE_SPEECH_REGION"),
        ) {
            (Some(key), Some(region)) => Some(AzureSpeechConfig { key, region }),
            _ => None,
        };

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            redis_url: get_env("REDIS_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            jwt_ttl_hours: get_env_parse_or("JWT_TTL_HOURS", 24)?,
            log_json: get_optional("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            upload_limit_mb: get_env_parse_or("UPLOAD_LIMIT_MB", 50)?,
            gemini_api_key: get_optional("GEMINI_API_KEY"),
            gemini_model: get_optional("GEMINI_MODEL")
                .unwrap_or_else(|| "gemini-2.0-flash".to_string()),
            cloudinary,
            azure_speech,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_optional(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
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
