use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_ENDPOINT_PREFIX: &str = "/api/public";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// API host, e.g. `https://shop.example.com`.
    pub host: String,
    pub endpoint_prefix: String,
    /// Pre-built site configuration JSON, tried before the API.
    pub prefetched_config: Option<String>,
    /// Where durable and session stores live. `~` is expanded.
    pub storage_dir: Option<String>,
    pub csrf_token: Option<String>,
    /// Emit a timing line for every finished call.
    pub console_logging: bool,
    /// Log requests and responses at debug level.
    pub console_debug: bool,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let blueprint_path = match std::env::var("CARGO_MANIFEST_DIR") {
            Ok(manifest_dir) => {
                let mut path = PathBuf::from(manifest_dir);
                path.push("shopfront.toml");
                path
            }
            // Release builds: look for the blueprint next to the working directory.
            Err(_) => PathBuf::from("shopfront.toml"),
        };

        let user_config_path = get_user_config_path();

        if let Some(user_config_path) = &user_config_path {
            if !user_config_path.exists() {
                if let Ok(blueprint_content) = fs::read_to_string(&blueprint_path) {
                    if let Some(parent) = user_config_path.parent() {
                        fs::create_dir_all(parent).map_err(|e| ConfigError::Foreign(Box::new(e)))?;
                    }
                    fs::write(user_config_path, blueprint_content)
                        .map_err(|e| ConfigError::Foreign(Box::new(e)))?;
                }
            }
        }

        let mut builder = Config::builder()
            .set_default("host", "http://localhost:8000")?
            .set_default("endpoint_prefix", DEFAULT_ENDPOINT_PREFIX)?
            .set_default("console_logging", false)?
            .set_default("console_debug", true)?
            // 1. Project defaults from the blueprint.
            .add_source(File::from(blueprint_path).required(false));
        // 2. User's global config.
        if let Some(user_config_path) = user_config_path {
            builder = builder.add_source(File::from(user_config_path).required(false));
        }
        let s = builder
            // 3. Local override from the working directory.
            .add_source(File::with_name("shopfront.toml").required(false))
            // 4. SHOPFRONT_HOST and friends.
            .add_source(Environment::with_prefix("SHOPFRONT"))
            .build()?;

        s.try_deserialize()
    }

    /// Defaults pointed at `host`, no files involved.
    pub fn with_host(host: &str) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            endpoint_prefix: DEFAULT_ENDPOINT_PREFIX.to_string(),
            prefetched_config: None,
            storage_dir: None,
            csrf_token: None,
            console_logging: false,
            console_debug: false,
        }
    }

    /// `{host}{prefix}{uri}`
    pub fn api_url(&self, uri: &str) -> String {
        format!("{}{}{}", self.host, self.endpoint_prefix, uri)
    }

    pub fn storage_path(&self) -> PathBuf {
        match &self.storage_dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).into_owned()),
            None => dirs::data_dir()
                .map(|d| d.join("shopfront"))
                .unwrap_or_else(|| PathBuf::from(".shopfront")),
        }
    }

    pub fn prefetched_config_path(&self) -> Option<PathBuf> {
        self.prefetched_config
            .as_ref()
            .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()))
    }
}

pub fn get_user_config_path() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".config");
    path.push("shopfront");
    path.push("shopfront.toml");
    Some(path)
}

/// Writes one key into the user's config file, keeping everything else.
pub fn save_setting(key: &str, value: toml::Value) -> Result<(), anyhow::Error> {
    let user_config_path =
        get_user_config_path().ok_or_else(|| anyhow::anyhow!("no home directory to store settings in"))?;

    let config_str = fs::read_to_string(&user_config_path).unwrap_or_else(|_| "".to_string());
    let mut doc = config_str.parse::<toml::Table>()?;

    doc.insert(key.to_string(), value);

    if let Some(parent) = user_config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&user_config_path, doc.to_string())?;

    Ok(())
}
