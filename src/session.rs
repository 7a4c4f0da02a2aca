//! Language preference, quick contacts and the site configuration.
//!
//! Everything here used to be read straight out of browser storage at the
//! call site. [`Session`] owns it instead: build it once at startup, call
//! [`Session::load_config`], and hand it to whatever needs the language or
//! the configuration.

use std::fmt;
use std::fs;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ApiClient;
use crate::error::{ApiError, ErrorKind};
use crate::storage::{CONFIG_KEY, LANGUAGE_KEY, QUICK_CONTACTS_KEY, Storage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ita,
    Eng,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Ita => "ita",
            Language::Eng => "eng",
        }
    }

    /// Value for `<html lang>` and the `language` meta tag.
    pub fn html_lang(&self) -> &'static str {
        match self {
            Language::Ita => "it",
            Language::Eng => "en",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Language::Ita => Language::Eng,
            Language::Eng => Language::Ita,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ita" => Ok(Language::Ita),
            "eng" => Ok(Language::Eng),
            other => Err(format!("unknown language '{other}', expected ita or eng")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Localized {
    pub ita: String,
    pub eng: String,
}

impl Localized {
    pub fn get(&self, lang: Language) -> &str {
        match lang {
            Language::Ita => &self.ita,
            Language::Eng => &self.eng,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pagination {
    pub home_product_page_pagination: Option<u32>,
    pub product_page_pagination: Option<u32>,
    pub show_page_old_pagination: Option<u32>,
    pub search_product_pagination: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteSettings {
    pub website_maintenance: Option<bool>,
    pub show_home_banner: Option<bool>,
    pub enable_show_banner: Option<bool>,
    pub banner_img: String,
    pub show_page_img: Option<String>,
    pub show_home_title: Option<bool>,
    pub show_home_show_section: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Titles {
    pub home_title_text: Localized,
    pub faq_page_title: Localized,
    pub show_page_title: Localized,
    pub contact_page_title: Localized,
    pub search_page_title: Localized,
    pub footer_title: Localized,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Texts {
    pub home_page_description_text: Localized,
    pub contact_page_text: Localized,
    pub home_page_shows_text: Localized,
    pub shows_page_text: Localized,
    pub show_old_page_text: Localized,
    pub show_next_page_text: Localized,
    pub footer_text: Localized,
}

/// Site-wide configuration served by `/config/read`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub pagination: Pagination,
    pub settings: SiteSettings,
    pub titles: Titles,
    pub text: Texts,
}

impl SiteConfig {
    pub fn in_maintenance(&self) -> bool {
        self.settings.website_maintenance == Some(true)
    }
}

/// Result of [`Session::load_config`]. `Maintenance` switches the whole app
/// to the maintenance display; `Error` is an ordinary failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLoad {
    Success,
    Maintenance,
    Error,
}

impl fmt::Display for ConfigLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfigLoad::Success => "success",
            ConfigLoad::Maintenance => "maintenance",
            ConfigLoad::Error => "error",
        };
        f.write_str(s)
    }
}

impl From<&ApiError> for ConfigLoad {
    fn from(error: &ApiError) -> Self {
        match error.kind() {
            ErrorKind::Maintenance => ConfigLoad::Maintenance,
            _ => ConfigLoad::Error,
        }
    }
}

pub const CONFIG_URI: &str = "/config/read";

pub struct Session {
    storage: Storage,
    language: Language,
    quick_contacts: Vec<Value>,
    config: SiteConfig,
}

impl Session {
    pub fn new(storage: Storage) -> Self {
        let language = storage
            .local
            .get(LANGUAGE_KEY)
            .and_then(|l| l.parse().ok())
            .unwrap_or_default();
        let quick_contacts = read_quick_contacts(&storage);
        Self { storage, language, quick_contacts, config: SiteConfig::default() }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Stores the current language so it survives restarts.
    pub fn persist_language(&self) {
        self.storage.local.set(LANGUAGE_KEY, self.language.code());
    }

    /// Switches ita <-> eng and persists the choice.
    pub fn change_language(&mut self) -> Language {
        self.language = self.language.toggled();
        self.persist_language();
        tracing::debug!(language = %self.language, "language changed");
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        self.persist_language();
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Session cache, then the prefetched file, then the API.
    pub async fn load_config(&mut self, api: &ApiClient) -> ConfigLoad {
        let outcome = self.load_config_sources(api).await;
        if outcome == ConfigLoad::Success && self.config.in_maintenance() {
            tracing::warn!("site configuration reports maintenance mode");
            return ConfigLoad::Maintenance;
        }
        outcome
    }

    /// Drops the cached configuration and loads it again.
    pub async fn reload_config(&mut self, api: &ApiClient) -> ConfigLoad {
        self.storage.session.remove(CONFIG_KEY);
        self.load_config(api).await
    }

    async fn load_config_sources(&mut self, api: &ApiClient) -> ConfigLoad {
        if let Some(config) = self
            .storage
            .session
            .get(CONFIG_KEY)
            .and_then(|raw| serde_json::from_str::<SiteConfig>(&raw).ok())
        {
            tracing::debug!("config loaded from session cache");
            self.config = config;
            return ConfigLoad::Success;
        }

        if let Some(path) = api.settings().prefetched_config_path() {
            match fs::read_to_string(&path).map(|raw| serde_json::from_str::<SiteConfig>(&raw)) {
                Ok(Ok(config)) => {
                    tracing::debug!(path = %path.display(), "config loaded from file");
                    self.config = config;
                    return ConfigLoad::Success;
                }
                Ok(Err(e)) => tracing::debug!(path = %path.display(), error = %e, "prefetched config unreadable"),
                Err(e) => tracing::debug!(path = %path.display(), error = %e, "no prefetched config"),
            }
        }

        match fetch_config(api).await {
            Ok((config, raw)) => {
                tracing::debug!("config loaded from API");
                self.storage.session.set(CONFIG_KEY, &raw);
                self.config = config;
                ConfigLoad::Success
            }
            Err(e) => ConfigLoad::from(&e),
        }
    }

    pub fn quick_contacts(&self) -> &[Value] {
        &self.quick_contacts
    }

    pub fn quick_contacts_mut(&mut self) -> &mut Vec<Value> {
        &mut self.quick_contacts
    }

    pub fn save_session_data(&self) {
        let json = Value::Array(self.quick_contacts.clone()).to_string();
        self.storage.session.set(QUICK_CONTACTS_KEY, &json);
    }

    pub fn load_session_data(&mut self) {
        self.quick_contacts = read_quick_contacts(&self.storage);
    }
}

/// GETs the configuration, returning it decoded and as the raw JSON to cache.
/// A 503 or a body-less answer means the site is in maintenance.
pub async fn fetch_config(api: &ApiClient) -> Result<(SiteConfig, String), ApiError> {
    let response = api.get(CONFIG_URI).await.inspect_err(|e| match e {
        ApiError::Canceled => tracing::debug!("config request superseded"),
        e => tracing::error!(error = %e, "config request failed"),
    })?;

    if response.status == 503 {
        tracing::error!("API in maintenance mode");
        return Err(ApiError::Maintenance);
    }
    if !(200..300).contains(&response.status) {
        tracing::error!(status = response.status, text = %response.status_text, "config request failed");
        return Err(ApiError::Server { status: response.status, text: response.status_text });
    }
    match response.body {
        None | Some(Value::Null) => {
            tracing::error!("config endpoint returned no body");
            Err(ApiError::Maintenance)
        }
        Some(body) => {
            let raw = body.to_string();
            let config = serde_json::from_value::<SiteConfig>(body).map_err(|source| {
                tracing::error!(error = %source, "config payload does not decode");
                ApiError::Decode { what: "site configuration", source }
            })?;
            Ok((config, raw))
        }
    }
}

fn default_quick_contacts() -> Vec<Value> {
    (0..4).map(|_| Value::Object(Default::default())).collect()
}

fn read_quick_contacts(storage: &Storage) -> Vec<Value> {
    storage
        .session
        .get(QUICK_CONTACTS_KEY)
        .and_then(|raw| serde_json::from_str::<Vec<Value>>(&raw).ok())
        .unwrap_or_else(default_quick_contacts)
}
