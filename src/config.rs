use crate::catalog::{CatalogCache, DEFAULT_HEADER_LABEL};
use crate::policy::{
    AccessMode, AccessPolicy, QuotaSettings, StaticCredentials, DEFAULT_INITIAL_LIMIT,
    DEFAULT_REWARD_LIMIT,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "karaoke-search";
const DOTFILE: &str = ".karaoke-search.toml";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub access: AccessConfig,

    /// User id → password table for the credentials and quota modes.
    #[serde(default)]
    pub users: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: PathBuf,
    pub header_label: String,
    pub preview_limit: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data.xlsx"),
            header_label: DEFAULT_HEADER_LABEL.to_string(),
            preview_limit: 50,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub mode: AccessMode,
    pub password: Option<String>,
    pub embed_key: Option<String>,
    pub signup_url: Option<String>,
    pub initial_limit: u32,
    pub reward_limit: u32,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            mode: AccessMode::default(),
            password: None,
            embed_key: None,
            signup_url: None,
            initial_limit: DEFAULT_INITIAL_LIMIT,
            reward_limit: DEFAULT_REWARD_LIMIT,
        }
    }
}

impl Config {
    /// Load from `explicit` if given, otherwise from the first config file
    /// found in the usual places, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_config_path(),
        };

        match path {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn find_config_path() -> Option<PathBuf> {
        if let Some(xdg_config) = dirs::config_dir() {
            let xdg_path = xdg_config.join(APP_DIR).join("config.toml");
            if xdg_path.exists() {
                return Some(xdg_path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let home_path = home.join(DOTFILE);
            if home_path.exists() {
                return Some(home_path);
            }
        }

        let current_path = Path::new(DOTFILE);
        if current_path.exists() {
            return Some(current_path.to_path_buf());
        }

        None
    }

    pub fn quota(&self) -> QuotaSettings {
        QuotaSettings {
            initial_limit: self.access.initial_limit,
            reward_limit: self.access.reward_limit,
        }
    }

    /// Build the access policy described by this configuration.
    pub fn access_policy(&self) -> AccessPolicy {
        let mut policy = AccessPolicy::new(self.access.mode).with_quota(self.quota());

        if let Some(users) = &self.users {
            let store: StaticCredentials = users
                .iter()
                .map(|(id, secret)| (id.clone(), secret.clone()))
                .collect();
            policy = policy.with_credentials(store);
        }
        if let Some(password) = &self.access.password {
            policy = policy.with_shared_password(password.clone());
        }
        if let Some(key) = &self.access.embed_key {
            policy = policy.with_embed_key(key.clone());
        }
        policy
    }

    pub fn catalog_cache(&self) -> CatalogCache {
        CatalogCache::new(self.catalog.path.clone(), self.catalog.header_label.clone())
    }
}
