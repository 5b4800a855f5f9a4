//! Application configuration, loaded once at startup and passed explicitly.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_APP_ID: &str = "kid-rewards-app-multifamily-v3";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Namespace under which every collection is stored
    pub app_id: String,
    pub database_url: String,
    pub bind_address: String,
    pub cors_origin: String,
    /// Accounts with these emails are system administrators
    pub admin_emails: Vec<String>,
    pub log_level: String,
    /// Built UI served for paths outside `/api`
    pub static_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_id: DEFAULT_APP_ID.to_string(),
            database_url: "sqlite:chores.db".to_string(),
            bind_address: "127.0.0.1:3000".to_string(),
            cors_origin: "http://localhost:8080".to_string(),
            admin_emails: Vec::new(),
            log_level: "info".to_string(),
            static_dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file, falling back to defaults when the
    /// file does not exist, then apply environment overrides.
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        debug!("Loading configuration from {:?}", config_path);

        let config = if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
            let config: AppConfig = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
            info!("Loaded configuration from {:?}", config_path);
            config
        } else {
            info!("No configuration file at {:?}, using defaults", config_path);
            Self::default()
        };

        Ok(config.with_overrides(|key| std::env::var(key).ok()).normalized())
    }

    /// Apply `CHORE_*` overrides looked up through `lookup`
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(app_id) = lookup("CHORE_APP_ID") {
            self.app_id = app_id;
        }
        if let Some(url) = lookup("CHORE_DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(address) = lookup("CHORE_BIND_ADDRESS") {
            self.bind_address = address;
        }
        if let Some(emails) = lookup("CHORE_ADMIN_EMAILS") {
            self.admin_emails = emails.split(',').map(str::to_string).collect();
        }
        self
    }

    /// Trim and lower-case the admin allow-list, dropping blanks
    pub fn normalized(mut self) -> Self {
        let mut emails: Vec<String> = self
            .admin_emails
            .iter()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        emails.sort();
        emails.dedup();
        self.admin_emails = emails;
        self
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|a| *a == email)
    }
}
