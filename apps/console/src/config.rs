use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use client_core::TransportConfig;
use serde::Deserialize;
use url::Url;

const CONFIG_FILE: &str = "console.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_base_url: String,
    pub token: Option<String>,
    pub request_timeout_seconds: u64,
    pub notice_duration_ms: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "https://nshopping.runasp.net/api".into(),
            token: None,
            request_timeout_seconds: 30,
            notice_duration_ms: 3000,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn transport_config(&self) -> anyhow::Result<TransportConfig> {
        let base_url = Url::parse(self.api_base_url.trim())
            .with_context(|| format!("invalid api base url '{}'", self.api_base_url))?;
        Ok(TransportConfig {
            base_url,
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
        })
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_duration_ms)
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(Path::new(CONFIG_FILE)) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        return;
    };
    if let Some(v) = file_cfg.get("api_base_url") {
        settings.api_base_url = v.clone();
    }
    if let Some(v) = file_cfg.get("token") {
        settings.token = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("request_timeout_seconds") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_seconds = parsed;
        }
    }
    if let Some(v) = file_cfg.get("notice_duration_ms") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.notice_duration_ms = parsed;
        }
    }
    if let Some(v) = file_cfg.get("log_filter") {
        settings.log_filter = v.clone();
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("ADMIN_API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = var("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = var("ADMIN_TOKEN") {
        settings.token = Some(v);
    }
    if let Some(v) = var("APP__TOKEN") {
        settings.token = Some(v);
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_seconds = parsed;
        }
    }
    if let Some(v) = var("APP__NOTICE_DURATION_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.notice_duration_ms = parsed;
        }
    }
    if let Some(v) = var("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}
