use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;
use session::controller::DEFAULT_BATCH_CAP;
use tracing::warn;

pub const CONFIG_FILE: &str = "review.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub dataset_path: PathBuf,
    pub batch_cap: usize,
    pub page_title: String,
    pub image_width: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8501".into(),
            database_url: "sqlite://./ratings.db".into(),
            dataset_path: PathBuf::from("data.csv"),
            batch_cap: DEFAULT_BATCH_CAP,
            page_title: "SEO Content Review".into(),
            image_width: 300,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    database_url: Option<String>,
    dataset_path: Option<PathBuf>,
    batch_cap: Option<usize>,
    page_title: Option<String>,
    image_width: Option<u32>,
}

pub fn load_settings() -> Settings {
    let raw = fs::read_to_string(CONFIG_FILE).ok();
    resolve_settings(raw.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then `review.toml` contents, then environment variables.
pub fn resolve_settings(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file_contents {
        match toml::from_str::<FileSettings>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.bind_addr {
                    settings.server_bind = v;
                }
                if let Some(v) = file_cfg.database_url {
                    settings.database_url = v;
                }
                if let Some(v) = file_cfg.dataset_path {
                    settings.dataset_path = v;
                }
                if let Some(v) = file_cfg.batch_cap.filter(|cap| *cap > 0) {
                    settings.batch_cap = v;
                }
                if let Some(v) = file_cfg.page_title {
                    settings.page_title = v;
                }
                if let Some(v) = file_cfg.image_width {
                    settings.image_width = v;
                }
            }
            Err(error) => warn!(%error, file = CONFIG_FILE, "ignoring unreadable config file"),
        }
    }

    if let Some(v) = env("REVIEW_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("DATASET_PATH") {
        settings.dataset_path = PathBuf::from(v);
    }
    if let Some(v) = env("APP__DATASET_PATH") {
        settings.dataset_path = PathBuf::from(v);
    }

    if let Some(v) = env("APP__BATCH_CAP") {
        if let Ok(parsed) = v.parse::<usize>() {
            if parsed > 0 {
                settings.batch_cap = parsed;
            }
        }
    }

    if let Some(v) = env("APP__PAGE_TITLE") {
        settings.page_title = v;
    }

    if let Some(v) = env("APP__IMAGE_WIDTH") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.image_width = parsed;
        }
    }

    settings
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
