use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/board.json";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

const ENV_BACKEND: &str = "BOARD_BACKEND";
const ENV_DATABASE_PATH: &str = "BOARD_DATABASE_PATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Range-query capable SQLite store.
    #[default]
    Sqlite,
    /// Flat JSON file, filtered client side.
    JsonFile,
    /// Flat in-process map, filtered client side. Nothing survives exit.
    Memory,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "json_file" | "json-file" | "json" => Ok(Self::JsonFile),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown backend `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendKind,
    pub database_path: PathBuf,
    pub kv_path: PathBuf,
    pub refresh_interval_secs: u64,
    pub default_location: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            database_path: PathBuf::from("data/board.db"),
            kv_path: PathBuf::from("data/board_kv.json"),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            default_location: None,
        }
    }
}

impl AppConfig {
    /// Applies `BOARD_BACKEND` and `BOARD_DATABASE_PATH` when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_BACKEND).ok(),
            std::env::var(ENV_DATABASE_PATH).ok(),
        );
    }

    fn apply_overrides(&mut self, backend: Option<String>, database_path: Option<String>) {
        if let Some(raw) = backend {
            match raw.parse() {
                Ok(kind) => self.backend = kind,
                Err(err) => log::warn!("Ignoring {ENV_BACKEND}: {err}"),
            }
        }
        if let Some(path) = database_path.filter(|path| !path.trim().is_empty()) {
            self.database_path = PathBuf::from(path);
        }
    }

    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

pub fn save_config(path: &str, config: &AppConfig) -> std::io::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)
}
