//! Runtime configuration.
//!
//! Layers, lowest to highest precedence: built-in defaults, an optional TOML
//! file, then `CLINIC_*` environment variables (a `.env` file is read first).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::client::ClinicSettings;
use crate::error::AppError;

const ENV_CONFIG: &str = "CLINIC_CONFIG";
const ENV_BIND_ADDR: &str = "CLINIC_BIND_ADDR";
const ENV_DATA_DIR: &str = "CLINIC_DATA_DIR";
const ENV_DEFAULT_NAME: &str = "CLINIC_DEFAULT_NAME";
const ENV_DEFAULT_ADDRESS: &str = "CLINIC_DEFAULT_ADDRESS";
const ENV_DEFAULT_PHONE: &str = "CLINIC_DEFAULT_PHONE";
const ENV_DEFAULT_EMAIL: &str = "CLINIC_DEFAULT_EMAIL";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const CONFIG_FILE_NAME: &str = "clinic.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    /// Values a settings client shows for keys the store does not hold.
    pub defaults: ClinicSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    bind_addr: Option<String>,
    data_dir: Option<PathBuf>,
    defaults: Option<FileDefaults>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileDefaults {
    name: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    email: Option<String>,
}

/// `<platform data dir>/clinic-desk`, or `./clinic-desk` when the platform has none.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clinic-desk")
}

/// Load configuration from the process environment.
pub fn load() -> Result<AppConfig, AppError> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!("Ignoring unreadable .env file: {}", e);
        }
    }
    load_from(|name| std::env::var(name).ok())
}

/// Load configuration with `env` standing in for the process environment.
pub fn load_from(env: impl Fn(&str) -> Option<String>) -> Result<AppConfig, AppError> {
    let env_data_dir = env(ENV_DATA_DIR).map(PathBuf::from);

    let file_path = match env(ENV_CONFIG) {
        Some(path) => Some(PathBuf::from(path)),
        None => {
            let candidate = env_data_dir
                .clone()
                .unwrap_or_else(default_data_dir)
                .join(CONFIG_FILE_NAME);
            candidate.exists().then_some(candidate)
        }
    };

    let file = match file_path {
        Some(path) => read_file(&path)?,
        None => FileConfig::default(),
    };

    let bind_addr = env(ENV_BIND_ADDR)
        .or(file.bind_addr)
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    let bind_addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| AppError::Config(format!("invalid bind address {bind_addr:?}: {e}")))?;

    let data_dir = env_data_dir
        .or(file.data_dir)
        .unwrap_or_else(default_data_dir);

    let mut defaults = ClinicSettings::default();
    if let Some(d) = file.defaults {
        apply(&mut defaults.name, d.name);
        apply(&mut defaults.address, d.address);
        apply(&mut defaults.phone, d.phone);
        apply(&mut defaults.email, d.email);
    }
    apply(&mut defaults.name, env(ENV_DEFAULT_NAME));
    apply(&mut defaults.address, env(ENV_DEFAULT_ADDRESS));
    apply(&mut defaults.phone, env(ENV_DEFAULT_PHONE));
    apply(&mut defaults.email, env(ENV_DEFAULT_EMAIL));

    Ok(AppConfig {
        bind_addr,
        data_dir,
        defaults,
    })
}

fn read_file(path: &Path) -> Result<FileConfig, AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    toml::from_str(&text)
        .map_err(|e| AppError::Config(format!("cannot parse {}: {e}", path.display())))
}

fn apply(slot: &mut String, value: Option<String>) {
    if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
        *slot = v;
    }
}
