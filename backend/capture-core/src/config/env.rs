use super::SdkConfig;

use common::RedactedSecret;

use std::env;
use std::path::PathBuf;

use log::{debug, info, warn};

pub const CLIENT_ID_ENV: &str = "CAPTURE_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "CAPTURE_CLIENT_SECRET";
pub const CLIENT_DOMAIN_ENV: &str = "CAPTURE_CLIENT_DOMAIN";

/// Load `.env` from the current directory, then next to the executable.
pub(super) fn try_load_dotenv() -> Option<PathBuf> {
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded .env from: {:?}", path);
        return Some(path);
    }

    let exe_dir = env::current_exe().ok()?.parent()?.to_path_buf();
    let env_path = exe_dir.join(".env");
    if !env_path.exists() {
        return None;
    }

    match dotenvy::from_path(&env_path) {
        Ok(()) => {
            info!("Loaded .env from: {:?}", env_path);
            Some(env_path)
        }
        Err(e) => {
            warn!("Failed to parse .env at {:?}: {}", env_path, e);
            None
        }
    }
}

fn read_var(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        Ok(_) => None,
        Err(env::VarError::NotPresent) => None,
        Err(env::VarError::NotUnicode(_)) => {
            warn!("Env var {name} contains invalid unicode");
            None
        }
    }
}

pub(super) fn apply_overrides(config: &mut SdkConfig) {
    if let Some(id) = read_var(CLIENT_ID_ENV) {
        debug!("Client id taken from {CLIENT_ID_ENV}");
        config.client.id = Some(id);
    }
    if let Some(secret) = read_var(CLIENT_SECRET_ENV) {
        debug!("Client secret taken from {CLIENT_SECRET_ENV}");
        config.client.secret = Some(RedactedSecret::new(secret));
    }
    if let Some(domain) = read_var(CLIENT_DOMAIN_ENV) {
        debug!("Client domain taken from {CLIENT_DOMAIN_ENV}");
        config.client.domain = Some(domain);
    }
}
