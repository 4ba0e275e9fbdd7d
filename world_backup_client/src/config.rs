/**
 * World Backup Client Configuration
 *
 * Settings are taken, highest first, from command line flags, the JSON
 * config file, the environment (password only) and finally interactive
 * prompts for whatever is still missing.
 */
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::client::Credentials;
use crate::prompt::Prompter;

/// Backup written by a scan and read by a restore
pub const DEFAULT_BACKUP_FILE: &str = "backup.txt";

/// Plain-text trail of attempted mutations
pub const DEFAULT_ACTIVITY_LOG: &str = "log.txt";

/// Snapshot used by the offline world adapter
pub const DEFAULT_WORLD_FILE: &str = "world.json";

/// Name the session appears under in the world
pub const DEFAULT_BOT_NAME: &str = "Portal Mage";

pub const PASSWORD_ENV: &str = "WORLD_BACKUP_PASSWORD";
pub const CONFIG_ENV: &str = "WORLD_BACKUP_CONFIG";

/// Retrieve the account password from the environment
pub fn get_password() -> Option<String> {
    std::env::var(PASSWORD_ENV).ok().filter(|p| !p.is_empty())
}

/// Config file named by the environment, if any
pub fn get_config_path() -> Option<PathBuf> {
    std::env::var_os(CONFIG_ENV).map(PathBuf::from)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("prompt failed: {0}")]
    Prompt(#[from] std::io::Error),
    #[error("invalid citizen number {0:?}")]
    InvalidCitizen(String),
    #[error("unknown mode {mode:?}, expected one of: {known}")]
    UnknownMode { mode: String, known: String },
}

/// Contents of the optional JSON config file
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub citizen: Option<u32>,
    pub password: Option<String>,
    pub world: Option<String>,
    pub bot_name: Option<String>,
    pub backup_file: Option<PathBuf>,
    pub activity_log: Option<PathBuf>,
    pub world_file: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        serde_json::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }
}

/// Settings given on the command line
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub citizen: Option<u32>,
    pub world: Option<String>,
    pub backup_file: Option<PathBuf>,
    pub activity_log: Option<PathBuf>,
    pub no_activity_log: bool,
    pub world_file: Option<PathBuf>,
}

/// Fully resolved run settings
#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub credentials: Credentials,
    pub world: String,
    pub backup_file: PathBuf,
    pub activity_log: Option<PathBuf>,
    pub world_file: PathBuf,
}

impl BackupConfig {
    pub fn resolve(
        overrides: Overrides,
        file: FileConfig,
        env_password: Option<String>,
        prompter: &mut impl Prompter,
    ) -> Result<Self, ConfigError> {
        let citizen = match overrides.citizen.or(file.citizen) {
            Some(c) => c,
            None => {
                let answer = prompter.ask("Citizen Number: ")?;
                answer.parse().map_err(|_| ConfigError::InvalidCitizen(answer))?
            }
        };
        let password = match file.password.or(env_password) {
            Some(p) => p,
            None => prompter.ask_hidden("Password: ")?,
        };
        let world = match overrides.world.or(file.world) {
            Some(w) => w,
            None => prompter.ask("World: ")?,
        };
        let activity_log = if overrides.no_activity_log {
            None
        } else {
            Some(overrides.activity_log.or(file.activity_log).unwrap_or_else(|| DEFAULT_ACTIVITY_LOG.into()))
        };

        Ok(Self {
            credentials: Credentials {
                citizen,
                password,
                name: file.bot_name.unwrap_or_else(|| DEFAULT_BOT_NAME.to_string()),
            },
            world,
            backup_file: overrides.backup_file.or(file.backup_file).unwrap_or_else(|| DEFAULT_BACKUP_FILE.into()),
            activity_log,
            world_file: overrides.world_file.or(file.world_file).unwrap_or_else(|| DEFAULT_WORLD_FILE.into()),
        })
    }
}
