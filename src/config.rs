//! Application-level configuration loading, including the PUG thresholds.

use std::{env, fs, io::ErrorKind, path::PathBuf, sync::Arc, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::react::UserId;

/// Default location on disk where the bot looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/pugbot.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PUGBOT_CONFIG_PATH";
/// Environment variable holding the bot owner's user id.
const OWNER_ID_ENV: &str = "PUGBOT_OWNER_ID";
/// Environment variable holding the shared secret for the control plane.
const CONTROL_TOKEN_ENV: &str = "PUGBOT_CONTROL_TOKEN";

/// Thresholds and timings that drive the PUG phases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PugSettings {
    /// Hosts required before sign-ups close.
    pub min_hosts: usize,
    /// Captains required before sign-ups close.
    pub min_captains: usize,
    /// Players (captains included) required before sign-ups close.
    pub min_players: usize,
    /// Ballots each active vote needs before it concludes.
    pub min_votes: usize,
    /// Upper bound on players across both teams.
    pub max_players: usize,
    /// Inactivity after which a running game is concluded automatically.
    pub running_timeout: Duration,
}

impl Default for PugSettings {
    fn default() -> Self {
        Self {
            min_hosts: 1,
            min_captains: 2,
            min_players: 8,
            min_votes: 12,
            max_players: 12,
            running_timeout: Duration::from_secs(90 * 60),
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// PUG thresholds handed to every new snapshot.
    pub pug: Arc<PugSettings>,
    /// Bot owner; always an admin and the only user allowed to poke/reset.
    pub owner_id: Option<UserId>,
    /// Shared secret expected in the control plane's token header.
    pub control_token: Option<String>,
}

impl AppConfig {
    /// Load the configuration from disk and the environment, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let pug = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let settings: PugSettings = raw.into();
                    info!(
                        path = %path.display(),
                        min_players = settings.min_players,
                        min_votes = settings.min_votes,
                        "loaded PUG settings from config"
                    );
                    settings
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    PugSettings::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                PugSettings::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                PugSettings::default()
            }
        };

        let owner_id = env::var(OWNER_ID_ENV).ok().and_then(|value| {
            value
                .trim()
                .parse::<UserId>()
                .inspect_err(|err| warn!(error = %err, "ignoring malformed {OWNER_ID_ENV}"))
                .ok()
        });
        let control_token = env::var(CONTROL_TOKEN_ENV)
            .ok()
            .filter(|token| !token.is_empty());
        if control_token.is_none() {
            warn!("{CONTROL_TOKEN_ENV} not set; control plane accepts unauthenticated requests");
        }

        Self {
            pug: Arc::new(pug),
            owner_id,
            control_token,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pug: Arc::new(PugSettings::default()),
            owner_id: None,
            control_token: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    min_hosts: Option<usize>,
    min_captains: Option<usize>,
    min_players: Option<usize>,
    min_votes: Option<usize>,
    max_players: Option<usize>,
    running_timeout_secs: Option<u64>,
}

impl From<RawConfig> for PugSettings {
    fn from(value: RawConfig) -> Self {
        let defaults = PugSettings::default();
        Self {
            min_hosts: value.min_hosts.unwrap_or(defaults.min_hosts),
            min_captains: value.min_captains.unwrap_or(defaults.min_captains),
            min_players: value.min_players.unwrap_or(defaults.min_players),
            min_votes: value.min_votes.unwrap_or(defaults.min_votes),
            max_players: value.max_players.unwrap_or(defaults.max_players),
            running_timeout: value
                .running_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.running_timeout),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
