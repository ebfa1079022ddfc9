use super::error::{DiscordError, DiscordResult};

/// Public API root used when `DISCORD_API_BASE` is unset.
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Runtime configuration describing how to reach Discord's REST API.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    /// REST API root, without a trailing slash.
    pub api_base: String,
    /// Bot token sent as `Authorization: Bot <token>`.
    pub token: String,
}

impl DiscordConfig {
    /// Construct a configuration from an explicit token against the public API.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            token: token.into(),
        }
    }

    /// Point the client at a different API root (a proxy or a mock server).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> DiscordResult<Self> {
        let token = std::env::var("DISCORD_TOKEN")
            .ok()
            .filter(|token| !token.is_empty())
            .ok_or(DiscordError::MissingEnvVar {
                var: "DISCORD_TOKEN",
            })?;

        let mut config = Self::new(token);
        if let Ok(api_base) = std::env::var("DISCORD_API_BASE") {
            config = config.with_api_base(api_base);
        }

        Ok(config)
    }
}
