//! Configuration loading for callbell.
//!
//! Loads `callbell.toml`. Only `[webhook].url` is mandatory; every other
//! section uses `#[serde(default)]` so a short file is valid.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::directory::Directory;
use crate::esl::EventFormat;
use crate::router::{RoutingOptions, Target};

/// Config file name looked up in the working and platform config directories.
pub const CONFIG_FILE_NAME: &str = "callbell.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BellConfig {
    /// Event socket connection settings.
    #[serde(default)]
    pub esl: EslConfig,

    /// Webhook delivery settings.
    pub webhook: WebhookConfig,

    /// Who gets notified.
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Log level and optional file output.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Extension → chat user directory.
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,
}

/// Event socket connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EslConfig {
    /// Switch host name or address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Event socket port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Event socket password.
    #[serde(default = "default_password")]
    pub password: String,

    /// Environment variable holding the password. When named, it replaces
    /// `password` entirely and must be set.
    #[serde(default)]
    pub password_env: Option<String>,

    /// Event encoding to subscribe with.
    #[serde(default)]
    pub format: EventFormat,

    /// Seconds allowed for the TCP connect plus the auth handshake.
    #[serde(default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for EslConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: default_password(),
            password_env: None,
            format: EventFormat::default(),
            connect_timeout_secs: default_timeout_secs(),
        }
    }
}

impl EslConfig {
    /// The password to authenticate with.
    ///
    /// # Errors
    ///
    /// Returns an error if `password_env` names a variable that is unset.
    pub fn resolve_password(&self) -> anyhow::Result<String> {
        match &self.password_env {
            Some(var) => std::env::var(var)
                .with_context(|| format!("event socket password variable {var} is not set")),
            None => Ok(self.password.clone()),
        }
    }
}

/// Webhook delivery settings.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Incoming webhook URL.
    pub url: String,

    /// Icon URL overriding the webhook's default.
    #[serde(default)]
    pub icon: Option<String>,

    /// Display name overriding the webhook's default.
    #[serde(default)]
    pub username: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Notification audience.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifyConfig {
    /// Also notify the calling party.
    #[serde(default)]
    pub notify_caller: bool,

    /// Post panel summaries for every call.
    #[serde(default)]
    pub panel: bool,

    /// Channel for panel summaries; the webhook's own channel when unset.
    #[serde(default)]
    pub panel_channel: Option<String>,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily-rotated JSON logs; console only when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

impl BellConfig {
    /// Validate that configuration values are usable.
    pub fn validate(&self) -> anyhow::Result<()> {
        let url = url::Url::parse(&self.webhook.url)
            .with_context(|| format!("webhook.url is not a valid URL: {}", self.webhook.url))?;
        anyhow::ensure!(
            url.scheme() == "http" || url.scheme() == "https",
            "webhook.url must be http or https"
        );
        anyhow::ensure!(!self.esl.host.trim().is_empty(), "esl.host must not be empty");
        anyhow::ensure!(self.esl.port != 0, "esl.port must be nonzero");
        anyhow::ensure!(
            self.esl.connect_timeout_secs >= 1,
            "esl.connect_timeout_secs must be >= 1"
        );
        anyhow::ensure!(
            self.webhook.timeout_secs >= 1,
            "webhook.timeout_secs must be >= 1"
        );
        if let Some(channel) = &self.notify.panel_channel {
            anyhow::ensure!(
                !channel.trim().is_empty(),
                "notify.panel_channel must not be empty when set"
            );
        }
        for (extension, user) in &self.extensions {
            anyhow::ensure!(
                !extension.trim().is_empty(),
                "extensions must not contain an empty key"
            );
            anyhow::ensure!(
                !user.trim().is_empty(),
                "extension {extension} maps to an empty user"
            );
        }
        Ok(())
    }

    /// Build the extension directory.
    pub fn directory(&self) -> Directory {
        Directory::new(self.extensions.clone())
    }

    /// Build routing options from `[notify]`.
    pub fn routing_options(&self) -> RoutingOptions {
        let panel = self.notify.panel.then(|| match &self.notify.panel_channel {
            Some(channel) => Target::Channel(channel.clone()),
            None => Target::Default,
        });
        RoutingOptions {
            notify_caller: self.notify.notify_caller,
            panel,
        }
    }
}

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or fails validation.
pub fn load_config(path: &Path) -> anyhow::Result<BellConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    let config: BellConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config at {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Platform config directory (e.g. `~/.config/callbell` on Linux).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "callbell")
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(dirs.config_dir().to_path_buf())
}

/// Pick the config file to load.
///
/// Precedence: `explicit` > `./callbell.toml` > `{config_dir}/callbell.toml`.
///
/// # Errors
///
/// Returns an error if no explicit path is given and neither default
/// location holds a config file.
pub fn resolve_config_path(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Ok(local);
    }

    let platform = config_dir()?.join(CONFIG_FILE_NAME);
    if platform.is_file() {
        return Ok(platform);
    }

    anyhow::bail!(
        "no config found at ./{CONFIG_FILE_NAME} or {}; pass --config",
        platform.display()
    )
}

// Default value functions for serde.

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8021
}

fn default_password() -> String {
    "ClueCon".to_owned()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_owned()
}
