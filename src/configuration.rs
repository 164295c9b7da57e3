// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Configuration file handling.

use config::{Config, ConfigError};
use log::{info, warn};
use serde_with::{DurationSeconds, serde_as};
use std::fmt::{Display, Formatter};
use std::time::Duration;
use url::Url;

/// Default configuration file.
pub const DEF_CONFIG_FILE: &str = "configuration.yaml";

/// Environment variable prefix to override configuration values.
///
/// Nested keys are separated with a double underscore, e.g. `EMBY_MEDIA__EMBY__API_KEY`.
pub const ENV_PREFIX: &str = "EMBY_MEDIA";

/// Environment variable to enable tracing of raw Emby server responses.
///
/// Valid values: `true` or `1`. Messages are logged with `trace` level.
///
/// **Attention:** this setting is only for debugging and exposes all library data!
pub const ENV_TRACE_RESPONSES: &str = "EMBY_MEDIA_TRACE_RESPONSES";

pub const DEF_PORT: u16 = 8096;
pub const DEF_MAX_ITEMS: u32 = 5;
pub const DEF_REQUEST_TIMEOUT_SEC: u64 = 10;
/// Scan once per hour.
pub const DEF_SCAN_INTERVAL_SEC: u64 = 3600;
const MIN_SCAN_INTERVAL_SEC: u64 = 60;

#[derive(Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct Settings {
    pub emby: EmbySettings,
    pub sensor: SensorSettings,
}

/// Emby server connection settings.
#[serde_as]
#[derive(Clone, serde::Deserialize, serde::Serialize)]
pub struct EmbySettings {
    pub host: String,
    pub port: u16,
    /// Use https instead of http.
    pub ssl: bool,
    api_key: String,
    /// User identifier to retrieve the library views for.
    pub user_id: String,
    /// Max time for a single request, including connection establishment.
    #[serde_as(as = "DurationSeconds")]
    #[serde(rename = "request_timeout_sec", default = "default_request_timeout")]
    pub request_timeout: Duration,
}

impl Default for EmbySettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEF_PORT,
            ssl: false,
            api_key: "".to_string(),
            user_id: "".to_string(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl EmbySettings {
    pub fn new(host: impl Into<String>, port: u16, api_key: impl AsRef<str>) -> Self {
        let mut settings = Self {
            host: host.into(),
            port,
            ..Default::default()
        };
        settings.set_api_key(api_key);
        settings
    }

    /// Server base url without any path: `{scheme}://{host}:{port}`.
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        let scheme = if self.ssl { "https" } else { "http" };
        Url::parse(&format!("{scheme}://{}:{}", self.host, self.port))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn set_api_key(&mut self, api_key: impl AsRef<str>) {
        self.api_key = api_key.as_ref().trim().to_string();
    }
}

// api key must not be exposed in the log
impl Display for EmbySettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Emby server={}://{}:{}, user={}, api_key={}, timeout={:?}",
            if self.ssl { "https" } else { "http" },
            self.host,
            self.port,
            self.user_id,
            if self.api_key.is_empty() { "-" } else { "***" },
            self.request_timeout
        )
    }
}

/// Sensor platform settings.
#[serde_as]
#[derive(Clone, serde::Deserialize, serde::Serialize)]
pub struct SensorSettings {
    /// Only create sensors for the libraries with these names. Empty: all supported libraries.
    #[serde(default)]
    pub include: Vec<String>,
    /// Number of latest items per library.
    pub max: u32,
    /// Use backdrop images for the poster instead of the primary image.
    pub use_backdrop: bool,
    /// Create one sensor per collection kind instead of one per library.
    pub group_libraries: bool,
    /// List single episodes instead of grouping them per series.
    pub episodes: bool,
    #[serde_as(as = "DurationSeconds")]
    #[serde(rename = "scan_interval_sec", default = "default_scan_interval")]
    pub scan_interval: Duration,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            max: DEF_MAX_ITEMS,
            use_backdrop: false,
            group_libraries: false,
            episodes: true,
            scan_interval: default_scan_interval(),
        }
    }
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(DEF_REQUEST_TIMEOUT_SEC)
}

fn default_scan_interval() -> Duration {
    Duration::from_secs(DEF_SCAN_INTERVAL_SEC)
}

/// Load and validate the configuration settings.
///
/// The application provides default values which can be overriden in the following order:
/// 1. Configuration settings in the yaml or json configuration file specified in `filename`
/// 2. Environment variables with prefix `EMBY_MEDIA` and `__` as key separator
pub fn get_configuration(filename: Option<&str>) -> Result<Settings, ConfigError> {
    check_cfg_values(load_configuration(filename)?)
}

/// Load the configuration settings without validation.
///
/// See [`get_configuration`] for the order of configuration sources. The loaded settings must be
/// validated with [`check_cfg_values`] before use.
pub fn load_configuration(filename: Option<&str>) -> Result<Settings, ConfigError> {
    // default configuration
    let mut config = Config::builder().add_source(Config::try_from(&Settings::default())?);
    // read optional configuration file to override defaults
    if let Some(filename) = filename {
        info!("Loading configuration file: {filename}");
        config = config.add_source(config::File::with_name(filename));
    }

    // E.g. `EMBY_MEDIA__EMBY__HOST=emby.local` sets the `emby.host` key
    let config = config
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("sensor.include"),
        )
        .build()?;

    config.try_deserialize()
}

/// Validate the configuration settings.
///
/// Missing mandatory values are an error, invalid optional values are reset to their defaults.
pub fn check_cfg_values(mut settings: Settings) -> Result<Settings, ConfigError> {
    if settings.emby.host.trim().is_empty() {
        return Err(ConfigError::Message("emby.host must be set".into()));
    }
    if settings.emby.user_id.trim().is_empty() {
        return Err(ConfigError::Message("emby.user_id must be set".into()));
    }
    if let Err(e) = settings.emby.base_url() {
        return Err(ConfigError::Message(format!(
            "invalid Emby server address {}:{}: {e}",
            settings.emby.host, settings.emby.port
        )));
    }
    let api_key = std::mem::take(&mut settings.emby.api_key);
    settings.emby.set_api_key(api_key);
    if settings.emby.api_key.is_empty() {
        warn!("No Emby API key configured, requests will most likely be rejected.");
    }
    if settings.emby.request_timeout.is_zero() {
        warn!("Invalid request timeout, using default.");
        settings.emby.request_timeout = default_request_timeout();
    }

    if settings.sensor.max == 0 {
        warn!("Invalid max item setting, using default: {DEF_MAX_ITEMS}");
        settings.sensor.max = DEF_MAX_ITEMS;
    }
    if settings.sensor.scan_interval.as_secs() < MIN_SCAN_INTERVAL_SEC {
        warn!("Invalid scan interval, using default: {DEF_SCAN_INTERVAL_SEC}s");
        settings.sensor.scan_interval = default_scan_interval();
    }
    settings.sensor.include.retain(|name| !name.trim().is_empty());

    Ok(settings)
}
