use anyhow::Context;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::models::{DateFormat, DateKeyError, RuleSet};
use crate::protocol::{DEFAULT_ORIGIN_COOKIE, DEFAULT_SUPPRESSION_COOKIE};

/// Settings file looked up in the working directory when none is given.
pub const DEFAULT_SETTINGS_FILE: &str = "takeover";

pub const DEFAULT_BANNER_STYLE: &str = "position:fixed;top:0;width:100%;background-color:#00689f;color:#fff;padding:15px 10px;text-align:center;z-index:9999;box-sizing:border-box;font-family:Arial,sans-serif;font-size:16px;font-weight:bold;display:flex;flex-wrap:wrap;justify-content:center;align-items:center;";
pub const DEFAULT_LINK_STYLE: &str = "color:#ffffff;text-decoration:underline;";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("'[{0}]' configuration is required but not found")]
    MissingSection(&'static str),
    #[error("'urls_by_date' is required in the dispatcher configuration")]
    MissingRuleSet,
    #[error("invalid date key: {0}")]
    InvalidDateKey(#[from] DateKeyError),
    #[error("date keys '{first}' and '{second}' name the same day")]
    DuplicateDateKey { first: String, second: String },
    #[error("'return_link_text_template' is required in the banner configuration")]
    MissingLinkTemplate,
    #[error("'{setting}' is not a usable cookie name: {name:?}")]
    InvalidCookieName { setting: &'static str, name: String },
    #[error("'{0}' must be a positive duration")]
    InvalidCookieLifetime(&'static str),
}

/// Everything the simulator reads at startup. Either section may be absent;
/// the component that needs it refuses to start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub dispatcher: Option<DispatcherSettings>,
    #[serde(default)]
    pub banner: Option<BannerSettings>,
}

/// Raw dispatcher settings as they appear in a settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherSettings {
    #[serde(default)]
    pub urls_by_date: Option<BTreeMap<String, String>>,
    #[serde(default = "DispatcherSettings::default_suppression_cookie")]
    pub suppression_cookie: String,
    #[serde(default = "DispatcherSettings::default_suppression_minutes")]
    pub suppression_minutes: u64,
    #[serde(default)]
    pub date_format: DateFormat,
}

/// Raw banner settings as they appear in a settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannerSettings {
    #[serde(default)]
    pub return_link_text_template: Option<String>,
    #[serde(default = "BannerSettings::default_origin_cookie")]
    pub origin_cookie: String,
    #[serde(default = "BannerSettings::default_cookie_expiration_seconds")]
    pub cookie_expiration_seconds: u64,
    #[serde(default)]
    pub banner_style: Option<String>,
    #[serde(default)]
    pub link_style: Option<String>,
}

impl DispatcherSettings {
    fn default_suppression_cookie() -> String {
        DEFAULT_SUPPRESSION_COOKIE.to_string()
    }

    const fn default_suppression_minutes() -> u64 {
        24 * 60
    }

    /// Settings with the given rules and every optional value at its default.
    pub fn with_rules<I, K, V>(rules: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            urls_by_date: Some(
                rules
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            suppression_cookie: Self::default_suppression_cookie(),
            suppression_minutes: Self::default_suppression_minutes(),
            date_format: DateFormat::default(),
        }
    }
}

impl BannerSettings {
    fn default_origin_cookie() -> String {
        DEFAULT_ORIGIN_COOKIE.to_string()
    }

    const fn default_cookie_expiration_seconds() -> u64 {
        1800
    }

    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            return_link_text_template: Some(template.into()),
            origin_cookie: Self::default_origin_cookie(),
            cookie_expiration_seconds: Self::default_cookie_expiration_seconds(),
            banner_style: None,
            link_style: None,
        }
    }
}

/// Validated dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub rules: RuleSet,
    pub suppression_cookie: String,
    pub suppression_duration: Duration,
    pub date_format: DateFormat,
}

/// Validated banner configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerConfig {
    pub link_text_template: String,
    pub origin_cookie: String,
    pub cookie_lifetime: Duration,
    pub banner_style: String,
    pub link_style: String,
}

fn check_cookie_name(setting: &'static str, name: &str) -> Result<(), ConfigError> {
    let usable = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_graphic() && !matches!(c, '=' | ';' | ',' | '"' | '\\'));
    if usable {
        Ok(())
    } else {
        Err(ConfigError::InvalidCookieName {
            setting,
            name: name.to_string(),
        })
    }
}

impl TryFrom<DispatcherSettings> for DispatcherConfig {
    type Error = ConfigError;

    fn try_from(settings: DispatcherSettings) -> Result<Self, Self::Error> {
        let urls_by_date = settings.urls_by_date.ok_or(ConfigError::MissingRuleSet)?;
        let rules = RuleSet::from_entries(urls_by_date)?;

        check_cookie_name("suppression_cookie", &settings.suppression_cookie)?;

        let suppression_duration = i64::try_from(settings.suppression_minutes)
            .ok()
            .filter(|minutes| *minutes > 0)
            .and_then(Duration::try_minutes)
            .ok_or(ConfigError::InvalidCookieLifetime("suppression_minutes"))?;

        Ok(Self {
            rules,
            suppression_cookie: settings.suppression_cookie,
            suppression_duration,
            date_format: settings.date_format,
        })
    }
}

impl TryFrom<BannerSettings> for BannerConfig {
    type Error = ConfigError;

    fn try_from(settings: BannerSettings) -> Result<Self, Self::Error> {
        let link_text_template = settings
            .return_link_text_template
            .filter(|template| !template.trim().is_empty())
            .ok_or(ConfigError::MissingLinkTemplate)?;

        check_cookie_name("origin_cookie", &settings.origin_cookie)?;

        let cookie_lifetime = i64::try_from(settings.cookie_expiration_seconds)
            .ok()
            .filter(|seconds| *seconds > 0)
            .and_then(Duration::try_seconds)
            .ok_or(ConfigError::InvalidCookieLifetime("cookie_expiration_seconds"))?;

        Ok(Self {
            link_text_template,
            origin_cookie: settings.origin_cookie,
            cookie_lifetime,
            banner_style: settings
                .banner_style
                .unwrap_or_else(|| DEFAULT_BANNER_STYLE.to_string()),
            link_style: settings
                .link_style
                .unwrap_or_else(|| DEFAULT_LINK_STYLE.to_string()),
        })
    }
}

impl Settings {
    /// Load settings from `path` (or `./takeover.{toml,yaml,json}` if present),
    /// then let `TAKEOVER__*` environment variables override individual values.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(path) => config::File::from(path),
            None => config::File::with_name(DEFAULT_SETTINGS_FILE).required(false),
        };

        let raw = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("TAKEOVER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("failed to read takeover settings")?;

        raw.try_deserialize()
            .context("takeover settings do not have the expected shape")
    }

    pub fn dispatcher_config(&self) -> Result<DispatcherConfig, ConfigError> {
        self.dispatcher
            .clone()
            .ok_or(ConfigError::MissingSection("dispatcher"))?
            .try_into()
    }

    pub fn banner_config(&self) -> Result<BannerConfig, ConfigError> {
        self.banner
            .clone()
            .ok_or(ConfigError::MissingSection("banner"))?
            .try_into()
    }
}
