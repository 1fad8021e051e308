use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use crate::whatsapp::webdriver::WebDriverConfig;
use crate::whatsapp::SendOptions;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    /// Bearer token required on every request; `None` leaves the API open.
    pub api_key: Option<String>,
    pub webdriver: WebDriverConfig,
    pub send: SendOptions,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let defaults = WebDriverConfig::default();
        let webdriver = WebDriverConfig {
            url: var("WEBDRIVER_URL").unwrap_or(defaults.url),
            browser: var("WEBDRIVER_BROWSER").unwrap_or(defaults.browser),
            profile_dir: var("WEBDRIVER_PROFILE_DIR").map(PathBuf::from),
            headless: parse_bool("WEBDRIVER_HEADLESS", var("WEBDRIVER_HEADLESS"), false)?,
            timeout: Duration::from_secs(parse(
                "WEBDRIVER_TIMEOUT_SECS",
                var("WEBDRIVER_TIMEOUT_SECS"),
                defaults.timeout.as_secs(),
            )?),
        };

        let defaults = SendOptions::default();
        let send = SendOptions {
            wait_time: Duration::from_secs(parse(
                "WHATSAPP_WAIT_TIME_SECS",
                var("WHATSAPP_WAIT_TIME_SECS"),
                defaults.wait_time.as_secs(),
            )?),
            tab_close: parse_bool("WHATSAPP_TAB_CLOSE", var("WHATSAPP_TAB_CLOSE"), defaults.tab_close)?,
            close_time: Duration::from_secs(parse(
                "WHATSAPP_CLOSE_TIME_SECS",
                var("WHATSAPP_CLOSE_TIME_SECS"),
                defaults.close_time.as_secs(),
            )?),
        };

        Ok(Self {
            bind: var("WHATSAPP_API_BIND").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse("WHATSAPP_API_PORT", var("WHATSAPP_API_PORT"), 5001)?,
            api_key: var("WHATSAPP_API_KEY"),
            webdriver,
            send,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

fn parse<T>(key: &str, value: Option<String>, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v
            .trim()
            .parse()
            .with_context(|| format!("{} has invalid value {:?}", key, v)),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, value: Option<String>, default: bool) -> anyhow::Result<bool> {
    let Some(v) = value else {
        return Ok(default);
    };
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{} must be a boolean, got {:?}", key, v),
    }
}
