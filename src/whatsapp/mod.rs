pub mod phone;
pub mod schedule;
pub mod webdriver;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use webdriver::WebDriverSender;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("Country code missing from phone number: {0}")]
    CountryCode(String),

    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Invalid send time {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },

    #[error("Call time must be greater than wait time ({left}s left, {wait}s wait) as WhatsApp Web takes some time to load")]
    CallTime { left: u64, wait: u64 },

    #[error("WebDriver error {error}: {message}")]
    WebDriver { error: String, message: String },

    #[error("WebDriver request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected WebDriver response: {0}")]
    Protocol(String),
}

/// Timing knobs forwarded to the sender on every call.
#[derive(Debug, Clone)]
pub struct SendOptions {
    /// Time allowed for WhatsApp Web to load the chat before Enter is pressed.
    pub wait_time: Duration,
    pub tab_close: bool,
    pub close_time: Duration,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            wait_time: Duration::from_secs(10),
            tab_close: true,
            close_time: Duration::from_secs(3),
        }
    }
}

#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Open the chat for `phone` and send `message` right away.
    async fn send_instantly(
        &self,
        phone: &str,
        message: &str,
        opts: &SendOptions,
    ) -> Result<(), SendError>;

    /// Sleep until `hour:minute` local time (minus the load wait), then send.
    async fn send_at(
        &self,
        phone: &str,
        message: &str,
        hour: u32,
        minute: u32,
        opts: &SendOptions,
    ) -> Result<(), SendError>;

    /// Whether the automation backend can take a send right now.
    async fn ready(&self) -> bool;
}
