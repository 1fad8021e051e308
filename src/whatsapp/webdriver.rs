use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, Method, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use super::{phone, schedule, MessageSender, SendError, SendOptions};

const WHATSAPP_SEND_URL: &str = "https://web.whatsapp.com/send";

/// WebDriver key code for Enter.
const ENTER_KEY: &str = "\u{E007}";

#[derive(Debug, Clone)]
pub struct WebDriverConfig {
    pub url: String,
    pub browser: String,
    /// Browser profile holding the paired WhatsApp Web login.
    pub profile_dir: Option<PathBuf>,
    pub headless: bool,
    pub timeout: Duration,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9515".to_string(),
            browser: "chrome".to_string(),
            profile_dir: None,
            headless: false,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    value: Value,
}

#[derive(Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

/// Drives WhatsApp Web through a W3C WebDriver server (chromedriver,
/// geckodriver). One browser session per message; sessions never overlap.
pub struct WebDriverSender {
    base_url: String,
    http: Client,
    capabilities: Value,
    lock: Mutex<()>,
}

impl WebDriverSender {
    pub fn new(config: WebDriverConfig) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            http,
            capabilities: capabilities(&config),
            lock: Mutex::new(()),
        })
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, SendError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("WebDriver {} {}", method, url);

        let mut req = self.http.request(method, &url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await?;
        let status = response.status();
        let payload: WireResponse = response.json().await?;

        if !status.is_success() {
            return Err(match serde_json::from_value::<WireError>(payload.value) {
                Ok(err) => SendError::WebDriver {
                    error: err.error,
                    message: err.message,
                },
                Err(_) => SendError::Protocol(format!("HTTP {} from {}", status, url)),
            });
        }
        Ok(payload.value)
    }

    async fn new_session(&self) -> Result<String, SendError> {
        let value = self
            .command(
                Method::POST,
                "/session",
                Some(json!({ "capabilities": self.capabilities })),
            )
            .await?;
        value
            .get("sessionId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SendError::Protocol("new session response has no sessionId".into()))
    }

    async fn delete_session(&self, session: &str) -> Result<(), SendError> {
        self.command(Method::DELETE, &format!("/session/{}", session), None)
            .await?;
        Ok(())
    }

    async fn press_enter(&self, session: &str) -> Result<(), SendError> {
        let actions = json!({
            "actions": [{
                "type": "key",
                "id": "keyboard",
                "actions": [
                    { "type": "keyDown", "value": ENTER_KEY },
                    { "type": "keyUp", "value": ENTER_KEY },
                ],
            }],
        });
        self.command(
            Method::POST,
            &format!("/session/{}/actions", session),
            Some(actions),
        )
        .await?;
        Ok(())
    }

    async fn drive(&self, session: &str, link: &Url, opts: &SendOptions) -> Result<(), SendError> {
        self.command(
            Method::POST,
            &format!("/session/{}/url", session),
            Some(json!({ "url": link.as_str() })),
        )
        .await?;

        tokio::time::sleep(opts.wait_time).await;
        self.press_enter(session).await
    }

    async fn deliver(&self, phone: &str, message: &str, opts: &SendOptions) -> Result<(), SendError> {
        let link = chat_link(phone, message)?;

        let _guard = self.lock.lock().await;
        let session = self.new_session().await?;
        info!("Opened browser session {} for {}", session, phone);

        let result = self.drive(&session, &link, opts).await;
        match &result {
            Ok(()) if opts.tab_close => {
                tokio::time::sleep(opts.close_time).await;
                // Enter already pressed, the message is out.
                if let Err(e) = self.delete_session(&session).await {
                    warn!("Message sent but closing session {} failed: {}", session, e);
                }
            }
            Ok(()) => info!("Leaving browser session {} open", session),
            Err(e) => {
                warn!("Send through session {} failed: {}", session, e);
                if let Err(e) = self.delete_session(&session).await {
                    warn!("Failed to close session {}: {}", session, e);
                }
            }
        }
        result
    }
}

fn chat_link(phone: &str, message: &str) -> Result<Url, SendError> {
    let digits = phone.trim_start_matches('+');
    Url::parse_with_params(WHATSAPP_SEND_URL, &[("phone", digits), ("text", message)])
        .map_err(|e| SendError::Protocol(e.to_string()))
}

fn capabilities(config: &WebDriverConfig) -> Value {
    let mut always = json!({ "browserName": config.browser });

    let mut args: Vec<String> = Vec::new();
    match config.browser.as_str() {
        "firefox" => {
            if config.headless {
                args.push("-headless".into());
            }
            if let Some(dir) = &config.profile_dir {
                args.push("-profile".into());
                args.push(dir.display().to_string());
            }
            if !args.is_empty() {
                always["moz:firefoxOptions"] = json!({ "args": args });
            }
        }
        _ => {
            if config.headless {
                args.push("--headless=new".into());
            }
            if let Some(dir) = &config.profile_dir {
                args.push(format!("--user-data-dir={}", dir.display()));
            }
            if !args.is_empty() {
                always["goog:chromeOptions"] = json!({ "args": args });
            }
        }
    }

    json!({ "alwaysMatch": always })
}

#[async_trait]
impl MessageSender for WebDriverSender {
    async fn send_instantly(
        &self,
        phone: &str,
        message: &str,
        opts: &SendOptions,
    ) -> Result<(), SendError> {
        let phone = phone::normalize(phone)?;
        self.deliver(&phone, message, opts).await?;
        info!("Message sent to {}", phone);
        Ok(())
    }

    async fn send_at(
        &self,
        phone: &str,
        message: &str,
        hour: u32,
        minute: u32,
        opts: &SendOptions,
    ) -> Result<(), SendError> {
        let phone = phone::normalize(phone)?;
        let now = chrono::Local::now().time();
        let delay = schedule::delay_before_send(now, hour, minute, opts.wait_time)?;

        info!(
            "Sending to {} at {:02}:{:02}, opening WhatsApp Web in {}s",
            phone,
            hour,
            minute,
            delay.as_secs()
        );
        tokio::time::sleep(delay).await;

        self.deliver(&phone, message, opts).await?;
        info!("Scheduled message sent to {}", phone);
        Ok(())
    }

    async fn ready(&self) -> bool {
        match self.command(Method::GET, "/status", None).await {
            Ok(value) => value.get("ready").and_then(Value::as_bool).unwrap_or(false),
            Err(e) => {
                warn!("WebDriver status check failed: {}", e);
                false
            }
        }
    }
}
