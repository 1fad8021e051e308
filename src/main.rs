mod config;
mod error;
mod handlers;
mod types;
mod whatsapp;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use log::info;
use tower_http::cors::CorsLayer;

use config::Config;
use handlers::AppState;
use whatsapp::WebDriverSender;

async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, StatusCode> {
    let Some(api_key) = state.api_key.as_deref() else {
        return Ok(next.run(req).await);
    };

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth_header.strip_prefix("Bearer ").unwrap_or(auth_header);

    if token == api_key {
        Ok(next.run(req).await)
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/send-message", post(handlers::send_message))
        .route("/health", get(handlers::health))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init_timed();

    let config = Config::from_env()?;
    info!("WebDriver: {} ({})", config.webdriver.url, config.webdriver.browser);
    match &config.webdriver.profile_dir {
        Some(dir) => info!("Browser profile: {}", dir.display()),
        None => log::warn!("No WEBDRIVER_PROFILE_DIR set, WhatsApp Web will ask for a QR pairing on every session"),
    }
    if config.api_key.is_none() {
        log::warn!("WHATSAPP_API_KEY is empty, the API accepts unauthenticated requests");
    }

    let sender = WebDriverSender::new(config.webdriver.clone())?;
    let state = Arc::new(AppState {
        sender: Arc::new(sender),
        options: config.send.clone(),
        api_key: config.api_key.clone(),
    });

    let addr = config.addr();
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::whatsapp::{MessageSender, SendError, SendOptions};

    struct ReadySender;

    #[async_trait]
    impl MessageSender for ReadySender {
        async fn send_instantly(&self, _: &str, _: &str, _: &SendOptions) -> Result<(), SendError> {
            Ok(())
        }

        async fn send_at(
            &self,
            _: &str,
            _: &str,
            _: u32,
            _: u32,
            _: &SendOptions,
        ) -> Result<(), SendError> {
            Ok(())
        }

        async fn ready(&self) -> bool {
            true
        }
    }

    fn protected_app() -> Router {
        app(Arc::new(AppState {
            sender: Arc::new(ReadySender),
            options: SendOptions::default(),
            api_key: Some("s3cret".to_string()),
        }))
    }

    fn health_with(auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/health");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn rejects_missing_or_wrong_key() {
        let resp = protected_app().oneshot(health_with(None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = protected_app()
            .oneshot(health_with(Some("Bearer nope")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn accepts_bearer_or_bare_key() {
        for auth in ["Bearer s3cret", "s3cret"] {
            let resp = protected_app()
                .oneshot(health_with(Some(auth)))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "auth: {}", auth);
        }
    }

    #[tokio::test]
    async fn open_when_no_key_configured() {
        let app = app(Arc::new(AppState {
            sender: Arc::new(ReadySender),
            options: SendOptions::default(),
            api_key: None,
        }));
        let resp = app.oneshot(health_with(None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
