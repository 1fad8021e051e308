use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use log::{error, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::types::{HealthResponse, SendRequest, SendResponse};
use crate::whatsapp::{schedule, MessageSender, SendError, SendOptions};

/// How far ahead the fallback send is scheduled when the instant send fails.
const FALLBACK_DELAY_MINUTES: i64 = 1;

pub struct AppState {
    pub sender: Arc<dyn MessageSender>,
    pub options: SendOptions,
    pub api_key: Option<String>,
}

fn required(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.is_empty())
}

pub async fn send_message(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<SendResponse>, AppError> {
    let Json(req) = payload?;

    let (Some(to), Some(message)) = (required(req.to), required(req.message)) else {
        return Err(AppError::BadRequest(
            "Phone number and message are required".to_string(),
        ));
    };

    let id = Uuid::new_v4();
    info!("[{}] Sending WhatsApp message to {}", id, to);

    // Runs to completion even if the client goes away.
    let sender = state.sender.clone();
    let options = state.options.clone();
    let response = tokio::spawn(async move {
        deliver(id, sender.as_ref(), &options, &to, &message).await
    })
    .await??;

    Ok(Json(response))
}

/// Instant send, then exactly one scheduled attempt if it fails.
async fn deliver(
    id: Uuid,
    sender: &dyn MessageSender,
    options: &SendOptions,
    to: &str,
    message: &str,
) -> Result<SendResponse, SendError> {
    let instant_err = match sender.send_instantly(to, message, options).await {
        Ok(()) => {
            info!("[{}] Sent instantly", id);
            return Ok(SendResponse::sent());
        }
        Err(e) => e,
    };

    let (hour, minute) = schedule::fallback_time(
        chrono::Local::now().naive_local(),
        chrono::Duration::minutes(FALLBACK_DELAY_MINUTES),
    );
    warn!(
        "[{}] Instant send failed ({}), scheduling for {:02}:{:02}",
        id, instant_err, hour, minute
    );

    if let Err(e) = sender.send_at(to, message, hour, minute, options).await {
        error!("[{}] Scheduled send failed: {}", id, e);
        return Err(e);
    }

    info!("[{}] Sent through scheduled fallback", id);
    Ok(SendResponse::scheduled(instant_err.to_string()))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = if state.sender.ready().await {
        "ok"
    } else {
        "driver_unavailable"
    };
    Json(HealthResponse {
        status: status.to_string(),
    })
}
