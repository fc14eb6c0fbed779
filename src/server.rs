//! HTTP surface
//!
//! One webhook endpoint, `POST /api/messages`, receives channel activities
//! and answers with the bot's replies in the response body. The endpoint
//! always answers 200 with a well-formed reply list: errors that survive
//! turn processing are logged and collapsed to a generic message, never a
//! 5xx the channel would retry.

use crate::activity::Activity;
use crate::bot::{FlightBot, GENERIC_ERROR_TEXT};
use crate::config::Config;
use crate::error::{BotError, Result};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<FlightBot>,
}

pub fn router(bot: Arc<FlightBot>) -> Router {
    Router::new()
        .route("/api/messages", post(messages))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { bot })
}

/// Bind and run the server until it is shut down.
pub async fn serve(config: &Config, bot: Arc<FlightBot>) -> Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|err| BotError::Configuration(format!("cannot bind {addr}: {err}")))?;

    info!(%addr, "listening");
    axum::serve(listener, router(bot))
        .await
        .map_err(|err| BotError::Internal(err.to_string()))
}

async fn messages(
    State(state): State<AppState>,
    Json(activity): Json<Activity>,
) -> Json<Vec<Activity>> {
    match state.bot.process_activity(&activity).await {
        Ok(replies) => Json(replies),
        Err(err) => {
            error!(error = %err, "activity processing failed");
            Json(vec![Activity::message(GENERIC_ERROR_TEXT)])
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> AppState {
        AppState {
            bot: Arc::new(FlightBot::builder().build()),
        }
    }

    #[tokio::test]
    async fn test_messages_returns_replies() {
        let activity: Activity = serde_json::from_value(json!({
            "type": "message",
            "text": "hello",
            "conversation": { "id": "conv-1" }
        }))
        .unwrap();

        let Json(replies) = messages(State(state()), Json(activity)).await;
        assert!(!replies.is_empty());
        assert!(replies[0].text.is_some());
    }

    #[tokio::test]
    async fn test_invalid_activity_collapses_to_generic_reply() {
        // No conversation: turn processing fails, but the channel still
        // gets a reply list
        let activity: Activity = serde_json::from_value(json!({
            "type": "message",
            "text": "hello"
        }))
        .unwrap();

        let Json(replies) = messages(State(state()), Json(activity)).await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text.as_deref(), Some(GENERIC_ERROR_TEXT));
    }

    #[tokio::test]
    async fn test_healthz() {
        assert_eq!(healthz().await, "ok");
    }
}
