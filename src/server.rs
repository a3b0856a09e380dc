/*
 * @file server.rs
 * @brief HTTP routes for the mirror agent
 * @author Kevin Thomas
 * @date 2025
 *
 * MIT License
 *
 * Copyright (c) 2025 Kevin Thomas
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! HTTP front-end: `POST /query`, `GET /voice`, `POST /reset`,
//! `GET /affirmation`.
//!
//! Every route answers JSON. Successful replies carry `response` (or `status`
//! for reset); failures carry `error` with a 400 or 500 status.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::assistant::MirrorAssistant;
use crate::error::MirrorError;

/// Request body for `POST /query`.
///
/// `message` stays untyped so a present but non-string value can be told
/// apart from a missing one.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub message: Option<Value>,
}

impl QueryRequest {
    fn into_message(self) -> Result<String, MirrorError> {
        match self.message {
            Some(Value::String(message)) => Ok(message),
            None | Some(Value::Null) => Err(MirrorError::MissingMessage),
            Some(_) => Err(MirrorError::InvalidMessage),
        }
    }
}

/// Body returned by the conversational and affirmation routes.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplyResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// Builds the router with permissive CORS so a browser mirror UI on any
/// origin can call it.
pub fn router(assistant: Arc<MirrorAssistant>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    Router::new()
        .route("/query", post(handle_query))
        .route("/voice", get(handle_voice))
        .route("/reset", post(handle_reset))
        .route("/affirmation", get(handle_affirmation))
        .layer(cors)
        .with_state(assistant)
}

/// Binds `bind_addr` and serves until Ctrl+C or SIGTERM.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(assistant: Arc<MirrorAssistant>, bind_addr: &str) -> Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("Mirror agent listening on {}", listener.local_addr()?);
    axum::serve(listener, router(assistant))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Mirror agent stopped");
    Ok(())
}

async fn handle_query(
    State(assistant): State<Arc<MirrorAssistant>>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<ReplyResponse>, MirrorError> {
    let Ok(Json(request)) = body else {
        return Err(MirrorError::MissingMessage);
    };
    let message = request.into_message()?;
    let response = assistant.ask(message).await?;
    Ok(Json(ReplyResponse { response }))
}

async fn handle_voice(
    State(assistant): State<Arc<MirrorAssistant>>,
) -> Result<Json<ReplyResponse>, MirrorError> {
    let response = assistant.listen().await?;
    Ok(Json(ReplyResponse { response }))
}

async fn handle_reset(
    State(assistant): State<Arc<MirrorAssistant>>,
) -> Result<Json<StatusResponse>, MirrorError> {
    assistant.reset().await?;
    Ok(Json(StatusResponse {
        status: "Conversation reset.",
    }))
}

async fn handle_affirmation(
    State(assistant): State<Arc<MirrorAssistant>>,
) -> Result<Json<ReplyResponse>, MirrorError> {
    let response = assistant.affirmation().await?;
    Ok(Json(ReplyResponse { response }))
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutdown signal received");
}
