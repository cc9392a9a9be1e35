//! Discord interaction webhook endpoint.
//!
//! Order matters: the raw body is authenticated byte-for-byte against the
//! application public key before anything parses it as JSON. Past that
//! point every command-shaped interaction is answered with a well-formed
//! acknowledgement, never a raw protocol error.

use crate::dispatch::{self, DispatchOutcome};
use crate::server::AppState;
use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Extension, Json};
use std::sync::Arc;
use wum_discord::{verify_signature, Interaction};

pub fn router() -> axum::Router {
    axum::Router::new().route("/api/discord/interactions", post(post_interactions))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

#[tracing::instrument(level = "debug", skip_all)]
async fn post_interactions(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let public_key = state.config.discord.public_key.trim();
    if public_key.is_empty() {
        tracing::error!("discord public key is not configured");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Server configuration error").into_response();
    }

    let signature = header_str(&headers, "x-signature-ed25519");
    let timestamp = header_str(&headers, "x-signature-timestamp");
    if !verify_signature(public_key, signature, timestamp, &body) {
        tracing::warn!("rejected interaction with an invalid signature");
        return (StatusCode::UNAUTHORIZED, "Invalid request signature").into_response();
    }

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(interaction) => interaction,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable interaction payload");
            return (StatusCode::BAD_REQUEST, "Unknown interaction type").into_response();
        }
    };

    match dispatch::dispatch(&state, interaction) {
        DispatchOutcome::Response(response) => Json(response).into_response(),
        DispatchOutcome::Unhandled => {
            (StatusCode::BAD_REQUEST, "Unknown interaction type").into_response()
        }
    }
}
