//! wumtodo server.
//!
//! Builds application state from config and mounts the interaction and
//! health routes behind the usual HTTP middleware stack.

use crate::config::WumtodoConfig;
use crate::deferred::DeferredCoordinator;
use crate::reminder::ReminderJob;
use crate::routes;
use anyhow::{Context, Result};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::Response;
use axum::Extension;
use cron::Schedule;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use wum_discord::{DiscordClient, DiscordRestClient};
use wum_store::Store;

pub struct AppState {
    pub config: WumtodoConfig,
    pub store: Store,
    pub discord: Arc<dyn DiscordClient>,
    pub deferred: DeferredCoordinator,
}

pub async fn doctor(config_path: Option<PathBuf>) -> Result<()> {
    let cfg = WumtodoConfig::load(config_path)?;
    cfg.validate()?;
    let store = Store::open(&cfg.database.path)?;
    let team_count = store.count_teams()?;
    tracing::info!(
        bind_addr = %cfg.server.bind_addr,
        database_path = %cfg.database.path,
        team_count,
        reminder_enabled = cfg.reminder.enabled,
        reminder_schedule = %cfg.reminder.schedule,
        "config ok"
    );
    Ok(())
}

/// One reminder sweep, for operators and external schedulers.
pub async fn remind_once(config_path: Option<PathBuf>) -> Result<()> {
    let cfg = WumtodoConfig::load(config_path)?;
    cfg.validate()?;
    let store = Store::open(&cfg.database.path)?;
    let discord: Arc<dyn DiscordClient> = Arc::new(DiscordRestClient::new(&cfg.discord.bot_token)?);
    let job = ReminderJob::new(store, discord);
    let summary = job.run_once().await?;
    tracing::info!(
        examined = summary.examined,
        notified = summary.notified,
        "reminder sweep finished"
    );
    Ok(())
}

pub async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    let cfg = WumtodoConfig::load(config_path)?;
    cfg.validate()?;

    let addr: SocketAddr = cfg
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("invalid server.bind_addr {:?}", cfg.server.bind_addr))?;
    let listener = preflight_bind_listener(addr).await?;

    let store = Store::open(&cfg.database.path)
        .with_context(|| format!("failed to open database {:?}", cfg.database.path))?;
    let discord: Arc<dyn DiscordClient> = Arc::new(DiscordRestClient::new(&cfg.discord.bot_token)?);
    let deferred = DeferredCoordinator::new(Arc::clone(&discord), &cfg.discord.application_id);

    let shutdown = CancellationToken::new();
    let reminder_handle = if cfg.reminder.enabled {
        // Already validated, parse cannot fail here.
        let schedule = Schedule::from_str(&cfg.reminder.schedule)?;
        let job = Arc::new(ReminderJob::new(store.clone(), Arc::clone(&discord)));
        tracing::info!(schedule = %cfg.reminder.schedule, "reminder job started");
        Some(job.start(schedule, shutdown.child_token()))
    } else {
        None
    };

    let state = Arc::new(AppState {
        config: cfg.clone(),
        store,
        discord,
        deferred,
    });

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id_from_headers(request.headers())
            )
        })
        .on_response(
            |response: &Response, latency: Duration, _span: &tracing::Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis() as u64,
                    "http request completed"
                );
            },
        )
        .on_failure(
            |error: ServerErrorsFailureClass, latency: Duration, _span: &tracing::Span| {
                tracing::error!(
                    error_class = %error,
                    latency_ms = latency.as_millis() as u64,
                    "http request failed"
                );
            },
        );

    let app = routes::router()
        .layer(Extension(state.clone()))
        .layer(GlobalConcurrencyLimitLayer::new(cfg.server.http_max_in_flight))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(cfg.server.http_timeout_seconds),
        ))
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    tracing::info!(%addr, "wumtodo serving");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;
    tracing::info!("http server shutdown completed");

    shutdown.cancel();
    // Deferred interactions were already acknowledged; let their follow-ups
    // finish before the process exits.
    state.deferred.shutdown().await;
    if let Some(handle) = reminder_handle {
        match handle.await {
            Ok(()) => tracing::info!("reminder job shutdown completed"),
            Err(e) => tracing::error!(error = %e, "reminder task join failed during shutdown"),
        }
    }

    Ok(())
}

async fn preflight_bind_listener(addr: SocketAddr) -> Result<tokio::net::TcpListener> {
    tracing::info!(%addr, "preflight bind check starting");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("preflight bind failed for {addr}: {e}"))?;
    tracing::info!(%addr, "preflight bind check passed");
    Ok(listener)
}

fn request_id_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "missing".to_string())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(sig) => sig,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler; falling back to ctrl_c only");
                if let Err(ctrlc_err) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %ctrlc_err, "failed to await ctrl-c signal");
                }
                shutdown.cancel();
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("received ctrl-c; beginning graceful shutdown");
            }
            _ = terminate.recv() => {
                tracing::warn!("received SIGTERM; beginning graceful shutdown");
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to await ctrl-c signal");
        } else {
            tracing::warn!("received ctrl-c; beginning graceful shutdown");
        }
    }
    shutdown.cancel();
}
