// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `opsdesk serve`: wire storage, flows, and the Telegram dispatcher.

use std::sync::Arc;
use std::time::Duration;

use opsdesk_config::OpsdeskConfig;
use opsdesk_core::types::ChatId;
use opsdesk_core::{SupportError, SupportGateway};
use opsdesk_engine::{
    ConversationFlow, OperatorFlow, RoutingService, SessionStore, TicketLifecycle, WorkingHours,
};
use opsdesk_storage::Database;
use opsdesk_telegram::TelegramGateway;
use opsdesk_telegram::dispatch::{self, AppContext};
use tracing::{error, info, warn};

use crate::seed;

pub async fn run(config: OpsdeskConfig) -> Result<(), SupportError> {
    let token = config
        .telegram
        .bot_token
        .clone()
        .ok_or_else(|| SupportError::Config("telegram.bot_token is required for serve".into()))?;
    let support_channel = config.telegram.support_channel_id.ok_or_else(|| {
        SupportError::Config("telegram.support_channel_id is required for serve".into())
    })?;
    if config.telegram.operators.is_empty() {
        warn!("telegram.operators is empty; nobody will be able to take tickets");
    }

    info!(
        database = %config.storage.database_path,
        support_channel,
        operators = config.telegram.operators.len(),
        "starting opsdesk"
    );

    let db = Arc::new(Database::open(&config.storage.database_path, config.storage.wal_mode).await?);
    seed::ensure_default(&db).await?;

    let sessions = Arc::new(SessionStore::new());
    spawn_session_sweeper(sessions.clone(), config.session.idle_timeout_secs);

    if config.health.port > 0 {
        spawn_health_server(config.health.port).await?;
    }

    let gateway = Arc::new(TelegramGateway::new(&token)?);
    let bot = gateway.bot().clone();
    let gateway: Arc<dyn SupportGateway> = gateway;

    let lifecycle = Arc::new(TicketLifecycle::new(db.clone()));
    let routing = Arc::new(RoutingService::new(
        db.clone(),
        gateway,
        ChatId(support_channel),
    ));
    let hours = WorkingHours::new(
        config.hours.start,
        config.hours.end,
        config.hours.days.clone(),
        config.hours.utc_offset_minutes,
    );
    let conversation = Arc::new(ConversationFlow::new(
        db.clone(),
        sessions.clone(),
        lifecycle.clone(),
        routing.clone(),
        hours,
    ));
    let operator = Arc::new(OperatorFlow::new(
        db.clone(),
        sessions,
        lifecycle,
        routing,
        config.telegram.operators.clone(),
    ));

    let ctx = Arc::new(AppContext {
        conversation,
        operator,
        support_channel: ChatId(support_channel),
    });

    dispatch::run(bot, ctx).await;

    info!("shutting down");
    db.close().await
}

/// Abandoned sessions are dropped after a bounded idle period to bound
/// memory; nothing functional depends on the sweep cadence.
fn spawn_session_sweeper(sessions: Arc<SessionStore>, idle_timeout_secs: u64) {
    let max_idle = Duration::from_secs(idle_timeout_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            sessions.expire_idle(max_idle);
        }
    });
}

/// Liveness endpoint: GET /healthz answers 200 with no payload.
async fn spawn_health_server(port: u16) -> Result<(), SupportError> {
    let app = axum::Router::new().route("/healthz", axum::routing::get(|| async {}));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| SupportError::Config(format!("health port {port} unavailable: {e}")))?;
    info!(port, "liveness endpoint listening");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "liveness endpoint failed");
        }
    });
    Ok(())
}
