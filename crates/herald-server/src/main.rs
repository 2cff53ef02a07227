mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use herald_api::{AppStateInner, AuthSettings, WebhookSettings};
use herald_broadcast::{
    Dispatcher, FixedInterval, IngressAdapter, Pacer, RecipientStore, TokenBucket,
};
use herald_db::Database;
use herald_telegram::{BotApi, BotCommands, BotTexts};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "herald=debug,herald_broadcast=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    let db = Arc::new(Database::open(&PathBuf::from(&config.db_path))?);
    let recipients = RecipientStore::count(db.as_ref())?;
    info!(path = %config.db_path, recipients, "Database ready");

    let bot = Arc::new(BotApi::new(&config.telegram_api_url, &config.telegram_token)?);

    let pacer: Arc<dyn Pacer> = match config.broadcast_rate {
        Some(rate) => {
            info!(rate, "Pacing broadcasts with a token bucket");
            Arc::new(TokenBucket::per_second(rate))
        }
        None => Arc::new(FixedInterval::new(config.broadcast_interval)),
    };

    let dispatcher = if config.exclusive_broadcasts {
        Dispatcher::exclusive(db.clone(), db.clone(), bot.clone(), pacer)
    } else {
        Dispatcher::new(db.clone(), db.clone(), bot.clone(), pacer)
    };
    info!(exclusive = dispatcher.is_exclusive(), "Dispatcher ready");

    let commands = Arc::new(BotCommands::new(bot.clone(), BotTexts::default()));
    let ingress = IngressAdapter::new(db.clone(), commands);

    let webhook = WebhookSettings {
        public_url: config.webhook_url.clone(),
        secret: config.webhook_secret.clone(),
    };

    if let Some(endpoint) = webhook.endpoint() {
        match bot.set_webhook(&endpoint, webhook.secret.as_deref()).await {
            Ok(()) => info!(url = %endpoint, "Webhook registered"),
            Err(e) => warn!(error = %e, "Failed to register webhook at startup"),
        }
    }

    let state = Arc::new(AppStateInner {
        db,
        dispatcher,
        ingress,
        bot,
        auth: AuthSettings {
            password_hash: herald_api::auth::hash_password(&config.admin_password)?,
            jwt_secret: config.secret_key.clone(),
            token_ttl: config.token_ttl,
        },
        webhook,
    });

    let app = herald_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Herald listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    warn!(error = %e, "Failed to install SIGTERM handler");
                    ctrl_c.await.ok();
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
