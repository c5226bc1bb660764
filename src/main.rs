use std::sync::Arc;

use anyhow::Context;

use lead_bot::channels::{Channel, PollingChannel, TelegramApi, WebhookChannel};
use lead_bot::config::{BotConfig, DeliveryMode};
use lead_bot::dispatcher::Dispatcher;
use lead_bot::flow::{LeadFlow, Menu};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export BOT_TOKEN=123456:ABC... ADMIN_CHAT_ID=...");
        std::process::exit(1);
    });

    let api = TelegramApi::new(config.token.clone());
    let me = api
        .get_me()
        .await
        .context("Bot API rejected the token (getMe failed)")?;

    eprintln!("🤖 Lead Bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Bot: @{}",
        me.username.as_deref().unwrap_or("<no username>")
    );
    eprintln!("   Admin chat: {}", config.admin_chat_id);

    let flow = LeadFlow::new(Menu::default(), config.channel_url.clone());
    let dispatcher = Dispatcher::new(flow, Arc::new(api.clone()), config.admin_chat_id);

    match config.mode {
        DeliveryMode::Polling => {
            eprintln!("   Mode: polling\n");
            let channel = PollingChannel::new(api);
            let events = channel.start().await?;

            tokio::select! {
                _ = dispatcher.run(events) => {}
                _ = shutdown_signal() => {}
            }
            channel.shutdown().await?;
        }
        DeliveryMode::Webhook(webhook) => {
            eprintln!("   Mode: webhook");
            eprintln!("   Listening: http://0.0.0.0:{}\n", webhook.port);

            let port = webhook.port;
            let channel = WebhookChannel::new(api, webhook);
            let app = channel.router();

            // Bind before registering so Telegram never calls a dead port.
            let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
                .await
                .with_context(|| format!("Failed to bind webhook port {port}"))?;
            let events = channel.start().await?;

            let server = tokio::spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown_signal())
                    .await
            });
            let pump = {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move { dispatcher.run(events).await })
            };

            let served = server.await.context("Webhook server task panicked")?;
            tracing::info!("Webhook server stopped");
            if let Err(e) = channel.shutdown().await {
                tracing::warn!("Failed to remove webhook: {e}");
            }
            pump.abort();
            served.context("Webhook server failed")?;
        }
    }

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
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
