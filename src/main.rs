#![deny(unused)]
//! Webs - conversational gateway
//!
//! Answers identity questions locally, serves repeated questions from a
//! response cache, and otherwise walks an ordered chain of text-generation
//! providers until one replies.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use webs_core::config::AppConfig;
use webs_core::traits::SessionStore;
use webs_gateway::{
    spawn_cache_sweeper, ChatOrchestrator, GatewayConfig, GatewayServer, InMemoryResponseCache,
    PhraseIntentMatcher,
};
use webs_model_gateway::{FallbackChain, ProviderTable};
use webs_store::{spawn_pruner, InMemorySessionStore, RetentionPolicy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real environment variables win.
    let dotenv = dotenvy::dotenv();

    let config = AppConfig::load()?;
    config.validate()?;

    webs_governance::configure_tracing(config.observability.json_logs)?;

    tracing::info!("Starting Webs v{}", env!("CARGO_PKG_VERSION"));
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    // =========================================================================
    // Providers
    // =========================================================================
    let providers_path = std::path::Path::new("providers.json");
    let definitions = if providers_path.exists() {
        tracing::info!("Loading provider table from providers.json");
        match ProviderTable::load(providers_path).await {
            Ok(table) => table.providers,
            Err(e) => {
                tracing::error!("Failed to load providers.json: {}. Using configured providers.", e);
                config.model_gateway.providers.clone()
            }
        }
    } else {
        config.model_gateway.providers.clone()
    };

    let providers = FallbackChain::from_definitions(&definitions, &config.model_gateway.provider_order)?;
    if providers.is_empty() {
        tracing::warn!("No providers available; every non-cached question will get the degraded reply");
    }

    // =========================================================================
    // Session store & cache
    // =========================================================================
    let sessions: Arc<dyn SessionStore> = Arc::new(
        InMemorySessionStore::new().with_history_cap(config.session.max_history_turns),
    );
    let cache = Arc::new(InMemoryResponseCache::from_config(&config.cache));
    let matcher = Arc::new(PhraseIntentMatcher::from_config(&config.identity));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let policy = RetentionPolicy {
        max_idle: Duration::from_secs(config.session.idle_ttl_secs),
        interval: Duration::from_secs(config.session.prune_interval_secs.max(1)),
    };
    let pruner = spawn_pruner(sessions.clone(), policy, shutdown_rx.clone());

    let sweeper = config.cache.ttl_secs.map(|_| {
        spawn_cache_sweeper(
            cache.clone(),
            Duration::from_secs(config.cache.cleanup_interval_secs),
            shutdown_rx,
        )
    });

    // =========================================================================
    // Gateway
    // =========================================================================
    let orchestrator = ChatOrchestrator::builder()
        .with_config(&config)
        .with_session_store(sessions)
        .with_cache(cache)
        .with_matcher(matcher)
        .with_providers(providers)
        .build();

    let gateway_config = GatewayConfig::from(&config.server);
    let mut server = GatewayServer::new(gateway_config.clone(), orchestrator);

    if config.observability.metrics {
        server = server.with_metrics(webs_governance::setup_metrics_recorder()?);
    }

    println!();
    println!("  Webs v{}", env!("CARGO_PKG_VERSION"));
    println!("    POST /api/chat   - Chat ({{message, sessionId}} -> {{reply}})");
    println!("    GET  /health     - Health check");
    println!("    GET  /v1/doctor  - Provider connectivity");
    println!("  Server: http://{}:{}", gateway_config.host, gateway_config.port);
    println!();

    server.run_until(shutdown_signal()).await?;

    if shutdown_tx.send(true).is_err() {
        tracing::debug!("Background tasks already stopped");
    }
    if let Err(e) = pruner.await {
        tracing::warn!(error = %e, "Session pruner ended abnormally");
    }
    if let Some(sweeper) = sweeper {
        if let Err(e) = sweeper.await {
            tracing::warn!(error = %e, "Cache sweeper ended abnormally");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
