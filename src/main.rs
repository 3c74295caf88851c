use anyhow::{Result, anyhow};
use legal_console::build_router;
use legal_console::config::Config;
use legal_console::logger::{Logger, log_error};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::SmartIpKeyExtractor;

#[tokio::main]
async fn main() -> Result<()> {
    let logger = Logger::for_local_host();
    let config = match Config::load() {
        Ok(config) => Arc::new(config),
        Err(error) => {
            log_error(&logger, "config.invalid", &error);
            return Err(error);
        }
    };

    if std::env::args().any(|arg| arg == "--config-check") {
        logger.info(
            "config.check_passed",
            json!({
                "port": config.port,
                "maxSessions": config.max_sessions,
                "sessionTtlSeconds": config.session_ttl.as_secs(),
                "demoEnabled": config.demo.enabled,
                "allowedOrigins": config.allowed_origins,
                "allowAllOrigins": config.allow_all_origins,
            }),
        );
        return Ok(());
    }

    let governor_config = GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(30)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limiter config"))?;

    let app = build_router(config.clone(), logger.clone())?.layer(GovernorLayer::new(governor_config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    logger.info(
        "server.started",
        json!({ "port": config.port, "maxSessions": config.max_sessions }),
    );

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal(logger.clone()))
        .await?;

    logger.info("server.stopped", json!({}));
    Ok(())
}

async fn shutdown_signal(logger: Logger) {
    let _ = signal::ctrl_c().await;
    logger.info("shutdown.ctrl_c", json!({ "message": "Received Ctrl+C" }));
}
