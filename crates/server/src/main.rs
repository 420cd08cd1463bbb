//! Runs the session event service: the router, the optional cross-instance
//! replication bridge and the HTTP surface.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod replication;

use replication::Replication;

use std::net::SocketAddr;
use std::time::Duration;

use airsync_bootable::Bootable;
use airsync_http::{CleanupOptions, CleanupService, HttpContext, HttpOptions, HttpServer};
use airsync_pubsub::Publisher;
use airsync_repository::MemorySessionRepository;
use airsync_router::{RouterOptions, SessionEventRouter};
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error(transparent)]
    Broker(#[from] airsync_broker::Error),

    #[error(transparent)]
    Http(#[from] airsync_http::Error),

    #[error(transparent)]
    Nats(#[from] airsync_broker_nats::Error),

    #[error(transparent)]
    Redis(#[from] airsync_broker_redis::Error),

    #[error(transparent)]
    Router(#[from] airsync_router::Error),
}

/// Which broker replicates events between instances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum BrokerKind {
    /// Single instance, nothing is replicated.
    #[default]
    None,
    /// In-process hub, useful for trying the bridge locally.
    Memory,
    Redis,
    Nats,
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "0.0.0.0:8080", env = "AIRSYNC_LISTEN_ADDR")]
    listen_addr: SocketAddr,

    #[arg(long, value_enum, default_value_t = BrokerKind::None, env = "AIRSYNC_BROKER")]
    broker: BrokerKind,

    #[arg(long, default_value = "redis://127.0.0.1:6379", env = "AIRSYNC_REDIS_URL")]
    redis_url: String,

    #[arg(long, default_value = "session", env = "AIRSYNC_REDIS_CHANNEL")]
    redis_channel: String,

    #[arg(long, default_value = "nats://127.0.0.1:4222", env = "AIRSYNC_NATS_URL")]
    nats_url: String,

    #[arg(long, default_value = "session", env = "AIRSYNC_NATS_SUBJECT")]
    nats_subject: String,

    /// Seconds a deleted session's topic stays open.
    #[arg(long, default_value_t = 30, env = "AIRSYNC_GRACE_PERIOD_SECS")]
    grace_period_secs: u64,

    /// Queue length of every subscriber.
    #[arg(long, default_value_t = airsync_pubsub::DEFAULT_QUEUE_CAPACITY, env = "AIRSYNC_SUBSCRIBER_CAPACITY")]
    subscriber_capacity: usize,

    #[arg(long, default_value_t = 30, env = "AIRSYNC_HEARTBEAT_SECS")]
    heartbeat_secs: u64,

    #[arg(long, default_value_t = 30, env = "AIRSYNC_POLL_TIMEOUT_SECS")]
    poll_timeout_secs: u64,

    /// Minimum seconds between two cleanup runs.
    #[arg(long, default_value_t = 3600, env = "AIRSYNC_CLEANUP_INTERVAL_SECS")]
    cleanup_interval_secs: u64,

    /// Sessions older than this are removed by cleanup.
    #[arg(long, default_value_t = 86_400, env = "AIRSYNC_SESSION_MAX_AGE_SECS")]
    session_max_age_secs: u64,

    #[arg(long, env = "AIRSYNC_ENABLE_CORS")]
    enable_cors: bool,
}

impl Args {
    const fn router_options(&self) -> RouterOptions {
        RouterOptions {
            grace_period: Duration::from_secs(self.grace_period_secs),
        }
    }

    const fn http_options(&self) -> HttpOptions {
        HttpOptions {
            heartbeat: Duration::from_secs(self.heartbeat_secs),
            poll_timeout: Duration::from_secs(self.poll_timeout_secs),
            enable_cors: self.enable_cors,
        }
    }

    const fn cleanup_options(&self) -> CleanupOptions {
        CleanupOptions {
            interval: Duration::from_secs(self.cleanup_interval_secs),
            max_age: Duration::from_secs(self.session_max_age_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let publisher = Publisher::new(args.subscriber_capacity);
    let replication = Replication::connect(&args, publisher.clone()).await?;
    let events =
        SessionEventRouter::with_replication(publisher.clone(), replication, args.router_options());
    events.start().await?;

    let repository = MemorySessionRepository::new();
    let cleanup = CleanupService::new(repository.clone(), publisher.clone(), args.cleanup_options());
    let context = HttpContext::new(repository, publisher, cleanup, args.http_options());
    let shutdown_token = context.shutdown_token.clone();

    let http_server = HttpServer::new(
        args.listen_addr,
        airsync_http::router(context),
        shutdown_token.clone(),
    );

    if let Err(e) = http_server.start().await {
        error!("failed to start http server: {e}");
        events.shutdown().await?;
        return Err(e.into());
    }

    let signal_shutdown_token = shutdown_token.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sigterm = signal(SignalKind::terminate()).expect("SIGTERM handler failed");
            let mut sigint = signal(SignalKind::interrupt()).expect("SIGINT handler failed");

            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM"),
                _ = sigint.recv() => info!("Received SIGINT"),
            }
        }

        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received Ctrl-C");
        }

        signal_shutdown_token.cancel();
    });

    tokio::select! {
        () = shutdown_token.cancelled() => {}
        () = http_server.wait() => error!("http server stopped unexpectedly"),
    }

    info!("shutting down...");

    let http_result = http_server.shutdown().await;
    events.shutdown().await?;
    http_result?;

    info!("shutdown complete");

    Ok(())
}
