use crate::error::Error;

use std::net::SocketAddr;

use airsync_bootable::Bootable;
use async_trait::async_trait;
use axum::Router;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

/// Serves a router until shut down.
pub struct HttpServer {
    listen_addr: SocketAddr,
    router: Mutex<Option<Router>>,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl HttpServer {
    /// Creates a server for `router`. `shutdown_token` is cancelled on
    /// shutdown, so it should be the token streaming handlers watch.
    #[must_use]
    pub fn new(listen_addr: SocketAddr, router: Router, shutdown_token: CancellationToken) -> Self {
        Self {
            listen_addr,
            router: Mutex::new(Some(router)),
            shutdown_token,
            task_tracker: TaskTracker::new(),
        }
    }
}

#[async_trait]
impl Bootable for HttpServer {
    type Error = Error;

    fn name(&self) -> &'static str {
        "http"
    }

    async fn start(&self) -> Result<(), Error> {
        let Some(router) = self.router.lock().take() else {
            return Err(Error::AlreadyStarted);
        };

        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(Error::Bind)?;
        info!("http server listening on {}", self.listen_addr);

        let shutdown_token = self.shutdown_token.clone();
        self.task_tracker.spawn(async move {
            let result = axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(shutdown_token.cancelled_owned())
                .await;

            if let Err(e) = result {
                error!("http server exited: {e}");
            }
        });

        self.task_tracker.close();

        Ok(())
    }

    async fn shutdown(&self) -> Result<(), Error> {
        info!("http server shutting down...");

        self.shutdown_token.cancel();
        self.task_tracker.wait().await;

        info!("http server shutdown");

        Ok(())
    }

    async fn wait(&self) {
        self.task_tracker.wait().await;
    }
}
