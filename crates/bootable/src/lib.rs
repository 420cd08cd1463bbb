//! Lifecycle interface shared by the long-running services.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::error::Error;

use async_trait::async_trait;

/// Marker trait for errors returned by bootable services.
pub trait BootableError: Error + Send + Sync + 'static {}

/// A service that is started once, runs background tasks, and is shut down
/// before the process exits.
#[async_trait]
pub trait Bootable
where
    Self: Send + Sync + 'static,
{
    /// The error type for the service.
    type Error: BootableError;

    /// Name used in log lines.
    fn name(&self) -> &str;

    /// Start the service.
    ///
    /// Starting twice is an error, and a failure here should abort startup.
    async fn start(&self) -> Result<(), Self::Error>;

    /// Stop the service and wait for its background tasks to finish.
    async fn shutdown(&self) -> Result<(), Self::Error>;

    /// Wait until the service's background tasks have exited.
    async fn wait(&self);
}
