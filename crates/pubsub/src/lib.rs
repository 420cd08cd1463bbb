//! In-process publish/subscribe over named topics.
//!
//! A [`Publisher`] is the registry that owns every [`Topic`]. Topics are
//! created lazily the first time they are looked up and removed again when
//! they are closed. Each [`Subscriber`] owns a small bounded queue. Publishing
//! never waits on a slow consumer: when a subscriber's queue is full the value
//! is dropped for that subscriber only.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod publisher;
mod subscriber;
mod topic;

pub use publisher::Publisher;
pub use subscriber::Subscriber;
pub use topic::Topic;

/// Queue capacity used by [`Publisher::default`].
pub const DEFAULT_QUEUE_CAPACITY: usize = 1;
