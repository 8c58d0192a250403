//! Read paths over a CTFd challenge catalog.
//!
//! [`ChallengesDataSource`] builds a full [`Snapshot`](ctfsync_core::Snapshot)
//! and [`ChallengeResource`] reads a single challenge; both go through the
//! same [`hydrate`] routine.

pub mod config;
pub mod context;
pub mod hydrate;
pub mod resource;
pub mod snapshot;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, ProviderConfig};
pub use context::{CancelHandle, ReadContext};
pub use hydrate::{Hydration, hydrate};
pub use resource::{ChallengeRead, ChallengeResource};
pub use snapshot::{ChallengesDataSource, ConfigureError, SnapshotRead};
