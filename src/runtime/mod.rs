//! Runtime adapters for launching scheduled tasks.

use std::future::Future;

pub mod tokio_spawner;

pub use tokio_spawner::TokioSpawner;

/// Abstraction for spawning task execution on a runtime.
pub trait Spawn {
    /// Spawn a future that runs independently of the caller.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
