//! Runtime abstraction for background work
//!
//! Tile downloads run as spawned tasks while the host thread stays
//! synchronous. Spawning goes through [`AsyncSpawner`] so an embedding
//! application can route tasks onto its own executor with [`init_runtime`].

use crate::prelude::{Future, Pin};

/// A trait for spawning async tasks (object-safe version).
///
/// Spawned work is detached: tasks run to completion and report back
/// through their own channels.
pub trait AsyncSpawner: Send + Sync + 'static {
    fn spawn_boxed(&self, future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>);
}

/// Spawns a detached future on the installed runtime
pub fn spawn<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    runtime().spawn_boxed(Box::pin(future))
}

pub mod spawners {
    use super::*;
    use once_cell::sync::Lazy;
    use tokio::runtime::{Handle, Runtime};

    /// Fallback runtime for hosts that call in from plain threads
    static FALLBACK: Lazy<Runtime> = Lazy::new(|| {
        tokio::runtime::Builder::new_multi_thread()
            .thread_name("tileview-worker")
            .enable_all()
            .build()
            .expect("failed to build tokio runtime")
    });

    /// Tokio-based async spawner.
    ///
    /// Uses the ambient runtime when called from inside one, otherwise a
    /// lazily started multi-threaded runtime owned by the library.
    pub struct TokioSpawner;

    impl TokioSpawner {
        fn handle() -> Handle {
            Handle::try_current().unwrap_or_else(|_| {
                log::trace!("no ambient tokio runtime, using the fallback runtime");
                FALLBACK.handle().clone()
            })
        }
    }

    impl AsyncSpawner for TokioSpawner {
        fn spawn_boxed(&self, future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>) {
            Self::handle().spawn(future);
        }
    }
}

/// Global runtime instance
static RUNTIME: std::sync::OnceLock<Box<dyn AsyncSpawner>> = std::sync::OnceLock::new();

/// Install a spawner. Only the first call takes effect.
pub fn init_runtime(spawner: Box<dyn AsyncSpawner>) {
    if RUNTIME.set(spawner).is_err() {
        log::warn!("runtime already initialized, ignoring replacement spawner");
    }
}

/// Get the global runtime spawner
pub fn runtime() -> &'static dyn AsyncSpawner {
    RUNTIME
        .get_or_init(|| Box::new(spawners::TokioSpawner))
        .as_ref()
}
