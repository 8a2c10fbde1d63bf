use std::path::Path;
use std::sync::Arc;

use ordenes_core::config::Config;
use ordenes_core::engine::Engine;
use ordenes_core::timer::SlaTimer;
use tokio::sync::{broadcast, watch};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub timer: Arc<SlaTimer>,
    pub config: Arc<Config>,
    /// Fired after every committed mutation and every tick that changed data.
    pub event_tx: broadcast::Sender<()>,
    /// Flipped to `true` once when the server starts shutting down. The
    /// periodic timer and open SSE streams end on it.
    pub shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    pub fn new(engine: Arc<Engine>, config: Config) -> Self {
        let (tx, _) = broadcast::channel(64);
        let timer = Arc::new(SlaTimer::new(Arc::clone(&engine), config.timer.clone()));
        Self {
            engine,
            timer,
            config: Arc::new(config),
            event_tx: tx,
            shutdown: Arc::new(watch::channel(false).0),
        }
    }

    /// Open the database under `root` and build the state around it.
    pub fn open(root: &Path, config: Config) -> anyhow::Result<Self> {
        let engine = Engine::open(&ordenes_core::paths::db_path(root))?;
        Ok(Self::new(Arc::new(engine), config))
    }

    /// Tell SSE subscribers that something changed. No subscribers is fine.
    pub fn notify(&self) {
        let _ = self.event_tx.send(());
    }

    /// Start shutting down. Safe to call more than once.
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// A future that resolves once shutdown has been requested, including
    /// when that already happened.
    pub fn shutdown_requested(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.shutdown.subscribe();
        async move {
            while !*rx.borrow_and_update() {
                if rx.changed().await.is_err() {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_database_and_shares_config() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.timer.sla_seg = 900;
        let state = AppState::open(dir.path(), config).unwrap();
        assert!(ordenes_core::paths::db_path(dir.path()).exists());
        assert_eq!(state.timer.config().sla_seg, 900);
        assert_eq!(state.config.timer.sla_seg, 900);
    }

    #[test]
    fn notify_without_subscribers_is_harmless() {
        let dir = TempDir::new().unwrap();
        let state = AppState::open(dir.path(), Config::default()).unwrap();
        state.notify();
        let mut rx = state.event_tx.subscribe();
        state.notify();
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn shutdown_is_seen_by_late_and_early_waiters() {
        let dir = TempDir::new().unwrap();
        let state = AppState::open(dir.path(), Config::default()).unwrap();
        assert!(!state.is_shutting_down());

        let early = tokio::spawn(state.shutdown_requested());
        state.request_shutdown();
        state.request_shutdown();
        tokio::time::timeout(std::time::Duration::from_secs(1), early)
            .await
            .expect("early waiter not woken")
            .unwrap();

        assert!(state.is_shutting_down());
        tokio::time::timeout(std::time::Duration::from_secs(1), state.shutdown_requested())
            .await
            .expect("late waiter not resolved");
    }
}
