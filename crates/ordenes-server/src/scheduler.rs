//! Periodic SLA timer task.

use std::sync::Arc;
use std::time::Duration;

use ordenes_core::error::OrdenesError;
use ordenes_core::timer::SlaTimer;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Handle to the running periodic timer.
pub struct TimerHandle {
    shutdown: Arc<watch::Sender<bool>>,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Ask the loop to stop and wait for it. A tick already running is
    /// finished first.
    pub async fn stop(self) {
        self.shutdown.send_replace(true);
        if let Err(e) = self.task.await {
            tracing::error!("timer task ended abnormally: {e}");
        }
    }
}

/// Spawn the periodic loop, ticking every `timer.config().interval()`.
///
/// The loop ends as soon as `shutdown` turns `true`, whoever flips it.
/// Ticks are skipped while the timer is configured inactive or a manual tick
/// is running. A changed `n_seg` re-arms the interval at the next wakeup.
/// Must be called inside a tokio runtime.
pub fn spawn(
    timer: Arc<SlaTimer>,
    event_tx: broadcast::Sender<()>,
    shutdown: Arc<watch::Sender<bool>>,
) -> TimerHandle {
    let rx = shutdown.subscribe();
    let task = tokio::spawn(run(timer, event_tx, rx));
    TimerHandle { shutdown, task }
}

/// An interval whose first tick is one full `period` from now.
fn interval(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

async fn run(
    timer: Arc<SlaTimer>,
    event_tx: broadcast::Sender<()>,
    mut shutdown: watch::Receiver<bool>,
) {
    let cfg = timer.config();
    let mut period = cfg.interval();
    let mut ticker = interval(period);
    tracing::info!(
        n_seg = cfg.n_seg,
        sla_seg = cfg.sla_seg,
        active = cfg.active,
        "SLA timer started"
    );

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
        }

        let cfg = timer.config();
        if cfg.interval() != period {
            period = cfg.interval();
            ticker = interval(period);
            tracing::info!(n_seg = cfg.n_seg, "SLA timer interval changed");
            continue;
        }
        if !cfg.active {
            continue;
        }

        let t = Arc::clone(&timer);
        match tokio::task::spawn_blocking(move || t.tick()).await {
            Ok(Ok(report)) => {
                if report.changed_anything() {
                    let _ = event_tx.send(());
                }
            }
            Ok(Err(OrdenesError::TickInProgress)) => {
                tracing::debug!("periodic tick skipped: manual tick running");
            }
            Ok(Err(e)) => tracing::error!("periodic tick failed: {e}"),
            Err(e) => tracing::error!("periodic tick panicked: {e}"),
        }
    }

    tracing::info!("SLA timer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ordenes_core::area::NewArea;
    use ordenes_core::config::TimerConfig;
    use ordenes_core::engine::{Engine, TransitionRequest};
    use ordenes_core::order::NewOrder;
    use ordenes_core::types::PartialState;
    use tempfile::TempDir;

    fn timer_with_running_area(dir: &TempDir, active: bool) -> (Arc<SlaTimer>, u64, u64) {
        let engine = Arc::new(Engine::open(&dir.path().join("sched.redb")).unwrap());
        let now = Utc::now();
        let area = engine
            .store()
            .create_area(
                &NewArea {
                    name: "Redes".into(),
                    responsible: "Marta".into(),
                    contact: None,
                },
                now,
            )
            .unwrap();
        let order = engine
            .create_order(
                NewOrder {
                    title: "Switch down".into(),
                    description: "Core switch in rack 2 is down".into(),
                    creator: "ops".into(),
                    area_ids: vec![area.id],
                    ..Default::default()
                },
                now,
            )
            .unwrap();
        engine
            .apply_transition(
                &TransitionRequest::new(order.id, area.id, PartialState::InProgress),
                now - chrono::Duration::seconds(30),
            )
            .unwrap();
        let timer = Arc::new(SlaTimer::new(
            engine,
            TimerConfig {
                n_seg: 1,
                sla_seg: 5,
                active,
            },
        ));
        (timer, order.id, area.id)
    }

    fn shutdown_flag() -> Arc<watch::Sender<bool>> {
        Arc::new(watch::channel(false).0)
    }

    fn area_state(timer: &SlaTimer, order_id: u64, area_id: u64) -> PartialState {
        let order = timer.engine().store().get_order(order_id).unwrap();
        order.area(area_id).unwrap().state
    }

    #[tokio::test]
    async fn periodic_tick_times_out_and_notifies() {
        let dir = TempDir::new().unwrap();
        let (timer, order_id, area_id) = timer_with_running_area(&dir, true);
        let (tx, mut rx) = broadcast::channel(8);

        let handle = spawn(Arc::clone(&timer), tx, shutdown_flag());
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no update within 5s")
            .unwrap();
        handle.stop().await;

        assert_eq!(area_state(&timer, order_id, area_id), PartialState::Overdue);
    }

    #[tokio::test]
    async fn inactive_timer_does_not_scan() {
        let dir = TempDir::new().unwrap();
        let (timer, order_id, area_id) = timer_with_running_area(&dir, false);
        let (tx, _rx) = broadcast::channel(8);

        let handle = spawn(Arc::clone(&timer), tx, shutdown_flag());
        tokio::time::sleep(Duration::from_millis(1500)).await;
        handle.stop().await;

        assert_eq!(area_state(&timer, order_id, area_id), PartialState::InProgress);
    }

    #[tokio::test]
    async fn shared_flag_stops_the_loop() {
        let dir = TempDir::new().unwrap();
        let (timer, order_id, area_id) = timer_with_running_area(&dir, true);
        let (tx, _rx) = broadcast::channel(8);
        let flag = shutdown_flag();

        let handle = spawn(Arc::clone(&timer), tx, Arc::clone(&flag));
        flag.send_replace(true);
        tokio::time::timeout(Duration::from_secs(1), handle.task)
            .await
            .expect("timer did not stop")
            .unwrap();

        // Stopped before its first period elapsed.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(area_state(&timer, order_id, area_id), PartialState::InProgress);
    }

    #[tokio::test]
    async fn changed_interval_rearms_the_loop() {
        let dir = TempDir::new().unwrap();
        let (timer, order_id, area_id) = timer_with_running_area(&dir, false);
        let (tx, _rx) = broadcast::channel(8);

        let handle = spawn(Arc::clone(&timer), tx, shutdown_flag());
        tokio::time::sleep(Duration::from_millis(300)).await;
        timer.set_config(TimerConfig {
            n_seg: 3600,
            sla_seg: 5,
            active: true,
        });

        // The 1s wakeup sees the new period and waits an hour instead of scanning.
        tokio::time::sleep(Duration::from_millis(2500)).await;
        handle.stop().await;
        assert_eq!(area_state(&timer, order_id, area_id), PartialState::InProgress);
    }
}
