use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use super::facade::CommandCenter;
use tracing::{debug, error, info};

/// Periodic background activity. Each loop runs its ticks one at a time and
/// drops ticks it missed.
pub struct Scheduler {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn start(center: Arc<CommandCenter>, cancel: CancellationToken) -> Self {
        let schedule = center.config().schedule.clone();
        let mut handles = Vec::new();

        let c = center.clone();
        handles.push(spawn_tick("health", secs(schedule.health_secs), cancel.clone(), move || {
            let c = c.clone();
            async move {
                let readings = c.registry().health_tick().await;
                let unhealthy = readings.iter().filter(|r| !r.healthy).count();
                debug!(agents = readings.len(), unhealthy, "Health tick");
            }
        }));

        let c = center.clone();
        let period = secs(schedule.performance_secs);
        handles.push(spawn_tick("performance", period, cancel.clone(), move || {
            let c = c.clone();
            async move {
                c.registry().performance_tick(period).await;
            }
        }));

        let c = center.clone();
        handles.push(spawn_tick("connectivity", secs(schedule.connectivity_secs), cancel.clone(), move || {
            let c = c.clone();
            async move {
                c.broker().probe_connectivity().await;
            }
        }));

        let c = center.clone();
        handles.push(spawn_tick("metrics", secs(schedule.metrics_secs), cancel.clone(), move || {
            let c = c.clone();
            async move {
                c.recompute_metrics(Utc::now().date_naive()).await;
            }
        }));

        let c = center.clone();
        handles.push(spawn_tick("velocity", secs(schedule.velocity_secs), cancel.clone(), move || {
            let c = c.clone();
            async move {
                c.compute_velocity(Utc::now()).await;
            }
        }));

        let c = center;
        handles.push(spawn_tick("status", secs(schedule.status_broadcast_secs), cancel.clone(), move || {
            let c = c.clone();
            async move {
                c.broadcast_status().await;
            }
        }));

        info!(loops = handles.len(), "Background ticks started");
        Self { cancel, handles }
    }

    /// Stop every loop and wait for in-flight ticks to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.handles {
            let _ = handle.await;
        }
        info!("Background ticks stopped");
    }
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n.max(1))
}

/// Run `tick` every `period` until cancelled. A panicking tick is logged and
/// the loop carries on.
fn spawn_tick<F, Fut>(
    name: &'static str,
    period: Duration,
    cancel: CancellationToken,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = tokio::spawn(tick()).await {
                        error!(tick = name, error = %e, "Tick failed");
                    }
                }
            }
        }
        debug!(tick = name, "Tick loop stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use crate::config::CenterConfig;
    use crate::simulation::ScriptedPolicy;

    #[tokio::test(start_paused = true)]
    async fn test_tick_runs_until_cancelled() {
        let count = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let c = count.clone();
        let handle = spawn_tick("test", Duration::from_secs(1), cancel.clone(), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(3500)).await;
        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_tick_keeps_loop_alive() {
        let count = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let c = count.clone();
        let handle = spawn_tick("flaky", Duration::from_secs(1), cancel.clone(), move || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    panic!("first tick fails");
                }
            }
        });

        tokio::time::sleep(Duration::from_millis(2500)).await;
        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_publishes_status() {
        let mut config = CenterConfig::default();
        config.executor.enabled = false;
        config.simulation.time_scale = 0.0;
        let center = Arc::new(
            CommandCenter::builder(config)
                .policy(Arc::new(ScriptedPolicy::passing()))
                .build()
                .await
                .unwrap(),
        );
        let mut rx = center.subscribe();
        let scheduler = Scheduler::start(center, CancellationToken::new());

        tokio::time::sleep(Duration::from_secs(11)).await;
        scheduler.shutdown().await;

        let mut names = Vec::new();
        while let Ok(event) = rx.try_recv() {
            names.push(event.name());
        }
        assert!(names.contains(&"project-status"));
        assert!(names.contains(&"metric-updated"));
        assert!(names.contains(&"blockers-detected"));
        assert!(!names.contains(&"health-warning"));
    }
}
