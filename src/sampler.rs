//! Periodic sampler.
//!
//! Every tick queries the provider for each metric category independently,
//! builds one [`Snapshot`] and hands it to the dashboard task. Provider calls
//! run on the blocking pool, so nothing that owns view state ever waits on
//! the operating system.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use crate::error::{MetricError, MetricKind};
use crate::model::{ProcessRow, ProcessTable, Snapshot, SystemStats};
use crate::provider::MetricsProvider;
use crate::shutdown::Phase;

/// Fixed sampling cadence.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Ordering applied to process rows before publishing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProcessOrder {
    /// Ascending PID; stable across ticks.
    #[default]
    Pid,
    /// Whatever order the provider returned.
    Acquisition,
}

/// Remembers which categories are currently failing so an outage is logged
/// once when it starts and once when it ends.
#[derive(Debug, Default)]
struct FailureLog {
    failing: HashSet<MetricKind>,
}

impl FailureLog {
    fn record<T>(&mut self, kind: MetricKind, result: Result<T, MetricError>) -> Option<T> {
        match result {
            Ok(value) => {
                if self.failing.remove(&kind) {
                    info!("{} available again", kind);
                }
                Some(value)
            }
            Err(e) => {
                if self.failing.insert(kind) {
                    warn!("{}", e);
                } else {
                    debug!("{}", e);
                }
                None
            }
        }
    }
}

pub struct Sampler<P> {
    provider: P,
    disk_path: PathBuf,
    order: ProcessOrder,
    tick: u64,
    failures: FailureLog,
}

impl<P: MetricsProvider> Sampler<P> {
    pub fn new(provider: P, disk_path: PathBuf, order: ProcessOrder) -> Self {
        Self {
            provider,
            disk_path,
            order,
            tick: 0,
            failures: FailureLog::default(),
        }
    }

    /// Runs one sampling cycle. A failed category becomes `None` in the
    /// snapshot; the other categories are still fresh.
    #[instrument(skip(self), fields(tick = self.tick + 1))]
    pub fn sample(&mut self) -> Snapshot {
        self.tick += 1;
        let sampled_at = Local::now();

        let cpu = self.provider.cpu_percent_per_core();
        let cpu_per_core = self.failures.record(MetricKind::Cpu, cpu);

        let memory = self.provider.memory_stats();
        let memory = self.failures.record(MetricKind::Memory, memory);

        let disk = self.provider.disk_stats(&self.disk_path);
        let disk = self.failures.record(MetricKind::Disk, disk);

        let processes = self.provider.list_processes();
        let processes = self
            .failures
            .record(MetricKind::Processes, processes)
            .map(|rows| ProcessTable::new(order_rows(rows, self.order)));

        debug!(
            "Sampled {} processes",
            processes.as_ref().map_or(0, ProcessTable::total_count)
        );

        Snapshot {
            tick: self.tick,
            stats: SystemStats {
                cpu_per_core,
                memory,
                disk,
                sampled_at: Some(sampled_at),
            },
            processes,
        }
    }
}

impl<P: MetricsProvider + Send + 'static> Sampler<P> {
    /// Samples every [`TICK_INTERVAL`] until shutdown leaves `Running` or the
    /// receiver goes away. The stop flag is checked before each cycle and
    /// again before publishing; a cycle that finishes after stop is dropped.
    pub async fn run(self, tx: mpsc::Sender<Snapshot>, mut phase: watch::Receiver<Phase>) {
        let mut ticker = interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!("Sampler started with {}s interval", TICK_INTERVAL.as_secs());

        let mut sampler = self;
        let mut published: u64 = 0;
        loop {
            tokio::select! {
                biased;
                _ = phase.wait_for(|p| !p.is_running()) => break,
                _ = ticker.tick() => {}
            }
            if !phase.borrow().is_running() {
                break;
            }

            let joined = tokio::task::spawn_blocking(move || {
                let snapshot = sampler.sample();
                (sampler, snapshot)
            })
            .await;

            let snapshot = match joined {
                Ok((returned, snapshot)) => {
                    sampler = returned;
                    snapshot
                }
                Err(e) => {
                    error!("Sampling task failed: {}", e);
                    break;
                }
            };

            if !phase.borrow().is_running() {
                debug!("Discarding tick {} sampled during shutdown", snapshot.tick);
                break;
            }
            if tx.send(snapshot).await.is_err() {
                debug!("Snapshot receiver dropped");
                break;
            }
            published += 1;
        }

        info!("Sampler stopped after {} published ticks", published);
    }
}

fn order_rows(mut rows: Vec<ProcessRow>, order: ProcessOrder) -> Vec<ProcessRow> {
    if order == ProcessOrder::Pid {
        rows.sort_by_key(|row| row.pid);
    }
    rows
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::UsageStats;
    use crate::shutdown::{ShutdownCoordinator, StopReason};
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    /// Provider whose per-category results are set by the test.
    #[derive(Clone)]
    pub(crate) struct ScriptedProvider {
        pub cpu: Result<Vec<f32>, MetricError>,
        pub memory: Result<UsageStats, MetricError>,
        pub disk: Result<UsageStats, MetricError>,
        pub processes: Arc<Mutex<Result<Vec<ProcessRow>, MetricError>>>,
        pub disk_paths: Arc<Mutex<Vec<PathBuf>>>,
    }

    pub(crate) fn rows(pids: impl IntoIterator<Item = u32>) -> Vec<ProcessRow> {
        pids.into_iter()
            .map(|pid| ProcessRow {
                pid,
                name: Some(format!("proc-{pid}")),
                cpu_percent: Some(1.5),
                mem_percent: Some(0.25),
            })
            .collect()
    }

    impl ScriptedProvider {
        pub(crate) fn healthy(process_count: u32) -> Self {
            Self {
                cpu: Ok(vec![12.5, 50.0]),
                memory: Ok(UsageStats::new(8 << 30, 2 << 30, 6 << 30)),
                disk: Ok(UsageStats::new(100 << 30, 40 << 30, 60 << 30)),
                processes: Arc::new(Mutex::new(Ok(rows(1..=process_count)))),
                disk_paths: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl MetricsProvider for ScriptedProvider {
        fn cpu_percent_per_core(&mut self) -> Result<Vec<f32>, MetricError> {
            self.cpu.clone()
        }

        fn memory_stats(&mut self) -> Result<UsageStats, MetricError> {
            self.memory.clone()
        }

        fn disk_stats(&mut self, path: &Path) -> Result<UsageStats, MetricError> {
            self.disk_paths.lock().unwrap().push(path.to_path_buf());
            self.disk.clone()
        }

        fn list_processes(&mut self) -> Result<Vec<ProcessRow>, MetricError> {
            self.processes.lock().unwrap().clone()
        }
    }

    fn sampler(provider: ScriptedProvider) -> Sampler<ScriptedProvider> {
        Sampler::new(provider, PathBuf::from("/"), ProcessOrder::Pid)
    }

    #[test]
    fn test_memory_failure_keeps_other_metrics_fresh() {
        let mut provider = ScriptedProvider::healthy(3);
        provider.memory = Err(MetricError::new(MetricKind::Memory, "denied"));

        let snapshot = sampler(provider).sample();
        assert_eq!(snapshot.tick, 1);
        assert!(snapshot.stats.memory.is_none());
        assert_eq!(snapshot.stats.cpu_per_core, Some(vec![12.5, 50.0]));
        assert!(snapshot.stats.disk.is_some());
        assert_eq!(snapshot.total_count(), 3);
        assert!(snapshot.stats.sampled_at.is_some());
    }

    #[test]
    fn test_every_category_can_fail_independently() {
        let mut provider = ScriptedProvider::healthy(3);
        provider.cpu = Err(MetricError::new(MetricKind::Cpu, "x"));
        provider.disk = Err(MetricError::new(MetricKind::Disk, "x"));
        *provider.processes.lock().unwrap() = Err(MetricError::new(MetricKind::Processes, "x"));

        let snapshot = sampler(provider).sample();
        assert!(snapshot.stats.cpu_per_core.is_none());
        assert!(snapshot.stats.disk.is_none());
        assert!(snapshot.processes.is_none());
        assert!(snapshot.stats.memory.is_some());
    }

    #[test]
    fn test_ticks_are_numbered_and_disk_path_forwarded() {
        let provider = ScriptedProvider::healthy(1);
        let paths = provider.disk_paths.clone();
        let mut sampler = Sampler::new(provider, PathBuf::from("/data"), ProcessOrder::Pid);

        assert_eq!(sampler.sample().tick, 1);
        assert_eq!(sampler.sample().tick, 2);
        assert_eq!(*paths.lock().unwrap(), vec![PathBuf::from("/data"); 2]);
    }

    #[test]
    fn test_pid_order_sorts_rows() {
        let provider = ScriptedProvider::healthy(0);
        *provider.processes.lock().unwrap() = Ok(rows([30, 4, 12]));

        let snapshot = sampler(provider.clone()).sample();
        let pids: Vec<u32> = snapshot.rows().iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![4, 12, 30]);

        let mut unordered = Sampler::new(provider, PathBuf::from("/"), ProcessOrder::Acquisition);
        let pids: Vec<u32> = unordered.sample().rows().iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![30, 4, 12]);
    }

    #[test]
    fn test_failure_log_tracks_outages() {
        let mut log = FailureLog::default();
        let failed: Result<(), MetricError> = Err(MetricError::new(MetricKind::Disk, "gone"));
        assert!(log.record(MetricKind::Disk, failed.clone()).is_none());
        assert!(log.failing.contains(&MetricKind::Disk));
        assert!(log.record(MetricKind::Disk, failed).is_none());
        assert_eq!(log.failing.len(), 1);

        assert_eq!(log.record(MetricKind::Disk, Ok(5)), Some(5));
        assert!(log.failing.is_empty());
    }

    #[tokio::test]
    async fn test_run_publishes_then_stops_within_one_tick() {
        let shutdown = ShutdownCoordinator::new();
        let (tx, mut rx) = mpsc::channel(4);
        let task = tokio::spawn(sampler(ScriptedProvider::healthy(5)).run(tx, shutdown.subscribe()));

        let first = rx.recv().await.expect("first tick is published immediately");
        assert_eq!(first.tick, 1);
        assert_eq!(first.total_count(), 5);

        assert!(shutdown.stop(StopReason::Quit));
        tokio::time::timeout(TICK_INTERVAL, task)
            .await
            .expect("sampler stops within one tick")
            .unwrap();

        while let Ok(snapshot) = rx.try_recv() {
            assert!(snapshot.tick <= 2);
        }
    }

    #[tokio::test]
    async fn test_run_does_not_start_a_cycle_after_stop() {
        let shutdown = ShutdownCoordinator::new();
        shutdown.stop(StopReason::Quit);
        let (tx, mut rx) = mpsc::channel(4);

        sampler(ScriptedProvider::healthy(5))
            .run(tx, shutdown.subscribe())
            .await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_run_ends_when_receiver_dropped() {
        let shutdown = ShutdownCoordinator::new();
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        tokio::time::timeout(
            TICK_INTERVAL,
            sampler(ScriptedProvider::healthy(1)).run(tx, shutdown.subscribe()),
        )
        .await
        .expect("sampler exits once nobody listens");
    }
}
