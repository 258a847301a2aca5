use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::trace;

use super::filter::FilterPolicy;
use super::platform;
use super::snapshot::{MemoryTotals, ProcessSample, Snapshot};

/// Anything that can produce a fresh [`Snapshot`] on demand.
pub trait Sampler {
    fn sample(&mut self) -> Snapshot;
}

/// OS-backed sampler built on `sysinfo`.
pub struct Collector {
    sys: System,
    policy: FilterPolicy,
    page_size: u64,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new(FilterPolicy::default())
    }
}

impl Collector {
    pub fn new(policy: FilterPolicy) -> Self {
        Collector {
            sys: System::new(),
            policy,
            page_size: platform::page_size(),
        }
    }

    fn refresh(&mut self) {
        self.sys.refresh_memory();
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_memory().without_tasks(),
        );
    }

    fn build_snapshot(&self) -> Snapshot {
        let memory = MemoryTotals {
            total_bytes: self.sys.total_memory(),
            available_bytes: self.sys.available_memory(),
            page_size_bytes: self.page_size,
        };

        // A zero resident size means the OS refused to report it for this
        // process; such entries are skipped rather than reported.
        let mut skipped = 0usize;
        let candidates = self.sys.processes().iter().filter_map(|(pid, process)| {
            // Threads share their owner's memory and are not processes.
            if process.thread_kind().is_some() {
                return None;
            }
            let working_set_bytes = process.memory();
            if working_set_bytes == 0 {
                skipped += 1;
                return None;
            }
            Some(ProcessSample {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().into_owned(),
                working_set_bytes,
            })
        });
        let processes = self.policy.apply(candidates);

        trace!(
            retained = processes.len(),
            skipped,
            "collected process samples"
        );

        Snapshot::new(memory, processes)
    }
}

impl Sampler for Collector {
    fn sample(&mut self) -> Snapshot {
        let _span = tracing::debug_span!("collector.sample").entered();

        if !sysinfo::IS_SUPPORTED_SYSTEM {
            trace!("sysinfo does not support this platform, returning empty snapshot");
            return Snapshot::new(
                MemoryTotals {
                    page_size_bytes: self.page_size,
                    ..MemoryTotals::default()
                },
                Vec::new(),
            );
        }

        self.refresh();
        self.build_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_reports_consistent_memory() {
        let mut collector = Collector::default();
        let snap = collector.sample();
        assert!(snap.available_physical_bytes() <= snap.total_physical_bytes());
        let pct = snap.usage_percent();
        assert!((0.0..=100.0).contains(&pct), "usage out of range: {pct}");
        assert!(snap.page_size_bytes() > 0);
    }

    #[test]
    fn unbounded_scan_sees_current_process() {
        let mut collector = Collector::new(FilterPolicy::with_threshold_mb(usize::MAX, None));
        let snap = collector.sample();
        let me = std::process::id();
        assert!(
            snap.processes().iter().any(|p| p.pid == me),
            "test process {me} missing from sample"
        );
    }

    #[test]
    fn threads_are_not_reported_as_processes() {
        const WORKER_NAME: &str = "sampler-worker";
        let (release, parked) = std::sync::mpsc::channel::<()>();
        let parked = std::sync::Arc::new(std::sync::Mutex::new(parked));
        let (ready_tx, ready_rx) = std::sync::mpsc::channel();
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let parked = std::sync::Arc::clone(&parked);
                let ready_tx = ready_tx.clone();
                std::thread::Builder::new()
                    .name(WORKER_NAME.to_string())
                    .spawn(move || {
                        ready_tx.send(()).unwrap();
                        let _ = parked.lock().unwrap().recv();
                    })
                    .unwrap()
            })
            .collect();
        for _ in 0..workers.len() {
            ready_rx.recv().unwrap();
        }

        let mut collector = Collector::new(FilterPolicy::with_threshold_mb(usize::MAX, None));
        let snap = collector.sample();

        drop(release);
        for worker in workers {
            worker.join().unwrap();
        }

        let me = std::process::id();
        assert_eq!(snap.processes().iter().filter(|p| p.pid == me).count(), 1);
        let leaked: Vec<_> = snap
            .processes()
            .iter()
            .filter(|p| p.name == WORKER_NAME)
            .collect();
        assert!(leaked.is_empty(), "threads listed as processes: {leaked:?}");
    }

    #[test]
    fn sample_honours_policy() {
        let policy = FilterPolicy::with_threshold_mb(3, Some(1));
        let mut collector = Collector::new(policy);
        let snap = collector.sample();
        assert!(snap.processes().len() <= 3);
        for p in snap.processes() {
            assert!(p.working_set_bytes > 1024 * 1024, "{p:?} below threshold");
        }
    }
}
