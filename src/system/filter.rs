use super::snapshot::ProcessSample;

const MIB: u64 = 1024 * 1024;

/// Which processes a sample keeps, and how many.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterPolicy {
    /// Keep only processes whose working set is strictly above this size.
    pub min_working_set_bytes: Option<u64>,
    /// Stop scanning once this many processes have been retained.
    pub max_processes: usize,
}

impl FilterPolicy {
    /// Every inspectable process, up to 1024 entries.
    pub fn full_scan() -> Self {
        FilterPolicy {
            min_working_set_bytes: None,
            max_processes: 1024,
        }
    }

    /// The first ten processes holding more than 50 MiB.
    pub fn top_consumers() -> Self {
        FilterPolicy {
            min_working_set_bytes: Some(50 * MIB),
            max_processes: 10,
        }
    }

    pub fn with_threshold_mb(max_processes: usize, min_working_set_mb: Option<u64>) -> Self {
        FilterPolicy {
            min_working_set_bytes: min_working_set_mb.map(|mb| mb.saturating_mul(MIB)),
            max_processes,
        }
    }

    pub fn accepts(&self, sample: &ProcessSample) -> bool {
        match self.min_working_set_bytes {
            Some(threshold) => sample.working_set_bytes > threshold,
            None => true,
        }
    }

    /// Retain matching samples in iteration order.
    ///
    /// The iterator is not polled again once the cap is reached, so callers
    /// backed by a lazy OS walk stop inspecting processes early.
    pub fn apply<I>(&self, samples: I) -> Vec<ProcessSample>
    where
        I: IntoIterator<Item = ProcessSample>,
    {
        let mut retained = Vec::new();
        if self.max_processes == 0 {
            return retained;
        }
        for sample in samples {
            if !self.accepts(&sample) {
                continue;
            }
            retained.push(sample);
            if retained.len() >= self.max_processes {
                break;
            }
        }
        retained
    }
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self::full_scan()
    }
}
