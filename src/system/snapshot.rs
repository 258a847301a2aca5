/// Host-wide physical memory figures, all in bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryTotals {
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub page_size_bytes: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessSample {
    pub pid: u32,
    pub name: String,
    pub working_set_bytes: u64,
}

/// Point-in-time record of host memory and the retained processes.
///
/// Fields are private so the `available <= total` invariant established by
/// [`Snapshot::new`] cannot be broken after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    total_physical_bytes: u64,
    available_physical_bytes: u64,
    page_size_bytes: u64,
    processes: Vec<ProcessSample>,
}

impl Snapshot {
    pub fn new(memory: MemoryTotals, processes: Vec<ProcessSample>) -> Self {
        Snapshot {
            total_physical_bytes: memory.total_bytes,
            available_physical_bytes: memory.available_bytes.min(memory.total_bytes),
            page_size_bytes: memory.page_size_bytes,
            processes,
        }
    }

    /// A snapshot with zeroed memory fields and no processes.
    pub fn empty() -> Self {
        Self::new(MemoryTotals::default(), Vec::new())
    }

    pub fn total_physical_bytes(&self) -> u64 {
        self.total_physical_bytes
    }

    pub fn available_physical_bytes(&self) -> u64 {
        self.available_physical_bytes
    }

    pub fn used_physical_bytes(&self) -> u64 {
        self.total_physical_bytes - self.available_physical_bytes
    }

    pub fn page_size_bytes(&self) -> u64 {
        self.page_size_bytes
    }

    pub fn page_count(&self) -> u64 {
        if self.page_size_bytes == 0 {
            return 0;
        }
        self.used_physical_bytes() / self.page_size_bytes
    }

    pub fn usage_percent(&self) -> f64 {
        if self.total_physical_bytes == 0 {
            return 0.0;
        }
        self.used_physical_bytes() as f64 / self.total_physical_bytes as f64 * 100.0
    }

    pub fn processes(&self) -> &[ProcessSample] {
        &self.processes
    }
}
