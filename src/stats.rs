use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free enforcement counters.
#[derive(Debug, Default)]
pub struct StatsCollector {
    intercepted_scripts: AtomicU64,
    intercepted_iframes: AtomicU64,
    restored: AtomicU64,
    cookies_purged: AtomicU64,
    storage_keys_purged: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub intercepted_scripts: u64,
    pub intercepted_iframes: u64,
    pub restored: u64,
    pub cookies_purged: u64,
    pub storage_keys_purged: u64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_intercepted_script(&self) {
        self.intercepted_scripts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_intercepted_iframe(&self) {
        self.intercepted_iframes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_restored(&self) {
        self.restored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_cookies_purged(&self, count: u64) {
        self.cookies_purged.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_storage_keys_purged(&self, count: u64) {
        self.storage_keys_purged.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            intercepted_scripts: self.intercepted_scripts.load(Ordering::Relaxed),
            intercepted_iframes: self.intercepted_iframes.load(Ordering::Relaxed),
            restored: self.restored.load(Ordering::Relaxed),
            cookies_purged: self.cookies_purged.load(Ordering::Relaxed),
            storage_keys_purged: self.storage_keys_purged.load(Ordering::Relaxed),
        }
    }
}
