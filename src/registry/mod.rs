mod defaults;
mod remote;
mod types;

pub use defaults::builtin_services;
pub use remote::{RegistryLoader, RemoteLoader};
pub use types::{Category, ServiceDefinition, ServiceList, ServiceMatcher};

use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::info;

/// Shared handle to the active service list. Readers always see a
/// complete list; a refresh replaces it wholesale, never in place.
#[derive(Debug)]
pub struct RegistryHandle {
    active: ArcSwap<ServiceList>,
}

impl RegistryHandle {
    pub fn new(list: ServiceList) -> Self {
        Self {
            active: ArcSwap::from_pointee(list),
        }
    }

    /// Handle pre-loaded with the built-in defaults, ready before any
    /// network traffic.
    pub fn with_defaults() -> Self {
        Self::new(ServiceList::new(builtin_services()))
    }

    pub fn current(&self) -> Arc<ServiceList> {
        self.active.load_full()
    }

    pub fn replace(&self, list: ServiceList) {
        info!("Replacing active service registry ({} services)", list.len());
        self.active.store(Arc::new(list));
    }

    /// Runs one loader fetch; on success the fetched list replaces the
    /// active one atomically, on failure the active list is untouched.
    pub async fn refresh(&self, loader: &dyn RegistryLoader, site_id: &str) -> bool {
        match loader.fetch(site_id).await {
            Some(list) => {
                self.replace(list);
                true
            }
            None => {
                info!("Registry refresh failed; keeping current service list");
                false
            }
        }
    }
}

impl Default for RegistryHandle {
    fn default() -> Self {
        Self::with_defaults()
    }
}
