use super::types::{ServiceDefinition, ServiceList};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct RemoteConfigResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    config: Option<RemoteConfig>,
}

#[derive(Debug, Deserialize)]
struct RemoteConfig {
    #[serde(default)]
    services: Vec<ServiceDefinition>,
}

/// The "control plane" for the registry: fetches a per-site service list.
#[async_trait::async_trait]
pub trait RegistryLoader: Send + Sync {
    /// A full replacement list, or None when the fetch failed in any way
    /// (the built-in defaults then stay authoritative).
    async fn fetch(&self, site_id: &str) -> Option<ServiceList>;
}

/// Fetches `GET <api>/config/<site_id>`. Every failure mode (network
/// error, timeout, non-OK status, missing `success`, malformed payload)
/// is absorbed with a warning; page protection never depends on it.
pub struct RemoteLoader {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl RemoteLoader {
    pub fn new(base_url: &str, timeout_ms: u64) -> Self {
        Self {
            client: Client::builder()
                .user_agent("ConsentGate/0.1")
                .build()
                .unwrap(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

#[async_trait::async_trait]
impl RegistryLoader for RemoteLoader {
    async fn fetch(&self, site_id: &str) -> Option<ServiceList> {
        let url = format!("{}/config/{}", self.base_url, site_id);
        info!("Fetching site configuration from {}", url);

        let response = match tokio::time::timeout(self.timeout, self.client.get(&url).send()).await
        {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                warn!("Site configuration fetch failed: {}", e);
                return None;
            }
            Err(_) => {
                warn!(
                    "Site configuration fetch timed out after {}ms",
                    self.timeout.as_millis()
                );
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                "Site configuration fetch returned status {}",
                response.status()
            );
            return None;
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                warn!("Failed to read site configuration body: {}", e);
                return None;
            }
        };

        let Some(services) = parse_remote_payload(&body) else {
            warn!("Malformed or unsuccessful site configuration payload");
            return None;
        };

        if services.is_empty() {
            warn!("Site configuration contained no services; keeping defaults");
            return None;
        }

        info!("Fetched {} service definitions", services.len());
        Some(ServiceList::new(services))
    }
}

pub(crate) fn parse_remote_payload(raw: &str) -> Option<Vec<ServiceDefinition>> {
    let payload: RemoteConfigResponse = serde_json::from_str(raw).ok()?;
    if !payload.success {
        return None;
    }
    payload.config.map(|c| c.services)
}
