//! Initialization helpers for embedding the engine in a page runtime.

use crate::config::Config;
use crate::dom::Document;
use crate::engine::ConsentEngine;
use std::sync::Arc;

/// Sets up the tracing subscriber with the configured filters.
pub fn setup_logging(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = config.logging.level.clone();

        // Suppress HTTP client internals unless explicitly overridden
        if !filter.contains("reqwest") {
            filter.push_str(",reqwest=off");
        }
        if !filter.contains("hyper") {
            filter.push_str(",hyper=off");
        }

        tracing_subscriber::EnvFilter::new(filter)
    });

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

/// Builds the page model and the engine in the startup order the
/// protection guarantees require: the document and the engine (with its
/// built-in service defaults and any persisted decision) exist before the
/// remote refresh is even scheduled.
pub fn init_engine(config: Config) -> (Arc<Document>, Arc<ConsentEngine>) {
    let document = Document::new(&config.hostname);
    let engine = ConsentEngine::new(config, document.clone());
    engine.start_remote_refresh();
    (document, engine)
}
