//! consent-gate: a consent-gated resource execution engine.
//!
//! Prevents third-party tracking scripts, iframes and cookies from taking
//! effect until the visitor has made an explicit per-category consent
//! decision, and reconciles previously blocked resources when the
//! decision changes.
//!
//! The moving parts, leaf first:
//! - [`registry`]: service definitions (tracker to category) with built-in
//!   defaults and an optional remote per-site refresh.
//! - [`consent`]: the current decision, its persistence, deny-by-default.
//! - [`dom`]: the modeled page surfaces every enforcement decision runs
//!   against (element tree, cookies, storage, dataLayer, network log).
//! - [`engine`]: interception chokepoint, mutation watcher, blocked-
//!   resource ledger, reconciliation, consent-mode bridge, purge rules.
//! - [`events`]: observable engine outcomes for the consent UI.
//!
//! The primary guarantee lives in [`engine::GuardedFactory`]: a matched
//! script can never acquire a network-triggering `src` before its category
//! is granted. The [`engine::MutationWatcher`] is a best-effort net for
//! insertions that bypass the factory; for markup the parser itself
//! fetches synchronously, that net is acknowledged to be too late.

pub mod config;
pub mod consent;
pub mod dom;
pub mod engine;
pub mod events;
pub mod init;
pub mod registry;
pub mod stats;

pub use config::Config;
pub use consent::ConsentDecision;
pub use engine::ConsentEngine;
