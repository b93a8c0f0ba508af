//! # adlist-sync
//!
//! Keeps a Pi-hole's ad-list subscriptions in step with which list URLs are
//! actually reachable.
//!
//! ## Architecture
//!
//! ```text
//! seed file + remote entries → UrlReconciler → remote mutations
//!                                   ↓              + report
//!                             LivenessProbe
//! ```
//!
//! - [`reconcile`]: worklist-driven probing and the enable/disable/create policy
//! - [`probe`]: header-only HTTP liveness checks, redirects not followed
//! - [`remote`]: Pi-hole admin interface client
//! - [`report`]: banner + sorted address output
//!
//! ## Quick Start
//!
//! ```bash
//! # Probe all subscriptions and update the Pi-hole
//! adlist-sync sync --seed pihole.list
//!
//! # See what would change
//! adlist-sync sync --dry-run
//!
//! # Hostnames that got through
//! adlist-sync hosts --client 192.168.1.20
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together configuration,
/// the remote client and the probe.
pub mod app;

/// Command-line interface using clap.
///
/// - `sync [--seed] [--output] [--dry-run]` - Reconcile subscriptions
/// - `hosts [--client]` - List non-blocked hostnames
pub mod cli;

/// TOML configuration with `secrets.env` overrides.
pub mod config;

/// Ad-list entries and the local seed list.
pub mod domain;

/// Liveness probing.
///
/// - [`LivenessProbe`](probe::LivenessProbe): Async trait for probes
/// - [`HttpProbe`](probe::HttpProbe): reqwest-based `HEAD` implementation
pub mod probe;

/// The reconciliation core.
pub mod reconcile;

/// Remote ad-list service.
///
/// - [`RemoteListService`](remote::RemoteListService): Trait for list owners
/// - [`PiHoleClient`](remote::PiHoleClient): Pi-hole v5 admin implementation
pub mod remote;

pub mod report;
