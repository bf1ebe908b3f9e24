//! # shardwatch
//!
//! An operator TUI and library for watching and administering sharded
//! key-value clusters through their coordinator's dashboard API.
//!
//! The coordinator owns the topology: shard groups of replicas, failover
//! sentinels and load-balancer endpoints. shardwatch polls its stats,
//! reconciles what the sentinels think with what the groups say, and sends
//! the operator's commands back with the cluster's request tag.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  events ──▶ app ──▶ dispatch (prompt / reject)               │
//! │              │  ▲                                            │
//! │              ▼  │ SourceEvent                                │
//! │           source ──▶ coordinator (HTTP client, tags, errors) │
//! │              │                                               │
//! │              ▼                                               │
//! │            data (parse ─▶ merge ─▶ ha) ──▶ ui                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: application state, selection and dialogs
//! - **[`source`]**: the [`DataSource`] trait with [`HttpSource`] and [`FileSource`]
//! - **[`coordinator`]**: REST client, [`Command`] routes and error payloads
//! - **[`data`]**: stats parsing, stable merging, HA reconciliation, history
//! - **[`dispatch`]**: turns an operator action into a confirmation prompt
//! - **[`ui`]**: ratatui rendering
//! - **[`config`]**: layered [`Settings`]
//!
//! ## Usage
//!
//! ```bash
//! # Live coordinator
//! shardwatch --coordinator 127.0.0.1:18090 --cluster codis-demo
//!
//! # Replay a saved stats response
//! shardwatch --file stats.json --cluster codis-demo
//! ```
//!
//! ### As a library with a file source
//!
//! ```
//! use shardwatch::{App, FileSource};
//!
//! let source = Box::new(FileSource::new("stats.json", "codis-demo"));
//! let mut app = App::new(source);
//! app.select_cluster("codis-demo");
//! ```

pub mod app;
pub mod config;
pub mod coordinator;
pub mod data;
pub mod dispatch;
pub mod events;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::Settings;
pub use coordinator::{Command, CoordinatorClient, CoordinatorError};
pub use data::{History, ViewModel};
pub use source::{ClusterStats, DataSource, FileSource, HttpSource, Overview, SourceEvent};
