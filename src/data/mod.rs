//! Data models and processing for cluster stats.
//!
//! ## Submodules
//!
//! - [`parse`]: raw poll payload to per-entity records
//! - [`merge`]: in-place structural merge of new records into the view model
//! - [`ha`]: sentinel vs. configured-master reconciliation
//! - [`history`]: ops/sec samples for sparklines
//! - [`view`]: the display model ([`ViewModel`], [`ShardGroup`], ...)
//!
//! ## Data Flow
//!
//! ```text
//! ClusterStats (raw JSON)
//!        │
//!        ▼
//! parse::parse_stats()
//!        │
//!        ▼
//! ViewModel::apply()  ──▶ merge + ha::reconcile
//!        │
//!        └──▶ History::record() (for sparklines)
//! ```

pub mod ha;
pub mod history;
pub mod merge;
pub mod parse;
pub mod size;
pub mod view;

pub use history::History;
pub use merge::Merge;
pub use parse::parse_stats;
pub use size::human_size;
pub use view::{
    BalancerKind, BalancerServer, ClusterInfo, HaRole, ParsedStats, Promotion, ReplicaServer,
    SentinelServer, ServerStatus, ShardGroup, TemplateFile, ViewModel, NOT_AVAILABLE, NO_UPSTREAM,
    UNLIMITED,
};
