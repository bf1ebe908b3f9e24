//! Data source abstraction for talking to a coordinator.
//!
//! A source accepts requests (cluster list, overview, stats, commands) and
//! hands back their results through [`DataSource::poll`]. Requests never
//! block the caller; results are tagged with the cluster they were made for
//! so the app can drop responses for a cluster it has since left.

mod file;
mod http;
mod snapshot;

pub use file::FileSource;
pub use http::HttpSource;
pub use snapshot::{
    ClusterStats, GroupModel, GroupSection, GroupServerModel, GslbModel, GslbSection, Overview,
    OverviewConfig, ProbeStats, PromotingModel, SentinelModel, SentinelSection, ServerStats,
    TemplateSection, TopomModel,
};

use std::fmt::Debug;

use crate::coordinator::{Command, CoordinatorError};

/// A completed request.
#[derive(Debug)]
pub enum SourceEvent {
    Clusters(Result<Vec<String>, CoordinatorError>),
    Overview {
        cluster: String,
        result: Result<Overview, CoordinatorError>,
    },
    Stats {
        cluster: String,
        result: Result<ClusterStats, CoordinatorError>,
    },
    CommandDone {
        cluster: String,
        command: Command,
        result: Result<(), CoordinatorError>,
    },
}

impl SourceEvent {
    /// Cluster the originating request was made for, if any.
    pub fn cluster(&self) -> Option<&str> {
        match self {
            SourceEvent::Clusters(_) => None,
            SourceEvent::Overview { cluster, .. }
            | SourceEvent::Stats { cluster, .. }
            | SourceEvent::CommandDone { cluster, .. } => Some(cluster),
        }
    }
}

/// Trait for reaching a coordinator through different transports.
///
/// # Example
///
/// ```
/// use shardwatch::{DataSource, FileSource};
///
/// let mut source = FileSource::new("stats.json", "demo");
/// source.request_stats("demo");
/// while let Some(event) = source.poll() {
///     println!("{:?}", event.cluster());
/// }
/// ```
pub trait DataSource: Send + Debug {
    /// Ask for the list of known clusters.
    fn request_clusters(&mut self);

    fn request_overview(&mut self, cluster: &str);

    /// Ask for a fresh stats snapshot.
    fn request_stats(&mut self, cluster: &str);

    /// Send a mutation. The outcome arrives as [`SourceEvent::CommandDone`].
    fn submit(&mut self, cluster: &str, command: Command);

    /// Next completed request, if any. Must not block.
    fn poll(&mut self) -> Option<SourceEvent>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;
}
