//! File-based data source.
//!
//! Replays a saved stats JSON file, for offline inspection.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{ClusterStats, DataSource, Overview, OverviewConfig, SourceEvent, TopomModel};
use crate::coordinator::{Command, CoordinatorError};

/// A read-only data source backed by a stats JSON file.
///
/// The file holds one `/api/topom/stats` response. It is re-read only when
/// its modification time moves forward, so an unchanged file yields no new
/// stats. Commands always fail with [`CoordinatorError::ReadOnly`].
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    cluster: String,
    description: String,
    last_modified: Option<SystemTime>,
    pending: VecDeque<SourceEvent>,
}

impl FileSource {
    /// Create a source presenting `path` as the stats of `cluster`.
    pub fn new<P: AsRef<Path>>(path: P, cluster: &str) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            cluster: cluster.to_string(),
            description,
            last_modified: None,
            pending: VecDeque::new(),
        }
    }

    /// Returns the path being replayed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn get_modified_time(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok()?.modified().ok()
    }

    /// Read and parse the file.
    pub fn read_stats(&self) -> Result<ClusterStats, CoordinatorError> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| CoordinatorError::Connection(format!("Read error: {}", e)))?;
        serde_json::from_str(&content)
            .map_err(|e| CoordinatorError::Parse(format!("Parse error: {}", e)))
    }

    /// Read the file if it changed since the last successful read.
    fn read_if_changed(&mut self) -> Option<Result<ClusterStats, CoordinatorError>> {
        let current_modified = self.get_modified_time();

        let file_changed = match (&self.last_modified, &current_modified) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(last), Some(current)) => current > last,
        };
        if !file_changed {
            return None;
        }

        let result = self.read_stats();
        if result.is_ok() {
            self.last_modified = current_modified;
        }
        Some(result)
    }
}

impl DataSource for FileSource {
    fn request_clusters(&mut self) {
        self.pending.push_back(SourceEvent::Clusters(Ok(vec![self.cluster.clone()])));
    }

    fn request_overview(&mut self, cluster: &str) {
        let result = if cluster == self.cluster {
            Ok(Overview {
                config: OverviewConfig {
                    coordinator_name: "file".to_string(),
                    coordinator_addr: self.path.display().to_string(),
                },
                model: Some(TopomModel {
                    admin_addr: self.description.clone(),
                    product_name: self.cluster.clone(),
                    ..TopomModel::default()
                }),
                ..Overview::default()
            })
        } else {
            Err(CoordinatorError::ReadOnly(format!(
                "{} only holds cluster {}",
                self.description, self.cluster
            )))
        };

        self.pending.push_back(SourceEvent::Overview {
            cluster: cluster.to_string(),
            result,
        });
    }

    fn request_stats(&mut self, cluster: &str) {
        if cluster != self.cluster {
            return;
        }
        if let Some(result) = self.read_if_changed() {
            if let Err(e) = &result {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read stats file");
            }
            self.pending.push_back(SourceEvent::Stats {
                cluster: cluster.to_string(),
                result,
            });
        }
    }

    fn submit(&mut self, cluster: &str, command: Command) {
        self.pending.push_back(SourceEvent::CommandDone {
            cluster: cluster.to_string(),
            command,
            result: Err(CoordinatorError::ReadOnly(self.description.clone())),
        });
    }

    fn poll(&mut self) -> Option<SourceEvent> {
        self.pending.pop_front()
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample_json() -> &'static str {
        r#"{
            "group": {
                "models": [{"name": "g1", "servers": [{"server": "a:1"}]}],
                "stats": {"a:1": {"stats": {"used_memory": "2048"}}}
            }
        }"#
    }

    fn stats_event(source: &mut FileSource) -> Option<Result<ClusterStats, CoordinatorError>> {
        source.request_stats("demo");
        match source.poll()? {
            SourceEvent::Stats { cluster, result } => {
                assert_eq!(cluster, "demo");
                Some(result)
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_file_source_new() {
        let source = FileSource::new("/tmp/stats.json", "demo");
        assert_eq!(source.path(), Path::new("/tmp/stats.json"));
        assert_eq!(source.description(), "file: /tmp/stats.json");
    }

    #[test]
    fn test_file_source_reads_once_until_changed() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let mut source = FileSource::new(file.path(), "demo");

        let stats = stats_event(&mut source).unwrap().unwrap();
        assert_eq!(stats.group.models[0].name, "g1");

        // Unchanged file produces nothing
        assert!(stats_event(&mut source).is_none());
    }

    #[test]
    fn test_other_cluster_is_ignored() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let mut source = FileSource::new(file.path(), "demo");
        source.request_stats("other");
        assert!(source.poll().is_none());
    }

    #[test]
    fn test_file_source_missing_file() {
        let mut source = FileSource::new("/nonexistent/path/stats.json", "demo");

        let err = stats_event(&mut source).unwrap().unwrap_err();
        assert!(err.to_string().contains("Read error"));
    }

    #[test]
    fn test_file_source_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let mut source = FileSource::new(file.path(), "demo");
        let err = stats_event(&mut source).unwrap().unwrap_err();
        assert!(matches!(err, CoordinatorError::Parse(_)));
    }

    #[test]
    fn test_overview_and_clusters() {
        let mut source = FileSource::new("/tmp/stats.json", "demo");
        source.request_clusters();
        source.request_overview("demo");

        match source.poll() {
            Some(SourceEvent::Clusters(Ok(names))) => assert_eq!(names, vec!["demo".to_string()]),
            other => panic!("unexpected event: {:?}", other),
        }
        match source.poll() {
            Some(SourceEvent::Overview { result: Ok(overview), .. }) => {
                assert_eq!(overview.model.unwrap().admin_addr, "file: /tmp/stats.json");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_commands_are_rejected() {
        let mut source = FileSource::new("/tmp/stats.json", "demo");
        source.submit("demo", Command::ResyncSentinels);

        match source.poll() {
            Some(SourceEvent::CommandDone { result, .. }) => {
                assert!(matches!(result, Err(CoordinatorError::ReadOnly(_))));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
