//! Ops/sec history for sparklines.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::view::ViewModel;

/// Maximum number of samples kept per server.
const MAX_HISTORY_SIZE: usize = 60;

/// Tracks recent `instantaneous_ops_per_sec` readings per replica address.
///
/// Servers that drop out of the topology are forgotten on the next record,
/// so the map never outgrows the cluster.
#[derive(Debug, Clone, Default)]
pub struct History {
    ops: BTreeMap<String, VecDeque<u64>>,
    /// Cluster-wide total per recorded poll.
    total: VecDeque<u64>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, e.g. after switching clusters.
    pub fn clear(&mut self) {
        self.ops.clear();
        self.total.clear();
    }

    /// Record one sample per replica that reported ops/sec.
    pub fn record(&mut self, view: &ViewModel) {
        let mut total: u64 = 0;
        let mut seen = BTreeSet::new();

        for server in view.groups.iter().flat_map(|g| &g.servers) {
            let Some(ops) = server.ops_per_sec else {
                continue;
            };
            total = total.saturating_add(ops);
            seen.insert(server.addr.as_str());

            let samples = self.ops.entry(server.addr.clone()).or_default();
            samples.push_back(ops);
            if samples.len() > MAX_HISTORY_SIZE {
                samples.pop_front();
            }
        }

        self.ops.retain(|addr, _| seen.contains(&addr.as_str()));

        self.total.push_back(total);
        if self.total.len() > MAX_HISTORY_SIZE {
            self.total.pop_front();
        }
    }

    /// Latest cluster-wide ops/sec, if anything was recorded.
    pub fn total_ops(&self) -> Option<u64> {
        self.total.back().copied()
    }

    /// Sparkline data for one server (normalized to 0-7 for 8 bar levels).
    pub fn server_sparkline(&self, addr: &str) -> Vec<u8> {
        normalize_sparkline(self.ops.get(addr))
    }

    pub fn total_sparkline(&self) -> Vec<u8> {
        normalize_sparkline(Some(&self.total))
    }

    /// Raw samples for one server, oldest first.
    pub fn samples(&self, addr: &str) -> Vec<u64> {
        self.ops.get(addr).map(|v| v.iter().copied().collect()).unwrap_or_default()
    }
}

/// Scale readings to 0-7. Ops/sec is already a rate, so no deltas are taken.
fn normalize_sparkline(data: Option<&VecDeque<u64>>) -> Vec<u8> {
    let Some(values) = data else {
        return Vec::new();
    };
    if values.len() < 2 {
        return Vec::new();
    }

    let max = values.iter().copied().max().unwrap_or(0).max(1) as f64;
    values
        .iter()
        .map(|&v| ((v as f64 / max * 7.0) as u8).min(7))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::view::{HaRole, ReplicaServer, ServerStatus, ShardGroup};

    fn view(samples: &[(&str, Option<u64>)]) -> ViewModel {
        let servers = samples
            .iter()
            .map(|(addr, ops)| ReplicaServer {
                addr: addr.to_string(),
                label: addr.to_string(),
                status: ServerStatus::Ok,
                memory: String::new(),
                max_memory: String::new(),
                db_size: String::new(),
                ops_per_sec: *ops,
                upstream: String::new(),
                expected_upstream: String::new(),
                replication_ok: None,
                keys: Vec::new(),
                can_remove: false,
                can_promote: false,
                can_force_full_sync: false,
                is_promoting: false,
                ha_role: HaRole::Undefined,
            })
            .collect();

        ViewModel {
            groups: vec![ShardGroup {
                name: "g1".to_string(),
                servers,
                promoting: None,
                out_of_sync: false,
                proxy_read_port: 0,
                proxy_write_port: 0,
                can_remove: false,
                ha_warning: None,
            }],
            ..ViewModel::new("demo")
        }
    }

    #[test]
    fn test_record_and_total() {
        let mut history = History::new();
        history.record(&view(&[("a:1", Some(10)), ("b:1", Some(5)), ("c:1", None)]));

        assert_eq!(history.total_ops(), Some(15));
        assert_eq!(history.samples("a:1"), vec![10]);
        assert!(history.samples("c:1").is_empty());
    }

    #[test]
    fn test_sparkline_needs_two_samples() {
        let mut history = History::new();
        history.record(&view(&[("a:1", Some(10))]));
        assert!(history.server_sparkline("a:1").is_empty());

        history.record(&view(&[("a:1", Some(20))]));
        assert_eq!(history.server_sparkline("a:1"), vec![3, 7]);
    }

    #[test]
    fn test_history_is_capped() {
        let mut history = History::new();
        for i in 0..(MAX_HISTORY_SIZE as u64 + 10) {
            history.record(&view(&[("a:1", Some(i))]));
        }
        let samples = history.samples("a:1");
        assert_eq!(samples.len(), MAX_HISTORY_SIZE);
        assert_eq!(samples[0], 10);
    }

    #[test]
    fn test_removed_servers_are_forgotten() {
        let mut history = History::new();
        history.record(&view(&[("a:1", Some(1)), ("b:1", Some(2))]));
        history.record(&view(&[("a:1", Some(1))]));

        assert!(history.samples("b:1").is_empty());
        assert_eq!(history.samples("a:1"), vec![1, 1]);
    }

    #[test]
    fn test_total_saturates() {
        let mut history = History::new();
        history.record(&view(&[("a:1", Some(u64::MAX)), ("b:1", Some(5))]));
        assert_eq!(history.total_ops(), Some(u64::MAX));
    }

    #[test]
    fn test_many_servers_keep_their_own_history() {
        let addrs: Vec<String> = (0..200).map(|i| format!("10.0.0.{}:6379", i)).collect();
        let samples: Vec<(&str, Option<u64>)> =
            addrs.iter().map(|a| (a.as_str(), Some(1))).collect();

        let mut history = History::new();
        history.record(&view(&samples));
        history.record(&view(&samples[..100]));

        assert_eq!(history.samples(&addrs[99]), vec![1, 1]);
        assert!(history.samples(&addrs[100]).is_empty());
        assert_eq!(history.total_ops(), Some(100));
    }

    #[test]
    fn test_idle_cluster_sparkline_is_flat() {
        let mut history = History::new();
        history.record(&view(&[("a:1", Some(0))]));
        history.record(&view(&[("a:1", Some(0))]));
        assert_eq!(history.total_sparkline(), vec![0, 0]);
    }
}
