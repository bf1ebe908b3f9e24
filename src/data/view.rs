//! Display-stable view model for one cluster.
//!
//! Rebuilt from every poll by [`parse`](super::parse), folded into the
//! long-lived copy with [`Merge`], then annotated by [`ha`](super::ha).

use std::collections::BTreeMap;

use serde::Serialize;

use super::merge::{scalar_merge, Merge};

/// Placeholder for a metric the server did not report.
pub const NOT_AVAILABLE: &str = "NA";

/// Upstream marker for a server that replicates from nobody.
pub const NO_UPSTREAM: &str = "NO:ONE";

/// Memory limit marker for `maxmemory 0`.
pub const UNLIMITED: &str = "unlimited";

/// Reachability of a polled server, as seen by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServerStatus {
    /// No stats entry yet; expected right after a topology change.
    Pending,
    Timeout,
    Error,
    Ok,
}

impl ServerStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ServerStatus::Pending => "PENDING",
            ServerStatus::Timeout => "TIMEOUT",
            ServerStatus::Error => "ERROR",
            ServerStatus::Ok => "OK",
        }
    }
}

/// Replication role of a server relative to what the sentinels report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HaRole {
    /// No sentinel has reported a master for the group.
    Undefined,
    /// Index 0, and the sentinels agree.
    Master,
    /// Index 0, but the sentinels elected someone else.
    NotMaster,
    /// Not index 0, yet the sentinels elected it.
    RealMaster,
    Slave,
}

impl HaRole {
    pub fn label(&self) -> &'static str {
        match self {
            HaRole::Undefined => "-",
            HaRole::Master => "master",
            HaRole::NotMaster => "not master",
            HaRole::RealMaster => "REAL MASTER",
            HaRole::Slave => "slave",
        }
    }
}

/// In-progress promotion of a group member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Promotion {
    pub index: usize,
    pub state: String,
}

/// One replica of a shard group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicaServer {
    pub addr: String,
    /// Address plus an `[HA]` suffix when the sentinels elected this server.
    pub label: String,
    pub status: ServerStatus,
    pub memory: String,
    pub max_memory: String,
    pub db_size: String,
    pub ops_per_sec: Option<u64>,
    /// `"<addr>:<link>"`, [`NO_UPSTREAM`], or [`NOT_AVAILABLE`].
    pub upstream: String,
    pub expected_upstream: String,
    /// Whether the reported upstream matches the group layout. Unknown until OK.
    pub replication_ok: Option<bool>,
    pub keys: Vec<String>,
    pub can_remove: bool,
    pub can_promote: bool,
    pub can_force_full_sync: bool,
    /// This server is the target of the group's running promotion.
    pub is_promoting: bool,
    pub ha_role: HaRole,
}

/// A shard group with its ordered replicas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShardGroup {
    pub name: String,
    pub servers: Vec<ReplicaServer>,
    pub promoting: Option<Promotion>,
    pub out_of_sync: bool,
    pub proxy_read_port: u16,
    pub proxy_write_port: u16,
    pub can_remove: bool,
    /// Set when the sentinel-elected master is not a member of the group.
    pub ha_warning: Option<String>,
}

impl ShardGroup {
    /// Index of the server the sentinels elected in place of index 0.
    pub fn real_master(&self) -> Option<usize> {
        self.servers.iter().rposition(|s| s.ha_role == HaRole::RealMaster)
    }

    /// Whether the group disagrees with the sentinels in any way.
    pub fn has_ha_conflict(&self) -> bool {
        self.real_master().is_some() || self.ha_warning.is_some()
    }

    pub fn server_index(&self, addr: &str) -> Option<usize> {
        self.servers.iter().position(|s| s.addr == addr)
    }
}

/// A failover sentinel with aggregates over this cluster's masters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentinelServer {
    pub addr: String,
    pub status: ServerStatus,
    pub masters: u64,
    pub masters_down: u64,
    pub avg_slaves: f64,
    pub avg_sentinels: f64,
    pub summary: String,
}

/// Which load-balancer tier an endpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BalancerKind {
    /// Proxy-tier balancer.
    Haproxy,
    /// L4 balancer.
    Lvs,
}

impl BalancerKind {
    /// Name used by the coordinator in models and URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            BalancerKind::Haproxy => "haproxy",
            BalancerKind::Lvs => "lvs",
        }
    }
}

/// A load-balancer endpoint; only reachability is tracked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalancerServer {
    pub addr: String,
    pub status: ServerStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateFile {
    pub name: String,
}

/// Coordinator identity shown in the header.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClusterInfo {
    pub admin_addr: String,
    /// Coordinator kind, e.g. `[Zookeeper]`.
    pub coordinator_kind: String,
    pub coordinator_addr: String,
}

/// Everything one poll contributes, before merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedStats {
    pub groups: Vec<ShardGroup>,
    pub sentinels: Vec<SentinelServer>,
    pub sentinel_out_of_sync: bool,
    pub ha_masters: BTreeMap<String, String>,
    pub haproxy: Vec<BalancerServer>,
    pub lvs: Vec<BalancerServer>,
    pub template_files: Vec<TemplateFile>,
}

/// The merged model the UI renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewModel {
    pub cluster: String,
    pub info: ClusterInfo,
    pub groups: Vec<ShardGroup>,
    pub sentinels: Vec<SentinelServer>,
    pub sentinel_out_of_sync: bool,
    pub ha_masters: BTreeMap<String, String>,
    pub haproxy: Vec<BalancerServer>,
    pub lvs: Vec<BalancerServer>,
    pub template_files: Vec<TemplateFile>,
}

impl ViewModel {
    pub fn new(cluster: &str) -> Self {
        Self {
            cluster: cluster.to_string(),
            ..Self::default()
        }
    }

    pub fn group(&self, name: &str) -> Option<&ShardGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn balancers(&self, kind: BalancerKind) -> &[BalancerServer] {
        match kind {
            BalancerKind::Haproxy => &self.haproxy,
            BalancerKind::Lvs => &self.lvs,
        }
    }

    /// Fold a fresh poll into the model and re-derive HA roles.
    ///
    /// Returns `true` if anything visible changed.
    pub fn apply(&mut self, mut parsed: ParsedStats) -> bool {
        // Annotate the incoming groups first so the merge diff sees final labels
        super::ha::reconcile(
            &mut parsed.groups,
            &parsed.ha_masters,
            !parsed.sentinels.is_empty(),
        );

        let mut changed = self.groups.merge(parsed.groups);
        changed |= self.sentinels.merge(parsed.sentinels);
        changed |= self.sentinel_out_of_sync.merge(parsed.sentinel_out_of_sync);
        changed |= self.ha_masters.merge(parsed.ha_masters);
        changed |= self.haproxy.merge(parsed.haproxy);
        changed |= self.lvs.merge(parsed.lvs);
        changed |= self.template_files.merge(parsed.template_files);

        // Roles depend on the merged group list and the fresh masters
        let has_sentinels = !self.sentinels.is_empty();
        let reconciled = super::ha::reconcile(&mut self.groups, &self.ha_masters, has_sentinels);
        changed || reconciled
    }
}

scalar_merge!(ServerStatus, HaRole);

impl Merge for Promotion {
    fn merge(&mut self, new: Self) -> bool {
        let mut changed = self.index.merge(new.index);
        changed |= self.state.merge(new.state);
        changed
    }
}

impl Merge for ReplicaServer {
    fn merge(&mut self, new: Self) -> bool {
        let mut changed = self.addr.merge(new.addr);
        changed |= self.label.merge(new.label);
        changed |= self.status.merge(new.status);
        changed |= self.memory.merge(new.memory);
        changed |= self.max_memory.merge(new.max_memory);
        changed |= self.db_size.merge(new.db_size);
        changed |= self.ops_per_sec.merge(new.ops_per_sec);
        changed |= self.upstream.merge(new.upstream);
        changed |= self.expected_upstream.merge(new.expected_upstream);
        changed |= self.replication_ok.merge(new.replication_ok);
        changed |= self.keys.merge(new.keys);
        changed |= self.can_remove.merge(new.can_remove);
        changed |= self.can_promote.merge(new.can_promote);
        changed |= self.can_force_full_sync.merge(new.can_force_full_sync);
        changed |= self.is_promoting.merge(new.is_promoting);
        changed |= self.ha_role.merge(new.ha_role);
        changed
    }
}

impl Merge for ShardGroup {
    fn merge(&mut self, new: Self) -> bool {
        let mut changed = self.name.merge(new.name);
        changed |= self.servers.merge(new.servers);
        changed |= self.promoting.merge(new.promoting);
        changed |= self.out_of_sync.merge(new.out_of_sync);
        changed |= self.proxy_read_port.merge(new.proxy_read_port);
        changed |= self.proxy_write_port.merge(new.proxy_write_port);
        changed |= self.can_remove.merge(new.can_remove);
        changed |= self.ha_warning.merge(new.ha_warning);
        changed
    }
}

impl Merge for SentinelServer {
    fn merge(&mut self, new: Self) -> bool {
        let mut changed = self.addr.merge(new.addr);
        changed |= self.status.merge(new.status);
        changed |= self.masters.merge(new.masters);
        changed |= self.masters_down.merge(new.masters_down);
        changed |= self.avg_slaves.merge(new.avg_slaves);
        changed |= self.avg_sentinels.merge(new.avg_sentinels);
        changed |= self.summary.merge(new.summary);
        changed
    }
}

impl Merge for BalancerServer {
    fn merge(&mut self, new: Self) -> bool {
        let mut changed = self.addr.merge(new.addr);
        changed |= self.status.merge(new.status);
        changed
    }
}

impl Merge for TemplateFile {
    fn merge(&mut self, new: Self) -> bool {
        self.name.merge(new.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parse_stats;
    use crate::source::{ClusterStats, GroupModel, GroupServerModel, SentinelModel, ServerStats};

    fn stats(addrs: &[&str], ops: &str, ha_master: Option<&str>) -> ClusterStats {
        let mut stats = ClusterStats::default();
        stats.group.models.push(GroupModel {
            name: "g1".to_string(),
            servers: addrs
                .iter()
                .map(|a| GroupServerModel {
                    server: a.to_string(),
                    replica_group: false,
                })
                .collect(),
            ..GroupModel::default()
        });
        for addr in addrs {
            let mut entry = ServerStats::default();
            entry.stats.insert("instantaneous_ops_per_sec".to_string(), ops.to_string());
            stats.group.stats.insert(addr.to_string(), entry);
        }
        if let Some(master) = ha_master {
            stats.sentinels.model = Some(SentinelModel {
                servers: vec!["s:26379".to_string()],
                out_of_sync: false,
            });
            stats.sentinels.masters.insert("g1".to_string(), master.to_string());
        }
        stats
    }

    #[test]
    fn test_apply_reports_changes_only_once() {
        let mut view = ViewModel::new("demo");
        assert!(view.apply(parse_stats(&stats(&["a:1", "b:1"], "5", None), "demo")));
        assert!(!view.apply(parse_stats(&stats(&["a:1", "b:1"], "5", None), "demo")));
        assert!(view.apply(parse_stats(&stats(&["a:1", "b:1"], "6", None), "demo")));
        assert_eq!(view.groups[0].servers[1].ops_per_sec, Some(6));
    }

    #[test]
    fn test_apply_reconciles_elected_master() {
        let mut view = ViewModel::new("demo");
        view.apply(parse_stats(&stats(&["a:1", "b:1"], "5", Some("b:1")), "demo"));

        let group = view.group("g1").unwrap();
        assert_eq!(group.servers[0].ha_role, HaRole::NotMaster);
        assert_eq!(group.servers[1].ha_role, HaRole::RealMaster);
        assert_eq!(group.servers[1].label, "b:1 [HA]");
        assert_eq!(group.real_master(), Some(1));
        assert!(group.has_ha_conflict());

        // Sentinels agree again: roles and labels follow
        assert!(view.apply(parse_stats(&stats(&["a:1", "b:1"], "5", Some("a:1")), "demo")));
        let group = view.group("g1").unwrap();
        assert_eq!(group.servers[0].ha_role, HaRole::Master);
        assert_eq!(group.servers[1].label, "b:1");
        assert!(!group.has_ha_conflict());
    }

    #[test]
    fn test_server_index_and_balancers() {
        let mut view = ViewModel::new("demo");
        view.apply(parse_stats(&stats(&["a:1", "b:1"], "5", None), "demo"));
        assert_eq!(view.group("g1").unwrap().server_index("b:1"), Some(1));
        assert_eq!(view.group("g1").unwrap().server_index("c:1"), None);
        assert!(view.group("g2").is_none());
        assert!(view.balancers(BalancerKind::Lvs).is_empty());
    }
}
