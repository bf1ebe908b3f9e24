//! Snapshot parsing: raw poll payload to per-entity records.
//!
//! Pure transformation of one [`ClusterStats`] into [`ParsedStats`]. HA roles
//! are left [`HaRole::Undefined`] here; [`ha::reconcile`](super::ha::reconcile)
//! fills them in once the result is merged.

use std::collections::BTreeMap;

use super::size::human_size;
use super::view::{
    BalancerKind, BalancerServer, HaRole, ParsedStats, Promotion, ReplicaServer, SentinelServer,
    ServerStatus, ShardGroup, TemplateFile, NOT_AVAILABLE, NO_UPSTREAM, UNLIMITED,
};
use crate::source::{ClusterStats, GroupModel, GslbSection, ProbeStats, SentinelSection, ServerStats};

/// A stats entry that can report a timeout or an error.
trait Probe {
    fn timed_out(&self) -> bool;
    fn failed(&self) -> bool;
}

impl Probe for ServerStats {
    fn timed_out(&self) -> bool {
        self.timeout
    }

    fn failed(&self) -> bool {
        self.error.is_some()
    }
}

impl Probe for ProbeStats {
    fn timed_out(&self) -> bool {
        self.timeout
    }

    fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Classify a server by its stats entry, if any.
fn classify<P: Probe>(entry: Option<&P>) -> ServerStatus {
    match entry {
        None => ServerStatus::Pending,
        Some(p) if p.timed_out() => ServerStatus::Timeout,
        Some(p) if p.failed() => ServerStatus::Error,
        Some(_) => ServerStatus::Ok,
    }
}

/// Parse the leading decimal digits of a stats value ("1024", "12abc").
fn leading_int(value: &str) -> Option<u64> {
    let value = value.trim();
    let end = value.find(|c: char| !c.is_ascii_digit()).unwrap_or(value.len());
    value[..end].parse().ok()
}

/// Look up a stats field, treating an empty value as absent.
fn field<'a>(stats: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    stats.get(name).map(String::as_str).filter(|v| !v.is_empty())
}

/// Parse one poll payload for the cluster named `cluster`.
pub fn parse_stats(stats: &ClusterStats, cluster: &str) -> ParsedStats {
    let (sentinels, sentinel_out_of_sync) = parse_sentinels(&stats.sentinels, cluster);

    ParsedStats {
        groups: stats
            .group
            .models
            .iter()
            .map(|g| parse_group(g, &stats.group.stats))
            .collect(),
        sentinels,
        sentinel_out_of_sync,
        ha_masters: stats.sentinels.masters.clone(),
        haproxy: parse_balancers(&stats.gslbs, BalancerKind::Haproxy),
        lvs: parse_balancers(&stats.gslbs, BalancerKind::Lvs),
        template_files: stats
            .template
            .file_names
            .iter()
            .map(|name| TemplateFile { name: name.clone() })
            .collect(),
    }
}

fn parse_group(model: &GroupModel, stats: &BTreeMap<String, ServerStats>) -> ShardGroup {
    let promoting = (!model.promoting.state.is_empty()).then(|| Promotion {
        index: model.promoting.index,
        state: model.promoting.state.clone(),
    });

    let servers = model
        .servers
        .iter()
        .enumerate()
        .map(|(index, server)| {
            parse_replica(model, index, stats.get(&server.server), promoting.as_ref())
        })
        .collect();

    ShardGroup {
        name: model.name.clone(),
        servers,
        promoting,
        out_of_sync: model.out_of_sync,
        proxy_read_port: model.proxy_read_port,
        proxy_write_port: model.proxy_write_port,
        can_remove: model.servers.is_empty(),
        ha_warning: None,
    }
}

fn parse_replica(
    group: &GroupModel,
    index: usize,
    entry: Option<&ServerStats>,
    promoting: Option<&Promotion>,
) -> ReplicaServer {
    let addr = group.servers[index].server.clone();
    let group_master = group.servers[0].server.as_str();
    let status = classify(entry);

    let mut server = ReplicaServer {
        label: addr.clone(),
        addr,
        status,
        memory: NOT_AVAILABLE.to_string(),
        max_memory: NOT_AVAILABLE.to_string(),
        db_size: NOT_AVAILABLE.to_string(),
        ops_per_sec: None,
        upstream: NOT_AVAILABLE.to_string(),
        expected_upstream: if index == 0 {
            NO_UPSTREAM.to_string()
        } else {
            group_master.to_string()
        },
        replication_ok: None,
        keys: Vec::new(),
        can_remove: false,
        can_promote: false,
        can_force_full_sync: false,
        is_promoting: false,
        ha_role: HaRole::Undefined,
    };

    if let (ServerStatus::Ok, Some(entry)) = (status, entry) {
        fill_metrics(&mut server, &entry.stats, index, group_master);
    }

    match promoting {
        Some(p) => server.is_promoting = index == p.index,
        None => {
            server.can_remove = index != 0 || group.servers.len() <= 1;
            server.can_promote = index != 0;
            server.can_force_full_sync = index != 0;
        }
    }

    server
}

fn fill_metrics(
    server: &mut ReplicaServer,
    stats: &BTreeMap<String, String>,
    index: usize,
    group_master: &str,
) {
    server.keys = stats
        .iter()
        .filter(|(name, _)| name.contains(" keys"))
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect();

    if let Some(v) = field(stats, "used_memory").and_then(leading_int) {
        server.memory = human_size(v);
    }
    if let Some(v) = field(stats, "maxmemory").and_then(leading_int) {
        server.max_memory = if v == 0 {
            UNLIMITED.to_string()
        } else {
            human_size(v)
        };
    }
    if let Some(v) = field(stats, "db_size").and_then(leading_int) {
        server.db_size = human_size(v);
    }
    server.ops_per_sec = field(stats, "instantaneous_ops_per_sec").and_then(leading_int);

    server.upstream = match field(stats, "master_addr") {
        Some(addr) => format!(
            "{}:{}",
            addr,
            stats.get("master_link_status").map(String::as_str).unwrap_or_default()
        ),
        None => NO_UPSTREAM.to_string(),
    };

    server.replication_ok = Some(if index == 0 {
        server.upstream == NO_UPSTREAM
    } else {
        server.upstream == format!("{}:up", group_master)
    });
}

/// Whether a sentinel master name is `<cluster>-<index>`.
pub fn is_cluster_master(name: &str, cluster: &str) -> bool {
    name.strip_prefix(cluster)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}

/// Split a `key=value,key=value` master record. Malformed pairs are skipped.
fn parse_master_record(record: &str) -> BTreeMap<&str, &str> {
    record
        .split(',')
        .filter_map(|pair| {
            let mut parts = pair.split('=');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(k), Some(v), None) => Some((k, v)),
                _ => None,
            }
        })
        .collect()
}

fn parse_sentinels(section: &SentinelSection, cluster: &str) -> (Vec<SentinelServer>, bool) {
    let Some(model) = section.model.as_ref() else {
        return (Vec::new(), false);
    };

    let servers = model
        .servers
        .iter()
        .map(|addr| {
            let entry = section.stats.get(addr);
            let status = classify(entry);
            let mut server = SentinelServer {
                addr: addr.clone(),
                status,
                masters: 0,
                masters_down: 0,
                avg_slaves: 0.0,
                avg_sentinels: 0.0,
                summary: String::new(),
            };
            if let (ServerStatus::Ok, Some(entry)) = (status, entry) {
                aggregate_masters(&mut server, &entry.stats, cluster);
            }
            server
        })
        .collect();

    (servers, model.out_of_sync)
}

fn aggregate_masters(server: &mut SentinelServer, stats: &BTreeMap<String, String>, cluster: &str) {
    let count = stats.get("sentinel_masters").and_then(|v| leading_int(v)).unwrap_or(0);

    let mut slaves = 0u64;
    let mut sentinels = 0u64;
    for j in 0..count {
        let Some(record) = stats.get(&format!("master{}", j)) else {
            continue;
        };
        let record = parse_master_record(record);
        let Some(name) = record.get("name") else {
            continue;
        };
        if !is_cluster_master(name, cluster) {
            continue;
        }

        server.masters += 1;
        if record.get("status").copied() != Some("ok") {
            server.masters_down += 1;
        }
        slaves += record.get("slaves").and_then(|v| leading_int(v)).unwrap_or(0);
        sentinels += record.get("sentinels").and_then(|v| leading_int(v)).unwrap_or(0);
    }

    if server.masters > 0 {
        server.avg_slaves = slaves as f64 / server.masters as f64;
        server.avg_sentinels = sentinels as f64 / server.masters as f64;
    }
    server.summary = format!(
        "masters={},down={},slaves={:.2},sentinels={:.2}",
        server.masters, server.masters_down, server.avg_slaves, server.avg_sentinels
    );
}

fn parse_balancers(section: &GslbSection, kind: BalancerKind) -> Vec<BalancerServer> {
    let Some(model) = section.models.get(kind.as_str()) else {
        return Vec::new();
    };

    model
        .servers
        .iter()
        .map(|addr| BalancerServer {
            addr: addr.clone(),
            status: classify(section.stats.get(addr)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{GroupServerModel, SentinelModel};

    fn ok_stats(fields: &[(&str, &str)]) -> ServerStats {
        ServerStats {
            stats: fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            ..ServerStats::default()
        }
    }

    fn group_model(name: &str, addrs: &[&str]) -> GroupModel {
        GroupModel {
            name: name.to_string(),
            servers: addrs
                .iter()
                .map(|a| GroupServerModel {
                    server: a.to_string(),
                    replica_group: false,
                })
                .collect(),
            ..GroupModel::default()
        }
    }

    fn stats_with_groups(groups: Vec<GroupModel>, entries: &[(&str, ServerStats)]) -> ClusterStats {
        let mut stats = ClusterStats::default();
        stats.group.models = groups;
        stats.group.stats = entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        stats
    }

    #[test]
    fn test_health_classification() {
        let timed_out = ServerStats {
            timeout: true,
            ..ServerStats::default()
        };
        let failed = ServerStats {
            error: Some(serde_json::json!({"Msg": "connection refused"})),
            ..ServerStats::default()
        };

        assert_eq!(classify::<ServerStats>(None), ServerStatus::Pending);
        assert_eq!(classify(Some(&timed_out)), ServerStatus::Timeout);
        assert_eq!(classify(Some(&failed)), ServerStatus::Error);
        assert_eq!(classify(Some(&ServerStats::default())), ServerStatus::Ok);
    }

    #[test]
    fn test_replica_metrics() {
        let stats = stats_with_groups(
            vec![group_model("g1", &["a:1", "b:1"])],
            &[
                (
                    "a:1",
                    ok_stats(&[
                        ("used_memory", "1048576"),
                        ("maxmemory", "0"),
                        ("db_size", "2048"),
                        ("instantaneous_ops_per_sec", "42"),
                        ("db0 keys", "100"),
                        ("db1 keys", "7"),
                        ("uptime_in_seconds", "10"),
                    ]),
                ),
                (
                    "b:1",
                    ok_stats(&[
                        ("master_addr", "a:1"),
                        ("master_link_status", "up"),
                        ("maxmemory", "1024"),
                    ]),
                ),
            ],
        );

        let parsed = parse_stats(&stats, "demo");
        let master = &parsed.groups[0].servers[0];
        assert_eq!(master.status, ServerStatus::Ok);
        assert_eq!(master.memory, "1.00 MB");
        assert_eq!(master.max_memory, UNLIMITED);
        assert_eq!(master.db_size, "2.00 KB");
        assert_eq!(master.ops_per_sec, Some(42));
        assert_eq!(master.keys, vec!["db0 keys: 100", "db1 keys: 7"]);
        assert_eq!(master.upstream, NO_UPSTREAM);
        assert_eq!(master.expected_upstream, NO_UPSTREAM);

        let replica = &parsed.groups[0].servers[1];
        assert_eq!(replica.memory, NOT_AVAILABLE);
        assert_eq!(replica.max_memory, "1.00 KB");
        assert_eq!(replica.ops_per_sec, None);
        assert_eq!(replica.upstream, "a:1:up");
        assert_eq!(replica.expected_upstream, "a:1");
    }

    #[test]
    fn test_replication_conformance() {
        let stats = stats_with_groups(
            vec![group_model("g1", &["a:1", "b:1", "c:1"])],
            &[
                ("a:1", ok_stats(&[("master_addr", "x:1"), ("master_link_status", "up")])),
                ("b:1", ok_stats(&[("master_addr", "a:1"), ("master_link_status", "up")])),
                ("c:1", ok_stats(&[("master_addr", "a:1"), ("master_link_status", "down")])),
            ],
        );

        let parsed = parse_stats(&stats, "demo");
        let flags: Vec<_> = parsed.groups[0].servers.iter().map(|s| s.replication_ok).collect();
        assert_eq!(flags, vec![Some(false), Some(true), Some(false)]);

        let healthy = stats_with_groups(
            vec![group_model("g1", &["a:1"])],
            &[("a:1", ok_stats(&[]))],
        );
        let parsed = parse_stats(&healthy, "demo");
        assert_eq!(parsed.groups[0].servers[0].replication_ok, Some(true));
    }

    #[test]
    fn test_unreachable_server_keeps_placeholders() {
        let stats = stats_with_groups(
            vec![group_model("g1", &["a:1"])],
            &[(
                "a:1",
                ServerStats {
                    timeout: true,
                    ..ok_stats(&[("used_memory", "1024")])
                },
            )],
        );

        let server = &parse_stats(&stats, "demo").groups[0].servers[0];
        assert_eq!(server.status, ServerStatus::Timeout);
        assert_eq!(server.memory, NOT_AVAILABLE);
        assert_eq!(server.upstream, NOT_AVAILABLE);
        assert_eq!(server.replication_ok, None);
    }

    #[test]
    fn test_removability() {
        let stats = stats_with_groups(
            vec![
                group_model("empty", &[]),
                group_model("single", &["a:1"]),
                group_model("pair", &["b:1", "c:1"]),
            ],
            &[],
        );

        let parsed = parse_stats(&stats, "demo");
        assert!(parsed.groups[0].can_remove);
        assert!(!parsed.groups[1].can_remove);
        assert!(parsed.groups[1].servers[0].can_remove);
        assert!(!parsed.groups[2].servers[0].can_remove);
        assert!(parsed.groups[2].servers[1].can_remove);

        assert!(!parsed.groups[2].servers[0].can_promote);
        assert!(parsed.groups[2].servers[1].can_promote);
        assert!(parsed.groups[2].servers[1].can_force_full_sync);
    }

    #[test]
    fn test_promotion_blocks_actions() {
        let mut model = group_model("g1", &["a:1", "b:1", "c:1"]);
        model.promoting.state = "preparing".to_string();
        model.promoting.index = 2;

        let parsed = parse_stats(&stats_with_groups(vec![model], &[]), "demo");
        let group = &parsed.groups[0];
        assert_eq!(
            group.promoting,
            Some(Promotion {
                index: 2,
                state: "preparing".to_string()
            })
        );
        for server in &group.servers {
            assert!(!server.can_remove);
            assert!(!server.can_promote);
            assert!(!server.can_force_full_sync);
        }
        let targets: Vec<_> = group.servers.iter().map(|s| s.is_promoting).collect();
        assert_eq!(targets, vec![false, false, true]);
    }

    #[test]
    fn test_promotion_target_defaults_to_zero() {
        let mut model = group_model("g1", &["a:1", "b:1"]);
        model.promoting.state = "prepared".to_string();

        let parsed = parse_stats(&stats_with_groups(vec![model], &[]), "demo");
        assert!(parsed.groups[0].servers[0].is_promoting);
        assert!(!parsed.groups[0].servers[1].is_promoting);
    }

    #[test]
    fn test_cluster_master_names() {
        assert!(is_cluster_master("foo-0", "foo"));
        assert!(is_cluster_master("foo-12", "foo"));
        assert!(is_cluster_master("my-app-3", "my-app"));
        assert!(!is_cluster_master("foobar-0", "foo"));
        assert!(!is_cluster_master("other-0", "foo"));
        assert!(!is_cluster_master("foo-", "foo"));
        assert!(!is_cluster_master("foo-1a", "foo"));
        assert!(!is_cluster_master("foo", "foo"));
    }

    #[test]
    fn test_sentinel_aggregation() {
        let mut stats = ClusterStats::default();
        stats.sentinels.model = Some(SentinelModel {
            servers: vec!["s:1".to_string(), "s:2".to_string()],
            out_of_sync: true,
        });
        stats.sentinels.stats.insert(
            "s:1".to_string(),
            ok_stats(&[
                ("sentinel_masters", "5"),
                ("master0", "name=foo-0,status=ok,address=a:1,slaves=2,sentinels=3"),
                ("master1", "name=foo-12,status=odown,address=b:1,slaves=1,sentinels=3"),
                ("master2", "name=foobar-0,status=ok,address=c:1,slaves=9,sentinels=9"),
                ("master3", "name=other-0,status=ok,address=d:1,slaves=9,sentinels=9"),
                ("master4", "status=ok,slaves=9"),
            ]),
        );

        let parsed = parse_stats(&stats, "foo");
        assert!(parsed.sentinel_out_of_sync);

        let s = &parsed.sentinels[0];
        assert_eq!(s.status, ServerStatus::Ok);
        assert_eq!(s.masters, 2);
        assert_eq!(s.masters_down, 1);
        assert_eq!(s.avg_slaves, 1.5);
        assert_eq!(s.avg_sentinels, 3.0);
        assert_eq!(s.summary, "masters=2,down=1,slaves=1.50,sentinels=3.00");

        assert_eq!(parsed.sentinels[1].status, ServerStatus::Pending);
        assert!(parsed.sentinels[1].summary.is_empty());
    }

    #[test]
    fn test_sentinel_without_masters_averages_zero() {
        let mut stats = ClusterStats::default();
        stats.sentinels.model = Some(SentinelModel {
            servers: vec!["s:1".to_string()],
            out_of_sync: false,
        });
        stats.sentinels.stats.insert("s:1".to_string(), ok_stats(&[]));

        let s = &parse_stats(&stats, "foo").sentinels[0];
        assert_eq!(s.masters, 0);
        assert_eq!(s.summary, "masters=0,down=0,slaves=0.00,sentinels=0.00");
    }

    #[test]
    fn test_balancers_and_templates() {
        let mut stats = ClusterStats::default();
        stats.gslbs.models.insert(
            "haproxy".to_string(),
            crate::source::GslbModel {
                servers: vec!["h:1".to_string(), "h:2".to_string()],
            },
        );
        stats.gslbs.stats.insert("h:1".to_string(), ProbeStats::default());
        stats.template.file_names = vec!["haproxy.cfg".to_string()];

        let parsed = parse_stats(&stats, "demo");
        assert_eq!(parsed.haproxy.len(), 2);
        assert_eq!(parsed.haproxy[0].status, ServerStatus::Ok);
        assert_eq!(parsed.haproxy[1].status, ServerStatus::Pending);
        assert!(parsed.lvs.is_empty());
        assert_eq!(parsed.template_files[0].name, "haproxy.cfg");
    }
}
