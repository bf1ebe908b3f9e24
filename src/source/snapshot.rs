//! Wire types for coordinator poll responses.
//!
//! These types match the JSON produced by the coordinator's `/topom` and
//! `/api/topom/stats` endpoints. The coordinator serializes empty lists and
//! maps as `null`, so every collection field tolerates `null`.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize `null` as the type's default value.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One poll result: the full topology and per-address stats of a cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterStats {
    #[serde(default)]
    pub closed: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub group: GroupSection,
    #[serde(default, deserialize_with = "null_default")]
    pub sentinels: SentinelSection,
    #[serde(default, deserialize_with = "null_default")]
    pub gslbs: GslbSection,
    #[serde(default, deserialize_with = "null_default")]
    pub template: TemplateSection,
}

/// Shard group topology plus stats keyed by server address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupSection {
    #[serde(default, deserialize_with = "null_default")]
    pub models: Vec<GroupModel>,
    #[serde(default, deserialize_with = "null_default")]
    pub stats: BTreeMap<String, ServerStats>,
}

/// Configured shard group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupModel {
    pub name: String,
    /// Ordered replica list; index 0 is the configured master.
    #[serde(default, deserialize_with = "null_default")]
    pub servers: Vec<GroupServerModel>,
    #[serde(default, deserialize_with = "null_default")]
    pub promoting: PromotingModel,
    #[serde(default)]
    pub out_of_sync: bool,
    #[serde(default)]
    pub proxy_read_port: u16,
    #[serde(default)]
    pub proxy_write_port: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupServerModel {
    pub server: String,
    #[serde(default)]
    pub replica_group: bool,
}

/// Promotion sub-state. An empty `state` means no promotion is running.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromotingModel {
    #[serde(default)]
    pub index: usize,
    #[serde(default, deserialize_with = "null_default")]
    pub state: String,
}

/// Stats reported for a single replica or sentinel address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerStats {
    /// Any non-null value means the coordinator failed to query the address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
    /// Raw `INFO` fields.
    #[serde(default, deserialize_with = "null_default")]
    pub stats: BTreeMap<String, String>,
    #[serde(default)]
    pub unixtime: i64,
    #[serde(default)]
    pub timeout: bool,
}

/// Sentinel topology, stats, and the masters the sentinels agree on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentinelSection {
    #[serde(default)]
    pub model: Option<SentinelModel>,
    #[serde(default, deserialize_with = "null_default")]
    pub stats: BTreeMap<String, ServerStats>,
    /// Sentinel-observed master address, keyed by group name.
    #[serde(default, deserialize_with = "null_default")]
    pub masters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentinelModel {
    #[serde(default, deserialize_with = "null_default")]
    pub servers: Vec<String>,
    #[serde(default)]
    pub out_of_sync: bool,
}

/// Load-balancer topology keyed by kind (`haproxy`, `lvs`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GslbSection {
    #[serde(default, deserialize_with = "null_default")]
    pub models: BTreeMap<String, GslbModel>,
    #[serde(default, deserialize_with = "null_default")]
    pub stats: BTreeMap<String, ProbeStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GslbModel {
    #[serde(default, deserialize_with = "null_default")]
    pub servers: Vec<String>,
}

/// Reachability probe result for a load-balancer endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub unixtime: i64,
    #[serde(default)]
    pub timeout: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateSection {
    #[serde(rename = "fileNames", default, deserialize_with = "null_default")]
    pub file_names: Vec<String>,
}

/// Response of `GET /topom?forward=<name>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Overview {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub compile: String,
    #[serde(default)]
    pub config: OverviewConfig,
    #[serde(default)]
    pub model: Option<TopomModel>,
    #[serde(default)]
    pub stats: Option<ClusterStats>,
}

/// The subset of the coordinator's config the dashboard displays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverviewConfig {
    #[serde(default, deserialize_with = "null_default")]
    pub coordinator_name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub coordinator_addr: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopomModel {
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub admin_addr: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub pid: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_stats() {
        let json = r#"{
            "closed": false,
            "group": {
                "models": [{
                    "name": "g1",
                    "servers": [{"server": "10.0.0.1:6379", "replicaGroup": false}],
                    "promoting": {},
                    "outOfSync": false,
                    "proxyReadPort": 6001,
                    "proxyWritePort": 6002
                }],
                "stats": {
                    "10.0.0.1:6379": {
                        "error": null,
                        "stats": {"used_memory": "1024"},
                        "unixtime": 1700000000
                    }
                }
            },
            "sentinels": {
                "model": {"servers": ["10.0.1.1:26379"], "outOfSync": true},
                "stats": {"10.0.1.1:26379": {"timeout": true, "unixtime": 0}},
                "masters": {"g1": "10.0.0.1:6379"}
            },
            "gslbs": {
                "models": {"haproxy": {"servers": ["10.0.2.1:8000"]}},
                "stats": {"10.0.2.1:8000": {"error": {"Msg": "refused"}, "unixtime": 0}}
            },
            "template": {"fileNames": ["haproxy.cfg"]}
        }"#;

        let stats: ClusterStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.group.models.len(), 1);

        let group = &stats.group.models[0];
        assert_eq!(group.name, "g1");
        assert_eq!(group.proxy_read_port, 6001);
        assert!(group.promoting.state.is_empty());

        let server = stats.group.stats.get("10.0.0.1:6379").unwrap();
        assert!(server.error.is_none());
        assert_eq!(server.stats.get("used_memory").map(String::as_str), Some("1024"));

        let sentinel = stats.sentinels.model.as_ref().unwrap();
        assert!(sentinel.out_of_sync);
        assert!(stats.sentinels.stats["10.0.1.1:26379"].timeout);
        assert_eq!(stats.sentinels.masters["g1"], "10.0.0.1:6379");

        assert!(stats.gslbs.stats["10.0.2.1:8000"].error.is_some());
        assert_eq!(stats.template.file_names, vec!["haproxy.cfg".to_string()]);
    }

    #[test]
    fn test_null_collections_are_empty() {
        let json = r#"{
            "group": {"models": [{"name": "g1", "servers": null, "promoting": {"state": null}}], "stats": null},
            "sentinels": {"model": null, "stats": null, "masters": null},
            "gslbs": {"models": null, "stats": null},
            "template": {"fileNames": null}
        }"#;

        let stats: ClusterStats = serde_json::from_str(json).unwrap();
        assert!(stats.group.models[0].servers.is_empty());
        assert!(stats.group.stats.is_empty());
        assert!(stats.sentinels.model.is_none());
        assert!(stats.sentinels.masters.is_empty());
        assert!(stats.gslbs.models.is_empty());
        assert!(stats.template.file_names.is_empty());
    }

    #[test]
    fn test_deserialize_overview() {
        let json = r#"{
            "version": "3.2",
            "compile": "2024-01-01",
            "config": {"coordinator_name": "zookeeper", "coordinator_addr": "127.0.0.1:2181", "product_name": "demo"},
            "model": {"startTime": "now", "adminAddr": "127.0.0.1:18080", "productName": "demo", "pid": 42},
            "stats": {"group": {"models": [], "stats": {}}}
        }"#;

        let overview: Overview = serde_json::from_str(json).unwrap();
        assert_eq!(overview.config.coordinator_name, "zookeeper");
        assert_eq!(overview.model.unwrap().admin_addr, "127.0.0.1:18080");
        assert!(overview.stats.is_some());
    }
}
