//! Mutating coordinator commands and their URL paths.

use std::fmt;

use serde::Serialize;

use crate::data::BalancerKind;

/// A mutation sent to the coordinator with `PUT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum Command {
    CreateGroup {
        group: String,
        read_port: u16,
        write_port: u16,
    },
    RemoveGroup {
        group: String,
    },
    AddServer {
        group: String,
        addr: String,
        datacenter: Option<String>,
    },
    RemoveServer {
        group: String,
        addr: String,
    },
    PromoteServer {
        group: String,
        addr: String,
    },
    ResyncGroup {
        group: String,
    },
    ResyncAllGroups,
    ForceFullSync {
        group: String,
        addr: String,
    },
    AddSentinel {
        addr: String,
    },
    RemoveSentinel {
        addr: String,
        force: bool,
    },
    ResyncSentinels,
    AddBalancer {
        kind: BalancerKind,
        addr: String,
    },
    RemoveBalancer {
        kind: BalancerKind,
        addr: String,
    },
}

impl Command {
    /// Path segments below `/api/topom/`, with `tag` in the request-tag slot.
    pub fn segments(&self, tag: &str) -> Vec<String> {
        let tag = tag.to_string();
        let s = |v: &str| v.to_string();

        match self {
            Command::CreateGroup {
                group,
                read_port,
                write_port,
            } => vec![
                s("group"),
                s("create"),
                tag,
                group.clone(),
                read_port.to_string(),
                write_port.to_string(),
            ],
            Command::RemoveGroup { group } => vec![s("group"), s("remove"), tag, group.clone()],
            Command::AddServer {
                group,
                addr,
                datacenter,
            } => {
                let mut path = vec![s("group"), s("add"), tag, group.clone(), addr.clone()];
                if let Some(dc) = datacenter.as_ref().filter(|dc| !dc.is_empty()) {
                    path.push(dc.clone());
                }
                path
            }
            Command::RemoveServer { group, addr } => {
                vec![s("group"), s("del"), tag, group.clone(), addr.clone()]
            }
            Command::PromoteServer { group, addr } => {
                vec![s("group"), s("promote"), tag, group.clone(), addr.clone()]
            }
            Command::ResyncGroup { group } => vec![s("group"), s("resync"), tag, group.clone()],
            Command::ResyncAllGroups => vec![s("group"), s("resync-all"), tag],
            Command::ForceFullSync { group, addr } => {
                vec![s("group"), s("force-full-sync"), tag, group.clone(), addr.clone()]
            }
            Command::AddSentinel { addr } => vec![s("sentinels"), s("add"), tag, addr.clone()],
            Command::RemoveSentinel { addr, force } => vec![
                s("sentinels"),
                s("del"),
                tag,
                addr.clone(),
                s(if *force { "1" } else { "0" }),
            ],
            Command::ResyncSentinels => vec![s("sentinels"), s("resync-all"), tag],
            Command::AddBalancer { kind, addr } => {
                vec![s("gslbs"), s("add"), tag, s(kind.as_str()), addr.clone()]
            }
            Command::RemoveBalancer { kind, addr } => {
                vec![s("gslbs"), s("del"), tag, s(kind.as_str()), addr.clone()]
            }
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::CreateGroup { group, .. } => write!(f, "create group {}", group),
            Command::RemoveGroup { group } => write!(f, "remove group {}", group),
            Command::AddServer { group, addr, .. } => write!(f, "add {} to {}", addr, group),
            Command::RemoveServer { group, addr } => write!(f, "remove {} from {}", addr, group),
            Command::PromoteServer { group, addr } => write!(f, "promote {} in {}", addr, group),
            Command::ResyncGroup { group } => write!(f, "resync group {}", group),
            Command::ResyncAllGroups => write!(f, "resync all groups"),
            Command::ForceFullSync { group, addr } => {
                write!(f, "force full sync {} in {}", addr, group)
            }
            Command::AddSentinel { addr } => write!(f, "add sentinel {}", addr),
            Command::RemoveSentinel { addr, force: true } => {
                write!(f, "force remove sentinel {}", addr)
            }
            Command::RemoveSentinel { addr, force: false } => {
                write!(f, "remove sentinel {}", addr)
            }
            Command::ResyncSentinels => write!(f, "resync sentinels"),
            Command::AddBalancer { kind, addr } => write!(f, "add {} {}", kind.as_str(), addr),
            Command::RemoveBalancer { kind, addr } => {
                write!(f, "remove {} {}", kind.as_str(), addr)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(cmd: Command) -> String {
        cmd.segments("TAG").join("/")
    }

    #[test]
    fn test_group_paths() {
        assert_eq!(
            path(Command::CreateGroup {
                group: "g1".into(),
                read_port: 6001,
                write_port: 6002
            }),
            "group/create/TAG/g1/6001/6002"
        );
        assert_eq!(path(Command::RemoveGroup { group: "g1".into() }), "group/remove/TAG/g1");
        assert_eq!(
            path(Command::RemoveServer {
                group: "g1".into(),
                addr: "a:1".into()
            }),
            "group/del/TAG/g1/a:1"
        );
        assert_eq!(
            path(Command::PromoteServer {
                group: "g1".into(),
                addr: "a:1".into()
            }),
            "group/promote/TAG/g1/a:1"
        );
        assert_eq!(path(Command::ResyncGroup { group: "g1".into() }), "group/resync/TAG/g1");
        assert_eq!(path(Command::ResyncAllGroups), "group/resync-all/TAG");
        assert_eq!(
            path(Command::ForceFullSync {
                group: "g1".into(),
                addr: "a:1".into()
            }),
            "group/force-full-sync/TAG/g1/a:1"
        );
    }

    #[test]
    fn test_add_server_datacenter_is_optional() {
        let without = Command::AddServer {
            group: "g1".into(),
            addr: "a:1".into(),
            datacenter: None,
        };
        assert_eq!(path(without), "group/add/TAG/g1/a:1");

        let empty = Command::AddServer {
            group: "g1".into(),
            addr: "a:1".into(),
            datacenter: Some(String::new()),
        };
        assert_eq!(path(empty), "group/add/TAG/g1/a:1");

        let with = Command::AddServer {
            group: "g1".into(),
            addr: "a:1".into(),
            datacenter: Some("dc1".into()),
        };
        assert_eq!(path(with), "group/add/TAG/g1/a:1/dc1");
    }

    #[test]
    fn test_sentinel_and_balancer_paths() {
        assert_eq!(path(Command::AddSentinel { addr: "s:1".into() }), "sentinels/add/TAG/s:1");
        assert_eq!(
            path(Command::RemoveSentinel {
                addr: "s:1".into(),
                force: true
            }),
            "sentinels/del/TAG/s:1/1"
        );
        assert_eq!(
            path(Command::RemoveSentinel {
                addr: "s:1".into(),
                force: false
            }),
            "sentinels/del/TAG/s:1/0"
        );
        assert_eq!(path(Command::ResyncSentinels), "sentinels/resync-all/TAG");
        assert_eq!(
            path(Command::AddBalancer {
                kind: BalancerKind::Lvs,
                addr: "l:1".into()
            }),
            "gslbs/add/TAG/lvs/l:1"
        );
        assert_eq!(
            path(Command::RemoveBalancer {
                kind: BalancerKind::Haproxy,
                addr: "h:1".into()
            }),
            "gslbs/del/TAG/haproxy/h:1"
        );
    }

    #[test]
    fn test_display() {
        let cmd = Command::RemoveSentinel {
            addr: "s:1".into(),
            force: true,
        };
        assert_eq!(cmd.to_string(), "force remove sentinel s:1");
    }
}
