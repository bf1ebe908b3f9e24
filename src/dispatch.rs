//! Command dispatch: operator actions to confirmed coordinator commands.
//!
//! [`decide`] is pure. It reads the current [`ViewModel`] to validate an
//! action and to decide how strongly the operator must confirm it. Nothing is
//! sent from here; the app sends [`Prompt::command`] once confirmed.

use serde::Serialize;

use crate::coordinator::Command;
use crate::data::view::NOT_AVAILABLE;
use crate::data::{BalancerKind, HaRole, ShardGroup, ViewModel};

/// Something the operator asked for, with raw form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CreateGroup {
        group: String,
        read_port: String,
        write_port: String,
    },
    RemoveGroup {
        group: String,
    },
    AddServer {
        group: String,
        addr: String,
        datacenter: String,
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
    ResyncSentinels,
    AddSentinel {
        addr: String,
    },
    RemoveSentinel {
        addr: String,
        force: bool,
    },
    AddBalancer {
        kind: BalancerKind,
        addr: String,
    },
    RemoveBalancer {
        kind: BalancerKind,
        addr: String,
    },
}

/// How hard the operator must confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Simple,
    /// The action touches state that disagrees with the sentinels.
    Escalated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub severity: Severity,
    pub title: String,
    pub body: String,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Missing or placeholder input; do nothing.
    Skip,
    /// Not allowed; show the text and stop.
    Reject(String),
    Confirm(Prompt),
}

/// Input is usable when it is non-empty and not the `NA` placeholder.
pub fn is_valid_input(value: &str) -> bool {
    !value.is_empty() && value != NOT_AVAILABLE
}

/// Decide what to do with `action` against the current view of `cluster`.
pub fn decide(cluster: &str, action: &Action, view: &ViewModel) -> Decision {
    if !is_valid_input(cluster) {
        return Decision::Skip;
    }

    match action {
        Action::CreateGroup {
            group,
            read_port,
            write_port,
        } => create_group(group, read_port, write_port),
        Action::RemoveGroup { group } => with_group(view, group, remove_group),
        Action::AddServer {
            group,
            addr,
            datacenter,
        } => {
            if !is_valid_input(addr) {
                return Decision::Skip;
            }
            with_group(view, group, |g| add_server(g, addr, datacenter))
        }
        Action::RemoveServer { group, addr } => {
            with_server(view, group, addr, |g, index| remove_server(g, index))
        }
        Action::PromoteServer { group, addr } => {
            with_server(view, group, addr, |g, index| promote_server(g, index))
        }
        Action::ResyncGroup { group } => with_group(view, group, resync_group),
        Action::ResyncAllGroups => resync_all(view),
        Action::ForceFullSync { group, addr } => {
            with_server(view, group, addr, |g, index| force_full_sync(g, index))
        }
        Action::ResyncSentinels => resync_sentinels(view),
        Action::AddSentinel { addr } => simple_addr(addr, "Add sentinel", |addr| {
            Command::AddSentinel { addr }
        }),
        Action::RemoveSentinel { addr, force } => {
            let title = if *force {
                "[FORCE] Remove sentinel"
            } else {
                "Remove sentinel"
            };
            simple_addr(addr, title, |addr| Command::RemoveSentinel {
                addr,
                force: *force,
            })
        }
        Action::AddBalancer { kind, addr } => {
            simple_addr(addr, &format!("Add {}", kind.as_str()), |addr| {
                Command::AddBalancer { kind: *kind, addr }
            })
        }
        Action::RemoveBalancer { kind, addr } => {
            simple_addr(addr, &format!("Remove {}", kind.as_str()), |addr| {
                Command::RemoveBalancer { kind: *kind, addr }
            })
        }
    }
}

fn with_group(view: &ViewModel, name: &str, f: impl FnOnce(&ShardGroup) -> Decision) -> Decision {
    if !is_valid_input(name) {
        return Decision::Skip;
    }
    match view.group(name) {
        Some(group) => f(group),
        None => Decision::Reject(format!("Group-[{}] does not exist", name)),
    }
}

fn with_server(
    view: &ViewModel,
    group: &str,
    addr: &str,
    f: impl FnOnce(&ShardGroup, usize) -> Decision,
) -> Decision {
    if !is_valid_input(addr) {
        return Decision::Skip;
    }
    with_group(view, group, |g| match g.server_index(addr) {
        Some(index) => f(g, index),
        None => Decision::Reject(format!("Server {} is not in Group-[{}]", addr, g.name)),
    })
}

/// `{"name": .., "servers": [..]}` as shown in group prompts.
fn group_summary(group: &ShardGroup) -> String {
    #[derive(Serialize)]
    struct Summary<'a> {
        name: &'a str,
        servers: Vec<&'a str>,
    }

    let summary = Summary {
        name: &group.name,
        servers: group.servers.iter().map(|s| s.addr.as_str()).collect(),
    };
    serde_json::to_string_pretty(&summary).unwrap_or_else(|_| group.name.clone())
}

/// Sentence describing a group's disagreement with the sentinels, if any.
fn conflict_note(group: &ShardGroup) -> Option<String> {
    if let Some(index) = group.real_master() {
        return Some(format!(
            "HA: server[{}]={} should be the real group master",
            index, group.servers[index].addr
        ));
    }
    group
        .ha_warning
        .as_ref()
        .map(|warning| format!("HA: sentinels report a master outside the group {}", warning))
}

fn promotion_block(group: &ShardGroup) -> Option<Decision> {
    group.promoting.as_ref().map(|p| {
        Decision::Reject(format!(
            "Group-[{}] is promoting server[{}] ({}); wait for it to finish",
            group.name, p.index, p.state
        ))
    })
}

fn prompt(severity: Severity, title: String, body: String, command: Command) -> Decision {
    Decision::Confirm(Prompt {
        severity,
        title,
        body,
        command,
    })
}

fn create_group(group: &str, read_port: &str, write_port: &str) -> Decision {
    if ![group, read_port, write_port].into_iter().all(is_valid_input) {
        return Decision::Skip;
    }
    let (Ok(read), Ok(write)) = (read_port.parse::<u16>(), write_port.parse::<u16>()) else {
        return Decision::Reject(format!(
            "Invalid proxy ports for Group-[{}]: {} / {}",
            group, read_port, write_port
        ));
    };

    prompt(
        Severity::Simple,
        format!("Create Group-[{}]", group),
        format!("read port {}, write port {}", read, write),
        Command::CreateGroup {
            group: group.to_string(),
            read_port: read,
            write_port: write,
        },
    )
}

fn remove_group(group: &ShardGroup) -> Decision {
    if !group.can_remove {
        return Decision::Reject(format!(
            "Group-[{}] still has servers: {}",
            group.name,
            group_summary(group)
        ));
    }

    let command = Command::RemoveGroup {
        group: group.name.clone(),
    };
    let title = format!("Remove Group-[{}]", group.name);
    match conflict_note(group) {
        Some(note) => prompt(
            Severity::Escalated,
            title,
            format!("{}\n\n{}, do you really want to remove it ??", group_summary(group), note),
            command,
        ),
        None => prompt(Severity::Simple, title, group_summary(group), command),
    }
}

fn add_server(group: &ShardGroup, addr: &str, datacenter: &str) -> Decision {
    let datacenter = is_valid_input(datacenter).then(|| datacenter.to_string());
    let body = match &datacenter {
        Some(dc) => format!("{} (datacenter {})", group_summary(group), dc),
        None => group_summary(group),
    };

    prompt(
        Severity::Simple,
        format!("Add server {} to Group-[{}]", addr, group.name),
        body,
        Command::AddServer {
            group: group.name.clone(),
            addr: addr.to_string(),
            datacenter,
        },
    )
}

fn remove_server(group: &ShardGroup, index: usize) -> Decision {
    if let Some(blocked) = promotion_block(group) {
        return blocked;
    }

    let server = &group.servers[index];
    if !server.can_remove {
        return Decision::Reject(format!(
            "Master server: {} cannot be removed while Group-[{}] has replicas: {}",
            server.addr,
            group.name,
            group_summary(group)
        ));
    }

    let command = Command::RemoveServer {
        group: group.name.clone(),
        addr: server.addr.clone(),
    };
    let title = format!("Remove server {} from Group-[{}]", server.addr, group.name);
    if server.ha_role == HaRole::RealMaster {
        prompt(
            Severity::Escalated,
            title,
            format!(
                "{}\n\nHA: server[{}]={} should be the real group master, do you really want to remove it ??",
                group_summary(group),
                index,
                server.addr
            ),
            command,
        )
    } else {
        prompt(Severity::Simple, title, group_summary(group), command)
    }
}

fn promote_server(group: &ShardGroup, index: usize) -> Decision {
    if let Some(blocked) = promotion_block(group) {
        return blocked;
    }

    let server = &group.servers[index];
    if !server.can_promote {
        return Decision::Reject(format!(
            "Master server: {} not allowed this operation in Group-[{}]: {}",
            server.addr,
            group.name,
            group_summary(group)
        ));
    }

    let command = Command::PromoteServer {
        group: group.name.clone(),
        addr: server.addr.clone(),
    };
    let title = format!("Promote server {} in Group-[{}]", server.addr, group.name);
    match group.real_master().filter(|&real| real != index) {
        Some(real) => prompt(
            Severity::Escalated,
            title,
            format!(
                "{}\n\nHA: server[{}]={} should be the real group master, do you really want to promote {} ??",
                group_summary(group),
                real,
                group.servers[real].addr,
                server.addr
            ),
            command,
        ),
        None => prompt(Severity::Simple, title, group_summary(group), command),
    }
}

fn resync_group(group: &ShardGroup) -> Decision {
    let command = Command::ResyncGroup {
        group: group.name.clone(),
    };
    let title = format!("Resync Group-[{}]", group.name);
    match conflict_note(group) {
        Some(note) => prompt(
            Severity::Escalated,
            title,
            format!(
                "{}\n\n{}, do you really want to resync group-[{}] ??",
                group_summary(group),
                note,
                group.name
            ),
            command,
        ),
        None => prompt(Severity::Simple, title, group_summary(group), command),
    }
}

fn resync_all(view: &ViewModel) -> Decision {
    let names: Vec<&str> = view.groups.iter().map(|g| g.name.as_str()).collect();
    let conflicting: Vec<&str> = view
        .groups
        .iter()
        .filter(|g| g.has_ha_conflict())
        .map(|g| g.name.as_str())
        .collect();

    let body = format!("group-[{}]", names.join(","));
    if conflicting.is_empty() {
        prompt(Severity::Simple, "Resync All Groups".to_string(), body, Command::ResyncAllGroups)
    } else {
        prompt(
            Severity::Escalated,
            "Resync All Groups (in conflict with HA)".to_string(),
            format!("{}\n\nconflicting: group-[{}]", body, conflicting.join(",")),
            Command::ResyncAllGroups,
        )
    }
}

fn force_full_sync(group: &ShardGroup, index: usize) -> Decision {
    if let Some(blocked) = promotion_block(group) {
        return blocked;
    }

    let server = &group.servers[index];
    let master = &group.servers[0].addr;
    if !server.can_force_full_sync {
        return Decision::Reject(format!(
            "Master server: {} not allowed this operation in Group-[{}]: {}",
            server.addr,
            group.name,
            group_summary(group)
        ));
    }

    let command = Command::ForceFullSync {
        group: group.name.clone(),
        addr: server.addr.clone(),
    };
    let title = format!("ForceFullSync server {} in Group-[{}]", server.addr, group.name);
    let question = format!(
        "Do you really want to ForceFullSync server: {} from master: {} ??",
        server.addr, master
    );
    match conflict_note(group) {
        Some(note) => prompt(
            Severity::Escalated,
            title,
            format!("{}\n\n{}\n\n{}", group_summary(group), note, question),
            command,
        ),
        None => prompt(
            Severity::Simple,
            title,
            format!("{}\n\n{}", group_summary(group), question),
            command,
        ),
    }
}

fn resync_sentinels(view: &ViewModel) -> Decision {
    #[derive(Serialize)]
    struct Conflict<'a> {
        group: &'a str,
        logical_master: &'a str,
        ha_real_master: &'a str,
    }

    let servers: Vec<&str> = view.sentinels.iter().map(|s| s.addr.as_str()).collect();
    let servers = serde_json::to_string_pretty(&servers).unwrap_or_default();

    let conflicts: Vec<Conflict<'_>> = view
        .groups
        .iter()
        .filter_map(|g| {
            let real = g.real_master()?;
            Some(Conflict {
                group: &g.name,
                logical_master: &g.servers[0].addr,
                ha_real_master: &g.servers[real].addr,
            })
        })
        .collect();

    if conflicts.is_empty() {
        return prompt(
            Severity::Simple,
            "Resync All Sentinels".to_string(),
            servers,
            Command::ResyncSentinels,
        );
    }

    let conflicts = serde_json::to_string_pretty(&conflicts).unwrap_or_default();
    prompt(
        Severity::Escalated,
        "Resync All Sentinels".to_string(),
        format!(
            "{}\n\nHA: real master & logical master are conflicting: {}\n\nPlease fix these before resync sentinels.",
            servers, conflicts
        ),
        Command::ResyncSentinels,
    )
}

fn simple_addr(addr: &str, title: &str, command: impl FnOnce(String) -> Command) -> Decision {
    if !is_valid_input(addr) {
        return Decision::Skip;
    }
    prompt(
        Severity::Simple,
        format!("{} {}", title, addr),
        String::new(),
        command(addr.to_string()),
    )
}
