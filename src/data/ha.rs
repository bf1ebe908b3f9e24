//! HA role reconciliation.
//!
//! Cross-references the master each group's sentinels agree on with the
//! group's configured server order (index 0 is the configured master).

use std::collections::BTreeMap;

use super::view::{HaRole, ShardGroup};

/// Suffix appended to the label of the sentinel-elected server.
const HA_SUFFIX: &str = " [HA]";

/// Assign HA roles, labels and dangling-master warnings to every group.
///
/// `masters` maps group name to the sentinel-observed master address. Roles
/// are only derived when `has_sentinels` is set; otherwise every server is
/// [`HaRole::Undefined`] and no warning is raised.
///
/// Returns `true` if any group changed.
pub fn reconcile(
    groups: &mut [ShardGroup],
    masters: &BTreeMap<String, String>,
    has_sentinels: bool,
) -> bool {
    let mut changed = false;
    for group in groups.iter_mut() {
        let master = if has_sentinels {
            masters.get(&group.name).map(String::as_str)
        } else {
            None
        };
        changed |= reconcile_group(group, master);
    }
    changed
}

fn reconcile_group(group: &mut ShardGroup, ha_master: Option<&str>) -> bool {
    let mut changed = false;
    let mut found = false;

    for (index, server) in group.servers.iter_mut().enumerate() {
        let elected = ha_master == Some(server.addr.as_str());
        let role = match ha_master {
            None => HaRole::Undefined,
            Some(_) if index == 0 && elected => HaRole::Master,
            Some(_) if index == 0 => HaRole::NotMaster,
            Some(_) if elected => HaRole::RealMaster,
            Some(_) => HaRole::Slave,
        };

        let label = if elected {
            found = true;
            format!("{}{}", server.addr, HA_SUFFIX)
        } else {
            server.addr.clone()
        };

        changed |= server.ha_role != role || server.label != label;
        server.ha_role = role;
        server.label = label;
    }

    let warning = match ha_master {
        Some(addr) if !found => Some(format!("[HA: {}]", addr)),
        _ => None,
    };
    changed |= group.ha_warning != warning;
    group.ha_warning = warning;

    changed
}
