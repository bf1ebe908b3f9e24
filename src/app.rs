//! Application state and navigation logic.
//!
//! All state lives here and is only touched from the UI thread. Requests go
//! out through the [`DataSource`]; their results come back through
//! [`App::process_events`], which drops anything addressed to a cluster the
//! operator has since left.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Serialize;

use crate::coordinator::ErrorBody;
use crate::data::{
    parse_stats, BalancerKind, BalancerServer, ClusterInfo, History, ReplicaServer, ShardGroup,
    ViewModel,
};
use crate::dispatch::{decide, is_valid_input, Action, Decision, Prompt, Severity};
use crate::source::{ClusterStats, DataSource, Overview, SourceEvent};
use crate::ui::Theme;

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Shard groups and their replicas.
    Groups,
    Sentinels,
    /// Load-balancer endpoints and template files.
    Endpoints,
}

impl View {
    pub const ALL: [View; 3] = [View::Groups, View::Sentinels, View::Endpoints];

    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Groups => View::Sentinels,
            View::Sentinels => View::Endpoints,
            View::Endpoints => View::Groups,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        match self {
            View::Groups => View::Endpoints,
            View::Sentinels => View::Groups,
            View::Endpoints => View::Sentinels,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            View::Groups => "Groups",
            View::Sentinels => "Sentinels",
            View::Endpoints => "Endpoints",
        }
    }
}

/// One line of the groups table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupRow {
    Group(usize),
    /// (group index, server index)
    Server(usize, usize),
}

/// Which add-form is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormKind {
    CreateGroup,
    AddServer { group: String },
    AddSentinel,
    AddBalancer(BalancerKind),
}

/// A small text form collecting the inputs of an add/create action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputForm {
    pub kind: FormKind,
    /// (label, value) pairs, in tab order.
    pub fields: Vec<(&'static str, String)>,
    pub focus: usize,
}

impl InputForm {
    pub fn new(kind: FormKind) -> Self {
        let labels: &[&'static str] = match &kind {
            FormKind::CreateGroup => &["group", "read port", "write port"],
            FormKind::AddServer { .. } => &["address", "datacenter"],
            FormKind::AddSentinel => &["address"],
            FormKind::AddBalancer(_) => &["address"],
        };
        Self {
            kind,
            fields: labels.iter().map(|l| (*l, String::new())).collect(),
            focus: 0,
        }
    }

    pub fn title(&self) -> String {
        match &self.kind {
            FormKind::CreateGroup => "Create group".to_string(),
            FormKind::AddServer { group } => format!("Add server to Group-[{}]", group),
            FormKind::AddSentinel => "Add sentinel".to_string(),
            FormKind::AddBalancer(kind) => format!("Add {}", kind.as_str()),
        }
    }

    pub fn push(&mut self, c: char) {
        if let Some((_, value)) = self.fields.get_mut(self.focus) {
            value.push(c);
        }
    }

    pub fn pop(&mut self) {
        if let Some((_, value)) = self.fields.get_mut(self.focus) {
            value.pop();
        }
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len().max(1);
    }

    fn value(&self, index: usize) -> String {
        self.fields.get(index).map(|(_, v)| v.trim().to_string()).unwrap_or_default()
    }

    pub fn to_action(&self) -> Action {
        match &self.kind {
            FormKind::CreateGroup => Action::CreateGroup {
                group: self.value(0),
                read_port: self.value(1),
                write_port: self.value(2),
            },
            FormKind::AddServer { group } => Action::AddServer {
                group: group.clone(),
                addr: self.value(0),
                datacenter: self.value(1),
            },
            FormKind::AddSentinel => Action::AddSentinel { addr: self.value(0) },
            FormKind::AddBalancer(kind) => Action::AddBalancer {
                kind: *kind,
                addr: self.value(0),
            },
        }
    }
}

/// Modal overlays. At most one is open at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    Confirm(Prompt),
    /// Informational refusal; no command is sent.
    Notice(String),
    /// A failed request, with the coordinator's payload.
    Error { title: String, body: ErrorBody },
    Input(InputForm),
    ClusterPicker { selected: usize },
    /// Details of the selected replica.
    ServerDetail,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,
    pub dialog: Option<Dialog>,

    // Data source
    source: Box<dyn DataSource>,
    pub clusters: Vec<String>,
    pub cluster: Option<String>,
    pub view: ViewModel,
    pub history: History,
    pub load_error: Option<String>,
    pub last_update: Option<Instant>,
    pub in_flight: usize,

    // Navigation state
    pub selected_row: usize,
    pub selected_sentinel: usize,
    pub selected_endpoint: usize,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(source: Box<dyn DataSource>) -> Self {
        Self {
            running: true,
            current_view: View::Groups,
            show_help: false,
            dialog: None,
            source,
            clusters: Vec::new(),
            cluster: None,
            view: ViewModel::default(),
            history: History::new(),
            load_error: None,
            last_update: None,
            in_flight: 0,
            selected_row: 0,
            selected_sentinel: 0,
            selected_endpoint: 0,
            theme: Theme::auto_detect(),
            status_message: None,
        }
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    pub fn request_clusters(&mut self) {
        self.source.request_clusters();
    }

    /// Switch to `name`, discarding everything known about the previous cluster.
    pub fn select_cluster(&mut self, name: &str) {
        if !is_valid_input(name) || self.cluster.as_deref() == Some(name) {
            return;
        }
        tracing::info!(cluster = name, "selecting cluster");

        self.cluster = Some(name.to_string());
        self.view = ViewModel::new(name);
        self.history.clear();
        self.load_error = None;
        self.last_update = None;
        self.selected_row = 0;
        self.selected_sentinel = 0;
        self.selected_endpoint = 0;
        self.source.request_overview(name);
    }

    /// Whether the selected cluster's overview has arrived.
    pub fn is_connected(&self) -> bool {
        self.cluster.as_deref().is_some_and(is_valid_input)
            && is_valid_input(&self.view.info.admin_addr)
    }

    /// Ask for fresh stats. Does nothing until the overview is known.
    pub fn refresh(&mut self) {
        if !self.is_connected() {
            return;
        }
        if let Some(cluster) = self.cluster.clone() {
            self.source.request_stats(&cluster);
        }
    }

    /// Drain all completed requests. Returns `true` if the view changed.
    pub fn process_events(&mut self) -> bool {
        let mut changed = false;
        while let Some(event) = self.source.poll() {
            changed |= self.handle_source_event(event);
        }
        changed
    }

    fn is_current(&self, cluster: &str) -> bool {
        self.cluster.as_deref() == Some(cluster)
    }

    /// Apply one completed request. Returns `true` if the view changed.
    pub fn handle_source_event(&mut self, event: SourceEvent) -> bool {
        match event {
            SourceEvent::Clusters(Ok(names)) => {
                self.clusters = names;
                if let Some(Dialog::ClusterPicker { selected }) = &mut self.dialog {
                    *selected = (*selected).min(self.clusters.len().saturating_sub(1));
                }
                false
            }
            SourceEvent::Clusters(Err(e)) => {
                self.set_status_message(format!("Cluster list failed: {}", e));
                false
            }
            SourceEvent::Overview { cluster, result } => {
                if !self.is_current(&cluster) {
                    tracing::debug!(%cluster, "dropping stale overview");
                    return false;
                }
                match result {
                    Ok(overview) => self.apply_overview(overview),
                    Err(e) => {
                        self.dialog = Some(Dialog::Error {
                            title: format!("Overview of {}", cluster),
                            body: e.detail(),
                        });
                        false
                    }
                }
            }
            SourceEvent::Stats { cluster, result } => {
                if !self.is_current(&cluster) {
                    tracing::debug!(%cluster, "dropping stale stats");
                    return false;
                }
                match result {
                    Ok(stats) => self.apply_stats(&stats),
                    Err(e) => {
                        self.load_error = Some(e.to_string());
                        false
                    }
                }
            }
            SourceEvent::CommandDone {
                cluster,
                command,
                result,
            } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                match result {
                    Ok(()) => {
                        self.set_status_message(format!("Done: {}", command));
                        if self.is_current(&cluster) {
                            self.refresh();
                        }
                    }
                    Err(e) => {
                        self.dialog = Some(Dialog::Error {
                            title: format!("Failed: {}", command),
                            body: e.detail(),
                        });
                    }
                }
                false
            }
        }
    }

    fn apply_overview(&mut self, overview: Overview) -> bool {
        let info = cluster_info(&overview);
        let changed = self.view.info != info;
        self.view.info = info;

        match overview.stats {
            Some(stats) => self.apply_stats(&stats) || changed,
            None => changed,
        }
    }

    fn apply_stats(&mut self, stats: &ClusterStats) -> bool {
        let Some(cluster) = self.cluster.clone() else {
            return false;
        };

        let changed = self.view.apply(parse_stats(stats, &cluster));
        // One sample per successful poll, changed or not
        self.history.record(&self.view);
        self.load_error = None;
        self.last_update = Some(Instant::now());
        self.clamp_selection();
        changed
    }

    fn clamp_selection(&mut self) {
        let rows = self.group_rows().len();
        self.selected_row = self.selected_row.min(rows.saturating_sub(1));
        self.selected_sentinel = self.selected_sentinel.min(self.view.sentinels.len().saturating_sub(1));
        self.selected_endpoint = self.selected_endpoint.min(self.endpoint_count().saturating_sub(1));
    }

    // === Commands ===

    /// Run `action` through the dispatcher and open the resulting dialog.
    pub fn request(&mut self, action: Action) {
        let cluster = self.cluster.clone().unwrap_or_default();
        match decide(&cluster, &action, &self.view) {
            Decision::Skip => tracing::debug!(?action, "skipping action with missing input"),
            Decision::Reject(text) => self.dialog = Some(Dialog::Notice(text)),
            Decision::Confirm(prompt) => self.dialog = Some(Dialog::Confirm(prompt)),
        }
    }

    /// Confirm the open prompt. Escalated prompts need `strong` confirmation.
    pub fn confirm(&mut self, strong: bool) {
        let Some(Dialog::Confirm(prompt)) = &self.dialog else {
            return;
        };
        if prompt.severity == Severity::Escalated && !strong {
            self.set_status_message("Conflicting HA state: press Y to confirm".to_string());
            return;
        }

        let Some(Dialog::Confirm(prompt)) = self.dialog.take() else {
            return;
        };
        let Some(cluster) = self.cluster.clone() else {
            return;
        };
        self.set_status_message(format!("Sent: {}", prompt.command));
        self.in_flight += 1;
        self.source.submit(&cluster, prompt.command);
    }

    pub fn submit_form(&mut self) {
        let Some(Dialog::Input(form)) = self.dialog.take() else {
            return;
        };
        self.request(form.to_action());
    }

    pub fn open_form(&mut self, kind: FormKind) {
        if self.cluster.is_none() {
            self.set_status_message("Select a cluster first (c)".to_string());
            return;
        }
        self.dialog = Some(Dialog::Input(InputForm::new(kind)));
    }

    /// Add-form appropriate to the current view.
    pub fn open_add_form(&mut self, alternate: bool) {
        match self.current_view {
            View::Groups => match self.selected_group().map(|g| g.name.clone()) {
                Some(group) if !alternate => self.open_form(FormKind::AddServer { group }),
                _ => self.open_form(FormKind::CreateGroup),
            },
            View::Sentinels => self.open_form(FormKind::AddSentinel),
            View::Endpoints => {
                let kind = if alternate {
                    BalancerKind::Lvs
                } else {
                    BalancerKind::Haproxy
                };
                self.open_form(FormKind::AddBalancer(kind))
            }
        }
    }

    /// Remove whatever is selected in the current view.
    pub fn request_remove(&mut self, force: bool) {
        let action = match self.current_view {
            View::Groups => match self.selected_group_row() {
                Some(GroupRow::Group(g)) => Action::RemoveGroup {
                    group: self.view.groups[g].name.clone(),
                },
                Some(GroupRow::Server(g, s)) => Action::RemoveServer {
                    group: self.view.groups[g].name.clone(),
                    addr: self.view.groups[g].servers[s].addr.clone(),
                },
                None => return,
            },
            View::Sentinels => match self.view.sentinels.get(self.selected_sentinel) {
                Some(s) => Action::RemoveSentinel {
                    addr: s.addr.clone(),
                    force,
                },
                None => return,
            },
            View::Endpoints => match self.selected_balancer() {
                Some((kind, b)) => Action::RemoveBalancer {
                    kind,
                    addr: b.addr.clone(),
                },
                None => return,
            },
        };
        self.request(action);
    }

    pub fn request_promote(&mut self) {
        if let Some((group, addr)) = self.selected_server_key() {
            self.request(Action::PromoteServer { group, addr });
        }
    }

    pub fn request_force_full_sync(&mut self) {
        if let Some((group, addr)) = self.selected_server_key() {
            self.request(Action::ForceFullSync { group, addr });
        }
    }

    /// Resync the selected group, or all sentinels on the sentinel view.
    pub fn request_resync(&mut self) {
        match self.current_view {
            View::Groups => {
                if let Some(group) = self.selected_group().map(|g| g.name.clone()) {
                    self.request(Action::ResyncGroup { group });
                }
            }
            View::Sentinels => self.request(Action::ResyncSentinels),
            View::Endpoints => {}
        }
    }

    pub fn request_resync_all(&mut self) {
        self.request(Action::ResyncAllGroups);
    }

    // === Selection ===

    /// Flattened group table: each group followed by its servers.
    pub fn group_rows(&self) -> Vec<GroupRow> {
        let mut rows = Vec::new();
        for (g, group) in self.view.groups.iter().enumerate() {
            rows.push(GroupRow::Group(g));
            rows.extend((0..group.servers.len()).map(|s| GroupRow::Server(g, s)));
        }
        rows
    }

    pub fn selected_group_row(&self) -> Option<GroupRow> {
        self.group_rows().get(self.selected_row).copied()
    }

    /// Group of the selected row, whether a group or server row.
    pub fn selected_group(&self) -> Option<&ShardGroup> {
        match self.selected_group_row()? {
            GroupRow::Group(g) | GroupRow::Server(g, _) => self.view.groups.get(g),
        }
    }

    pub fn selected_server(&self) -> Option<&ReplicaServer> {
        match self.selected_group_row()? {
            GroupRow::Server(g, s) => self.view.groups.get(g)?.servers.get(s),
            GroupRow::Group(_) => None,
        }
    }

    fn selected_server_key(&self) -> Option<(String, String)> {
        let group = self.selected_group()?.name.clone();
        let addr = self.selected_server()?.addr.clone();
        Some((group, addr))
    }

    /// Endpoint rows: haproxy first, then lvs.
    pub fn endpoint_count(&self) -> usize {
        self.view.haproxy.len() + self.view.lvs.len()
    }

    pub fn selected_balancer(&self) -> Option<(BalancerKind, &BalancerServer)> {
        let i = self.selected_endpoint;
        match self.view.haproxy.get(i) {
            Some(b) => Some((BalancerKind::Haproxy, b)),
            None => self
                .view
                .lvs
                .get(i - self.view.haproxy.len())
                .map(|b| (BalancerKind::Lvs, b)),
        }
    }

    fn row_count(&self) -> usize {
        match self.current_view {
            View::Groups => self.group_rows().len(),
            View::Sentinels => self.view.sentinels.len(),
            View::Endpoints => self.endpoint_count(),
        }
    }

    fn selection_mut(&mut self) -> &mut usize {
        match self.current_view {
            View::Groups => &mut self.selected_row,
            View::Sentinels => &mut self.selected_sentinel,
            View::Endpoints => &mut self.selected_endpoint,
        }
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    pub fn select_next_n(&mut self, n: usize) {
        let max = self.row_count().saturating_sub(1);
        let selected = self.selection_mut();
        *selected = (*selected + n).min(max);
    }

    pub fn select_prev_n(&mut self, n: usize) {
        let selected = self.selection_mut();
        *selected = selected.saturating_sub(n);
    }

    pub fn select_first(&mut self) {
        *self.selection_mut() = 0;
    }

    pub fn select_last(&mut self) {
        let last = self.row_count().saturating_sub(1);
        *self.selection_mut() = last;
    }

    // === Views and overlays ===

    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    /// Open the detail overlay for the selected replica.
    pub fn enter_detail(&mut self) {
        if self.current_view == View::Groups && self.selected_server().is_some() {
            self.dialog = Some(Dialog::ServerDetail);
        }
    }

    pub fn open_cluster_picker(&mut self) {
        let selected = self
            .cluster
            .as_ref()
            .and_then(|c| self.clusters.iter().position(|n| n == c))
            .unwrap_or(0);
        self.dialog = Some(Dialog::ClusterPicker { selected });
        self.request_clusters();
    }

    pub fn picker_move(&mut self, down: bool) {
        let max = self.clusters.len().saturating_sub(1);
        if let Some(Dialog::ClusterPicker { selected }) = &mut self.dialog {
            *selected = if down {
                (*selected + 1).min(max)
            } else {
                selected.saturating_sub(1)
            };
        }
    }

    pub fn picker_choose(&mut self) {
        let Some(Dialog::ClusterPicker { selected }) = self.dialog else {
            return;
        };
        self.dialog = None;
        if let Some(name) = self.clusters.get(selected).cloned() {
            self.select_cluster(&name);
        }
    }

    /// Close the open dialog, or the help overlay.
    pub fn go_back(&mut self) {
        if self.dialog.take().is_none() {
            self.show_help = false;
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the current view model to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        if self.cluster.is_none() {
            anyhow::bail!("No cluster selected");
        }
        write_export(&self.view, &self.history, path)
    }
}

/// Header identity from a coordinator overview.
pub fn cluster_info(overview: &Overview) -> ClusterInfo {
    ClusterInfo {
        admin_addr: overview
            .model
            .as_ref()
            .map(|m| m.admin_addr.clone())
            .unwrap_or_default(),
        coordinator_kind: coordinator_kind(&overview.config.coordinator_name),
        coordinator_addr: overview.config.coordinator_addr.clone(),
    }
}

/// `"zookeeper"` becomes `"[Zookeeper]"`.
fn coordinator_kind(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("[{}{}]", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

#[derive(Serialize)]
struct Export<'a> {
    total_ops_per_sec: Option<u64>,
    #[serde(flatten)]
    view: &'a ViewModel,
}

/// Write `view` as pretty JSON.
pub fn write_export(view: &ViewModel, history: &History, path: &Path) -> Result<()> {
    let export = Export {
        total_ops_per_sec: history.total_ops(),
        view,
    };
    let json = serde_json::to_string_pretty(&export)?;
    std::fs::write(path, json)?;
    tracing::info!(path = %path.display(), "exported view");
    Ok(())
}
