use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{PanelSettings, Settings};
use crate::error::{FmError, Result};
use crate::services::messages::Messages;
use crate::services::remote::{DirectoryService, EntryKind, TreeDirectory};
use crate::ui::panel::{
    sort_by_to_string, sort_order_to_string, view_type_to_string, PanelSide, PanelState,
};
use crate::ui::tree::{TreeCache, TreeRow};
use crate::utils::format::{is_same_or_descendant, normalize_dir, parent_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardOperation {
    Copy,
    Cut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardItem {
    pub kind: EntryKind,
    pub path: String,
}

/// Clipboard state for entries to copy/move. One per application,
/// whichever panel filled it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clipboard {
    pub operation: ClipboardOperation,
    pub disk: String,
    pub items: Vec<ClipboardItem>,
}

/// Keep the first error of a sequence of steps that all run.
fn keep_first(first: &mut Option<FmError>, result: Result<()>) {
    if let Err(e) = result {
        first.get_or_insert(e);
    }
}

fn into_result(first: Option<FmError>) -> Result<()> {
    match first {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

pub struct App {
    pub left_panel: PanelState,
    pub right_panel: PanelState,
    pub active_panel: PanelSide,
    pub tree: TreeCache,
    pub clipboard: Option<Clipboard>,
    pub messages: Messages,
    pub settings: Settings,
}

impl App {
    pub fn new(settings: Settings, service: Arc<dyn DirectoryService>) -> Self {
        let show_hidden = settings.hidden_files;
        let active_panel = PanelSide::parse(&settings.active_panel);
        let left_panel = PanelState::with_settings(
            PanelSide::Left,
            service.clone(),
            &settings.left_panel,
            show_hidden,
        );
        let right_panel = PanelState::with_settings(
            PanelSide::Right,
            service.clone(),
            &settings.right_panel,
            show_hidden,
        );
        let tree_disk = match active_panel {
            PanelSide::Left => settings.left_panel.disk.clone(),
            PanelSide::Right => settings.right_panel.disk.clone(),
        };

        Self {
            left_panel,
            right_panel,
            active_panel,
            tree: TreeCache::new(service, &tree_disk),
            clipboard: None,
            messages: Messages::new(),
            settings,
        }
    }

    /// Load the tree for the active panel's disk and open both panels at
    /// their configured start directories. Every step runs; the first error
    /// is returned.
    pub async fn initialize(&mut self) -> Result<()> {
        let mut first = None;
        let disk = self.active_panel().selected_disk().to_string();
        keep_first(
            &mut first,
            self.tree.initialize(&disk, &mut self.messages).await.map(|_| ()),
        );

        let left_path = self.settings.left_panel.path.clone();
        let right_path = self.settings.right_panel.path.clone();
        keep_first(
            &mut first,
            self.left_panel
                .navigate(left_path.as_deref(), true, &mut self.messages)
                .await,
        );
        keep_first(
            &mut first,
            self.right_panel
                .navigate(right_path.as_deref(), true, &mut self.messages)
                .await,
        );
        info!(
            disk = %disk,
            tree_nodes = self.tree.len(),
            active = self.active_panel.as_str(),
            "app initialized"
        );
        into_result(first)
    }

    // ========== panels ==========

    pub fn active_panel(&self) -> &PanelState {
        self.panel(self.active_panel)
    }

    pub fn active_panel_mut(&mut self) -> &mut PanelState {
        self.panel_mut(self.active_panel)
    }

    pub fn target_panel(&self) -> &PanelState {
        self.panel(self.active_panel.other())
    }

    pub fn panel(&self, side: PanelSide) -> &PanelState {
        match side {
            PanelSide::Left => &self.left_panel,
            PanelSide::Right => &self.right_panel,
        }
    }

    pub fn panel_mut(&mut self, side: PanelSide) -> &mut PanelState {
        match side {
            PanelSide::Left => &mut self.left_panel,
            PanelSide::Right => &mut self.right_panel,
        }
    }

    fn panel_and_messages(&mut self, side: PanelSide) -> (&mut PanelState, &mut Messages) {
        match side {
            PanelSide::Left => (&mut self.left_panel, &mut self.messages),
            PanelSide::Right => (&mut self.right_panel, &mut self.messages),
        }
    }

    /// Make `side` the active panel. The tree follows the active panel's disk.
    pub async fn set_active(&mut self, side: PanelSide) -> Result<()> {
        self.active_panel = side;
        self.sync_tree_disk().await
    }

    pub async fn switch_panel(&mut self) -> Result<()> {
        self.set_active(self.active_panel.other()).await
    }

    async fn sync_tree_disk(&mut self) -> Result<()> {
        let disk = self.active_panel().selected_disk().to_string();
        if disk == self.tree.disk() {
            return Ok(());
        }
        debug!(disk = %disk, "tree follows active panel disk");
        self.tree.initialize(&disk, &mut self.messages).await.map(|_| ())
    }

    /// Navigate the active panel to `path` and reveal it in the tree.
    pub async fn open(&mut self, path: &str) -> Result<()> {
        let mut first = None;
        let side = self.active_panel;
        let (panel, messages) = self.panel_and_messages(side);
        keep_first(&mut first, panel.navigate(Some(path), true, messages).await);

        if let Some(path) = normalize_dir(Some(path)) {
            keep_first(
                &mut first,
                self.tree.reopen_path(&path, &mut self.messages).await,
            );
        }
        into_result(first)
    }

    /// Switch the disk of one panel. The tree is reloaded when the active
    /// panel lands on a disk other than the one it shows.
    pub async fn select_disk(&mut self, side: PanelSide, disk: &str) -> Result<()> {
        let (panel, messages) = self.panel_and_messages(side);
        let result = panel.select_disk(disk, messages).await;
        if side == self.active_panel {
            let tree = self.sync_tree_disk().await;
            return result.and(tree);
        }
        result
    }

    /// Sidebar rows, honoring the hidden-files setting
    pub fn tree_rows(&self) -> Vec<TreeRow<'_>> {
        self.tree.rows(self.settings.hidden_files)
    }

    pub fn set_hidden_files(&mut self, show: bool) {
        self.settings.hidden_files = show;
        self.left_panel.show_hidden = show;
        self.right_panel.show_hidden = show;
    }

    // ========== clipboard ==========

    /// Capture the active panel's selection. The previous clipboard is
    /// replaced as a whole; an empty selection leaves it untouched.
    /// Returns the number of captured items.
    pub fn to_clipboard(&mut self, operation: ClipboardOperation) -> usize {
        let panel = self.active_panel();
        let selection = panel.selection();
        let items: Vec<ClipboardItem> = selection
            .directories()
            .iter()
            .map(|p| (EntryKind::Dir, p))
            .chain(selection.files().iter().map(|p| (EntryKind::File, p)))
            .map(|(kind, path)| ClipboardItem {
                kind,
                path: path.clone(),
            })
            .collect();

        if items.is_empty() {
            return 0;
        }

        let count = items.len();
        self.clipboard = Some(Clipboard {
            operation,
            disk: panel.selected_disk().to_string(),
            items,
        });
        debug!(count, ?operation, "clipboard filled");
        count
    }

    pub fn clear_clipboard(&mut self) {
        self.clipboard = None;
    }

    pub fn has_clipboard(&self) -> bool {
        self.clipboard.is_some()
    }

    // ========== external changes ==========

    /// Directories were created under `parent` (`None` for the disk root) on
    /// the tree's disk. The tree receives them unless `parent` is a cached
    /// node whose children were never loaded; a `parent` missing from the
    /// tree is reported as not found. Panels showing `parent` are refreshed.
    pub async fn directory_created(
        &mut self,
        parent: Option<&str>,
        dirs: Vec<TreeDirectory>,
    ) -> Result<()> {
        let mut first = None;
        let parent = normalize_dir(parent);
        let insert = match parent.as_deref() {
            None => true,
            Some(p) => self
                .tree
                .get(p)
                .map_or(true, |n| n.props.subdirectories_loaded),
        };
        if insert {
            let inserted = self
                .tree
                .insert_subtree(parent.as_deref(), dirs, &mut self.messages)
                .map(|_| ());
            keep_first(&mut first, inserted);
        }

        let disk = self.tree.disk().to_string();
        for side in [PanelSide::Left, PanelSide::Right] {
            let (panel, messages) = self.panel_and_messages(side);
            if panel.selected_disk() == disk && panel.selected_directory() == parent.as_deref() {
                keep_first(&mut first, panel.refresh(messages).await);
            }
        }
        into_result(first)
    }

    /// Entries at `paths` were deleted on the tree's disk. Their tree nodes
    /// and clipboard items go away; a panel inside a deleted directory moves
    /// to its parent, a panel showing the parent is refreshed.
    pub async fn paths_deleted<S: AsRef<str>>(&mut self, paths: &[S]) -> Result<()> {
        let mut first = None;
        let removed = self.tree.remove_subtree(paths);
        let disk = self.tree.disk().to_string();
        debug!(paths = paths.len(), removed, "paths deleted");

        let is_deleted =
            |path: &str| paths.iter().any(|p| is_same_or_descendant(path, p.as_ref()));
        if let Some(clipboard) = self.clipboard.as_mut().filter(|c| c.disk == disk) {
            clipboard.items.retain(|item| !is_deleted(&item.path));
        }
        if self.clipboard.as_ref().is_some_and(|c| c.items.is_empty()) {
            self.clipboard = None;
        }

        for side in [PanelSide::Left, PanelSide::Right] {
            let (panel, messages) = self.panel_and_messages(side);
            if panel.selected_disk() != disk {
                continue;
            }
            let current = panel.selected_directory().map(str::to_string);
            let inside = current.as_deref().and_then(|dir| {
                paths
                    .iter()
                    .map(|p| p.as_ref())
                    .find(|p| is_same_or_descendant(dir, p))
            });

            if let Some(deleted) = inside {
                let parent = parent_path(deleted);
                keep_first(
                    &mut first,
                    panel.navigate(parent.as_deref(), true, messages).await,
                );
            } else if paths
                .iter()
                .any(|p| parent_path(p.as_ref()) == current)
            {
                keep_first(&mut first, panel.refresh(messages).await);
            }
        }
        into_result(first)
    }

    // ========== settings ==========

    /// Copy the current panel state into `settings`.
    pub fn sync_settings(&mut self) {
        let snapshot = |panel: &PanelState| PanelSettings {
            disk: panel.selected_disk().to_string(),
            path: panel.selected_directory().map(str::to_string),
            sort_by: sort_by_to_string(panel.sort_by),
            sort_order: sort_order_to_string(panel.sort_order),
            view_type: view_type_to_string(panel.view_type),
        };
        self.settings.left_panel = snapshot(&self.left_panel);
        self.settings.right_panel = snapshot(&self.right_panel);
        self.settings.active_panel = self.active_panel.as_str().to_string();
    }

    /// Sync and write settings, to `path` or the default location.
    pub fn save_settings(&mut self, path: Option<&Path>) -> Result<()> {
        self.sync_settings();
        match path {
            Some(path) => self.settings.save_to(path),
            None => self.settings.save(),
        }
    }
}
