use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::PanelSettings;
use crate::error::{FmError, Result};
use crate::services::messages::Messages;
use crate::services::remote::{ContentResponse, DirectoryService, Entry, EntryKind};
use crate::ui::selection::Selection;
use crate::utils::format::{basename, format_size, is_hidden, normalize_dir, parent_path, path_prefixes};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelSide {
    Left,
    Right,
}

impl PanelSide {
    pub fn other(self) -> Self {
        match self {
            PanelSide::Left => PanelSide::Right,
            PanelSide::Right => PanelSide::Left,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PanelSide::Left => "left",
            PanelSide::Right => "right",
        }
    }

    /// Anything but "right" is the left panel
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("right") {
            PanelSide::Right
        } else {
            PanelSide::Left
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Name,
    Type,
    Size,
    Modified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewType {
    Table,
    Grid,
}

/// Parse sort_by string from settings to SortBy enum
pub fn parse_sort_by(s: &str) -> SortBy {
    match s.to_lowercase().as_str() {
        "type" => SortBy::Type,
        "size" => SortBy::Size,
        "modified" | "date" => SortBy::Modified,
        _ => SortBy::Name,
    }
}

/// Parse sort_order string from settings to SortOrder enum
pub fn parse_sort_order(s: &str) -> SortOrder {
    match s.to_lowercase().as_str() {
        "desc" | "down" => SortOrder::Desc,
        _ => SortOrder::Asc,
    }
}

pub fn parse_view_type(s: &str) -> ViewType {
    match s.to_lowercase().as_str() {
        "grid" => ViewType::Grid,
        _ => ViewType::Table,
    }
}

/// Convert SortBy enum to string for settings
pub fn sort_by_to_string(sort_by: SortBy) -> String {
    match sort_by {
        SortBy::Name => "name".to_string(),
        SortBy::Type => "type".to_string(),
        SortBy::Size => "size".to_string(),
        SortBy::Modified => "modified".to_string(),
    }
}

/// Convert SortOrder enum to string for settings
pub fn sort_order_to_string(sort_order: SortOrder) -> String {
    match sort_order {
        SortOrder::Asc => "asc".to_string(),
        SortOrder::Desc => "desc".to_string(),
    }
}

pub fn view_type_to_string(view_type: ViewType) -> String {
    match view_type {
        ViewType::Table => "table".to_string(),
        ViewType::Grid => "grid".to_string(),
    }
}

fn compare_entries(a: &Entry, b: &Entry, sort_by: SortBy, sort_order: SortOrder) -> Ordering {
    let by_name = || a.basename.to_lowercase().cmp(&b.basename.to_lowercase());
    let cmp = match sort_by {
        SortBy::Name => by_name(),
        SortBy::Type => {
            let ext_a = a.extension.as_deref().unwrap_or("").to_lowercase();
            let ext_b = b.extension.as_deref().unwrap_or("").to_lowercase();
            ext_a.cmp(&ext_b).then_with(by_name)
        }
        SortBy::Size => a.size.cmp(&b.size),
        SortBy::Modified => a.timestamp.cmp(&b.timestamp),
    };
    match sort_order {
        SortOrder::Asc => cmp,
        SortOrder::Desc => cmp.reverse(),
    }
}

/// Ticket for one listing fetch. Only the ticket with the panel's current
/// generation may update the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub generation: u64,
    pub disk: String,
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreadcrumbItem {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelSummary {
    pub directories: usize,
    pub files: usize,
    pub files_size: u64,
    pub selected: usize,
    pub selected_size: u64,
}

impl fmt::Display for PanelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} dirs, {} files ({})",
            self.directories,
            self.files,
            format_size(self.files_size)
        )?;
        if self.selected > 0 {
            write!(f, ", {} selected ({})", self.selected, format_size(self.selected_size))?;
        }
        Ok(())
    }
}

/// Navigation state of one pane: disk, working directory, listing,
/// selection and back/forward history.
pub struct PanelState {
    side: PanelSide,
    service: Arc<dyn DirectoryService>,
    selected_disk: String,
    /// `None` is the disk root
    selected_directory: Option<String>,
    directories: Vec<Entry>,
    files: Vec<Entry>,
    selection: Selection,
    history: Vec<Option<String>>,
    /// `None` iff `history` is empty
    history_pointer: Option<usize>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub view_type: ViewType,
    pub show_hidden: bool,
    generation: u64,
}

impl PanelState {
    pub fn new(side: PanelSide, service: Arc<dyn DirectoryService>, disk: &str) -> Self {
        Self {
            side,
            service,
            selected_disk: disk.to_string(),
            selected_directory: None,
            directories: Vec::new(),
            files: Vec::new(),
            selection: Selection::new(),
            history: Vec::new(),
            history_pointer: None,
            sort_by: SortBy::Name,
            sort_order: SortOrder::Asc,
            view_type: ViewType::Table,
            show_hidden: false,
            generation: 0,
        }
    }

    /// Create a PanelState with settings from config
    pub fn with_settings(
        side: PanelSide,
        service: Arc<dyn DirectoryService>,
        panel_settings: &PanelSettings,
        show_hidden: bool,
    ) -> Self {
        let mut state = Self::new(side, service, &panel_settings.disk);
        let (sort_by, sort_order) = panel_settings.sort();
        state.sort_by = sort_by;
        state.sort_order = sort_order;
        state.view_type = panel_settings.view();
        state.show_hidden = show_hidden;
        state
    }

    pub fn side(&self) -> PanelSide {
        self.side
    }

    pub fn selected_disk(&self) -> &str {
        &self.selected_disk
    }

    pub fn selected_directory(&self) -> Option<&str> {
        self.selected_directory.as_deref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &[Option<String>] {
        &self.history
    }

    pub fn history_pointer(&self) -> Option<usize> {
        self.history_pointer
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ========== navigation ==========

    /// Synchronous half of a navigation: moves the panel to `path`, clears the
    /// selection, records history when asked, and hands out the ticket the
    /// listing response must be applied with.
    pub fn begin_navigation(&mut self, path: Option<&str>, record_history: bool) -> ListingRequest {
        let path = normalize_dir(path);
        self.selected_directory = path.clone();
        self.selection.clear();

        if record_history {
            let keep = self.history_pointer.map_or(0, |p| p + 1);
            self.history.truncate(keep);
            self.history.push(path.clone());
            self.history_pointer = Some(self.history.len() - 1);
        }

        self.next_request()
    }

    fn next_request(&mut self) -> ListingRequest {
        self.generation += 1;
        ListingRequest {
            generation: self.generation,
            disk: self.selected_disk.clone(),
            path: self.selected_directory.clone(),
        }
    }

    pub async fn fetch(
        &self,
        request: &ListingRequest,
        messages: &mut Messages,
    ) -> Result<ContentResponse> {
        debug!(side = self.side.as_str(), disk = %request.disk, path = ?request.path, "panel: fetching listing");
        messages.add_loading();
        let response = self
            .service
            .content(&request.disk, request.path.as_deref())
            .await;
        messages.subtract_loading();
        response
    }

    /// Merge a listing response. Responses for superseded requests are
    /// dropped with `FmError::Cancelled`; a failed fetch empties the listing
    /// and is reported.
    pub fn apply_listing(
        &mut self,
        request: &ListingRequest,
        response: Result<ContentResponse>,
        messages: &mut Messages,
    ) -> Result<()> {
        if request.generation != self.generation {
            debug!(
                side = self.side.as_str(),
                stale = request.generation,
                current = self.generation,
                "panel: dropping stale listing"
            );
            return Err(FmError::Cancelled {
                generation: request.generation,
            });
        }

        match response.and_then(|r| r.into_entries()) {
            Ok((directories, files)) => {
                self.directories = directories;
                self.files = files;
                self.sort_listing();
                let (dirs, files) = (&self.directories, &self.files);
                self.selection.retain(|kind, path| {
                    let list = match kind {
                        EntryKind::Dir => dirs,
                        EntryKind::File => files,
                    };
                    list.iter().any(|e| e.path == path)
                });
                Ok(())
            }
            Err(e) => {
                self.directories.clear();
                self.files.clear();
                self.selection.clear();
                messages.report(&e);
                Err(e)
            }
        }
    }

    /// Go to `path` (`None` for the disk root) and load its listing.
    /// With `record_history` forward entries past the pointer are discarded
    /// before `path` is appended.
    pub async fn navigate(
        &mut self,
        path: Option<&str>,
        record_history: bool,
        messages: &mut Messages,
    ) -> Result<()> {
        let request = self.begin_navigation(path, record_history);
        let response = self.fetch(&request, messages).await;
        self.apply_listing(&request, response, messages)
    }

    /// Reload the current directory. History is untouched and selected entries
    /// that still exist stay selected.
    pub async fn refresh(&mut self, messages: &mut Messages) -> Result<()> {
        let request = self.next_request();
        let response = self.fetch(&request, messages).await;
        self.apply_listing(&request, response, messages)
    }

    /// Parent directory; at the disk root this is a no-op.
    pub async fn up(&mut self, messages: &mut Messages) -> Result<()> {
        let Some(current) = self.selected_directory.as_deref() else {
            return Ok(());
        };
        let parent = parent_path(current);
        self.navigate(parent.as_deref(), true, messages).await
    }

    pub fn can_history_back(&self) -> bool {
        self.history_pointer.is_some_and(|p| p > 0)
    }

    pub fn can_history_forward(&self) -> bool {
        self.history_pointer
            .is_some_and(|p| p + 1 < self.history.len())
    }

    pub async fn history_back(&mut self, messages: &mut Messages) -> Result<()> {
        let Some(pointer) = self.history_pointer.filter(|p| *p > 0) else {
            return Ok(());
        };
        self.replay(pointer - 1, messages).await
    }

    pub async fn history_forward(&mut self, messages: &mut Messages) -> Result<()> {
        let Some(pointer) = self.history_pointer.filter(|p| p + 1 < self.history.len()) else {
            return Ok(());
        };
        self.replay(pointer + 1, messages).await
    }

    async fn replay(&mut self, pointer: usize, messages: &mut Messages) -> Result<()> {
        self.history_pointer = Some(pointer);
        let path = self.history[pointer].clone();
        self.navigate(path.as_deref(), false, messages).await
    }

    /// Switch storage backend: history restarts at the new disk's root.
    pub async fn select_disk(&mut self, disk: &str, messages: &mut Messages) -> Result<()> {
        if disk == self.selected_disk {
            return Ok(());
        }
        self.selected_disk = disk.to_string();
        self.history.clear();
        self.history_pointer = None;
        self.navigate(None, true, messages).await
    }

    // ========== presentation ==========

    pub fn set_sort(&mut self, sort_by: SortBy, sort_order: SortOrder) {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self.sort_listing();
    }

    /// Same field flips the direction, a new field starts ascending.
    pub fn toggle_sort(&mut self, sort_by: SortBy) {
        if self.sort_by == sort_by {
            self.sort_order = match self.sort_order {
                SortOrder::Asc => SortOrder::Desc,
                SortOrder::Desc => SortOrder::Asc,
            };
        } else {
            self.sort_by = sort_by;
            self.sort_order = SortOrder::Asc;
        }
        self.sort_listing();
    }

    pub fn set_view(&mut self, view_type: ViewType) {
        self.view_type = view_type;
    }

    fn sort_listing(&mut self) {
        let (sort_by, sort_order) = (self.sort_by, self.sort_order);
        self.directories
            .sort_by(|a, b| compare_entries(a, b, sort_by, sort_order));
        self.files
            .sort_by(|a, b| compare_entries(a, b, sort_by, sort_order));
    }

    // ========== selection ==========

    fn entry(&self, kind: EntryKind, path: &str) -> Option<&Entry> {
        let list = match kind {
            EntryKind::Dir => &self.directories,
            EntryKind::File => &self.files,
        };
        list.iter().find(|e| e.path == path)
    }

    /// Entries outside the current listing cannot be selected.
    pub fn add_selection(&mut self, kind: EntryKind, path: &str) -> bool {
        self.entry(kind, path).is_some() && self.selection.add(kind, path)
    }

    pub fn remove_selection(&mut self, kind: EntryKind, path: &str) -> bool {
        self.selection.remove(kind, path)
    }

    pub fn toggle_selection(&mut self, kind: EntryKind, path: &str) -> bool {
        if !self.selection.contains(kind, path) && self.entry(kind, path).is_none() {
            return false;
        }
        self.selection.toggle(kind, path)
    }

    pub fn single_select(&mut self, kind: EntryKind, path: &str) -> bool {
        if self.entry(kind, path).is_none() {
            return false;
        }
        self.selection.single(kind, path);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Select every visible entry
    pub fn select_all(&mut self) {
        let visible: Vec<(EntryKind, String)> = self
            .directories()
            .into_iter()
            .chain(self.files())
            .map(|e| (e.kind, e.path.clone()))
            .collect();
        for (kind, path) in visible {
            self.selection.add(kind, &path);
        }
    }

    pub fn invert_selection(&mut self) {
        let visible: Vec<(EntryKind, String)> = self
            .directories()
            .into_iter()
            .chain(self.files())
            .map(|e| (e.kind, e.path.clone()))
            .collect();
        let mut next = Selection::new();
        for (kind, path) in visible {
            if !self.selection.contains(kind, &path) {
                next.add(kind, &path);
            }
        }
        self.selection = next;
    }

    pub fn is_selected(&self, kind: EntryKind, path: &str) -> bool {
        self.selection.contains(kind, path)
    }

    // ========== derived views ==========

    fn visible<'a>(&self, list: &'a [Entry]) -> Vec<&'a Entry> {
        list.iter()
            .filter(|e| self.show_hidden || !is_hidden(&e.basename))
            .collect()
    }

    pub fn directories(&self) -> Vec<&Entry> {
        self.visible(&self.directories)
    }

    pub fn files(&self) -> Vec<&Entry> {
        self.visible(&self.files)
    }

    pub fn directories_count(&self) -> usize {
        self.directories().len()
    }

    pub fn files_count(&self) -> usize {
        self.files().len()
    }

    pub fn files_size(&self) -> u64 {
        self.files().iter().map(|e| e.size).sum()
    }

    /// Selected entries as listing items: directories first, then files
    pub fn selected_list(&self) -> Vec<&Entry> {
        [EntryKind::Dir, EntryKind::File]
            .into_iter()
            .flat_map(move |kind| {
                self.selection
                    .paths(kind)
                    .iter()
                    .filter_map(move |p| self.entry(kind, p))
            })
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    pub fn selected_files_size(&self) -> u64 {
        self.selection
            .files()
            .iter()
            .filter_map(|p| self.entry(EntryKind::File, p))
            .map(|e| e.size)
            .sum()
    }

    pub fn directory_exists(&self, name: &str) -> bool {
        self.directories.iter().any(|e| e.basename == name)
    }

    pub fn file_exists(&self, name: &str) -> bool {
        self.files.iter().any(|e| e.basename == name)
    }

    /// Segments from the disk root down to the working directory
    pub fn breadcrumb(&self) -> Vec<BreadcrumbItem> {
        let Some(dir) = self.selected_directory.as_deref() else {
            return Vec::new();
        };
        path_prefixes(dir)
            .into_iter()
            .map(|path| BreadcrumbItem {
                name: basename(&path).to_string(),
                path,
            })
            .collect()
    }

    pub fn summary(&self) -> PanelSummary {
        PanelSummary {
            directories: self.directories_count(),
            files: self.files_count(),
            files_size: self.files_size(),
            selected: self.selected_count(),
            selected_size: self.selected_files_size(),
        }
    }
}
