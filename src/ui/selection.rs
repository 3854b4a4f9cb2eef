use crate::services::remote::EntryKind;

/// Selected entries of one panel's current listing, grouped by kind.
/// Each group keeps selection order and holds no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    directories: Vec<String>,
    files: Vec<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    fn group(&self, kind: EntryKind) -> &Vec<String> {
        match kind {
            EntryKind::Dir => &self.directories,
            EntryKind::File => &self.files,
        }
    }

    fn group_mut(&mut self, kind: EntryKind) -> &mut Vec<String> {
        match kind {
            EntryKind::Dir => &mut self.directories,
            EntryKind::File => &mut self.files,
        }
    }

    pub fn directories(&self) -> &[String] {
        &self.directories
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn paths(&self, kind: EntryKind) -> &[String] {
        self.group(kind)
    }

    pub fn contains(&self, kind: EntryKind, path: &str) -> bool {
        self.group(kind).iter().any(|p| p == path)
    }

    pub fn len(&self) -> usize {
        self.directories.len() + self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }

    /// Returns false when the path was already selected.
    pub fn add(&mut self, kind: EntryKind, path: &str) -> bool {
        if self.contains(kind, path) {
            return false;
        }
        self.group_mut(kind).push(path.to_string());
        true
    }

    /// Returns false when the path was not selected.
    pub fn remove(&mut self, kind: EntryKind, path: &str) -> bool {
        let group = self.group_mut(kind);
        let before = group.len();
        group.retain(|p| p != path);
        group.len() != before
    }

    /// Flip one entry; returns whether it is selected afterwards.
    pub fn toggle(&mut self, kind: EntryKind, path: &str) -> bool {
        if self.remove(kind, path) {
            false
        } else {
            self.add(kind, path)
        }
    }

    /// Exclusive selection: everything else, of both kinds, is deselected.
    pub fn single(&mut self, kind: EntryKind, path: &str) {
        self.clear();
        self.group_mut(kind).push(path.to_string());
    }

    pub fn clear(&mut self) {
        self.directories.clear();
        self.files.clear();
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(EntryKind, &str) -> bool) {
        self.directories.retain(|p| keep(EntryKind::Dir, p));
        self.files.retain(|p| keep(EntryKind::File, p));
    }
}
