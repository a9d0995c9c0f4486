use serde::{Deserialize, Serialize};
use tracing::debug;

use super::project_file::ProjectFile;

/// How the active file is shown: editable source or rendered markdown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Source,
    Preview,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Source => ViewMode::Preview,
            ViewMode::Preview => ViewMode::Source,
        }
    }
}

/// Default view for a file that just became active.
pub fn derive_view_mode(file: &ProjectFile) -> ViewMode {
    if file.is_documentation() || file.language == "markdown" {
        ViewMode::Preview
    } else {
        ViewMode::Source
    }
}

/// Open tabs, the active tab and its view mode.
///
/// Tabs keep insertion order. Ids are unique; paths are used to reuse an
/// existing tab when the same file is opened twice.
#[derive(Clone, Debug)]
pub struct WorkspaceStore {
    files: Vec<ProjectFile>,
    active_file_id: Option<String>,
    view_mode: ViewMode,
}

impl WorkspaceStore {
    pub fn new(files: Vec<ProjectFile>) -> Self {
        let mut store = Self {
            files: Vec::new(),
            active_file_id: None,
            view_mode: ViewMode::Source,
        };
        store.reset(files);
        store
    }

    /// Replace every tab; the first one becomes active.
    pub fn reset(&mut self, files: Vec<ProjectFile>) {
        self.files.clear();
        self.active_file_id = None;
        self.view_mode = ViewMode::Source;
        for file in files {
            self.insert_unique(file);
        }
        if let Some(first) = self.files.first() {
            self.active_file_id = Some(first.id.clone());
            self.view_mode = derive_view_mode(first);
        }
    }

    /// Open a file and make it active, returning the id of its tab.
    ///
    /// A file whose path is already open is not duplicated; the existing tab
    /// is activated instead.
    pub fn open_file(&mut self, candidate: ProjectFile) -> String {
        if let Some(existing) = self.files.iter().find(|f| f.path == candidate.path) {
            let id = existing.id.clone();
            debug!(path = %candidate.path, id = %id, "File already open, activating");
            self.activate(&id);
            return id;
        }

        let id = self.insert_unique(candidate);
        self.activate(&id);
        id
    }

    /// Remove a tab. Closing the active tab activates the last remaining one.
    pub fn close_file(&mut self, id: &str) -> bool {
        let initial_len = self.files.len();
        self.files.retain(|f| f.id != id);
        if self.files.len() == initial_len {
            return false;
        }

        if self.active_file_id.as_deref() == Some(id) {
            self.active_file_id = None;
            if let Some(last) = self.files.last() {
                let next = last.id.clone();
                self.activate(&next);
            }
        }
        true
    }

    /// Activate an open tab. Unknown ids are ignored.
    pub fn set_active(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.activate(id);
        true
    }

    /// Replace the content of the active file.
    pub fn edit_active(&mut self, new_content: impl Into<String>) -> bool {
        let Some(active_id) = self.active_file_id.as_deref() else {
            return false;
        };
        match self.files.iter_mut().find(|f| f.id == active_id) {
            Some(file) => {
                file.content = new_content.into();
                true
            }
            None => false,
        }
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.active_file_id.is_some() {
            self.view_mode = mode;
        }
    }

    pub fn toggle_view_mode(&mut self) -> ViewMode {
        self.set_view_mode(self.view_mode.toggled());
        self.view_mode
    }

    pub fn files(&self) -> &[ProjectFile] {
        &self.files
    }

    pub fn get(&self, id: &str) -> Option<&ProjectFile> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn find_by_path(&self, path: &str) -> Option<&ProjectFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_file_id.as_deref()
    }

    pub fn active_file(&self) -> Option<&ProjectFile> {
        self.active_file_id.as_deref().and_then(|id| self.get(id))
    }

    /// View mode of the active file. `None` when nothing is open.
    pub fn view_mode(&self) -> Option<ViewMode> {
        self.active_file_id.as_ref().map(|_| self.view_mode)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Switching to a different file recomputes the default view mode.
    fn activate(&mut self, id: &str) {
        if self.active_file_id.as_deref() == Some(id) {
            return;
        }
        if let Some(file) = self.files.iter().find(|f| f.id == id) {
            self.view_mode = derive_view_mode(file);
            self.active_file_id = Some(file.id.clone());
        }
    }

    /// Append, disambiguating ids shared by different paths (identical blobs
    /// have the same sha).
    fn insert_unique(&mut self, mut file: ProjectFile) -> String {
        if self.get(&file.id).is_some() {
            file.id = format!("{}:{}", file.id, file.path);
        }
        let id = file.id.clone();
        self.files.push(file);
        id
    }
}

impl Default for WorkspaceStore {
    fn default() -> Self {
        Self::new(vec![ProjectFile::welcome()])
    }
}
