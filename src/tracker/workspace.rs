//! Workspace context of the host editor. The tracker only needs the opened folders, the
//! project name is derived from them.

use std::{path::PathBuf, sync::Arc};

/// Project name used when the editor has no folder open.
pub const UNKNOWN_PROJECT: &str = "Unknown Project";

/// Contract the host adapter fulfils for the tracker.
#[cfg_attr(test, mockall::automock)]
pub trait Workspace {
    /// Folders currently open in the editor, in the editor's order.
    fn folders(&self) -> Vec<PathBuf>;

    fn set_folders(&mut self, folders: Vec<PathBuf>);
}

/// The project is named after the first workspace folder.
pub fn project_name(folders: &[PathBuf]) -> Arc<str> {
    match folders.first() {
        Some(folder) => folder
            .file_name()
            .map(|v| v.to_string_lossy().into())
            .unwrap_or_else(|| folder.to_string_lossy().into()),
        None => UNKNOWN_PROJECT.into(),
    }
}

/// Folders reported by the host, either at startup or through later events.
#[derive(Debug, Default, Clone)]
pub struct FolderWorkspace {
    folders: Vec<PathBuf>,
}

impl FolderWorkspace {
    pub fn new(folders: Vec<PathBuf>) -> Self {
        Self { folders }
    }
}

impl Workspace for FolderWorkspace {
    fn folders(&self) -> Vec<PathBuf> {
        self.folders.clone()
    }

    fn set_folders(&mut self, folders: Vec<PathBuf>) {
        self.folders = folders;
    }
}
