/// Native dialogs
///
/// All dialogs are modal and block the UI thread until dismissed.

use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};
use std::path::PathBuf;

use crate::convert::FolderPrompt;

pub fn warning(title: &str, description: &str) {
    show(MessageLevel::Warning, title, description);
}

pub fn info(title: &str, description: &str) {
    show(MessageLevel::Info, title, description);
}

fn show(level: MessageLevel, title: &str, description: &str) {
    MessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::Ok)
        .show();
}

/// Multi-select file picker restricted to MOL files.
/// Returns an empty list when the user cancels.
pub fn pick_mol_files() -> Vec<PathBuf> {
    FileDialog::new()
        .set_title("Select MOL files")
        .add_filter("MOL files", &["mol", "MOL"])
        .pick_files()
        .unwrap_or_default()
}

pub fn pick_export_folder() -> Option<PathBuf> {
    FileDialog::new()
        .set_title("Select Export Folder")
        .pick_folder()
}

/// Folder prompt used at conversion time when no valid export folder is saved
pub struct DialogFolderPrompt;

impl FolderPrompt for DialogFolderPrompt {
    fn choose_folder(&mut self) -> Option<PathBuf> {
        info(
            "Select Export Folder",
            "Please select a folder where the files will be saved.",
        );
        pick_export_folder()
    }
}
