/// The conversion queue
///
/// An ordered set of `.mol` paths. The visible list is derived from it
/// row by row, so a row index always names exactly one queued path.

use std::path::{Path, PathBuf};

/// Number of rows the list shows before it needs a scroll bar
pub const VISIBLE_ROWS: usize = 8;

/// File extension accepted by the queue (compared case-insensitively)
const MOL_EXTENSION: &str = "mol";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Queue {
    entries: Vec<PathBuf>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit every candidate that is a `.mol` file and not already queued.
    /// Returns how many were added; rejected candidates are dropped silently.
    pub fn enqueue<I, P>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut added = 0;
        for candidate in candidates {
            let path = candidate.into();
            if !is_mol_file(&path) || self.entries.contains(&path) {
                log::debug!("Skipping {}", path.display());
                continue;
            }
            log::debug!("Queued {}", path.display());
            self.entries.push(path);
            added += 1;
        }
        added
    }

    /// Remove the entry shown at `row`. Returns the removed path, or `None`
    /// when the row does not exist.
    pub fn remove_at(&mut self, row: usize) -> Option<PathBuf> {
        (row < self.entries.len()).then(|| self.entries.remove(row))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Text shown for each row (the file name only)
    pub fn display_rows(&self) -> impl Iterator<Item = String> + '_ {
        self.entries.iter().map(|p| display_name(p))
    }

    /// The list only scrolls once it holds more rows than fit on screen
    pub fn needs_scrollbar(&self) -> bool {
        self.entries.len() > VISIBLE_ROWS
    }

    /// One-line summary shown above the list
    pub fn summary(&self) -> String {
        match self.entries.len() {
            0 => "No files queued.".to_string(),
            n => format!("{n} file(s) queued for conversion."),
        }
    }
}

fn is_mol_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(MOL_EXTENSION))
        .unwrap_or(false)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .to_string()
}
