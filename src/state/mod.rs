/// State management module
///
/// This module handles all application state, including:
/// - The conversion queue (queue.rs)
/// - Export format and size selection (options.rs)
/// - The persisted export folder (settings.rs)

pub mod options;
pub mod queue;
pub mod settings;
