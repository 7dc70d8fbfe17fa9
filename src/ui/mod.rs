/// Presentation helpers for the main window
///
/// - dialogs.rs: native pickers and message boxes (rfd)
/// - queue_list.rs: the queued-files list with right-click removal
/// - about.rs: the About panel

pub mod about;
pub mod dialogs;
pub mod queue_list;
