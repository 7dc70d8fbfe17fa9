use iced::event::{self, Event};
use iced::widget::{button, checkbox, column, container, pick_list, row, text, Column};
use iced::{window, Alignment, Color, Element, Length, Size, Subscription, Task, Theme};
use std::path::PathBuf;

mod convert;
mod mol;
mod render;
mod state;
mod ui;

use convert::{ConversionRun, ConvertError, RunSummary};
use render::{OutputFormat, Renderer};
use state::options::{ExportOptions, ImageSize};
use state::queue::Queue;
use state::settings::Settings;
use ui::dialogs;

const WINDOW_TITLE: &str = "Mol Converter v2.3 \u{2013} Freeware by Edwin Angeli";

/// Main application state
struct MolConverter {
    /// Files waiting for the next conversion run
    queue: Queue,
    /// Format checkboxes and size selection
    options: ExportOptions,
    /// Persisted export folder
    settings: Settings,
    /// Shared renderer (holds the loaded system fonts)
    renderer: Renderer,
    /// The run in progress, if any
    run: Option<ConversionRun>,
    /// Progress / status line under the folder label
    status: String,
    /// Whether the About panel replaces the main controls
    show_about: bool,
}

/// Result of advancing the active run by one file
#[derive(Debug, PartialEq)]
enum RunProgress {
    /// No run is active
    Idle,
    /// More files are waiting
    Running,
    Finished(RunSummary),
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// User clicked "Select MOL Files"
    SelectFiles,
    /// A file was dropped onto the window
    FileDropped(PathBuf),
    /// Right-click on a queue row
    RemoveRow(usize),
    ClearQueue,
    ChangeExportFolder,
    FormatToggled(OutputFormat, bool),
    SizeSelected(ImageSize),
    /// User clicked "Convert Files"
    Convert,
    /// Convert the next queued file of the running conversion
    ConvertStep,
    ShowAbout,
    CloseAbout,
    OpenProfileLink,
    Exit,
}

impl MolConverter {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let settings = Settings::new().unwrap_or_else(|e| {
            log::warn!("⚠️  {}; keeping settings in the working directory", e);
            Settings::at(".molconverter_config.json")
        });
        log::info!("📁 Settings file: {}", settings.path().display());

        (Self::with(settings, Renderer::new()), Task::none())
    }

    fn with(settings: Settings, renderer: Renderer) -> Self {
        MolConverter {
            queue: Queue::new(),
            options: ExportOptions::default(),
            settings,
            renderer,
            run: None,
            status: String::new(),
            show_about: false,
        }
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SelectFiles => {
                let files = dialogs::pick_mol_files();
                // A cancelled picker is not a rejected batch
                if !files.is_empty() {
                    self.enqueue(files);
                }
                Task::none()
            }
            // The queue is cleared when a run ends, so it stays frozen until then
            Message::FileDropped(path) if self.run.is_some() => {
                log::debug!("Ignoring {} dropped during conversion", path.display());
                Task::none()
            }
            Message::FileDropped(path) => {
                self.enqueue([path]);
                Task::none()
            }
            Message::RemoveRow(_) if self.run.is_some() => Task::none(),
            Message::RemoveRow(row) => {
                if let Some(path) = self.queue.remove_at(row) {
                    log::debug!("Removed {} from queue", path.display());
                }
                Task::none()
            }
            Message::ClearQueue => {
                self.queue.clear();
                Task::none()
            }
            Message::ChangeExportFolder => {
                if let Some(folder) = dialogs::pick_export_folder() {
                    if let Err(e) = self.settings.save(&folder) {
                        log::warn!("⚠️  {}", e);
                    }
                }
                Task::none()
            }
            Message::FormatToggled(format, enabled) => {
                self.options.set(format, enabled);
                Task::none()
            }
            Message::SizeSelected(size) => {
                self.options.size = size;
                Task::none()
            }
            Message::Convert => self.start_conversion(),
            Message::ConvertStep => self.conversion_step(),
            Message::ShowAbout => {
                self.show_about = true;
                Task::none()
            }
            Message::CloseAbout => {
                self.show_about = false;
                Task::none()
            }
            Message::OpenProfileLink => {
                if let Err(e) = opener::open_browser(ui::about::PROFILE_URL) {
                    log::warn!("⚠️  Could not open browser: {}", e);
                }
                Task::none()
            }
            Message::Exit => iced::exit(),
        }
    }

    fn enqueue<I: IntoIterator<Item = PathBuf>>(&mut self, files: I) {
        let added = self.queue.enqueue(files);
        if added == 0 {
            self.status = "No new .mol files added.".to_string();
        }
    }

    fn start_conversion(&mut self) -> Task<Message> {
        if self.run.is_some() {
            return Task::none();
        }

        let mut prompt = dialogs::DialogFolderPrompt;
        match ConversionRun::prepare(&self.queue, &self.options, &self.settings, &mut prompt) {
            Ok(run) => {
                self.status = run.progress_text();
                self.run = Some(run);
                // One file per message so the progress label repaints in between
                Task::done(Message::ConvertStep)
            }
            Err(ConvertError::EmptyQueue) => {
                dialogs::warning("No Files", &ConvertError::EmptyQueue.to_string());
                Task::none()
            }
            Err(ConvertError::NoFormatSelected) => {
                dialogs::warning(
                    "No Format Selected",
                    &ConvertError::NoFormatSelected.to_string(),
                );
                Task::none()
            }
            Err(ConvertError::FolderPromptCancelled) => Task::none(),
        }
    }

    fn conversion_step(&mut self) -> Task<Message> {
        match self.advance_run() {
            RunProgress::Idle => Task::none(),
            RunProgress::Running => Task::done(Message::ConvertStep),
            RunProgress::Finished(summary) => {
                dialogs::info("Conversion Complete", &summary.message());
                if let Err(e) = opener::open(&summary.output_dir) {
                    log::warn!("⚠️  Could not open {}: {}", summary.output_dir.display(), e);
                }
                Task::none()
            }
        }
    }

    /// Convert the next file of the active run. After the last one the run
    /// is closed, the status shows the total and the queue is emptied.
    fn advance_run(&mut self) -> RunProgress {
        let Some(run) = self.run.as_mut() else {
            return RunProgress::Idle;
        };

        if run.step(&self.renderer).is_some() {
            self.status = run.progress_text();
            if !run.is_finished() {
                return RunProgress::Running;
            }
        }

        let summary = run.summary();
        self.run = None;
        log::info!(
            "📊 Conversion summary: {} of {} converted",
            summary.converted, summary.total
        );

        self.status = summary.status();
        self.queue.clear();
        RunProgress::Finished(summary)
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        if self.show_about {
            return ui::about::view();
        }

        let idle = self.run.is_none();
        let when_idle = |message: Message| idle.then_some(message);

        let formats = column![
            row![
                self.format_checkbox(OutputFormat::Png),
                self.format_checkbox(OutputFormat::Svg),
            ]
            .spacing(30),
            row![
                self.format_checkbox(OutputFormat::TransparentPng),
                self.format_checkbox(OutputFormat::Pdf),
            ]
            .spacing(30),
        ]
        .spacing(8);

        let hint_color = Color::from_rgb(0.25, 0.25, 0.25);

        let content: Column<Message> = column![
            text("Drag & drop your .mol files here\nor click the button to select files")
                .size(15)
                .align_x(iced::alignment::Horizontal::Center),
            button("Select MOL Files")
                .on_press_maybe(when_idle(Message::SelectFiles))
                .padding(8),
            text(self.queue.summary()).size(14),
            ui::queue_list::view(&self.queue),
            text("💡 Right-click a file to remove it from the queue")
                .size(13)
                .color(hint_color),
            button("Change Export Folder")
                .on_press_maybe(when_idle(Message::ChangeExportFolder))
                .padding(8),
            button("Convert Files")
                .on_press_maybe(when_idle(Message::Convert))
                .style(button::success)
                .padding(8),
            button("Clear Queue")
                .on_press_maybe(when_idle(Message::ClearQueue))
                .padding(8),
            text("Select export formats").size(14),
            formats,
            text("Select image size").size(14),
            pick_list(ImageSize::ALL, Some(self.options.size), Message::SizeSelected),
            text(self.settings.folder_label())
                .size(13)
                .align_x(iced::alignment::Horizontal::Center),
            text(&self.status).size(14).color(Color::from_rgb(0.0, 0.0, 1.0)),
            button("About").on_press(Message::ShowAbout).padding(6),
            button("Exit").on_press(Message::Exit).padding(6),
            text("Freeware \u{2013} Created by Edwin Angeli (2025)")
                .size(12)
                .color(Color::from_rgb(0.4, 0.4, 0.4)),
        ]
        .spacing(8)
        .padding(16)
        .align_x(Alignment::Center);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .into()
    }

    fn format_checkbox(&self, format: OutputFormat) -> Element<Message> {
        checkbox(format.to_string(), self.options.is_enabled(format))
            .on_toggle(move |enabled| Message::FormatToggled(format, enabled))
            .width(Length::Fixed(150.0))
            .into()
    }

    /// Feed dropped files into the queue
    fn subscription(&self) -> Subscription<Message> {
        event::listen_with(|event, _status, _window| match event {
            Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
            _ => None,
        })
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Light
    }
}

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    iced::application(WINDOW_TITLE, MolConverter::update, MolConverter::view)
        .subscription(MolConverter::subscription)
        .theme(MolConverter::theme)
        .window_size(Size::new(600.0, 750.0))
        .centered()
        .run_with(MolConverter::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::FolderPrompt;
    use crate::mol::molfile::tests::ALANINE;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    struct NoPrompt;

    impl FolderPrompt for NoPrompt {
        fn choose_folder(&mut self) -> Option<PathBuf> {
            None
        }
    }

    /// App with two queued molecules and a saved export folder
    fn app_with_queue() -> (TempDir, MolConverter) {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        let settings = Settings::at(dir.path().join("config.json"));
        settings.save(&out).unwrap();

        let mut app = MolConverter::with(settings, Renderer::without_fonts());
        for name in ["first", "second"] {
            let path = dir.path().join(format!("{name}.mol"));
            fs::write(&path, ALANINE).unwrap();
            let _ = app.update(Message::FileDropped(path));
        }
        (dir, app)
    }

    fn start(app: &mut MolConverter) {
        let run = ConversionRun::prepare(&app.queue, &app.options, &app.settings, &mut NoPrompt)
            .unwrap();
        app.run = Some(run);
    }

    fn finish(app: &mut MolConverter) -> RunSummary {
        loop {
            match app.advance_run() {
                RunProgress::Running => continue,
                RunProgress::Finished(summary) => return summary,
                RunProgress::Idle => panic!("no run active"),
            }
        }
    }

    #[test]
    fn test_rejected_batch_sets_notice() {
        let mut app = MolConverter::with(Settings::at("unused.json"), Renderer::without_fonts());
        let _ = app.update(Message::FileDropped(PathBuf::from("/data/notes.txt")));
        assert!(app.queue.is_empty());
        assert_eq!(app.status, "No new .mol files added.");
    }

    #[test]
    fn test_finished_run_clears_queue_and_reports() {
        let (dir, mut app) = app_with_queue();
        start(&mut app);

        assert_eq!(app.advance_run(), RunProgress::Running);
        assert_eq!(app.status, "Processing 1/2...");

        let summary = finish(&mut app);
        assert_eq!(summary.converted, 2);
        assert_eq!(app.status, "Done! 2 file(s) converted.");
        assert!(app.queue.is_empty());
        assert!(app.run.is_none());
        assert!(dir.path().join("out").join("second.svg").exists());
        assert_eq!(app.advance_run(), RunProgress::Idle);
    }

    #[test]
    fn test_queue_is_frozen_during_run() {
        let (dir, mut app) = app_with_queue();
        start(&mut app);

        let late = dir.path().join("late.mol");
        fs::write(&late, ALANINE).unwrap();
        let _ = app.update(Message::FileDropped(late.clone()));
        let _ = app.update(Message::RemoveRow(0));
        assert_eq!(app.queue.len(), 2);

        finish(&mut app);

        // Once idle again the dropped file is accepted normally
        let _ = app.update(Message::FileDropped(late));
        assert_eq!(app.queue.len(), 1);
        let _ = app.update(Message::RemoveRow(0));
        assert!(app.queue.is_empty());
    }
}
