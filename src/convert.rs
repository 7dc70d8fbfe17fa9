/// Conversion driver
///
/// Walks a snapshot of the queue once, in order, parsing each MOL file and
/// writing every enabled output format into the export folder. The run is a
/// step machine: the window calls `step` once per file so the progress label
/// can repaint between files while everything stays on the UI thread.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::mol;
use crate::render::{OutputFormat, Renderer};
use crate::state::options::ExportOptions;
use crate::state::queue::Queue;
use crate::state::settings::Settings;

/// Reasons a conversion run does not start
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConvertError {
    #[error("Please add some MOL files first.")]
    EmptyQueue,

    #[error("Please select at least one export format.")]
    NoFormatSelected,

    #[error("no export folder was chosen")]
    FolderPromptCancelled,
}

/// Asks the user for an export folder when none is usable.
/// Implemented with native dialogs by the window and stubbed in tests.
pub trait FolderPrompt {
    fn choose_folder(&mut self) -> Option<PathBuf>;
}

/// What happened to one queued file
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Parsed and rendered. Formats that failed to render or write are listed
    /// in `failed`; the file still counts as converted.
    Converted {
        source: PathBuf,
        written: Vec<PathBuf>,
        failed: Vec<(OutputFormat, String)>,
    },
    /// Could not be parsed; no output was produced
    Skipped { source: PathBuf, reason: String },
}

impl FileOutcome {
    pub fn is_converted(&self) -> bool {
        matches!(self, FileOutcome::Converted { .. })
    }
}

/// Totals reported once the run is over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub converted: usize,
    pub total: usize,
    pub output_dir: PathBuf,
}

impl RunSummary {
    /// Body of the completion dialog
    pub fn message(&self) -> String {
        format!("{} file(s) converted!", self.converted)
    }

    /// Final text of the progress label
    pub fn status(&self) -> String {
        format!("Done! {} file(s) converted.", self.converted)
    }
}

/// One synchronous pass over the queued files
#[derive(Debug)]
pub struct ConversionRun {
    files: Vec<PathBuf>,
    output_dir: PathBuf,
    formats: Vec<OutputFormat>,
    size: u32,
    next: usize,
    converted: usize,
}

impl ConversionRun {
    /// Check the preconditions and resolve the export folder.
    ///
    /// Order matters: an empty queue or missing format aborts before anything
    /// touches the filesystem. A saved folder that no longer exists is treated
    /// as absent and the user is prompted; a folder chosen there is saved.
    pub fn prepare(
        queue: &Queue,
        options: &ExportOptions,
        settings: &Settings,
        prompt: &mut impl FolderPrompt,
    ) -> Result<Self, ConvertError> {
        if queue.is_empty() {
            return Err(ConvertError::EmptyQueue);
        }
        if !options.any_selected() {
            return Err(ConvertError::NoFormatSelected);
        }

        let output_dir = match settings.current_valid() {
            Some(folder) => folder,
            None => {
                let folder = prompt
                    .choose_folder()
                    .ok_or(ConvertError::FolderPromptCancelled)?;
                if let Err(e) = settings.save(&folder) {
                    log::warn!("⚠️  Could not remember export folder: {}", e);
                }
                folder
            }
        };

        log::info!(
            "🧪 Converting {} file(s) to {:?} at {}px into {}",
            queue.len(),
            options.formats(),
            options.size.pixels(),
            output_dir.display()
        );

        Ok(Self {
            files: queue.entries().to_vec(),
            output_dir,
            formats: options.formats(),
            size: options.size.pixels(),
            next: 0,
            converted: 0,
        })
    }

    pub fn total(&self) -> usize {
        self.files.len()
    }

    pub fn converted(&self) -> usize {
        self.converted
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.files.len()
    }

    /// Text of the progress label after the latest step
    pub fn progress_text(&self) -> String {
        format!("Processing {}/{}...", self.next, self.total())
    }

    /// Convert the next file. Returns `None` once every file has been handled.
    pub fn step(&mut self, renderer: &Renderer) -> Option<FileOutcome> {
        let source = self.files.get(self.next)?.clone();
        self.next += 1;

        let outcome = convert_file(&source, &self.output_dir, &self.formats, self.size, renderer);
        match &outcome {
            FileOutcome::Converted { written, failed, .. } => {
                self.converted += 1;
                log::info!("✅ {} -> {} file(s)", source.display(), written.len());
                for (format, reason) in failed {
                    log::warn!("⚠️  {} ({}): {}", source.display(), format, reason);
                }
            }
            FileOutcome::Skipped { reason, .. } => {
                log::warn!("⚠️  Skipped {}: {}", source.display(), reason);
            }
        }
        Some(outcome)
    }

    /// Drive the run to the end without yielding to a UI
    pub fn run_to_end(&mut self, renderer: &Renderer) -> Vec<FileOutcome> {
        std::iter::from_fn(|| self.step(renderer)).collect()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            converted: self.converted,
            total: self.files.len(),
            output_dir: self.output_dir.clone(),
        }
    }
}

fn convert_file(
    source: &Path,
    output_dir: &Path,
    formats: &[OutputFormat],
    size: u32,
    renderer: &Renderer,
) -> FileOutcome {
    let molecule = match mol::parse_file(source) {
        Ok(molecule) => molecule,
        Err(e) => {
            return FileOutcome::Skipped {
                source: source.to_path_buf(),
                reason: e.to_string(),
            }
        }
    };

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "molecule".to_string());

    let mut written = Vec::new();
    let mut failed = Vec::new();
    for &format in formats {
        let target = output_dir.join(format.file_name(&stem));
        let result = renderer
            .render(&molecule, format, size)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                fs::write(&target, bytes)
                    .map_err(|e| format!("failed to write {}: {}", target.display(), e))
            });
        match result {
            Ok(()) => written.push(target),
            Err(reason) => failed.push((format, reason)),
        }
    }

    FileOutcome::Converted {
        source: source.to_path_buf(),
        written,
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mol::molfile::tests::ALANINE;
    use tempfile::{tempdir, TempDir};

    /// Prompt stub that records how often it was asked
    struct StubPrompt {
        answer: Option<PathBuf>,
        asked: usize,
    }

    impl StubPrompt {
        fn answering(answer: Option<PathBuf>) -> Self {
            Self { answer, asked: 0 }
        }
    }

    impl FolderPrompt for StubPrompt {
        fn choose_folder(&mut self) -> Option<PathBuf> {
            self.asked += 1;
            self.answer.clone()
        }
    }

    struct Fixture {
        dir: TempDir,
        queue: Queue,
        settings: Settings,
        out: PathBuf,
    }

    /// Three valid molecules and one broken file, export folder already saved
    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input");
        let out = dir.path().join("out");
        fs::create_dir(&input).unwrap();
        fs::create_dir(&out).unwrap();

        let mut queue = Queue::new();
        for name in ["alanine", "second", "third"] {
            let path = input.join(format!("{name}.mol"));
            fs::write(&path, ALANINE).unwrap();
            queue.enqueue([path]);
        }
        let broken = input.join("broken.mol");
        fs::write(&broken, "this is not\na molfile\n").unwrap();
        queue.enqueue([broken]);

        let settings = Settings::at(dir.path().join("config.json"));
        settings.save(&out).unwrap();

        Fixture {
            dir,
            queue,
            settings,
            out,
        }
    }

    fn png_and_svg() -> ExportOptions {
        let mut options = ExportOptions::default();
        options.clear_formats();
        options.set(OutputFormat::Png, true);
        options.set(OutputFormat::Svg, true);
        options
    }

    fn output_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_broken_file_is_skipped() {
        let f = fixture();
        let mut prompt = StubPrompt::answering(None);
        let mut run =
            ConversionRun::prepare(&f.queue, &png_and_svg(), &f.settings, &mut prompt).unwrap();
        assert_eq!(prompt.asked, 0);

        let outcomes = run.run_to_end(&Renderer::without_fonts());
        assert_eq!(outcomes.len(), 4);
        assert!(matches!(outcomes[3], FileOutcome::Skipped { .. }));
        assert_eq!(outcomes.iter().filter(|o| o.is_converted()).count(), 3);

        assert_eq!(
            output_files(&f.out),
            vec![
                "alanine.png",
                "alanine.svg",
                "second.png",
                "second.svg",
                "third.png",
                "third.svg",
            ]
        );

        let summary = run.summary();
        assert_eq!(summary.converted, 3);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.message(), "3 file(s) converted!");
        assert_eq!(summary.status(), "Done! 3 file(s) converted.");
    }

    #[test]
    fn test_progress_after_each_step() {
        let f = fixture();
        let mut prompt = StubPrompt::answering(None);
        let mut run =
            ConversionRun::prepare(&f.queue, &png_and_svg(), &f.settings, &mut prompt).unwrap();
        let renderer = Renderer::without_fonts();

        assert_eq!(run.progress_text(), "Processing 0/4...");
        let mut seen = Vec::new();
        while run.step(&renderer).is_some() {
            seen.push(run.progress_text());
        }
        assert_eq!(
            seen,
            vec![
                "Processing 1/4...",
                "Processing 2/4...",
                "Processing 3/4...",
                "Processing 4/4...",
            ]
        );
        assert!(run.is_finished());
        assert_eq!(run.step(&renderer), None);
    }

    #[test]
    fn test_all_formats_file_names() {
        let f = fixture();
        let mut queue = Queue::new();
        queue.enqueue([f.queue.entries()[0].clone()]);

        let mut options = ExportOptions::default();
        for format in OutputFormat::ALL {
            options.set(format, true);
        }
        let mut prompt = StubPrompt::answering(None);
        let mut run = ConversionRun::prepare(&queue, &options, &f.settings, &mut prompt).unwrap();
        run.run_to_end(&Renderer::without_fonts());

        assert_eq!(
            output_files(&f.out),
            vec![
                "alanine.pdf",
                "alanine.png",
                "alanine.svg",
                "alanine_transparent.png",
            ]
        );
    }

    #[test]
    fn test_no_format_aborts_untouched() {
        let f = fixture();
        let before = f.queue.clone();
        let mut options = ExportOptions::default();
        options.clear_formats();

        let mut prompt = StubPrompt::answering(Some(f.dir.path().to_path_buf()));
        let err = ConversionRun::prepare(&f.queue, &options, &f.settings, &mut prompt).unwrap_err();

        assert_eq!(err, ConvertError::NoFormatSelected);
        assert_eq!(prompt.asked, 0);
        assert_eq!(f.queue, before);
        assert!(output_files(&f.out).is_empty());
    }

    #[test]
    fn test_empty_queue_aborts() {
        let f = fixture();
        let mut prompt = StubPrompt::answering(None);
        let err = ConversionRun::prepare(&Queue::new(), &png_and_svg(), &f.settings, &mut prompt)
            .unwrap_err();
        assert_eq!(err, ConvertError::EmptyQueue);
        assert_eq!(err.to_string(), "Please add some MOL files first.");
    }

    #[test]
    fn test_deleted_folder_reprompts() {
        let f = fixture();
        fs::remove_dir(&f.out).unwrap();

        let replacement = f.dir.path().join("replacement");
        fs::create_dir(&replacement).unwrap();
        let mut prompt = StubPrompt::answering(Some(replacement.clone()));

        let run =
            ConversionRun::prepare(&f.queue, &png_and_svg(), &f.settings, &mut prompt).unwrap();
        assert_eq!(prompt.asked, 1);
        assert_eq!(run.output_dir(), replacement.as_path());
        // The new choice is remembered for next time
        assert_eq!(f.settings.load(), Some(replacement));
    }

    #[test]
    fn test_cancelled_prompt_aborts() {
        let f = fixture();
        fs::remove_dir(&f.out).unwrap();
        let mut prompt = StubPrompt::answering(None);

        let err = ConversionRun::prepare(&f.queue, &png_and_svg(), &f.settings, &mut prompt)
            .unwrap_err();
        assert_eq!(err, ConvertError::FolderPromptCancelled);
        assert_eq!(prompt.asked, 1);
    }

    #[test]
    fn test_write_failure_does_not_block_other_formats() {
        let f = fixture();
        // A directory squatting on the PNG target makes that write fail
        fs::create_dir(f.out.join("alanine.png")).unwrap();

        let mut queue = Queue::new();
        queue.enqueue([f.queue.entries()[0].clone()]);
        let mut prompt = StubPrompt::answering(None);
        let mut run =
            ConversionRun::prepare(&queue, &png_and_svg(), &f.settings, &mut prompt).unwrap();

        match run.step(&Renderer::without_fonts()) {
            Some(FileOutcome::Converted { written, failed, .. }) => {
                assert_eq!(written, vec![f.out.join("alanine.svg")]);
                assert_eq!(failed.len(), 1);
                assert_eq!(failed[0].0, OutputFormat::Png);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(run.converted(), 1);
    }
}
