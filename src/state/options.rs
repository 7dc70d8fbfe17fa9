/// Export configuration chosen in the format panel
///
/// Held only in UI state for the lifetime of the window, never persisted.

use std::fmt;

use crate::render::OutputFormat;

/// Output image size. All depictions are square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl ImageSize {
    pub const ALL: [ImageSize; 3] = [ImageSize::Small, ImageSize::Medium, ImageSize::Large];

    /// Edge length in pixels
    pub fn pixels(self) -> u32 {
        match self {
            ImageSize::Small => 256,
            ImageSize::Medium => 600,
            ImageSize::Large => 1200,
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageSize::Small => "Small",
            ImageSize::Medium => "Medium",
            ImageSize::Large => "Large",
        };
        let px = self.pixels();
        write!(f, "{name} ({px}x{px})")
    }
}

/// All export settings for one conversion run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub png: bool,
    pub transparent_png: bool,
    pub svg: bool,
    pub pdf: bool,
    pub size: ImageSize,
}

impl Default for ExportOptions {
    /// PNG and SVG on, medium size
    fn default() -> Self {
        Self {
            png: true,
            transparent_png: false,
            svg: true,
            pdf: false,
            size: ImageSize::default(),
        }
    }
}

impl ExportOptions {
    pub fn is_enabled(&self, format: OutputFormat) -> bool {
        match format {
            OutputFormat::Png => self.png,
            OutputFormat::TransparentPng => self.transparent_png,
            OutputFormat::Svg => self.svg,
            OutputFormat::Pdf => self.pdf,
        }
    }

    pub fn set(&mut self, format: OutputFormat, enabled: bool) {
        match format {
            OutputFormat::Png => self.png = enabled,
            OutputFormat::TransparentPng => self.transparent_png = enabled,
            OutputFormat::Svg => self.svg = enabled,
            OutputFormat::Pdf => self.pdf = enabled,
        }
    }

    /// Enabled formats in panel order
    pub fn formats(&self) -> Vec<OutputFormat> {
        OutputFormat::ALL
            .into_iter()
            .filter(|f| self.is_enabled(*f))
            .collect()
    }

    pub fn any_selected(&self) -> bool {
        OutputFormat::ALL.iter().any(|f| self.is_enabled(*f))
    }

    /// Deselect every format
    pub fn clear_formats(&mut self) {
        for format in OutputFormat::ALL {
            self.set(format, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ExportOptions::default();
        assert_eq!(options.formats(), vec![OutputFormat::Png, OutputFormat::Svg]);
        assert_eq!(options.size.pixels(), 600);
    }

    #[test]
    fn test_toggle_formats() {
        let mut options = ExportOptions::default();
        options.clear_formats();
        assert!(!options.any_selected());

        options.set(OutputFormat::Pdf, true);
        assert!(options.any_selected());
        assert_eq!(options.formats(), vec![OutputFormat::Pdf]);
    }

    #[test]
    fn test_size_labels() {
        assert_eq!(ImageSize::Small.to_string(), "Small (256x256)");
        assert_eq!(ImageSize::Large.to_string(), "Large (1200x1200)");
    }
}
