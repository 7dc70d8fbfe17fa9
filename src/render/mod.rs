/// Molecule rendering module
///
/// This module handles:
/// - Laying out a molecule and drawing it as SVG (depict.rs)
/// - Rasterising the SVG to PNG and converting it to PDF (encode.rs)
/// - Mapping each output format to its file name

pub mod depict;
pub mod encode;

use std::fmt;
use thiserror::Error;

use crate::mol::Molecule;
use depict::{Background, Depiction};

/// Errors produced while turning a molecule into output bytes
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid SVG: {0}")]
    Svg(#[from] usvg::Error),

    #[error("cannot allocate a {width}x{height} pixmap")]
    Pixmap { width: u32, height: u32 },

    #[error("PNG encoding failed: {0}")]
    Png(#[from] image::ImageError),

    #[error("PDF conversion failed: {0}")]
    Pdf(String),
}

/// One of the export formats offered in the format panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Png,
    TransparentPng,
    Svg,
    Pdf,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Png,
        OutputFormat::TransparentPng,
        OutputFormat::Svg,
        OutputFormat::Pdf,
    ];

    /// Output file name for an input file stem,
    /// e.g. `caffeine` -> `caffeine_transparent.png`
    pub fn file_name(self, stem: &str) -> String {
        match self {
            OutputFormat::Png => format!("{stem}.png"),
            OutputFormat::TransparentPng => format!("{stem}_transparent.png"),
            OutputFormat::Svg => format!("{stem}.svg"),
            OutputFormat::Pdf => format!("{stem}.pdf"),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Png => "PNG",
            OutputFormat::TransparentPng => "Transparent PNG",
            OutputFormat::Svg => "SVG",
            OutputFormat::Pdf => "PDF",
        })
    }
}

/// Renders molecules into the export formats.
///
/// Holds the usvg options (and with them the system font database) so fonts
/// are only scanned once per application run.
pub struct Renderer {
    options: usvg::Options<'static>,
}

impl Renderer {
    /// Create a renderer with the system fonts loaded
    pub fn new() -> Self {
        let mut options = usvg::Options::default();
        options.fontdb_mut().load_system_fonts();
        log::info!("🔤 Loaded {} font faces", options.fontdb.len());
        Self { options }
    }

    /// A renderer without any fonts; atom labels are dropped from raster and
    /// PDF output. Used by tests to keep them independent of the host.
    #[cfg(test)]
    pub fn without_fonts() -> Self {
        Self {
            options: usvg::Options::default(),
        }
    }

    /// Draw `molecule` as a `size` x `size` image in the requested format
    pub fn render(
        &self,
        molecule: &Molecule,
        format: OutputFormat,
        size: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let depiction = Depiction::new(molecule, size);

        match format {
            OutputFormat::Svg => Ok(depiction.to_svg(Background::White).into_bytes()),
            OutputFormat::Png => {
                let tree = encode::parse_svg(&depiction.to_svg(Background::White), &self.options)?;
                encode::png(&tree, true)
            }
            OutputFormat::TransparentPng => {
                let svg = depiction.to_svg(Background::Transparent);
                let tree = encode::parse_svg(&svg, &self.options)?;
                encode::png(&tree, false)
            }
            OutputFormat::Pdf => {
                let tree = encode::parse_svg(&depiction.to_svg(Background::White), &self.options)?;
                encode::pdf(&tree)
            }
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
