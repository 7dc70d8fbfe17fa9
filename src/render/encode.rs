/// SVG -> PNG / PDF encoders
///
/// The SVG text produced by the depiction is parsed once into a `usvg::Tree`
/// and then either rasterised with resvg or converted with svg2pdf.

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use std::io::Cursor;

use super::RenderError;

/// Parse SVG text with the given font database / options
pub fn parse_svg(svg: &str, options: &usvg::Options) -> Result<usvg::Tree, RenderError> {
    Ok(usvg::Tree::from_str(svg, options)?)
}

/// Rasterise a tree to PNG bytes.
/// `opaque` drops the alpha channel (the tree is expected to paint its own
/// background); otherwise an RGBA PNG is produced.
pub fn png(tree: &usvg::Tree, opaque: bool) -> Result<Vec<u8>, RenderError> {
    let size = tree.size().to_int_size();
    let (width, height) = (size.width(), size.height());
    let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::Pixmap { width, height })?;

    resvg::render(tree, Transform::identity(), &mut pixmap.as_mut());

    // tiny-skia stores premultiplied alpha, PNG wants straight alpha
    let mut image = RgbaImage::new(width, height);
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }

    let image = if opaque {
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(image).to_rgb8())
    } else {
        DynamicImage::ImageRgba8(image)
    };

    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Convert a tree to a single-page PDF
pub fn pdf(tree: &usvg::Tree) -> Result<Vec<u8>, RenderError> {
    svg2pdf::to_pdf(
        tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|e| RenderError::Pdf(format!("{e:?}")))
}
