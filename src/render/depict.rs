/// 2D structure depiction
///
/// Turns a parsed molecule into a standalone SVG document:
/// - atom positions come from the file's 2D coordinates (circle fallback)
/// - the drawing is fitted into a square canvas with a fixed margin
/// - heteroatoms get coloured labels with implicit hydrogens and charges
/// - bonds are drawn per order and wedge/hash stereo

use std::f64::consts::PI;
use std::fmt::Write;

use crate::mol::{BondOrder, BondStereo, Element, Molecule};

/// Fraction of the canvas kept free on each side
const MARGIN: f64 = 0.05;
/// Largest on-canvas bond length, as a fraction of the canvas
const MAX_BOND_FRACTION: f64 = 0.25;
/// Bond length used when the file carries no usable geometry
const DEFAULT_BOND_LENGTH: f64 = 1.5;

const BOND_COLOR: &str = "#000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    White,
    Transparent,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: f64,
    y: f64,
}

impl Point {
    fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }

    fn offset(self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Per-atom label as drawn on the canvas
#[derive(Debug, Clone, PartialEq)]
struct Label {
    isotope: Option<u16>,
    symbol: &'static str,
    hydrogens: u8,
    charge: i8,
    color: &'static str,
}

/// A molecule laid out on a square canvas
pub struct Depiction<'a> {
    molecule: &'a Molecule,
    size: u32,
    positions: Vec<Point>,
    labels: Vec<Option<Label>>,
    bond_px: f64,
    font_px: f64,
}

impl<'a> Depiction<'a> {
    /// Lay out `molecule` on a `size` x `size` canvas
    pub fn new(molecule: &'a Molecule, size: u32) -> Self {
        let model = model_coordinates(molecule);
        let bond_len = median_bond_length(molecule, &model);

        let canvas = size as f64;
        let usable = canvas * (1.0 - 2.0 * MARGIN);
        let (min, max) = bounds(&model);
        let width = max.x - min.x;
        let height = max.y - min.y;

        let fit = |extent: f64| if extent > 1e-9 { usable / extent } else { f64::INFINITY };
        let cap = canvas * MAX_BOND_FRACTION / bond_len;
        let scale = fit(width).min(fit(height)).min(cap);

        let center = Point::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0);
        let positions = model
            .iter()
            .map(|p| {
                Point::new(
                    canvas / 2.0 + (p.x - center.x) * scale,
                    canvas / 2.0 + (p.y - center.y) * scale,
                )
            })
            .collect();

        let bond_px = bond_len * scale;
        let font_px = (bond_px * 0.4).clamp(6.0, canvas * 0.08);

        let labels = (0..molecule.atoms.len())
            .map(|i| atom_label(molecule, i))
            .collect();

        Self {
            molecule,
            size,
            positions,
            labels,
            bond_px,
            font_px,
        }
    }

    /// Serialize the depiction as an SVG document
    pub fn to_svg(&self, background: Background) -> String {
        let size = self.size;
        let mut svg = String::with_capacity(4096);

        let _ = writeln!(
            svg,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{size}" height="{size}" viewBox="0 0 {size} {size}">"#
        );
        if !self.molecule.name.is_empty() {
            let _ = writeln!(svg, "<title>{}</title>", escape_xml(&self.molecule.name));
        }
        if background == Background::White {
            let _ = writeln!(
                svg,
                r##"<rect x="0" y="0" width="{size}" height="{size}" fill="#FFFFFF"/>"##
            );
        }

        let _ = writeln!(svg, r#"<g stroke-linecap="round">"#);
        for i in 0..self.molecule.bonds.len() {
            self.write_bond(&mut svg, i);
        }
        let _ = writeln!(svg, "</g>");

        let _ = writeln!(
            svg,
            r#"<g font-family="DejaVu Sans, Arial, Helvetica, sans-serif" font-size="{:.2}">"#,
            self.font_px
        );
        for (i, label) in self.labels.iter().enumerate() {
            if let Some(label) = label {
                self.write_label(&mut svg, self.positions[i], label);
            }
        }
        let _ = writeln!(svg, "</g>");
        svg.push_str("</svg>\n");
        svg
    }

    fn stroke_width(&self) -> f64 {
        (self.bond_px * 0.05).clamp(1.0, 8.0)
    }

    fn atom_color(&self, idx: usize) -> &'static str {
        self.labels[idx].as_ref().map_or(BOND_COLOR, |l| l.color)
    }

    /// Bond end points, pulled back from labelled atoms
    fn bond_ends(&self, begin: usize, end: usize) -> (Point, Point) {
        let (a, b) = (self.positions[begin], self.positions[end]);
        let len = a.distance(b);
        if len < 1e-9 {
            return (a, b);
        }
        let gap = self.font_px * 0.65 / len;
        let a2 = if self.labels[begin].is_some() { a.lerp(b, gap.min(0.45)) } else { a };
        let b2 = if self.labels[end].is_some() { b.lerp(a, gap.min(0.45)) } else { b };
        (a2, b2)
    }

    fn write_bond(&self, svg: &mut String, idx: usize) {
        let bond = &self.molecule.bonds[idx];
        let (a, b) = self.bond_ends(bond.begin, bond.end);
        let colors = (self.atom_color(bond.begin), self.atom_color(bond.end));
        let len = a.distance(b);
        if len < 1e-9 {
            return;
        }

        // Unit normal to the bond
        let (nx, ny) = ((a.y - b.y) / len, (b.x - a.x) / len);
        let spacing = self.bond_px * 0.16;

        match (bond.order, bond.stereo) {
            (BondOrder::Single, BondStereo::Wedge) => {
                let w = self.bond_px * 0.1;
                let _ = writeln!(
                    svg,
                    r#"<polygon points="{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}" fill="{}"/>"#,
                    a.x,
                    a.y,
                    b.x + nx * w,
                    b.y + ny * w,
                    b.x - nx * w,
                    b.y - ny * w,
                    colors.0
                );
            }
            (BondOrder::Single, BondStereo::Hash) => {
                let w = self.bond_px * 0.1;
                let steps = 6;
                for s in 0..=steps {
                    let t = s as f64 / steps as f64;
                    let p = a.lerp(b, t);
                    let half = w * t.max(0.1);
                    self.line(
                        svg,
                        p.offset(nx * half, ny * half),
                        p.offset(-nx * half, -ny * half),
                        if t < 0.5 { colors.0 } else { colors.1 },
                        None,
                    );
                }
            }
            (BondOrder::Single, BondStereo::Either) => {
                let dash = format!("{:.2},{:.2}", spacing * 0.5, spacing * 0.5);
                self.split_line(svg, a, b, colors, Some(&dash));
            }
            (BondOrder::Single, BondStereo::None) => self.split_line(svg, a, b, colors, None),
            (BondOrder::Query, _) => {
                let dash = format!("{:.2},{:.2}", spacing, spacing);
                self.split_line(svg, a, b, colors, Some(&dash));
            }
            (BondOrder::Double, _) => {
                let d = spacing / 2.0;
                self.split_line(svg, a.offset(nx * d, ny * d), b.offset(nx * d, ny * d), colors, None);
                self.split_line(svg, a.offset(-nx * d, -ny * d), b.offset(-nx * d, -ny * d), colors, None);
            }
            (BondOrder::Triple, _) => {
                self.split_line(svg, a, b, colors, None);
                for sign in [1.0, -1.0] {
                    let d = spacing * sign;
                    self.split_line(svg, a.offset(nx * d, ny * d), b.offset(nx * d, ny * d), colors, None);
                }
            }
            (BondOrder::Aromatic, _) => {
                self.split_line(svg, a, b, colors, None);
                // Dashed partner goes on the side where the neighbours are
                let sign = self.inner_side(bond.begin, bond.end, nx, ny);
                let d = spacing * sign;
                let (a2, b2) = (a.lerp(b, 0.12), b.lerp(a, 0.12));
                let dash = format!("{:.2},{:.2}", spacing * 0.6, spacing * 0.6);
                self.split_line(
                    svg,
                    a2.offset(nx * d, ny * d),
                    b2.offset(nx * d, ny * d),
                    colors,
                    Some(&dash),
                );
            }
        }
    }

    /// +1.0 if most neighbours of the bond lie along the normal, else -1.0
    fn inner_side(&self, begin: usize, end: usize, nx: f64, ny: f64) -> f64 {
        let mid = self.positions[begin].lerp(self.positions[end], 0.5);
        let score: f64 = [begin, end]
            .iter()
            .flat_map(|&atom| {
                self.molecule.bonds_of(atom).map(move |b| {
                    if b.begin == atom { b.end } else { b.begin }
                })
            })
            .filter(|&n| n != begin && n != end)
            .map(|n| {
                let p = self.positions[n];
                (p.x - mid.x) * nx + (p.y - mid.y) * ny
            })
            .sum();
        if score < 0.0 { -1.0 } else { 1.0 }
    }

    /// Draw a bond line coloured half by half after its end atoms
    fn split_line(
        &self,
        svg: &mut String,
        a: Point,
        b: Point,
        colors: (&str, &str),
        dash: Option<&str>,
    ) {
        if colors.0 == colors.1 {
            self.line(svg, a, b, colors.0, dash);
        } else {
            let mid = a.lerp(b, 0.5);
            self.line(svg, a, mid, colors.0, dash);
            self.line(svg, mid, b, colors.1, dash);
        }
    }

    fn line(&self, svg: &mut String, a: Point, b: Point, color: &str, dash: Option<&str>) {
        let _ = write!(
            svg,
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{:.2}""#,
            a.x,
            a.y,
            b.x,
            b.y,
            color,
            self.stroke_width()
        );
        if let Some(dash) = dash {
            let _ = write!(svg, r#" stroke-dasharray="{dash}""#);
        }
        svg.push_str("/>\n");
    }

    fn write_label(&self, svg: &mut String, at: Point, label: &Label) {
        let font = self.font_px;
        // Anchor the element symbol itself on the atom, hydrogens trail to the right
        let symbol_width = font * 0.62 * label.symbol.len() as f64;
        let x = at.x - symbol_width / 2.0;
        let y = at.y + font * 0.36;
        let small = font * 0.7;

        let _ = write!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" fill="{}" text-anchor="start">"#,
            x, y, label.color
        );
        if let Some(mass) = label.isotope {
            // Isotope sits to the left of the symbol, so shift the text start back
            let _ = write!(
                svg,
                r#"<tspan x="{:.2}" font-size="{:.2}" baseline-shift="super">{mass}</tspan><tspan baseline-shift="baseline">"#,
                x - small * 0.62 * mass.to_string().len() as f64,
                small
            );
            svg.push_str(label.symbol);
            svg.push_str("</tspan>");
        } else {
            svg.push_str(label.symbol);
        }
        if label.hydrogens > 0 {
            svg.push('H');
            if label.hydrogens > 1 {
                let _ = write!(
                    svg,
                    r#"<tspan font-size="{:.2}" baseline-shift="sub">{}</tspan>"#,
                    small, label.hydrogens
                );
            }
        }
        if label.charge != 0 {
            let magnitude = label.charge.unsigned_abs();
            let sign = if label.charge > 0 { "+" } else { "\u{2212}" };
            let text = if magnitude > 1 { format!("{magnitude}{sign}") } else { sign.to_string() };
            let _ = write!(
                svg,
                r#"<tspan font-size="{:.2}" baseline-shift="super">{}</tspan>"#,
                small, text
            );
        }
        svg.push_str("</text>\n");
    }
}

/// Decide whether atom `idx` gets a text label, and what it says
fn atom_label(molecule: &Molecule, idx: usize) -> Option<Label> {
    let atom = &molecule.atoms[idx];
    let degree = molecule.degree(idx);
    let is_plain_carbon = atom.element == Element::CARBON
        && atom.charge == 0
        && atom.isotope.is_none()
        && degree > 0;
    if is_plain_carbon {
        return None;
    }

    Some(Label {
        isotope: atom.isotope,
        symbol: atom.element.symbol(),
        hydrogens: molecule.implicit_hydrogens(idx),
        charge: atom.charge,
        color: atom.element.color(),
    })
}

/// Model-space coordinates with y pointing down, as SVG expects
fn model_coordinates(molecule: &Molecule) -> Vec<Point> {
    let flat = molecule
        .atoms
        .iter()
        .all(|a| a.x.abs() < 1e-6 && a.y.abs() < 1e-6);

    if flat && molecule.atoms.len() > 1 {
        // No 2D layout in the file: spread the atoms on a circle
        let n = molecule.atoms.len() as f64;
        let radius = DEFAULT_BOND_LENGTH / (2.0 * (PI / n).sin());
        return (0..molecule.atoms.len())
            .map(|i| {
                let angle = 2.0 * PI * i as f64 / n;
                Point::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect();
    }

    molecule.atoms.iter().map(|a| Point::new(a.x, -a.y)).collect()
}

fn median_bond_length(molecule: &Molecule, model: &[Point]) -> f64 {
    let mut lengths: Vec<f64> = molecule
        .bonds
        .iter()
        .map(|b| model[b.begin].distance(model[b.end]))
        .filter(|l| *l > 1e-6)
        .collect();
    if lengths.is_empty() {
        return DEFAULT_BOND_LENGTH;
    }
    lengths.sort_by(|a, b| a.total_cmp(b));
    lengths[lengths.len() / 2]
}

fn bounds(points: &[Point]) -> (Point, Point) {
    points.iter().fold(
        (
            Point::new(f64::INFINITY, f64::INFINITY),
            Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        ),
        |(min, max), p| {
            (
                Point::new(min.x.min(p.x), min.y.min(p.y)),
                Point::new(max.x.max(p.x), max.y.max(p.y)),
            )
        },
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
