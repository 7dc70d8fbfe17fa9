/// Molecule model and MOL file reading
///
/// This module handles:
/// - The in-memory molecule graph (atoms with 2D coordinates, bonds)
/// - Parsing MDL MOL files (V2000 and V3000 connection tables)
/// - Periodic table lookups used when labelling atoms

pub mod element;
pub mod molfile;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use element::Element;

/// Errors produced while reading a MOL file
#[derive(Debug, Error)]
pub enum MolError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing counts line")]
    MissingCounts,

    #[error("invalid counts line: {0:?}")]
    InvalidCounts(String),

    #[error("unsupported connection table version {0:?}")]
    UnsupportedVersion(String),

    #[error("unexpected end of {0} block")]
    Truncated(&'static str),

    #[error("line {line}: invalid {field}")]
    InvalidField { line: usize, field: &'static str },

    #[error("line {line}: unknown element {symbol:?}")]
    UnknownElement { line: usize, symbol: String },

    #[error("line {line}: unsupported bond type {kind}")]
    UnsupportedBondType { line: usize, kind: usize },

    #[error("bond {bond} references atom {atom}, but the molecule has {count} atoms")]
    BondAtomOutOfRange { bond: usize, atom: usize, count: usize },

    #[error("molecule has no atoms")]
    NoAtoms,
}

/// Bond multiplicity as declared in the connection table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
    /// Query bond types 5-8 ("single or double", "any", ...)
    Query,
}

impl BondOrder {
    /// Bond contribution to valence, in half-bond units so aromatic bonds
    /// (1.5) stay integral.
    fn half_units(self) -> u32 {
        match self {
            BondOrder::Single | BondOrder::Query => 2,
            BondOrder::Double => 4,
            BondOrder::Triple => 6,
            BondOrder::Aromatic => 3,
        }
    }
}

/// Wedge/hash annotation of a single bond, pointing from `begin` to `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BondStereo {
    #[default]
    None,
    Wedge,
    Hash,
    Either,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: Element,
    pub x: f64,
    pub y: f64,
    pub charge: i8,
    /// Absolute isotope mass, when the file specifies one
    pub isotope: Option<u16>,
}

impl Atom {
    pub fn new(element: Element, x: f64, y: f64) -> Self {
        Self {
            element,
            x,
            y,
            charge: 0,
            isotope: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bond {
    /// Zero-based atom index
    pub begin: usize,
    /// Zero-based atom index
    pub end: usize,
    pub order: BondOrder,
    pub stereo: BondStereo,
}

/// A parsed molecule ready for depiction
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Molecule {
    /// First header line of the file (often the compound name)
    pub name: String,
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
}

impl Molecule {
    /// Parse the text of a MOL file
    pub fn from_molfile(content: &str) -> Result<Self, MolError> {
        molfile::parse(content)
    }

    /// Indices of the bonds touching atom `idx`
    pub fn bonds_of(&self, idx: usize) -> impl Iterator<Item = &Bond> + '_ {
        self.bonds
            .iter()
            .filter(move |b| b.begin == idx || b.end == idx)
    }

    pub fn degree(&self, idx: usize) -> usize {
        self.bonds_of(idx).count()
    }

    /// Implicit hydrogen count derived from the element's default valences,
    /// the explicit bonds and the formal charge.
    pub fn implicit_hydrogens(&self, idx: usize) -> u8 {
        let atom = &self.atoms[idx];
        let valences = atom.element.default_valences();
        if valences.is_empty() {
            return 0;
        }

        let half: u32 = self.bonds_of(idx).map(|b| b.order.half_units()).sum();
        let used = half.div_ceil(2) as i32;

        // Cations of N/P/O/S gain a bond (NH4+, H3O+), everything else loses one
        let charge = atom.charge as i32;
        let shift = match atom.element.atomic_num() {
            7 | 8 | 15 | 16 | 33 | 34 if charge > 0 => charge,
            _ => -charge.abs(),
        };

        valences
            .iter()
            .map(|&v| v as i32 + shift)
            .find(|&v| v >= used)
            .map(|v| (v - used).clamp(0, 4) as u8)
            .unwrap_or(0)
    }
}

/// Read and parse a MOL file from disk
pub fn parse_file(path: &Path) -> Result<Molecule, MolError> {
    let content = std::fs::read_to_string(path).map_err(|source| MolError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Molecule::from_molfile(&content)
}
