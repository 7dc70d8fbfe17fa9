/// MDL MOL file parser
///
/// Supports the two connection table flavours found in the wild:
/// - V2000: fixed-column atom and bond blocks plus `M  CHG` / `M  ISO` properties
/// - V3000: `M  V30` keyword records with `-` line continuations
///
/// Anything the depiction does not need (atom maps, query features,
/// S-groups, ...) is skipped rather than rejected.

use super::{Atom, Bond, BondOrder, BondStereo, Element, MolError, Molecule};

/// Parse the full text of a MOL file
pub fn parse(content: &str) -> Result<Molecule, MolError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let lines: Vec<&str> = content.lines().collect();

    // Header block: name, program/timestamp, comment
    let name = lines.first().map(|l| l.trim().to_string()).unwrap_or_default();

    let counts = *lines.get(3).ok_or(MolError::MissingCounts)?;
    let molecule = if counts.contains("V3000") {
        parse_v3000(name, &lines[4..])?
    } else if counts.contains("V2000") || counts.trim_end().len() <= 33 {
        // Very old writers omit the version stamp entirely
        parse_v2000(name, counts, &lines[4..])?
    } else {
        let version = counts.get(33..).unwrap_or_default().trim().to_string();
        return Err(MolError::UnsupportedVersion(version));
    };

    if molecule.atoms.is_empty() {
        return Err(MolError::NoAtoms);
    }
    Ok(molecule)
}

// ========== V2000 ==========

fn parse_v2000(name: String, counts: &str, body: &[&str]) -> Result<Molecule, MolError> {
    let (atom_count, bond_count) = parse_counts_line(counts)?;

    // Line numbers in errors are 1-based and relative to the whole file
    const BODY_OFFSET: usize = 5;

    // Counts come from the file; never size anything from them before the
    // body is known to hold that many lines
    if body.len() < atom_count {
        return Err(MolError::Truncated("atom"));
    }
    if body.len() - atom_count < bond_count {
        return Err(MolError::Truncated("bond"));
    }

    let mut atoms = Vec::with_capacity(atom_count);
    for i in 0..atom_count {
        let line = body.get(i).ok_or(MolError::Truncated("atom"))?;
        atoms.push(parse_atom_line(line, BODY_OFFSET + i)?);
    }

    let mut bonds = Vec::with_capacity(bond_count);
    for i in 0..bond_count {
        let idx = atom_count + i;
        let line = body.get(idx).ok_or(MolError::Truncated("bond"))?;
        bonds.push(parse_bond_line(line, BODY_OFFSET + idx)?);
    }

    let mut molecule = Molecule { name, atoms, bonds };
    check_bonds(&molecule)?;

    let properties = &body[(atom_count + bond_count).min(body.len())..];
    apply_properties(&mut molecule, properties, BODY_OFFSET + atom_count + bond_count)?;

    Ok(molecule)
}

/// `aaabbblllfffcccsssxxxrrrpppiiimmmvvvvvv`
fn parse_counts_line(line: &str) -> Result<(usize, usize), MolError> {
    let fixed = (
        line.get(0..3).and_then(|s| s.trim().parse().ok()),
        line.get(3..6).and_then(|s| s.trim().parse().ok()),
    );
    if let (Some(atoms), Some(bonds)) = fixed {
        return Ok((atoms, bonds));
    }

    // Hand-edited files sometimes lose the column alignment
    let mut parts = line.split_whitespace();
    match (
        parts.next().and_then(|s| s.parse().ok()),
        parts.next().and_then(|s| s.parse().ok()),
    ) {
        (Some(atoms), Some(bonds)) => Ok((atoms, bonds)),
        _ => Err(MolError::InvalidCounts(line.to_string())),
    }
}

/// `xxxxx.xxxxyyyyy.yyyyzzzzz.zzzz aaaddcccssshhhbbbvvvHHHrrriiimmmnnneee`
fn atom_fixed_columns(line: &str) -> Option<(f64, f64, &str, i8)> {
    let x = line.get(0..10)?.trim().parse().ok()?;
    let y = line.get(10..20)?.trim().parse().ok()?;
    line.get(20..30)?.trim().parse::<f64>().ok()?;
    let symbol = line.get(31..34)?.trim();
    let charge = line
        .get(36..39)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or(Some(0), |s| s.parse().ok())?;
    if symbol.is_empty() {
        return None;
    }
    Some((x, y, symbol, charge))
}

fn atom_loose_columns(line: &str) -> Option<(f64, f64, &str, i8)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let x = parts.first()?.parse().ok()?;
    let y = parts.get(1)?.parse().ok()?;
    let symbol = *parts.get(3)?;
    let charge = parts.get(5).map_or(Some(0), |s| s.parse().ok())?;
    Some((x, y, symbol, charge))
}

fn parse_atom_line(line: &str, line_no: usize) -> Result<Atom, MolError> {
    let (x, y, symbol, charge_code) = atom_fixed_columns(line)
        .or_else(|| atom_loose_columns(line))
        .ok_or(MolError::InvalidField {
            line: line_no,
            field: "atom line",
        })?;

    let element = Element::from_symbol(symbol).ok_or_else(|| MolError::UnknownElement {
        line: line_no,
        symbol: symbol.to_string(),
    })?;

    check_finite(x, y, line_no, "atom coordinates")?;
    let mut atom = Atom::new(element, x, y);
    atom.charge = match charge_code {
        1 => 3,
        2 => 2,
        3 => 1,
        5 => -1,
        6 => -2,
        7 => -3,
        // 4 is a doublet radical, not a charge
        _ => 0,
    };
    if symbol == "D" {
        atom.isotope = Some(2);
    } else if symbol == "T" {
        atom.isotope = Some(3);
    }
    Ok(atom)
}

/// `1e999` parses as infinity, which the layout cannot scale
fn check_finite(x: f64, y: f64, line_no: usize, field: &'static str) -> Result<(), MolError> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(MolError::InvalidField { line: line_no, field })
    }
}

/// `111222tttsssxxxrrrccc`
fn parse_bond_line(line: &str, line_no: usize) -> Result<Bond, MolError> {
    let field = |range: std::ops::Range<usize>| -> Option<usize> {
        line.get(range)?.trim().parse().ok()
    };

    let fields = match (field(0..3), field(3..6), field(6..9)) {
        (Some(a), Some(b), Some(t)) => Some((a, b, t, field(9..12).unwrap_or(0))),
        _ => {
            let parts: Vec<usize> = line
                .split_whitespace()
                .map_while(|s| s.parse().ok())
                .collect();
            match parts.as_slice() {
                [a, b, t, rest @ ..] => Some((*a, *b, *t, rest.first().copied().unwrap_or(0))),
                _ => None,
            }
        }
    };

    let (begin, end, kind, stereo) = fields.ok_or(MolError::InvalidField {
        line: line_no,
        field: "bond line",
    })?;

    let order = bond_order(kind, line_no)?;
    let stereo = match (order, stereo) {
        (BondOrder::Single, 1) => BondStereo::Wedge,
        (BondOrder::Single, 4) => BondStereo::Either,
        (BondOrder::Single, 6) => BondStereo::Hash,
        _ => BondStereo::None,
    };

    // Zero would underflow; range against the atom list is checked afterwards
    if begin == 0 || end == 0 {
        return Err(MolError::InvalidField {
            line: line_no,
            field: "bond atom index",
        });
    }

    Ok(Bond {
        begin: begin - 1,
        end: end - 1,
        order,
        stereo,
    })
}

fn bond_order(kind: usize, line_no: usize) -> Result<BondOrder, MolError> {
    match kind {
        1 => Ok(BondOrder::Single),
        2 => Ok(BondOrder::Double),
        3 => Ok(BondOrder::Triple),
        4 => Ok(BondOrder::Aromatic),
        5..=8 => Ok(BondOrder::Query),
        _ => Err(MolError::UnsupportedBondType { line: line_no, kind }),
    }
}

/// Apply the `M  ...` property block.
/// Any `M  CHG` line supersedes every charge given in the atom block.
fn apply_properties(
    molecule: &mut Molecule,
    lines: &[&str],
    first_line_no: usize,
) -> Result<(), MolError> {
    let mut charges_reset = false;

    for (i, line) in lines.iter().enumerate() {
        let line_no = first_line_no + i;
        if line.starts_with("M  END") || line.starts_with("$$$$") {
            break;
        }

        let mut parts = line.split_whitespace();
        if parts.next() != Some("M") {
            continue;
        }
        let key = parts.next();
        if !matches!(key, Some("CHG") | Some("ISO")) {
            continue;
        }

        let values: Vec<i32> = parts
            .map(|s| s.parse())
            .collect::<Result<_, _>>()
            .map_err(|_| MolError::InvalidField {
                line: line_no,
                field: "property value",
            })?;
        let Some((&count, pairs)) = values.split_first() else {
            continue;
        };

        if key == Some("CHG") && !charges_reset {
            molecule.atoms.iter_mut().for_each(|a| a.charge = 0);
            charges_reset = true;
        }

        for pair in pairs.chunks_exact(2).take(count.max(0) as usize) {
            let idx = pair[0] as usize;
            let atom = idx
                .checked_sub(1)
                .and_then(|i| molecule.atoms.get_mut(i))
                .ok_or(MolError::InvalidField {
                    line: line_no,
                    field: "property atom index",
                })?;
            match key {
                Some("CHG") => atom.charge = pair[1].clamp(-15, 15) as i8,
                _ => atom.isotope = u16::try_from(pair[1]).ok(),
            }
        }
    }

    Ok(())
}

// ========== V3000 ==========

#[derive(PartialEq)]
enum Section {
    None,
    Atoms,
    Bonds,
}

fn parse_v3000(name: String, body: &[&str]) -> Result<Molecule, MolError> {
    let mut molecule = Molecule {
        name,
        ..Default::default()
    };
    // V3000 atom ids are arbitrary positive integers
    let mut ids: Vec<usize> = Vec::new();
    let mut section = Section::None;

    for (line_no, record) in v30_records(body) {
        let mut parts = record.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("BEGIN"), Some("ATOM")) => section = Section::Atoms,
            (Some("BEGIN"), Some("BOND")) => section = Section::Bonds,
            (Some("END"), _) => section = Section::None,
            _ if section == Section::Atoms => {
                let (id, atom) = parse_v30_atom(&record, line_no)?;
                ids.push(id);
                molecule.atoms.push(atom);
            }
            _ if section == Section::Bonds => {
                let bond = parse_v30_bond(&record, line_no, &ids)?;
                molecule.bonds.push(bond);
            }
            _ => {}
        }
    }

    Ok(molecule)
}

/// Collect `M  V30` records, joining `-` continuation lines.
/// Yields the file line number of each record's first line.
fn v30_records(body: &[&str]) -> Vec<(usize, String)> {
    let mut records = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (i, line) in body.iter().enumerate() {
        if line.starts_with("M  END") {
            break;
        }
        let Some(rest) = line.strip_prefix("M  V30 ") else {
            continue;
        };

        let (line_no, mut text) = pending.take().unwrap_or((i + 5, String::new()));
        match rest.trim_end().strip_suffix('-') {
            Some(head) => {
                text.push_str(head);
                pending = Some((line_no, text));
            }
            None => {
                text.push_str(rest.trim_end());
                records.push((line_no, text));
            }
        }
    }

    records.extend(pending);
    records
}

/// `index type x y z aamap [CHG=val] [MASS=val] ...`
fn parse_v30_atom(record: &str, line_no: usize) -> Result<(usize, Atom), MolError> {
    let invalid = MolError::InvalidField {
        line: line_no,
        field: "V3000 atom",
    };
    let parts: Vec<&str> = record.split_whitespace().collect();
    if parts.len() < 5 {
        return Err(invalid);
    }

    let id: usize = parts[0].parse().map_err(|_| invalid)?;
    let symbol = parts[1];
    let coords: Option<(f64, f64)> = parts[2].parse().ok().zip(parts[3].parse().ok());
    let (x, y) = coords.ok_or(MolError::InvalidField {
        line: line_no,
        field: "V3000 atom coordinates",
    })?;
    check_finite(x, y, line_no, "V3000 atom coordinates")?;

    let element = Element::from_symbol(symbol).ok_or_else(|| MolError::UnknownElement {
        line: line_no,
        symbol: symbol.to_string(),
    })?;
    let mut atom = Atom::new(element, x, y);

    for (key, value) in parts.iter().skip(6).filter_map(|p| p.split_once('=')) {
        match key {
            "CHG" => atom.charge = value.parse().unwrap_or(0),
            "MASS" => atom.isotope = value.parse().ok(),
            _ => {}
        }
    }

    Ok((id, atom))
}

/// `index type atom1 atom2 [CFG=val] ...`
fn parse_v30_bond(record: &str, line_no: usize, ids: &[usize]) -> Result<Bond, MolError> {
    let parts: Vec<&str> = record.split_whitespace().collect();
    let numbers: Option<Vec<usize>> = parts.get(1..4).map(|p| {
        p.iter().filter_map(|s| s.parse().ok()).collect()
    });
    let Some([kind, a, b]) = numbers.as_deref().and_then(|n| <[usize; 3]>::try_from(n).ok()) else {
        return Err(MolError::InvalidField {
            line: line_no,
            field: "V3000 bond",
        });
    };

    let bond_idx = parts[0].parse().unwrap_or(0);
    let position = |id: usize| {
        ids.iter()
            .position(|&x| x == id)
            .ok_or(MolError::BondAtomOutOfRange {
                bond: bond_idx,
                atom: id,
                count: ids.len(),
            })
    };

    let order = bond_order(kind, line_no)?;
    let cfg = parts
        .iter()
        .filter_map(|p| p.strip_prefix("CFG="))
        .find_map(|v| v.parse::<u8>().ok())
        .unwrap_or(0);
    let stereo = match (order, cfg) {
        (BondOrder::Single, 1) => BondStereo::Wedge,
        (BondOrder::Single, 2) => BondStereo::Either,
        (BondOrder::Single, 3) => BondStereo::Hash,
        _ => BondStereo::None,
    };

    Ok(Bond {
        begin: position(a)?,
        end: position(b)?,
        order,
        stereo,
    })
}

fn check_bonds(molecule: &Molecule) -> Result<(), MolError> {
    let count = molecule.atoms.len();
    for (i, bond) in molecule.bonds.iter().enumerate() {
        for atom in [bond.begin, bond.end] {
            if atom >= count {
                return Err(MolError::BondAtomOutOfRange {
                    bond: i + 1,
                    atom: atom + 1,
                    count,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// L-Alanine with a charged amine, carboxylate and a 13C label
    pub(crate) const ALANINE: &str = "L-Alanine (13C)
  GSMACCS-II10169115362D 1   0.00366   0.00000    0

  6  5  0  0  1  0            999 V2000
   -0.6622    0.5342    0.0000 C   0  0  2  0  0  0
    0.6622   -0.3000    0.0000 C   0  0  0  0  0  0
   -0.7207    2.0817    0.0000 C   1  0  0  0  0  0
   -1.8622   -0.3695    0.0000 N   0  3  0  0  0  0
    0.6220   -1.8037    0.0000 O   0  0  0  0  0  0
    1.9464    0.4244    0.0000 O   0  5  0  0  0  0
  1  2  1  0  0  0
  1  3  1  1  0  0
  1  4  1  0  0  0
  2  5  2  0  0  0
  2  6  1  0  0  0
M  CHG  2   4   1   6  -1
M  ISO  1   3  13
M  END
";

    const ETHANOL_V3000: &str = "ethanol
     RDKit          2D

  0  0  0  0  0  0  0  0  0  0999 V3000
M  V30 BEGIN CTAB
M  V30 COUNTS 3 2 0 0 0
M  V30 BEGIN ATOM
M  V30 1 C 0 0 0 0
M  V30 2 C 1.299 0.75 0 0
M  V30 3 O 2.5981 -0.00 -
M  V30 0 0 CHG=-1
M  V30 END ATOM
M  V30 BEGIN BOND
M  V30 1 1 1 2
M  V30 2 1 2 3 CFG=1
M  V30 END BOND
M  V30 END CTAB
M  END
";

    #[test]
    fn test_parse_v2000() {
        let mol = parse(ALANINE).unwrap();
        assert_eq!(mol.name, "L-Alanine (13C)");
        assert_eq!(mol.atoms.len(), 6);
        assert_eq!(mol.bonds.len(), 5);

        assert_eq!(mol.atoms[3].element.symbol(), "N");
        assert_eq!(mol.atoms[3].charge, 1);
        assert_eq!(mol.atoms[5].charge, -1);
        assert_eq!(mol.atoms[2].isotope, Some(13));
        assert!((mol.atoms[1].x - 0.6622).abs() < 1e-9);

        assert_eq!(mol.bonds[1].begin, 0);
        assert_eq!(mol.bonds[1].end, 2);
        assert_eq!(mol.bonds[1].stereo, BondStereo::Wedge);
        assert_eq!(mol.bonds[3].order, BondOrder::Double);
    }

    #[test]
    fn test_chg_property_overrides_atom_block() {
        // Atom block says +3 (code 1), property block says -2
        let text = "x\n\n\n  1  0  0  0  0  0            999 V2000
    0.0000    0.0000    0.0000 O   0  1  0  0  0  0
M  CHG  1   1  -2
M  END
";
        let mol = parse(text).unwrap();
        assert_eq!(mol.atoms[0].charge, -2);
    }

    #[test]
    fn test_atom_block_charge_without_properties() {
        let text = "x\n\n\n  1  0  0  0  0  0            999 V2000
    0.0000    0.0000    0.0000 N   0  3  0  0  0  0
M  END
";
        assert_eq!(parse(text).unwrap().atoms[0].charge, 1);
    }

    #[test]
    fn test_parse_v3000_with_continuation() {
        let mol = parse(ETHANOL_V3000).unwrap();
        assert_eq!(mol.atoms.len(), 3);
        assert_eq!(mol.bonds.len(), 2);
        assert_eq!(mol.atoms[2].element.symbol(), "O");
        assert_eq!(mol.atoms[2].charge, -1);
        assert_eq!(mol.bonds[1].stereo, BondStereo::Wedge);
    }

    #[test]
    fn test_loose_columns_fallback() {
        let text = "loose\n\n\n3 2 V2000
0.0 0.0 0.0 C 0 0
1.5 0.0 0.0 C 0 0
3.0 0.0 0.0 N 0 0
1 2 1 0
2 3 3 0
M  END
";
        let mol = parse(text).unwrap();
        assert_eq!(mol.atoms.len(), 3);
        assert_eq!(mol.bonds[1].order, BondOrder::Triple);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(parse(""), Err(MolError::MissingCounts)));
        assert!(matches!(
            parse("a\nb\nc\nnot a counts line\n"),
            Err(MolError::InvalidCounts(_))
        ));
    }

    #[test]
    fn test_rejects_truncated_atom_block() {
        let text = "x\n\n\n  3  0  0  0  0  0            999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0
";
        assert!(matches!(parse(text), Err(MolError::Truncated("atom"))));
    }

    #[test]
    fn test_rejects_unknown_element() {
        let text = "x\n\n\n  1  0  0  0  0  0            999 V2000
    0.0000    0.0000    0.0000 Xx  0  0  0  0  0  0
M  END
";
        assert!(matches!(
            parse(text),
            Err(MolError::UnknownElement { line: 5, .. })
        ));
    }

    #[test]
    fn test_rejects_dangling_bond() {
        let text = "x\n\n\n  1  1  0  0  0  0            999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0
  1  2  1  0  0  0
M  END
";
        assert!(matches!(
            parse(text),
            Err(MolError::BondAtomOutOfRange { atom: 2, .. })
        ));
    }

    #[test]
    fn test_oversized_counts_are_truncated() {
        let text = "x\n\n\n1 99999999999999999 V2000\n0.0 0.0 0.0 C 0 0\nM  END\n";
        assert!(matches!(parse(text), Err(MolError::Truncated("bond"))));

        let text = "x\n\n\n99999999999999999 0 V2000\nM  END\n";
        assert!(matches!(parse(text), Err(MolError::Truncated("atom"))));
    }

    #[test]
    fn test_rejects_non_finite_coordinates() {
        let text = "x\n\n\n2 1 V2000
1e999 0.0 0.0 C 0 0
1.5 0.0 0.0 C 0 0
1 2 1 0
M  END
";
        assert!(matches!(
            parse(text),
            Err(MolError::InvalidField { line: 5, field: "atom coordinates" })
        ));

        let v3000 = ETHANOL_V3000.replace("M  V30 2 C 1.299 0.75 0 0", "M  V30 2 C NaN 0.75 0 0");
        assert!(matches!(
            parse(&v3000),
            Err(MolError::InvalidField { field: "V3000 atom coordinates", .. })
        ));
    }

    #[test]
    fn test_rejects_out_of_range_bond_type() {
        // 257 must not wrap around to a single bond
        let text = "x\n\n\n  2  1  0  0  0  0            999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0
    1.5000    0.0000    0.0000 C   0  0  0  0  0  0
  1  2257  0  0  0
M  END
";
        assert!(matches!(
            parse(text),
            Err(MolError::UnsupportedBondType { line: 7, kind: 257 })
        ));
    }

    #[test]
    fn test_rejects_empty_molecule() {
        let text = "x\n\n\n  0  0  0  0  0  0            999 V2000\nM  END\n";
        assert!(matches!(parse(text), Err(MolError::NoAtoms)));
    }
}
