/// Periodic table lookups needed for depiction
///
/// Only the handful of properties the renderer cares about live here:
/// symbol validation, default valences (for implicit hydrogen labels)
/// and the label colour.

/// Element symbols indexed by atomic number (index 0 is unused)
static SYMBOLS: [&str; 119] = [
    "",
    "H", "He",
    "Li", "Be", "B", "C", "N", "O", "F", "Ne",
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar",
    "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr",
    "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe",
    "Cs", "Ba",
    "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn",
    "Fr", "Ra",
    "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm", "Md", "No",
    "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn",
    "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// A chemical element, stored as its atomic number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Element(u8);

impl Element {
    pub const HYDROGEN: Element = Element(1);
    pub const CARBON: Element = Element(6);

    /// Look up an element by its exact (case-sensitive) symbol.
    /// MOL files write `D` and `T` for hydrogen isotopes; both map to hydrogen.
    pub fn from_symbol(symbol: &str) -> Option<Element> {
        if symbol == "D" || symbol == "T" {
            return Some(Self::HYDROGEN);
        }
        SYMBOLS
            .iter()
            .skip(1)
            .position(|s| *s == symbol)
            .map(|i| Element(i as u8 + 1))
    }

    pub fn atomic_num(self) -> u8 {
        self.0
    }

    pub fn symbol(self) -> &'static str {
        SYMBOLS[self.0 as usize]
    }

    /// Allowed valences, lowest first. Empty for elements that never get
    /// implicit hydrogens drawn (metals, noble gases).
    pub fn default_valences(self) -> &'static [u8] {
        match self.0 {
            1 => &[1],
            5 => &[3],
            6 => &[4],
            7 => &[3, 5],
            8 => &[2],
            9 => &[1],
            14 => &[4],
            15 => &[3, 5],
            16 => &[2, 4, 6],
            17 => &[1],
            33 => &[3, 5],
            34 => &[2, 4, 6],
            35 => &[1],
            53 => &[1, 3, 5],
            _ => &[],
        }
    }

    /// Label colour as an RGB hex string
    pub fn color(self) -> &'static str {
        match self.0 {
            7 => "#0000FF",
            8 => "#FF0000",
            9 | 17 => "#33CCCC",
            15 => "#FF7F00",
            16 => "#CCCC00",
            35 => "#7F4C19",
            53 => "#A01EEF",
            _ => "#000000",
        }
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_lookup() {
        assert_eq!(Element::from_symbol("C"), Some(Element::CARBON));
        assert_eq!(Element::from_symbol("Cl").map(Element::atomic_num), Some(17));
        assert_eq!(Element::from_symbol("Og").map(Element::atomic_num), Some(118));
        assert_eq!(Element::from_symbol("D"), Some(Element::HYDROGEN));
    }

    #[test]
    fn test_symbol_is_case_sensitive() {
        assert_eq!(Element::from_symbol("CL"), None);
        assert_eq!(Element::from_symbol("c"), None);
        assert_eq!(Element::from_symbol("Xx"), None);
        assert_eq!(Element::from_symbol(""), None);
    }

    #[test]
    fn test_valences() {
        let n = Element::from_symbol("N").unwrap();
        assert_eq!(n.default_valences(), &[3, 5]);
        let fe = Element::from_symbol("Fe").unwrap();
        assert!(fe.default_valences().is_empty());
    }
}
