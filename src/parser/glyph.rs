//! Grid glyph classification
//!
//! Result grids are shared as rows of coloured square emoji. Each recognised
//! code point maps to exactly one [`Glyph`]; everything else in a post is
//! ignored when the grid is extracted.

/// A recognised grid character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Glyph {
    /// Black square, dark theme miss
    MissDark,
    /// White square, light theme miss
    MissLight,
    /// Yellow square
    Present,
    /// Blue square, colorblind palette present
    PresentColorblind,
    /// Green square
    Correct,
    /// Orange square, colorblind palette correct
    CorrectColorblind,
    /// Newline between rows
    RowSeparator,
}

/// Every recognised character and its class
const GLYPH_TABLE: [(char, Glyph); 7] = [
    ('\u{2B1B}', Glyph::MissDark),
    ('\u{2B1C}', Glyph::MissLight),
    ('\u{1F7E8}', Glyph::Present),
    ('\u{1F7E6}', Glyph::PresentColorblind),
    ('\u{1F7E9}', Glyph::Correct),
    ('\u{1F7E7}', Glyph::CorrectColorblind),
    ('\n', Glyph::RowSeparator),
];

impl Glyph {
    /// Classify one character, `None` for anything outside the grid alphabet
    pub fn classify(c: char) -> Option<Self> {
        GLYPH_TABLE
            .iter()
            .find(|(glyph_char, _)| *glyph_char == c)
            .map(|(_, glyph)| *glyph)
    }

    /// Canonical letter: `A` miss, `B` present, `C` correct
    ///
    /// Row separators have no canonical letter.
    pub fn canonical(&self) -> Option<char> {
        match self {
            Glyph::MissDark | Glyph::MissLight => Some('A'),
            Glyph::Present | Glyph::PresentColorblind => Some('B'),
            Glyph::Correct | Glyph::CorrectColorblind => Some('C'),
            Glyph::RowSeparator => None,
        }
    }

    /// Whether the glyph belongs to the colorblind palette
    pub fn is_colorblind(&self) -> bool {
        matches!(self, Glyph::PresentColorblind | Glyph::CorrectColorblind)
    }
}

/// Split text into grid rows of classified squares
///
/// Characters outside the glyph table are dropped before splitting, so emoji
/// variation selectors and prose around the grid do not break a row. Empty rows
/// are discarded.
pub fn extract_rows(text: &str) -> Vec<Vec<Glyph>> {
    let mut rows = Vec::new();
    let mut current = Vec::new();

    for glyph in text.chars().filter_map(Glyph::classify) {
        if glyph == Glyph::RowSeparator {
            if !current.is_empty() {
                rows.push(std::mem::take(&mut current));
            }
        } else {
            current.push(glyph);
        }
    }
    if !current.is_empty() {
        rows.push(current);
    }

    rows
}
