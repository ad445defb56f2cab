//! Character set designation (SCS) tables
//!
//! A received codepoint in the GL range is looked up in the table designated
//! to the active G-set. Only 0x20-0x7E are ever substituted.

/// One of the four designatable G-sets
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GSet {
    #[default]
    G0,
    G1,
    G2,
    G3,
}

impl GSet {
    pub fn index(self) -> usize {
        match self {
            GSet::G0 => 0,
            GSet::G1 => 1,
            GSet::G2 => 2,
            GSet::G3 => 3,
        }
    }
}

/// Transformation table designated to a G-set
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CharsetTable {
    #[default]
    UsAscii,
    UnitedKingdom,
    DecSpecialGraphics,
    DecSupplemental,
}

impl CharsetTable {
    /// Table selected by an SCS final byte (`ESC ( <final>`)
    pub fn from_final(byte: u8) -> Option<Self> {
        match byte {
            b'B' | b'1' => Some(CharsetTable::UsAscii),
            b'A' => Some(CharsetTable::UnitedKingdom),
            b'0' | b'2' => Some(CharsetTable::DecSpecialGraphics),
            b'<' => Some(CharsetTable::DecSupplemental),
            _ => None,
        }
    }
}

/// DEC Special Graphics, indexed from 0x5F ('_')
const DEC_SPECIAL_GRAPHICS: [char; 32] = [
    '\u{00A0}', // _ blank
    '\u{25C6}', // ` diamond
    '\u{2592}', // a checkerboard
    '\u{2409}', // b HT
    '\u{240C}', // c FF
    '\u{240D}', // d CR
    '\u{240A}', // e LF
    '\u{00B0}', // f degree
    '\u{00B1}', // g plus/minus
    '\u{2424}', // h NL
    '\u{240B}', // i VT
    '\u{2518}', // j lower-right corner
    '\u{2510}', // k upper-right corner
    '\u{250C}', // l upper-left corner
    '\u{2514}', // m lower-left corner
    '\u{253C}', // n crossing lines
    '\u{23BA}', // o scan line 1
    '\u{23BB}', // p scan line 3
    '\u{2500}', // q horizontal line
    '\u{23BC}', // r scan line 7
    '\u{23BD}', // s scan line 9
    '\u{251C}', // t left tee
    '\u{2524}', // u right tee
    '\u{2534}', // v bottom tee
    '\u{252C}', // w top tee
    '\u{2502}', // x vertical line
    '\u{2264}', // y less-than-or-equal
    '\u{2265}', // z greater-than-or-equal
    '\u{03C0}', // { pi
    '\u{2260}', // | not-equal
    '\u{00A3}', // } pound sign
    '\u{00B7}', // ~ centered dot
];

/// Substitute `codepoint` through `table`.
pub fn transform(table: CharsetTable, codepoint: char) -> char {
    match table {
        CharsetTable::UsAscii | CharsetTable::DecSupplemental => codepoint,
        CharsetTable::UnitedKingdom => {
            if codepoint == '#' {
                '\u{00A3}'
            } else {
                codepoint
            }
        }
        CharsetTable::DecSpecialGraphics => match codepoint {
            '\u{5F}'..='\u{7E}' => DEC_SPECIAL_GRAPHICS[codepoint as usize - 0x5F],
            _ => codepoint,
        },
    }
}
