//! Font decoding for text-showing operators.
//!
//! A [`PdfFont`] turns the bytes of a `Tj`/`TJ` string into glyphs with
//! Unicode text and an advance width. Simple fonts use one byte per code
//! with `/FirstChar`/`/Widths`, composite (Type0) fonts use two bytes per
//! code with the descendant's `/DW`/`/W`. A `/ToUnicode` map, when present,
//! takes precedence over the built-in single-byte decoding.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object};
use tracing::warn;

/// Advance used when a font gives no width for a code, in glyph units.
pub const DEFAULT_GLYPH_WIDTH: f64 = 500.0;

/// Largest number of codes a single `bfrange` entry may map.
pub const MAX_BFRANGE_SPAN: u32 = 0xFFFF;

/// Default width of a composite font without `/DW`.
const DEFAULT_CID_WIDTH: f64 = 1000.0;

/// WinAnsi codes in 0x80..=0x9F that differ from Latin-1.
const WIN_ANSI_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

/// One decoded glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Character code as read from the string.
    pub code: u32,
    /// Unicode text for the code (may be several characters, or empty).
    pub text: String,
    /// Advance width in glyph units (1/1000 of text space).
    pub width: f64,
    /// The text came from a fallback mapping rather than the font's own.
    pub fallback: bool,
}

/// ToUnicode mapping from character codes to Unicode strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToUnicode {
    map: HashMap<u32, String>,
}

#[derive(Debug, Clone, PartialEq)]
enum CMapToken {
    Hex(Vec<u8>),
    Open,
    Close,
    Word(String),
}

fn tokenize_cmap(data: &[u8]) -> Vec<CMapToken> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'<' => {
                let start = i + 1;
                let end = data[start..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map_or(data.len(), |p| start + p);
                let digits: Vec<u8> = data[start..end]
                    .iter()
                    .copied()
                    .filter(u8::is_ascii_hexdigit)
                    .collect();
                tokens.push(CMapToken::Hex(hex_bytes(&digits)));
                i = end + 1;
            }
            b'[' => {
                tokens.push(CMapToken::Open);
                i += 1;
            }
            b']' => {
                tokens.push(CMapToken::Close);
                i += 1;
            }
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < data.len()
                    && !data[i].is_ascii_whitespace()
                    && !matches!(data[i], b'<' | b'[' | b']' | b'%')
                {
                    i += 1;
                }
                tokens.push(CMapToken::Word(
                    String::from_utf8_lossy(&data[start..i]).into_owned(),
                ));
            }
        }
    }
    tokens
}

fn hex_bytes(digits: &[u8]) -> Vec<u8> {
    let nibble = |d: u8| (d as char).to_digit(16).unwrap_or(0) as u8;
    digits
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => nibble(*hi) << 4 | nibble(*lo),
            [hi] => nibble(*hi) << 4,
            _ => 0,
        })
        .collect()
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| acc << 8 | u32::from(b))
}

fn utf16be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|c| match c {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [lo] => u16::from(*lo),
            _ => 0,
        })
        .collect();
    String::from_utf16_lossy(&units)
}

/// Destination for the `offset`-th code of a bfrange: the last UTF-16 unit
/// of the start string is incremented.
fn range_destination(start: &[u8], offset: u32) -> String {
    let mut units: Vec<u16> = start
        .chunks(2)
        .map(|c| match c {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [lo] => u16::from(*lo),
            _ => 0,
        })
        .collect();
    if let Some(last) = units.last_mut() {
        *last = last.wrapping_add(offset as u16);
    }
    String::from_utf16_lossy(&units)
}

impl ToUnicode {
    /// Parse the `bfchar` and `bfrange` sections of a ToUnicode CMap.
    /// Unrecognized content is skipped.
    pub fn parse(data: &[u8]) -> Self {
        let tokens = tokenize_cmap(data);
        let mut map = HashMap::new();
        let mut i = 0;
        while i < tokens.len() {
            match &tokens[i] {
                CMapToken::Word(w) if w == "beginbfchar" => {
                    i += 1;
                    while let (Some(CMapToken::Hex(src)), Some(CMapToken::Hex(dst))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        map.insert(code_of(src), utf16be(dst));
                        i += 2;
                    }
                }
                CMapToken::Word(w) if w == "beginbfrange" => {
                    i += 1;
                    while let (Some(CMapToken::Hex(lo)), Some(CMapToken::Hex(hi))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        let (lo, hi) = (code_of(lo), code_of(hi));
                        i += 2;
                        let valid = lo <= hi && hi - lo <= MAX_BFRANGE_SPAN;
                        if !valid {
                            warn!(lo, hi, "bfrange entry skipped: span out of bounds");
                        }
                        match tokens.get(i) {
                            Some(CMapToken::Hex(start)) => {
                                if valid {
                                    for code in lo..=hi {
                                        map.insert(code, range_destination(start, code - lo));
                                    }
                                }
                                i += 1;
                            }
                            Some(CMapToken::Open) => {
                                i += 1;
                                let mut code = Some(lo);
                                while let Some(CMapToken::Hex(dst)) = tokens.get(i) {
                                    if let Some(c) = code.filter(|c| valid && *c <= hi) {
                                        map.insert(c, utf16be(dst));
                                    }
                                    code = code.and_then(|c| c.checked_add(1));
                                    i += 1;
                                }
                                if matches!(tokens.get(i), Some(CMapToken::Close)) {
                                    i += 1;
                                }
                            }
                            _ => break,
                        }
                    }
                }
                _ => i += 1,
            }
        }
        Self { map }
    }

    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// A font resource, reduced to what text extraction needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfFont {
    base_font: String,
    composite: bool,
    first_char: u32,
    widths: Vec<f64>,
    missing_width: f64,
    cid_widths: HashMap<u32, f64>,
    to_unicode: Option<ToUnicode>,
}

impl Default for PdfFont {
    /// Single-byte font with Latin-1 text and a fixed advance.
    fn default() -> Self {
        Self {
            base_font: String::new(),
            composite: false,
            first_char: 0,
            widths: Vec::new(),
            missing_width: DEFAULT_GLYPH_WIDTH,
            cid_widths: HashMap::new(),
            to_unicode: None,
        }
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(f64::from(*f)),
        _ => None,
    }
}

fn dict_number(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f64> {
    dict.get(key).ok().map(|o| resolve(doc, o)).and_then(number)
}

fn dict_array<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a [Object]> {
    dict.get(key)
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
        .map(Vec::as_slice)
}

/// Parse a CIDFont `/W` array: `c [w1 w2 …]` and `c_first c_last w` entries.
fn parse_cid_widths(doc: &Document, array: &[Object]) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < array.len() {
        let Some(first) = number(resolve(doc, &array[i])) else {
            i += 1;
            continue;
        };
        let first = first as u32;
        match array.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (k, w) in list.iter().enumerate() {
                    if let Some(w) = number(resolve(doc, w)) {
                        widths.insert(first + k as u32, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let (Some(last), Some(w)) = (
                    number(last),
                    array.get(i + 2).map(|o| resolve(doc, o)).and_then(number),
                ) else {
                    break;
                };
                for code in first..=(last as u32).max(first) {
                    widths.insert(code, w);
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

impl PdfFont {
    /// Read a font dictionary.
    pub fn from_dict(doc: &Document, dict: &Dictionary) -> Self {
        let base_font = dict
            .get(b"BaseFont")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_default();
        let composite = dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .is_some_and(|n| n == b"Type0");
        let to_unicode = dict
            .get(b"ToUnicode")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_stream().ok())
            .and_then(|s| s.decompressed_content().ok().or_else(|| Some(s.content.clone())))
            .map(|data| ToUnicode::parse(&data))
            .filter(|map| !map.is_empty());

        let mut font = Self {
            base_font,
            composite,
            to_unicode,
            ..Self::default()
        };

        if composite {
            let descendant = dict_array(doc, dict, b"DescendantFonts")
                .and_then(|fonts| fonts.first())
                .map(|o| resolve(doc, o))
                .and_then(|o| o.as_dict().ok());
            font.missing_width = descendant
                .and_then(|d| dict_number(doc, d, b"DW"))
                .unwrap_or(DEFAULT_CID_WIDTH);
            if let Some(w) = descendant.and_then(|d| dict_array(doc, d, b"W")) {
                font.cid_widths = parse_cid_widths(doc, w);
            }
        } else {
            font.first_char = dict_number(doc, dict, b"FirstChar").map_or(0, |v| v as u32);
            font.widths = dict_array(doc, dict, b"Widths")
                .map(|arr| {
                    arr.iter()
                        .map(|o| number(resolve(doc, o)).unwrap_or(0.0))
                        .collect()
                })
                .unwrap_or_default();
            font.missing_width = dict
                .get(b"FontDescriptor")
                .ok()
                .map(|o| resolve(doc, o))
                .and_then(|o| o.as_dict().ok())
                .and_then(|d| dict_number(doc, d, b"MissingWidth"))
                .filter(|w| *w > 0.0)
                .unwrap_or(DEFAULT_GLYPH_WIDTH);
        }
        font
    }

    pub fn base_font(&self) -> &str {
        &self.base_font
    }

    /// Two-byte codes (Type0 font).
    pub fn is_composite(&self) -> bool {
        self.composite
    }

    pub fn has_to_unicode(&self) -> bool {
        self.to_unicode.is_some()
    }

    /// Advance width for a code, in glyph units.
    pub fn width(&self, code: u32) -> f64 {
        if self.composite {
            return self
                .cid_widths
                .get(&code)
                .copied()
                .unwrap_or(self.missing_width);
        }
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(self.missing_width)
    }

    fn text_for(&self, code: u32) -> (String, bool) {
        if let Some(text) = self.to_unicode.as_ref().and_then(|m| m.lookup(code)) {
            return (text.to_string(), false);
        }
        if self.composite {
            let text = char::from_u32(code).map_or_else(String::new, String::from);
            return (text, true);
        }
        let byte = code as u8;
        let ch = WIN_ANSI_HIGH
            .iter()
            .find(|(b, _)| *b == byte)
            .map_or(byte as char, |(_, c)| *c);
        (ch.to_string(), self.to_unicode.is_some())
    }

    /// Split a string operand into glyphs.
    pub fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        let step = if self.composite { 2 } else { 1 };
        bytes
            .chunks(step)
            .map(|chunk| {
                let code = code_of(chunk);
                let (text, fallback) = self.text_for(code);
                Glyph {
                    code,
                    text,
                    width: self.width(code),
                    fallback,
                }
            })
            .collect()
    }
}
