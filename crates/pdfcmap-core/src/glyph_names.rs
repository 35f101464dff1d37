//! Glyph-name resolution for `bfchar` entries whose target is a name.
//!
//! Some ToUnicode streams write `<01> /fi` instead of a UTF-16 hex string.
//! The name is turned into text by a [`GlyphNameResolver`]; the default
//! [`AdobeGlyphNames`] follows the Adobe Glyph List conventions for
//! `uniXXXX`, `uXXXX[XX]`, `base.suffix` and `a_b` ligature names.

/// Maps a glyph name to its Unicode text.
pub trait GlyphNameResolver {
    /// Resolve `name`, or return `None` if it is unknown.
    fn resolve(&self, name: &str) -> Option<String>;
}

impl<F> GlyphNameResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Resolver backed by a built-in subset of the Adobe Glyph List.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdobeGlyphNames;

impl GlyphNameResolver for AdobeGlyphNames {
    fn resolve(&self, name: &str) -> Option<String> {
        // "a.sc" and "one.oldstyle" resolve like their base names.
        let base = name.split('.').next().unwrap_or(name);
        if base.is_empty() {
            return None;
        }
        if base.contains('_') {
            return base
                .split('_')
                .map(glyph_component)
                .collect::<Option<String>>();
        }
        glyph_component(base)
    }
}

/// Resolve one non-ligature component of a glyph name.
fn glyph_component(name: &str) -> Option<String> {
    if let Some(hex) = name.strip_prefix("uni") {
        if !hex.is_empty() && hex.len() % 4 == 0 {
            let units: Option<Vec<u16>> = hex
                .as_bytes()
                .chunks(4)
                .map(|chunk| {
                    std::str::from_utf8(chunk)
                        .ok()
                        .and_then(|s| u16::from_str_radix(s, 16).ok())
                })
                .collect();
            return units.and_then(|u| String::from_utf16(&u).ok());
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) {
            if let Some(ch) = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                return Some(ch.to_string());
            }
        }
    }
    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if ch.is_ascii_alphanumeric() {
            return Some(ch.to_string());
        }
    }
    glyph_name_to_char(name).map(String::from)
}

/// Look up a named glyph in the built-in table.
pub fn glyph_name_to_char(name: &str) -> Option<char> {
    GLYPH_NAMES
        .binary_search_by_key(&name, |&(n, _)| n)
        .ok()
        .map(|i| GLYPH_NAMES[i].1)
}

/// Named glyphs that are not single letters or digits.
/// Sorted by name for binary search.
static GLYPH_NAMES: &[(&str, char)] = &[
    ("AE", '\u{00C6}'),
    ("Eth", '\u{00D0}'),
    ("Euro", '\u{20AC}'),
    ("OE", '\u{0152}'),
    ("Oslash", '\u{00D8}'),
    ("Thorn", '\u{00DE}'),
    ("ae", '\u{00E6}'),
    ("ampersand", '&'),
    ("asciicircum", '^'),
    ("asciitilde", '~'),
    ("asterisk", '*'),
    ("at", '@'),
    ("backslash", '\\'),
    ("bar", '|'),
    ("braceleft", '{'),
    ("braceright", '}'),
    ("bracketleft", '['),
    ("bracketright", ']'),
    ("bullet", '\u{2022}'),
    ("colon", ':'),
    ("comma", ','),
    ("copyright", '\u{00A9}'),
    ("dagger", '\u{2020}'),
    ("daggerdbl", '\u{2021}'),
    ("degree", '\u{00B0}'),
    ("dollar", '$'),
    ("eight", '8'),
    ("ellipsis", '\u{2026}'),
    ("emdash", '\u{2014}'),
    ("endash", '\u{2013}'),
    ("equal", '='),
    ("eth", '\u{00F0}'),
    ("exclam", '!'),
    ("ff", '\u{FB00}'),
    ("ffi", '\u{FB03}'),
    ("ffl", '\u{FB04}'),
    ("fi", '\u{FB01}'),
    ("five", '5'),
    ("fl", '\u{FB02}'),
    ("four", '4'),
    ("germandbls", '\u{00DF}'),
    ("grave", '`'),
    ("greater", '>'),
    ("guillemotleft", '\u{00AB}'),
    ("guillemotright", '\u{00BB}'),
    ("hyphen", '-'),
    ("ideographicspace", '\u{3000}'),
    ("less", '<'),
    ("minus", '\u{2212}'),
    ("nbspace", '\u{00A0}'),
    ("nine", '9'),
    ("numbersign", '#'),
    ("oe", '\u{0153}'),
    ("one", '1'),
    ("oslash", '\u{00F8}'),
    ("parenleft", '('),
    ("parenright", ')'),
    ("percent", '%'),
    ("period", '.'),
    ("periodcentered", '\u{00B7}'),
    ("plus", '+'),
    ("question", '?'),
    ("quotedbl", '"'),
    ("quotedblleft", '\u{201C}'),
    ("quotedblright", '\u{201D}'),
    ("quoteleft", '\u{2018}'),
    ("quoteright", '\u{2019}'),
    ("quotesingle", '\''),
    ("registered", '\u{00AE}'),
    ("section", '\u{00A7}'),
    ("semicolon", ';'),
    ("seven", '7'),
    ("six", '6'),
    ("slash", '/'),
    ("space", ' '),
    ("sterling", '\u{00A3}'),
    ("thorn", '\u{00FE}'),
    ("three", '3'),
    ("trademark", '\u{2122}'),
    ("two", '2'),
    ("underscore", '_'),
    ("yen", '\u{00A5}'),
    ("zero", '0'),
];
