//! Code-to-Unicode table built from `bfchar` and `bfrange` sections.
//!
//! Targets are UTF-16BE strings. A single code may map to several code
//! points (ligatures such as `fi` → "fi"), and to surrogate pairs for
//! characters outside the BMP.

use std::collections::HashMap;

use crate::codespace::CharCode;
use crate::error::CMapError;

/// Mapping from character code to Unicode string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeToUnicode {
    map: HashMap<CharCode, String>,
}

impl CodeToUnicode {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `code` to `text`, replacing any earlier mapping.
    pub fn insert(&mut self, code: CharCode, text: impl Into<String>) {
        self.map.insert(code, text.into());
    }

    /// Map `code` to the UTF-16BE string in `target` (a `bfchar` entry).
    pub fn insert_utf16be(&mut self, code: CharCode, target: &[u8]) -> Result<(), CMapError> {
        let units = utf16be_units(target)?;
        self.insert(code, String::from_utf16_lossy(&units));
        Ok(())
    }

    /// Map `from..=to` starting at the UTF-16BE string `target`.
    ///
    /// Each step increments only the last UTF-16 code unit of `target`. The
    /// unit wraps within 16 bits and never carries into the preceding units.
    pub fn insert_range(
        &mut self,
        from: CharCode,
        to: CharCode,
        target: &[u8],
    ) -> Result<(), CMapError> {
        check_range_order(from, to)?;
        let mut units = utf16be_units(target)?;
        let last = units.len() - 1;
        let base = units[last];
        for (offset, code) in (from..=to).enumerate() {
            units[last] = base.wrapping_add(offset as u16);
            self.map.insert(code, String::from_utf16_lossy(&units));
        }
        Ok(())
    }

    /// Map `from..=to` onto one explicit string per code.
    ///
    /// `targets` must hold exactly `to - from + 1` strings.
    pub fn insert_range_array(
        &mut self,
        from: CharCode,
        to: CharCode,
        targets: Vec<String>,
    ) -> Result<(), CMapError> {
        check_range_order(from, to)?;
        let expected = u64::from(to - from) + 1;
        if targets.len() as u64 != expected {
            return Err(CMapError::malformed(format!(
                "bfrange <{from:X}> <{to:X}> covers {expected} codes but its array has {} entries",
                targets.len()
            )));
        }
        for (code, text) in (from..=to).zip(targets) {
            self.map.insert(code, text);
        }
        Ok(())
    }

    /// Look up the Unicode string for `code`.
    pub fn lookup(&self, code: CharCode) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }

    /// Number of mapped codes.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if no code is mapped.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over `(code, text)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (CharCode, &str)> {
        self.map.iter().map(|(&code, text)| (code, text.as_str()))
    }
}

fn check_range_order(from: CharCode, to: CharCode) -> Result<(), CMapError> {
    if from > to {
        return Err(CMapError::malformed(format!(
            "bfrange start <{from:X}> is above its end <{to:X}>"
        )));
    }
    Ok(())
}

/// Split a UTF-16BE target into code units.
///
/// A 1-byte target is widened to a single unit (`<41>` is "A"); other odd
/// lengths and empty targets are malformed.
pub fn utf16be_units(bytes: &[u8]) -> Result<Vec<u16>, CMapError> {
    match bytes.len() {
        0 => Err(CMapError::malformed("empty Unicode target")),
        1 => Ok(vec![u16::from(bytes[0])]),
        n if n % 2 != 0 => Err(CMapError::malformed(format!(
            "UTF-16BE target must have an even byte length, got {n}"
        ))),
        _ => Ok(bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect()),
    }
}

/// Decode UTF-16BE bytes to a string, replacing unpaired surrogates.
pub fn decode_utf16be(bytes: &[u8]) -> Result<String, CMapError> {
    utf16be_units(bytes).map(|units| String::from_utf16_lossy(&units))
}
