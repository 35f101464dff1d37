//! Codespace ranges and the variable-length code reader.
//!
//! A PDF string shown with a composite font is an un-delimited byte stream.
//! The byte length of each character code is not written anywhere; it is
//! inferred from the codespace ranges a CMap declares. [`CodespaceTable`]
//! holds those ranges, checks at construction that they are prefix-free, and
//! splits byte strings into [`Code`]s.

use std::fmt;

use crate::error::CMapError;

/// A raw character code of up to 4 bytes, accumulated big-endian.
pub type CharCode = u32;

/// Maximum number of bytes in a single character code.
pub const MAX_CODE_BYTES: usize = 4;

/// A declared codespace range: codes of `num_bytes` bytes in `low..=high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Codespace {
    /// Byte length of codes in this range (1..=4).
    pub num_bytes: u8,
    /// Lowest valid code.
    pub low: CharCode,
    /// Highest valid code.
    pub high: CharCode,
}

impl Codespace {
    /// Create a codespace range without validation.
    pub fn new(num_bytes: u8, low: CharCode, high: CharCode) -> Self {
        Self {
            num_bytes,
            low,
            high,
        }
    }

    /// Build a codespace from the two hex-string bounds of a
    /// `begincodespacerange` entry.
    ///
    /// Both bounds must have the same byte length (1..=4) and `low <= high`.
    pub fn from_bounds(low: &[u8], high: &[u8]) -> Result<Self, CMapError> {
        if low.len() != high.len() {
            return Err(CMapError::malformed(format!(
                "codespace bounds differ in length: {} vs {} bytes",
                low.len(),
                high.len()
            )));
        }
        if low.is_empty() || low.len() > MAX_CODE_BYTES {
            return Err(CMapError::malformed(format!(
                "codespace bound must be 1 to 4 bytes, got {}",
                low.len()
            )));
        }
        let range = Self::new(low.len() as u8, bytes_to_code(low), bytes_to_code(high));
        range.validate()?;
        Ok(range)
    }

    /// Check that the byte length is 1..=4, `low <= high`, and `high` fits
    /// in `num_bytes` bytes.
    pub fn validate(&self) -> Result<(), CMapError> {
        if self.num_bytes == 0 || usize::from(self.num_bytes) > MAX_CODE_BYTES {
            return Err(CMapError::malformed(format!(
                "codespace byte length must be 1 to 4, got {}",
                self.num_bytes
            )));
        }
        if self.low > self.high {
            return Err(CMapError::malformed(format!(
                "codespace low bound exceeds high bound: {self}"
            )));
        }
        if u64::from(self.high) >> (8 * u32::from(self.num_bytes)) != 0 {
            return Err(CMapError::malformed(format!(
                "codespace bound {:#X} does not fit in {} bytes",
                self.high, self.num_bytes
            )));
        }
        Ok(())
    }

    /// Whether a code of `len` bytes lies in this range.
    pub fn contains(&self, code: CharCode, len: usize) -> bool {
        usize::from(self.num_bytes) == len && self.low <= code && code <= self.high
    }

    /// Whether the leading bytes of `longer` can also be read as a code of
    /// this (shorter) range.
    fn shares_prefix_with(&self, longer: &Codespace) -> bool {
        let shift = 8 * u32::from(longer.num_bytes - self.num_bytes);
        let low = longer.low >> shift;
        let high = longer.high >> shift;
        low <= self.high && high >= self.low
    }
}

impl fmt::Display for Codespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = usize::from(self.num_bytes) * 2;
        write!(
            f,
            "<{:0width$X}>-<{:0width$X}>",
            self.low,
            self.high,
            width = width
        )
    }
}

/// Accumulate up to 4 bytes big-endian into a [`CharCode`].
pub fn bytes_to_code(bytes: &[u8]) -> CharCode {
    bytes
        .iter()
        .fold(0, |code, &b| (code << 8) | CharCode::from(b))
}

/// One segment of a decoded byte string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Code {
    /// A code that matched a declared codespace.
    Valid {
        /// The accumulated code value.
        value: CharCode,
        /// Number of bytes the code occupied (1..=4).
        len: u8,
    },
    /// A byte that starts no valid code. Reading resumed at the next byte.
    Invalid(u8),
}

impl Code {
    /// The code value, or `None` for an invalid byte.
    pub fn value(&self) -> Option<CharCode> {
        match self {
            Code::Valid { value, .. } => Some(*value),
            Code::Invalid(_) => None,
        }
    }

    /// Number of input bytes this segment consumed.
    pub fn byte_len(&self) -> usize {
        match self {
            Code::Valid { len, .. } => usize::from(*len),
            Code::Invalid(_) => 1,
        }
    }

    /// Whether this segment matched a codespace.
    pub fn is_valid(&self) -> bool {
        matches!(self, Code::Valid { .. })
    }
}

/// Ordered, prefix-free set of codespace ranges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodespaceTable {
    /// Ranges sorted by byte length, declaration order kept within a length.
    ranges: Vec<Codespace>,
    /// Every byte is a complete code (1-byte ranges cover `00..=FF`).
    byte_per_code: bool,
}

impl CodespaceTable {
    /// Build a table, rejecting malformed ranges and ranges that make code
    /// lengths ambiguous.
    pub fn new(mut ranges: Vec<Codespace>) -> Result<Self, CMapError> {
        ranges.sort_by_key(|r| r.num_bytes);
        validate_prefix_free(&ranges)?;
        let byte_per_code = covers_every_byte(&ranges);
        Ok(Self {
            ranges,
            byte_per_code,
        })
    }

    /// A table holding one range `{num_bytes, 0, max}` that accepts every
    /// code of that length.
    pub fn full_range(num_bytes: u8) -> Self {
        let num_bytes = num_bytes.clamp(1, MAX_CODE_BYTES as u8);
        let high = if num_bytes as usize == MAX_CODE_BYTES {
            CharCode::MAX
        } else {
            (1 << (8 * u32::from(num_bytes))) - 1
        };
        Self {
            ranges: vec![Codespace::new(num_bytes, 0, high)],
            byte_per_code: num_bytes == 1,
        }
    }

    /// The declared ranges, shortest first.
    pub fn ranges(&self) -> &[Codespace] {
        &self.ranges
    }

    /// Returns true if no range is declared.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Whether the single-byte fast path applies.
    pub fn is_byte_per_code(&self) -> bool {
        self.byte_per_code
    }

    /// Read one code from the start of `bytes`.
    ///
    /// Returns the code and its byte length, or `None` if no codespace
    /// matches within 4 bytes (or before the input ends).
    pub fn read_code(&self, bytes: &[u8]) -> Option<(CharCode, usize)> {
        if self.byte_per_code {
            return bytes.first().map(|&b| (CharCode::from(b), 1));
        }
        let mut code: CharCode = 0;
        for (i, &b) in bytes.iter().take(MAX_CODE_BYTES).enumerate() {
            code = (code << 8) | CharCode::from(b);
            let len = i + 1;
            if self.ranges.iter().any(|r| r.contains(code, len)) {
                return Some((code, len));
            }
        }
        None
    }

    /// Iterate over the codes in `bytes`.
    pub fn codes<'a>(&'a self, bytes: &'a [u8]) -> Codes<'a> {
        Codes {
            table: self,
            bytes,
            pos: 0,
        }
    }
}

/// Iterator over the [`Code`]s of a byte string. See [`CodespaceTable::codes`].
#[derive(Debug, Clone)]
pub struct Codes<'a> {
    table: &'a CodespaceTable,
    bytes: &'a [u8],
    pos: usize,
}

impl Iterator for Codes<'_> {
    type Item = Code;

    fn next(&mut self) -> Option<Code> {
        let rest = self.bytes.get(self.pos..).filter(|r| !r.is_empty())?;
        match self.table.read_code(rest) {
            Some((value, len)) => {
                self.pos += len;
                Some(Code::Valid {
                    value,
                    len: len as u8,
                })
            }
            None => {
                tracing::debug!(
                    offset = self.pos,
                    byte = rest[0],
                    "no codespace matches, skipping one byte"
                );
                self.pos += 1;
                Some(Code::Invalid(rest[0]))
            }
        }
    }
}

/// Check that every range is well formed and that no code of a shorter range
/// is also the prefix of a code in a longer range. `ranges` must be sorted by
/// byte length.
pub fn validate_prefix_free(ranges: &[Codespace]) -> Result<(), CMapError> {
    for range in ranges {
        range.validate()?;
    }
    for (i, shorter) in ranges.iter().enumerate() {
        for longer in &ranges[i + 1..] {
            if longer.num_bytes > shorter.num_bytes && shorter.shares_prefix_with(longer) {
                return Err(CMapError::AmbiguousCodespace {
                    shorter: *shorter,
                    longer: *longer,
                });
            }
        }
    }
    Ok(())
}

/// Whether the ranges are all 1-byte and jointly cover `0x00..=0xFF`.
fn covers_every_byte(ranges: &[Codespace]) -> bool {
    if ranges.is_empty() || ranges.iter().any(|r| r.num_bytes != 1) {
        return false;
    }
    let mut spans: Vec<(CharCode, CharCode)> = ranges.iter().map(|r| (r.low, r.high)).collect();
    spans.sort_unstable();
    let mut next: CharCode = 0;
    for (low, high) in spans {
        if low > next {
            return false;
        }
        next = next.max(high + 1);
    }
    next > 0xFF
}
