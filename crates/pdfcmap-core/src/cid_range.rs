//! Code-to-CID range tables (`cidrange` / `cidchar` / `notdefrange`).

use crate::codespace::CharCode;

/// Character identifier within a character collection. CID 0 is `.notdef`.
pub type Cid = u32;

/// CID returned for codes that no range maps.
pub const NOTDEF_CID: Cid = 0;

/// A contiguous code interval mapped onto a contiguous CID interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CidRange {
    /// First code of the interval.
    pub from: CharCode,
    /// Last code of the interval (inclusive).
    pub to: CharCode,
    /// CID of `from`; later codes map to consecutive CIDs.
    pub cid: Cid,
}

impl CidRange {
    /// Create a range mapping `from..=to` onto `cid..`.
    pub fn new(from: CharCode, to: CharCode, cid: Cid) -> Self {
        Self { from, to, cid }
    }

    /// Whether `code` falls in this range.
    pub fn contains(&self, code: CharCode) -> bool {
        self.from <= code && code <= self.to
    }

    /// CID for `code`, or `None` if the code is outside the range or the CID
    /// would overflow.
    pub fn cid_for(&self, code: CharCode) -> Option<Cid> {
        if !self.contains(code) {
            return None;
        }
        self.cid.checked_add(code - self.from)
    }
}

/// Sorted, non-overlapping list of [`CidRange`]s.
///
/// Ranges are inserted in declaration order. Where a new range overlaps
/// existing ones, the new range wins and the older ranges are trimmed, so a
/// `cidchar` after a covering `cidrange` overrides that single code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CidRangeTable {
    ranges: Vec<CidRange>,
    /// Every code of a range selects the range's CID (`.notdef` ranges).
    single_cid: bool,
}

impl CidRangeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table of `.notdef` ranges, where every code of a
    /// range maps to the range's one CID.
    pub fn notdef() -> Self {
        Self {
            ranges: Vec::new(),
            single_cid: true,
        }
    }

    /// Insert a range, trimming any older ranges it overlaps.
    ///
    /// Ranges with `from > to` are ignored.
    pub fn insert(&mut self, range: CidRange) {
        if range.from > range.to {
            return;
        }
        let start = self.ranges.partition_point(|r| r.to < range.from);
        let end = self.ranges.partition_point(|r| r.from <= range.to);
        if start == end {
            self.ranges.insert(start, range);
            return;
        }

        let mut pieces = Vec::with_capacity(3);
        let first = self.ranges[start];
        if first.from < range.from {
            pieces.push(CidRange::new(first.from, range.from - 1, first.cid));
        }
        pieces.push(range);
        let last = self.ranges[end - 1];
        if last.to > range.to {
            let cid = if self.single_cid {
                last.cid
            } else {
                last.cid.saturating_add(range.to + 1 - last.from)
            };
            pieces.push(CidRange::new(range.to + 1, last.to, cid));
        }
        self.ranges.splice(start..end, pieces);
    }

    /// Look up the CID for `code`.
    pub fn lookup(&self, code: CharCode) -> Option<Cid> {
        let idx = self.ranges.partition_point(|r| r.to < code);
        let range = self.ranges.get(idx)?;
        if self.single_cid {
            range.contains(code).then_some(range.cid)
        } else {
            range.cid_for(code)
        }
    }

    /// The ranges, sorted by first code.
    pub fn ranges(&self) -> &[CidRange] {
        &self.ranges
    }

    /// Number of ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Returns true if no range is present.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl FromIterator<CidRange> for CidRangeTable {
    fn from_iter<I: IntoIterator<Item = CidRange>>(iter: I) -> Self {
        let mut table = Self::new();
        for range in iter {
            table.insert(range);
        }
        table
    }
}
