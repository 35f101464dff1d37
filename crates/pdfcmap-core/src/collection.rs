//! CID→Unicode fallback tables for the Adobe character collections.
//!
//! When a composite font has no `/ToUnicode` stream, text can still be
//! recovered on a best-effort basis from its CIDs if the font's
//! CIDSystemInfo names a known collection. The tables here are
//! range-compressed and cover the commonly used part of each collection
//! (Roman, punctuation, kana, bopomofo), not every CID.
//!
//! `Adobe-Identity` has an intentionally empty table: Identity CIDs carry no
//! collection meaning.

use crate::cid_range::Cid;
use crate::system_info::CidSystemInfo;

/// A run of consecutive CIDs mapped to consecutive Unicode scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CidSpan {
    first_cid: Cid,
    last_cid: Cid,
    first_unicode: u32,
}

const fn span(first_cid: Cid, last_cid: Cid, first_unicode: u32) -> CidSpan {
    CidSpan {
        first_cid,
        last_cid,
        first_unicode,
    }
}

/// Read-only CID→Unicode table for one character collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CidToUnicode {
    registry: &'static str,
    ordering: &'static str,
    spans: &'static [CidSpan],
}

impl CidToUnicode {
    /// Registry of the collection this table serves.
    pub fn registry(&self) -> &'static str {
        self.registry
    }

    /// Ordering of the collection this table serves.
    pub fn ordering(&self) -> &'static str {
        self.ordering
    }

    /// Look up the Unicode character for `cid`.
    pub fn lookup(&self, cid: Cid) -> Option<char> {
        let idx = self.spans.partition_point(|s| s.last_cid < cid);
        let span = self.spans.get(idx)?;
        if cid < span.first_cid {
            return None;
        }
        char::from_u32(span.first_unicode + (cid - span.first_cid))
    }

    /// Returns true if the table maps no CID.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Fallback table for a collection, by registry and ordering.
///
/// Returns `None` for collections without a table.
pub fn cid_to_unicode(registry: &str, ordering: &str) -> Option<&'static CidToUnicode> {
    TABLES
        .iter()
        .find(|t| t.registry == registry && t.ordering == ordering)
}

/// Fallback table for the collection named by `info`.
pub fn cid_to_unicode_for(info: &CidSystemInfo) -> Option<&'static CidToUnicode> {
    cid_to_unicode(&info.registry, &info.ordering)
}

static TABLES: &[CidToUnicode] = &[
    CidToUnicode {
        registry: "Adobe",
        ordering: "Japan1",
        spans: ADOBE_JAPAN1,
    },
    CidToUnicode {
        registry: "Adobe",
        ordering: "GB1",
        spans: ADOBE_GB1,
    },
    CidToUnicode {
        registry: "Adobe",
        ordering: "CNS1",
        spans: ADOBE_CNS1,
    },
    CidToUnicode {
        registry: "Adobe",
        ordering: "Korea1",
        spans: ADOBE_KOREA1,
    },
    CidToUnicode {
        registry: "Adobe",
        ordering: "Identity",
        spans: &[],
    },
    CidToUnicode {
        registry: "Adobe",
        ordering: "UCS",
        spans: ADOBE_UCS,
    },
];

// Spans are sorted by CID and must not overlap.

static ADOBE_JAPAN1: &[CidSpan] = &[
    span(1, 95, 0x0020),
    span(96, 96, 0x00A5),
    span(97, 97, 0x203E),
    span(98, 99, 0x3001),
    span(100, 100, 0xFF0C),
    span(101, 101, 0xFF0E),
    span(327, 389, 0xFF61),
    span(633, 633, 0x3000),
    span(842, 924, 0x3041),
    span(925, 1010, 0x30A1),
];

static ADOBE_GB1: &[CidSpan] = &[
    span(1, 95, 0x0020),
    span(97, 97, 0x203E),
    span(98, 99, 0x3001),
    span(814, 814, 0x3000),
];

static ADOBE_CNS1: &[CidSpan] = &[
    span(1, 95, 0x0020),
    span(97, 97, 0x203E),
    span(98, 99, 0x3001),
    span(100, 100, 0xFF0C),
    span(101, 101, 0xFF0E),
    span(601, 601, 0x3000),
    span(800, 836, 0x3105),
];

static ADOBE_KOREA1: &[CidSpan] = &[span(1, 95, 0x0020)];

static ADOBE_UCS: &[CidSpan] = &[span(0, 0x10FFFF, 0)];
