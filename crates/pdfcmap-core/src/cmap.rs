//! The finished, immutable [`CMap`] and the [`CMapBuilder`] that produces it.
//!
//! A CMap is built once, either from an embedded program or from the
//! predefined registry, and is read-only afterwards. `usecmap` inheritance
//! never mutates an ancestor: [`CMap::inherit`] returns a new flattened value.

use crate::cid_range::{Cid, CidRange, CidRangeTable, NOTDEF_CID};
use crate::codespace::{CharCode, Code, Codes, Codespace, CodespaceTable, MAX_CODE_BYTES};
use crate::error::CMapError;
use crate::options::TextOptions;
use crate::system_info::CidSystemInfo;
use crate::to_unicode::CodeToUnicode;

/// A parsed and validated CMap.
#[derive(Debug, Clone, PartialEq)]
pub struct CMap {
    name: String,
    cmap_type: Option<i64>,
    version: Option<f64>,
    wmode: Option<u8>,
    usecmap: Option<String>,
    system_info: Option<CidSystemInfo>,
    /// Codespaces as declared (possibly inherited); may be empty.
    codespaces: CodespaceTable,
    /// Codespaces used for reading codes.
    reader: CodespaceTable,
    /// Widest source code seen in the mapping sections, in bytes.
    max_code_len: u8,
    cid_ranges: CidRangeTable,
    notdef_ranges: CidRangeTable,
    code_to_unicode: CodeToUnicode,
}

impl CMap {
    /// CMap name from `/CMapName` (empty if not declared).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `/CMapType`: 1 for code→CID CMaps, 2 for ToUnicode CMaps.
    pub fn cmap_type(&self) -> Option<i64> {
        self.cmap_type
    }

    /// `/CMapVersion`.
    pub fn version(&self) -> Option<f64> {
        self.version
    }

    /// Writing mode: 0 = horizontal, 1 = vertical.
    pub fn wmode(&self) -> u8 {
        self.wmode.unwrap_or(0)
    }

    /// Whether this CMap selects vertical writing.
    pub fn is_vertical(&self) -> bool {
        self.wmode() == 1
    }

    /// Name of the parent CMap from `usecmap`.
    pub fn usecmap(&self) -> Option<&str> {
        self.usecmap.as_deref()
    }

    /// `/CIDSystemInfo`.
    pub fn system_info(&self) -> Option<&CidSystemInfo> {
        self.system_info.as_ref()
    }

    /// Declared codespace ranges, shortest first.
    pub fn codespaces(&self) -> &[Codespace] {
        self.codespaces.ranges()
    }

    /// Code→CID ranges from `cidrange` and `cidchar`, sorted by code.
    pub fn cid_ranges(&self) -> &[CidRange] {
        self.cid_ranges.ranges()
    }

    /// `.notdef` ranges from `notdefrange` and `notdefchar`.
    pub fn notdef_ranges(&self) -> &[CidRange] {
        self.notdef_ranges.ranges()
    }

    /// Code→Unicode table from `bfchar` and `bfrange`.
    pub fn code_to_unicode(&self) -> &CodeToUnicode {
        &self.code_to_unicode
    }

    /// Whether this is the predefined Identity-H or Identity-V CMap.
    pub fn is_identity(&self) -> bool {
        matches!(self.name.as_str(), "Identity-H" | "Identity-V")
    }

    /// Read the first code of `bytes`, returning it with its byte length.
    pub fn read_code(&self, bytes: &[u8]) -> Option<(CharCode, usize)> {
        self.reader.read_code(bytes)
    }

    /// Iterate over the codes of `bytes`.
    pub fn codes<'a>(&'a self, bytes: &'a [u8]) -> Codes<'a> {
        self.reader.codes(bytes)
    }

    /// Split `bytes` into codes using the codespace ranges.
    ///
    /// Bytes that start no valid code come back as [`Code::Invalid`];
    /// reading resumes at the following byte.
    pub fn read_codes(&self, bytes: &[u8]) -> Vec<Code> {
        self.codes(bytes).collect()
    }

    /// CID for `code`, or `None` if neither a CID range nor a `.notdef`
    /// range covers it.
    pub fn lookup_cid(&self, code: CharCode) -> Option<Cid> {
        self.cid_ranges
            .lookup(code)
            .or_else(|| self.notdef_ranges.lookup(code))
    }

    /// CID for `code`; unmapped codes give CID 0 (`.notdef`).
    pub fn to_cid(&self, code: CharCode) -> Cid {
        self.lookup_cid(code).unwrap_or(NOTDEF_CID)
    }

    /// Unicode text for `code` from the `bfchar`/`bfrange` table.
    pub fn to_unicode(&self, code: CharCode) -> Option<&str> {
        self.code_to_unicode.lookup(code)
    }

    /// Decode `bytes` to text, substituting U+FFFD for invalid or unmapped
    /// codes.
    pub fn charcodes_to_unicode(&self, bytes: &[u8]) -> String {
        self.charcodes_to_unicode_with(bytes, &TextOptions::default())
    }

    /// Decode `bytes` to text using `options` for substitution and
    /// normalization.
    pub fn charcodes_to_unicode_with(&self, bytes: &[u8], options: &TextOptions) -> String {
        let mut text = String::with_capacity(bytes.len());
        for code in self.codes(bytes) {
            match code.value().and_then(|c| self.to_unicode(c)) {
                Some(s) => text.push_str(&options.unicode_norm.normalize(s)),
                None => text.push(options.replacement),
            }
        }
        text
    }

    /// Flatten this CMap over its `usecmap` parent.
    ///
    /// Non-empty codespaces, CID ranges, `.notdef` ranges, Unicode table and
    /// system info of `self` replace the parent's; empty ones are inherited.
    /// Name, type and `usecmap` always come from `self`; version and writing
    /// mode come from `self` when declared.
    pub fn inherit(&self, parent: &CMap) -> CMap {
        fn pick<T: Clone>(own: &T, inherited: &T, own_empty: bool) -> T {
            if own_empty { inherited.clone() } else { own.clone() }
        }

        let codespaces = pick(&self.codespaces, &parent.codespaces, self.codespaces.is_empty());
        let max_code_len = self.max_code_len.max(parent.max_code_len);
        CMap {
            name: self.name.clone(),
            cmap_type: self.cmap_type,
            version: self.version.or(parent.version),
            wmode: self.wmode.or(parent.wmode),
            usecmap: self.usecmap.clone(),
            system_info: self
                .system_info
                .clone()
                .or_else(|| parent.system_info.clone()),
            reader: reader_for(&codespaces, max_code_len),
            codespaces,
            max_code_len,
            cid_ranges: pick(&self.cid_ranges, &parent.cid_ranges, self.cid_ranges.is_empty()),
            notdef_ranges: pick(
                &self.notdef_ranges,
                &parent.notdef_ranges,
                self.notdef_ranges.is_empty(),
            ),
            code_to_unicode: pick(
                &self.code_to_unicode,
                &parent.code_to_unicode,
                self.code_to_unicode.is_empty(),
            ),
        }
    }
}

/// The declared codespaces, or one full-range codespace as wide as the
/// widest mapped code when none are declared.
fn reader_for(codespaces: &CodespaceTable, max_code_len: u8) -> CodespaceTable {
    if codespaces.is_empty() {
        CodespaceTable::full_range(max_code_len.max(1))
    } else {
        codespaces.clone()
    }
}

/// Accumulates the pieces of a CMap while its program is parsed.
#[derive(Debug, Clone)]
pub struct CMapBuilder {
    name: String,
    cmap_type: Option<i64>,
    version: Option<f64>,
    wmode: Option<u8>,
    usecmap: Option<String>,
    system_info: Option<CidSystemInfo>,
    codespaces: Vec<Codespace>,
    max_code_len: u8,
    cid_ranges: CidRangeTable,
    notdef_ranges: CidRangeTable,
    code_to_unicode: CodeToUnicode,
}

impl Default for CMapBuilder {
    fn default() -> Self {
        Self {
            name: String::new(),
            cmap_type: None,
            version: None,
            wmode: None,
            usecmap: None,
            system_info: None,
            codespaces: Vec::new(),
            max_code_len: 0,
            cid_ranges: CidRangeTable::new(),
            notdef_ranges: CidRangeTable::notdef(),
            code_to_unicode: CodeToUnicode::new(),
        }
    }
}

impl CMapBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `/CMapName`.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Set `/CMapType`.
    pub fn set_cmap_type(&mut self, cmap_type: i64) {
        self.cmap_type = Some(cmap_type);
    }

    /// Set `/CMapVersion`.
    pub fn set_version(&mut self, version: f64) {
        self.version = Some(version);
    }

    /// Set `/WMode`.
    pub fn set_wmode(&mut self, wmode: u8) {
        self.wmode = Some(wmode);
    }

    /// Record the `usecmap` parent name.
    pub fn set_usecmap(&mut self, name: impl Into<String>) {
        self.usecmap = Some(name.into());
    }

    /// Set `/CIDSystemInfo`.
    pub fn set_system_info(&mut self, info: CidSystemInfo) {
        self.system_info = Some(info);
    }

    /// Add a codespace range. Ambiguity is checked by [`CMapBuilder::build`].
    pub fn add_codespace(&mut self, codespace: Codespace) {
        self.codespaces.push(codespace);
    }

    /// Add a code→CID range; later ranges override earlier ones.
    pub fn add_cid_range(&mut self, range: CidRange) {
        self.cid_ranges.insert(range);
    }

    /// Add a `.notdef` range.
    pub fn add_notdef_range(&mut self, range: CidRange) {
        self.notdef_ranges.insert(range);
    }

    /// The code→Unicode table under construction.
    pub fn code_to_unicode_mut(&mut self) -> &mut CodeToUnicode {
        &mut self.code_to_unicode
    }

    /// Record the byte length of a source code seen in a mapping section.
    pub fn note_code_len(&mut self, len: usize) {
        let len = len.min(MAX_CODE_BYTES) as u8;
        self.max_code_len = self.max_code_len.max(len);
    }

    /// Name of the `usecmap` parent, if one was declared.
    pub fn usecmap(&self) -> Option<&str> {
        self.usecmap.as_deref()
    }

    /// Validate and freeze the CMap.
    ///
    /// # Errors
    ///
    /// Returns [`CMapError::Malformed`] for a codespace with a byte length
    /// outside 1..=4, inverted bounds, or a bound wider than its byte length,
    /// and [`CMapError::AmbiguousCodespace`] if the codespaces are not
    /// prefix-free.
    pub fn build(self) -> Result<CMap, CMapError> {
        let codespaces = CodespaceTable::new(self.codespaces)?;
        Ok(CMap {
            reader: reader_for(&codespaces, self.max_code_len),
            name: self.name,
            cmap_type: self.cmap_type,
            version: self.version,
            wmode: self.wmode,
            usecmap: self.usecmap,
            system_info: self.system_info,
            codespaces,
            max_code_len: self.max_code_len,
            cid_ranges: self.cid_ranges,
            notdef_ranges: self.notdef_ranges,
            code_to_unicode: self.code_to_unicode,
        })
    }
}
