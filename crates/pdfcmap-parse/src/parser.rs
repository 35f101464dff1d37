//! CMap program parser.
//!
//! Reads the PostScript subset used by CMap files and `/ToUnicode` streams:
//! scalar declarations (`/CMapName`, `/CMapType`, `/CMapVersion`, `/WMode`,
//! `/CIDSystemInfo`), `usecmap`, and the mapping sections
//! (`codespacerange`, `bfchar`, `bfrange`, `cidchar`, `cidrange`,
//! `notdefchar`, `notdefrange`). Everything else in the program (resource
//! bookkeeping such as `findresource`, `defineresource`, `begincmap`) is
//! skipped.
//!
//! Any grammar violation inside a section fails the whole load; a CMap is
//! never returned partially populated.

use std::fmt;

use pdfcmap_core::{
    AdobeGlyphNames, CMap, CMapBuilder, CMapError, CMapOptions, CharCode, CidRange,
    CidSystemInfo, Codespace, GlyphNameResolver, MAX_CODE_BYTES, bytes_to_code, decode_utf16be,
};

use crate::inherit::{CMapSource, resolve_usecmap};
use crate::predefined::Registry;
use crate::tokenizer::{Lexer, Token};

/// Configurable CMap program parser.
pub struct CMapParser {
    options: CMapOptions,
    glyph_names: Box<dyn GlyphNameResolver + Send + Sync>,
}

impl fmt::Debug for CMapParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CMapParser")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for CMapParser {
    fn default() -> Self {
        Self {
            options: CMapOptions::default(),
            glyph_names: Box::new(AdobeGlyphNames),
        }
    }
}

impl CMapParser {
    /// Create a parser with default limits and the built-in glyph-name table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the resource limits.
    pub fn with_options(mut self, options: CMapOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the resolver used for `bfchar` entries with glyph-name targets.
    pub fn with_glyph_names(mut self, resolver: impl GlyphNameResolver + Send + Sync + 'static) -> Self {
        self.glyph_names = Box::new(resolver);
        self
    }

    /// The resource limits in effect.
    pub fn options(&self) -> &CMapOptions {
        &self.options
    }

    /// Parse a single CMap program without resolving `usecmap`.
    ///
    /// The returned CMap reports its parent through [`CMap::usecmap`] but
    /// carries only the mappings declared in `data`.
    ///
    /// # Errors
    ///
    /// Returns [`CMapError::Malformed`] for grammar violations,
    /// [`CMapError::AmbiguousCodespace`] for codespaces that are not
    /// prefix-free, and [`CMapError::ResourceLimitExceeded`] when a limit in
    /// [`CMapOptions`] is exceeded.
    pub fn parse(&self, data: &[u8]) -> Result<CMap, CMapError> {
        CMapOptions::check_limit(
            "max_program_bytes",
            self.options.max_program_bytes,
            data.len(),
        )?;
        let mut program = Program {
            lexer: Lexer::new(data),
            builder: CMapBuilder::new(),
            parser: self,
            prev: None,
            prev2: None,
        };
        program.run()?;
        program.builder.build()
    }

    /// Parse a CMap program and flatten it over its `usecmap` ancestors from
    /// the predefined registry.
    pub fn load(&self, data: &[u8]) -> Result<CMap, CMapError> {
        self.load_with(data, Registry::global())
    }

    /// Parse a CMap program and flatten it over ancestors found in `source`.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`CMapParser::parse`], returns
    /// [`CMapError::UnknownPredefined`] for a missing ancestor and
    /// [`CMapError::CircularInheritance`] for a `usecmap` cycle.
    pub fn load_with(&self, data: &[u8], source: &dyn CMapSource) -> Result<CMap, CMapError> {
        let cmap = self.parse(data)?;
        resolve_usecmap(cmap, source)
    }
}

/// Parse an embedded CMap program with default options, resolving `usecmap`
/// against the predefined registry.
pub fn parse_cmap(data: &[u8]) -> Result<CMap, CMapError> {
    CMapParser::default().load(data)
}

/// State for one pass over a program.
struct Program<'a, 'p> {
    lexer: Lexer<'a>,
    builder: CMapBuilder,
    parser: &'p CMapParser,
    /// The two most recent top-level tokens, for `/Key value def` and
    /// `/Parent usecmap`.
    prev: Option<Token>,
    prev2: Option<Token>,
}

impl Program<'_, '_> {
    fn run(&mut self) -> Result<(), CMapError> {
        while let Some(tok) = self.lexer.next_token()? {
            match &tok {
                Token::Keyword(kw) => match kw.as_str() {
                    "begincodespacerange" => self.codespace_section()?,
                    "beginbfchar" => self.bfchar_section()?,
                    "beginbfrange" => self.bfrange_section()?,
                    "begincidchar" => self.cid_char_section("endcidchar", false)?,
                    "begincidrange" => self.cid_range_section("endcidrange", false)?,
                    "beginnotdefchar" => self.cid_char_section("endnotdefchar", true)?,
                    "beginnotdefrange" => self.cid_range_section("endnotdefrange", true)?,
                    "usecmap" => self.usecmap()?,
                    "def" => self.def(),
                    _ => {}
                },
                Token::Name(name) if name == "CIDSystemInfo" => {
                    if let Some(info) = self.system_info()? {
                        self.builder.set_system_info(info);
                        self.prev = None;
                        self.prev2 = None;
                        continue;
                    }
                }
                _ => {}
            }
            self.prev2 = self.prev.replace(tok);
        }
        Ok(())
    }

    /// `/Parent usecmap`: the name just before the keyword is the parent.
    fn usecmap(&mut self) -> Result<(), CMapError> {
        match &self.prev {
            Some(Token::Name(parent)) => {
                self.builder.set_usecmap(parent.clone());
                Ok(())
            }
            Some(other) => Err(CMapError::malformed(format!(
                "usecmap expects a CMap name, found {}",
                other.describe()
            ))),
            None => Err(CMapError::malformed("usecmap without a CMap name")),
        }
    }

    /// `/Key value def` for the scalar declarations.
    fn def(&mut self) {
        let (Some(Token::Name(key)), Some(value)) = (&self.prev2, &self.prev) else {
            return;
        };
        match (key.as_str(), value) {
            ("CMapName", Token::Name(name)) => self.builder.set_name(name.clone()),
            ("CMapName", Token::LiteralString(name)) => {
                self.builder.set_name(String::from_utf8_lossy(name));
            }
            ("CMapType", Token::Integer(t)) => self.builder.set_cmap_type(*t),
            ("CMapVersion", Token::Integer(v)) => self.builder.set_version(*v as f64),
            ("CMapVersion", Token::Real(v)) => self.builder.set_version(*v),
            ("WMode", Token::Integer(w @ (0 | 1))) => self.builder.set_wmode(*w as u8),
            ("WMode", other) => {
                tracing::debug!(value = %other.describe(), "ignoring invalid /WMode");
            }
            _ => {}
        }
    }

    /// Read the value following a `/CIDSystemInfo` name.
    ///
    /// Accepts a dictionary, an array whose first element is a dictionary,
    /// or the `N dict dup begin /Key value def ... end` form. Returns `None`
    /// without consuming anything if the next token is none of these.
    fn system_info(&mut self) -> Result<Option<CidSystemInfo>, CMapError> {
        let (literal, dict_block) = match self.lexer.peek_token()? {
            Some(Token::Dictionary(_) | Token::Array(_)) => (true, false),
            Some(Token::Integer(_)) => (false, true),
            _ => (false, false),
        };
        let entries = if literal {
            match self.lexer.next_token()? {
                Some(Token::Dictionary(entries)) => entries,
                Some(Token::Array(items)) => match items.into_iter().next() {
                    Some(Token::Dictionary(entries)) => entries,
                    _ => return Ok(None),
                },
                _ => return Ok(None),
            }
        } else if dict_block {
            self.dict_block()?
        } else {
            return Ok(None);
        };
        Ok(Some(system_info_from_entries(&entries)))
    }

    /// Read `N dict dup begin /Key value def ... end` into key/value pairs.
    fn dict_block(&mut self) -> Result<Vec<(String, Token)>, CMapError> {
        loop {
            match self.lexer.next_token()? {
                Some(tok) if tok.is_keyword("begin") => break,
                Some(Token::Integer(_)) => {}
                Some(tok) if tok.is_keyword("dict") || tok.is_keyword("dup") => {}
                Some(other) => {
                    return Err(CMapError::malformed(format!(
                        "unexpected {} in CIDSystemInfo dict",
                        other.describe()
                    )));
                }
                None => return Err(CMapError::malformed("unterminated CIDSystemInfo dict")),
            }
        }

        let mut entries = Vec::new();
        loop {
            let key = match self.lexer.next_token()? {
                Some(tok) if tok.is_keyword("end") => return Ok(entries),
                Some(Token::Name(key)) => key,
                Some(other) => {
                    return Err(CMapError::malformed(format!(
                        "expected CIDSystemInfo key, found {}",
                        other.describe()
                    )));
                }
                None => return Err(CMapError::malformed("unterminated CIDSystemInfo dict")),
            };
            let value = self.expect_value("CIDSystemInfo")?;
            match self.lexer.next_token()? {
                Some(tok) if tok.is_keyword("def") => entries.push((key, value)),
                _ => {
                    return Err(CMapError::malformed(format!(
                        "CIDSystemInfo entry /{key} is not followed by def"
                    )));
                }
            }
        }
    }

    /// Next token of a section group; end of input mid-group is malformed.
    fn expect_value(&mut self, section: &str) -> Result<Token, CMapError> {
        self.lexer
            .next_token()?
            .ok_or_else(|| CMapError::malformed(format!("incomplete {section} entry")))
    }

    /// First token of a group, or `None` at the `end` keyword or end of
    /// input.
    fn group_start(&mut self, end: &str) -> Result<Option<Token>, CMapError> {
        match self.lexer.next_token()? {
            Some(tok) if tok.is_keyword(end) => Ok(None),
            other => Ok(other),
        }
    }

    fn codespace_section(&mut self) -> Result<(), CMapError> {
        while let Some(first) = self.group_start("endcodespacerange")? {
            let low = hex_operand(first, "codespacerange")?;
            let high = hex_operand(self.expect_value("codespacerange")?, "codespacerange")?;
            self.builder.add_codespace(Codespace::from_bounds(&low, &high)?);
        }
        Ok(())
    }

    fn bfchar_section(&mut self) -> Result<(), CMapError> {
        while let Some(first) = self.group_start("endbfchar")? {
            let code = self.source_code(first, "bfchar")?;
            match self.expect_value("bfchar")? {
                Token::HexString(target) => {
                    self.builder.code_to_unicode_mut().insert_utf16be(code, &target)?;
                }
                Token::Name(glyph) => match self.parser.glyph_names.resolve(&glyph) {
                    Some(text) => self.builder.code_to_unicode_mut().insert(code, text),
                    None => {
                        tracing::debug!(code, glyph = %glyph, "skipping unresolvable glyph name");
                    }
                },
                other => {
                    return Err(CMapError::malformed(format!(
                        "bfchar target must be a hex string or name, found {}",
                        other.describe()
                    )));
                }
            }
        }
        Ok(())
    }

    fn bfrange_section(&mut self) -> Result<(), CMapError> {
        while let Some(first) = self.group_start("endbfrange")? {
            let from = self.source_code(first, "bfrange")?;
            let second = self.expect_value("bfrange")?;
            let to = self.source_code(second, "bfrange")?;
            if from > to {
                return Err(CMapError::malformed(format!(
                    "bfrange start <{from:X}> is above its end <{to:X}>"
                )));
            }
            match self.expect_value("bfrange")? {
                Token::HexString(target) => {
                    let span = (to - from) as usize + 1;
                    CMapOptions::check_limit(
                        "max_bfrange_codes",
                        self.parser.options.max_bfrange_codes,
                        span,
                    )?;
                    self.builder
                        .code_to_unicode_mut()
                        .insert_range(from, to, &target)?;
                }
                Token::Array(items) => {
                    let targets = items
                        .into_iter()
                        .map(|item| self.array_target(item))
                        .collect::<Result<Vec<_>, _>>()?;
                    self.builder
                        .code_to_unicode_mut()
                        .insert_range_array(from, to, targets)?;
                }
                other => {
                    return Err(CMapError::malformed(format!(
                        "bfrange target must be a hex string or array, found {}",
                        other.describe()
                    )));
                }
            }
        }
        Ok(())
    }

    /// One element of a `bfrange` array target.
    fn array_target(&self, item: Token) -> Result<String, CMapError> {
        match item {
            Token::HexString(target) => decode_utf16be(&target),
            Token::Name(glyph) => Ok(self.parser.glyph_names.resolve(&glyph).unwrap_or_else(|| {
                tracing::debug!(glyph = %glyph, "unresolvable glyph name in bfrange array");
                String::from('\u{FFFD}')
            })),
            other => Err(CMapError::malformed(format!(
                "bfrange array element must be a hex string, found {}",
                other.describe()
            ))),
        }
    }

    /// `<code> cid` pairs for `cidchar` and `notdefchar`.
    fn cid_char_section(&mut self, end: &str, notdef: bool) -> Result<(), CMapError> {
        let section = &end[3..];
        while let Some(first) = self.group_start(end)? {
            let code = self.source_code(first, section)?;
            let cid = cid_operand(self.expect_value(section)?, section)?;
            self.add_cid_range(CidRange::new(code, code, cid), notdef);
        }
        Ok(())
    }

    /// `<from> <to> cid` triples for `cidrange` and `notdefrange`.
    fn cid_range_section(&mut self, end: &str, notdef: bool) -> Result<(), CMapError> {
        let section = &end[3..];
        while let Some(first) = self.group_start(end)? {
            let from = self.source_code(first, section)?;
            let second = self.expect_value(section)?;
            let to = self.source_code(second, section)?;
            let cid = cid_operand(self.expect_value(section)?, section)?;
            if from > to {
                return Err(CMapError::malformed(format!(
                    "{section} start <{from:X}> is above its end <{to:X}>"
                )));
            }
            self.add_cid_range(CidRange::new(from, to, cid), notdef);
        }
        Ok(())
    }

    fn add_cid_range(&mut self, range: CidRange, notdef: bool) {
        if notdef {
            self.builder.add_notdef_range(range);
        } else {
            self.builder.add_cid_range(range);
        }
    }

    /// A source code operand: a 1..=4 byte hex string.
    fn source_code(&mut self, tok: Token, section: &str) -> Result<CharCode, CMapError> {
        let bytes = hex_operand(tok, section)?;
        if bytes.is_empty() || bytes.len() > MAX_CODE_BYTES {
            return Err(CMapError::malformed(format!(
                "{section} source code must be 1 to 4 bytes, got {}",
                bytes.len()
            )));
        }
        self.builder.note_code_len(bytes.len());
        Ok(bytes_to_code(&bytes))
    }
}

fn hex_operand(tok: Token, section: &str) -> Result<Vec<u8>, CMapError> {
    match tok {
        Token::HexString(bytes) => Ok(bytes),
        other => Err(CMapError::malformed(format!(
            "{section} expects a hex string, found {}",
            other.describe()
        ))),
    }
}

fn cid_operand(tok: Token, section: &str) -> Result<u32, CMapError> {
    match tok {
        Token::Integer(cid) => u32::try_from(cid)
            .map_err(|_| CMapError::malformed(format!("{section} CID out of range: {cid}"))),
        other => Err(CMapError::malformed(format!(
            "{section} expects an integer CID, found {}",
            other.describe()
        ))),
    }
}

fn system_info_from_entries(entries: &[(String, Token)]) -> CidSystemInfo {
    let text = |key: &str| {
        entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| match v {
                Token::LiteralString(s) | Token::HexString(s) => {
                    Some(String::from_utf8_lossy(s).into_owned())
                }
                Token::Name(n) => Some(n.clone()),
                _ => None,
            })
            .unwrap_or_default()
    };
    let supplement = entries
        .iter()
        .find(|(k, _)| k == "Supplement")
        .and_then(|(_, v)| match v {
            Token::Integer(i) => Some(*i),
            _ => None,
        })
        .unwrap_or(0);
    CidSystemInfo::new(text("Registry"), text("Ordering"), supplement)
}
