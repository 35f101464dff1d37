//! PostScript-subset tokenizer for CMap programs.
//!
//! Splits raw CMap program bytes into [`Token`]s. Arrays and dictionaries
//! are read eagerly into nested tokens; everything else (including the
//! `begin…`/`end…` section keywords) comes out one token at a time so the
//! parser can dispatch on keywords as it meets them.

use pdfcmap_core::CMapError;

/// Deepest array/dictionary nesting accepted.
const MAX_NESTING: usize = 32;

/// A CMap program token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Integer number (e.g., `42`, `-7`).
    Integer(i64),
    /// Real number (e.g., `10.003`, `.5`).
    Real(f64),
    /// Name object (e.g., `/CMapName`). Stored without the leading `/`.
    Name(String),
    /// Literal string delimited by parentheses, stored as raw bytes.
    LiteralString(Vec<u8>),
    /// Hexadecimal string delimited by angle brackets, stored as decoded bytes.
    HexString(Vec<u8>),
    /// Array of tokens (e.g., `[<0041> <0042>]`).
    Array(Vec<Token>),
    /// Dictionary (`<< /Key value ... >>`).
    Dictionary(Vec<(String, Token)>),
    /// Boolean value (`true` or `false`).
    Boolean(bool),
    /// The null object.
    Null,
    /// Any other bare word: an operator such as `def`, `usecmap` or
    /// `beginbfchar`.
    Keyword(String),
}

impl Token {
    /// Whether this token is the keyword `kw`.
    pub fn is_keyword(&self, kw: &str) -> bool {
        matches!(self, Token::Keyword(k) if k == kw)
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Integer(i) => format!("integer {i}"),
            Token::Real(r) => format!("real {r}"),
            Token::Name(n) => format!("name /{n}"),
            Token::LiteralString(_) => "literal string".to_string(),
            Token::HexString(_) => "hex string".to_string(),
            Token::Array(_) => "array".to_string(),
            Token::Dictionary(_) => "dictionary".to_string(),
            Token::Boolean(b) => format!("boolean {b}"),
            Token::Null => "null".to_string(),
            Token::Keyword(k) => format!("keyword {k}"),
        }
    }
}

/// Pull-based tokenizer over a CMap program with one token of lookahead.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    peeked: Option<Token>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer positioned at the start of `input`.
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            peeked: None,
        }
    }

    /// Byte offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Read the next token, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`CMapError::Malformed`] for unterminated strings, arrays or
    /// dictionaries, bad hex digits, odd-length hex strings, and stray
    /// closing delimiters.
    pub fn next_token(&mut self) -> Result<Option<Token>, CMapError> {
        if let Some(tok) = self.peeked.take() {
            return Ok(Some(tok));
        }
        read_token(self.input, &mut self.pos)
    }

    /// Look at the next token without consuming it.
    pub fn peek_token(&mut self) -> Result<Option<&Token>, CMapError> {
        if self.peeked.is_none() {
            self.peeked = read_token(self.input, &mut self.pos)?;
        }
        Ok(self.peeked.as_ref())
    }
}

/// Tokenize a whole CMap program.
pub fn tokenize(input: &[u8]) -> Result<Vec<Token>, CMapError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    while let Some(tok) = lexer.next_token()? {
        tokens.push(tok);
    }
    Ok(tokens)
}

/// Read one top-level token.
fn read_token(input: &[u8], pos: &mut usize) -> Result<Option<Token>, CMapError> {
    loop {
        skip_whitespace_and_comments(input, pos);
        let Some(&b) = input.get(*pos) else {
            return Ok(None);
        };
        match b {
            b']' => return Err(CMapError::malformed("unexpected ']' outside array")),
            b'>' if input.get(*pos + 1) == Some(&b'>') => {
                return Err(CMapError::malformed("unexpected '>>' outside dictionary"));
            }
            b')' | b'>' => {
                return Err(CMapError::malformed(format!(
                    "unexpected '{}' at offset {}",
                    b as char, *pos
                )));
            }
            // Procedure braces carry no meaning for CMap loading.
            b'{' | b'}' => *pos += 1,
            _ => return read_value(input, pos, 0).map(Some),
        }
    }
}

/// Read a value starting at a non-whitespace byte.
fn read_value(input: &[u8], pos: &mut usize, depth: usize) -> Result<Token, CMapError> {
    let b = input[*pos];
    match b {
        b'(' => Ok(Token::LiteralString(parse_literal_string(input, pos)?)),
        b'<' if input.get(*pos + 1) == Some(&b'<') => {
            Ok(Token::Dictionary(parse_dictionary(input, pos, depth + 1)?))
        }
        b'<' => Ok(Token::HexString(parse_hex_string(input, pos)?)),
        b'[' => {
            *pos += 1; // skip '['
            Ok(Token::Array(parse_array(input, pos, depth + 1)?))
        }
        b'/' => Ok(Token::Name(parse_name(input, pos))),
        b'0'..=b'9' | b'+' | b'-' | b'.' => parse_number(input, pos),
        _ => {
            let keyword = parse_keyword(input, pos);
            Ok(match keyword.as_str() {
                "true" => Token::Boolean(true),
                "false" => Token::Boolean(false),
                "null" => Token::Null,
                _ => Token::Keyword(keyword),
            })
        }
    }
}

/// Returns `true` if `b` is a PDF whitespace character.
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0C | 0x00)
}

/// Returns `true` if `b` is a PDF delimiter character.
fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// Skip whitespace and comments.
fn skip_whitespace_and_comments(input: &[u8], pos: &mut usize) {
    while *pos < input.len() {
        if is_whitespace(input[*pos]) {
            *pos += 1;
        } else if input[*pos] == b'%' {
            // Comment: skip to end of line
            while *pos < input.len() && input[*pos] != b'\n' && input[*pos] != b'\r' {
                *pos += 1;
            }
        } else {
            break;
        }
    }
}

/// Parse a literal string `(...)` with balanced parentheses and escape sequences.
fn parse_literal_string(input: &[u8], pos: &mut usize) -> Result<Vec<u8>, CMapError> {
    *pos += 1; // skip opening '('

    let mut result = Vec::new();
    let mut depth = 1u32;

    while *pos < input.len() {
        let b = input[*pos];
        match b {
            b'(' => {
                depth += 1;
                result.push(b'(');
                *pos += 1;
            }
            b')' => {
                depth -= 1;
                *pos += 1;
                if depth == 0 {
                    return Ok(result);
                }
                result.push(b')');
            }
            b'\\' => {
                *pos += 1;
                let Some(&escaped) = input.get(*pos) else {
                    break;
                };
                match escaped {
                    b'n' => result.push(b'\n'),
                    b'r' => result.push(b'\r'),
                    b't' => result.push(b'\t'),
                    b'b' => result.push(0x08),
                    b'f' => result.push(0x0C),
                    b'\r' => {
                        // Line continuation (CR or CR+LF)
                        if input.get(*pos + 1) == Some(&b'\n') {
                            *pos += 1;
                        }
                    }
                    b'\n' => {}
                    b'0'..=b'7' => {
                        let mut val = escaped - b'0';
                        for _ in 0..2 {
                            match input.get(*pos + 1) {
                                Some(&d @ b'0'..=b'7') => {
                                    *pos += 1;
                                    val = val.wrapping_mul(8).wrapping_add(d - b'0');
                                }
                                _ => break,
                            }
                        }
                        result.push(val);
                    }
                    // `\(`, `\)`, `\\` and unknown escapes keep the character.
                    other => result.push(other),
                }
                *pos += 1;
            }
            _ => {
                result.push(b);
                *pos += 1;
            }
        }
    }

    Err(CMapError::malformed("unterminated literal string"))
}

/// Parse a hex string `<...>`. Whitespace between digits is ignored.
fn parse_hex_string(input: &[u8], pos: &mut usize) -> Result<Vec<u8>, CMapError> {
    let start = *pos;
    *pos += 1; // skip '<'

    let mut digits = Vec::new();
    loop {
        let Some(&b) = input.get(*pos) else {
            return Err(CMapError::malformed(format!(
                "unterminated hex string at offset {start}"
            )));
        };
        *pos += 1;
        if b == b'>' {
            break;
        }
        if !is_whitespace(b) {
            digits.push(hex_digit(b)?);
        }
    }

    if digits.len() % 2 != 0 {
        return Err(CMapError::malformed(format!(
            "odd-length hex string at offset {start}"
        )));
    }
    Ok(digits
        .chunks_exact(2)
        .map(|pair| (pair[0] << 4) | pair[1])
        .collect())
}

/// Convert a hex digit character to its value (0-15).
fn hex_digit(b: u8) -> Result<u8, CMapError> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        _ => Err(CMapError::malformed(format!(
            "invalid hex digit: {:?}",
            b as char
        ))),
    }
}

/// Parse an array until `]`. Assumes `[` already consumed.
fn parse_array(input: &[u8], pos: &mut usize, depth: usize) -> Result<Vec<Token>, CMapError> {
    if depth > MAX_NESTING {
        return Err(CMapError::malformed("arrays nested too deeply"));
    }
    let mut elements = Vec::new();

    loop {
        skip_whitespace_and_comments(input, pos);
        let Some(&b) = input.get(*pos) else {
            return Err(CMapError::malformed("unterminated array"));
        };
        match b {
            b']' => {
                *pos += 1; // skip ']'
                return Ok(elements);
            }
            b')' | b'>' | b'{' | b'}' => {
                return Err(CMapError::malformed(format!(
                    "unexpected byte in array: 0x{b:02X}"
                )));
            }
            _ => elements.push(read_value(input, pos, depth)?),
        }
    }
}

/// Parse a dictionary `<< /Key value ... >>`. Assumes current bytes are `<<`.
fn parse_dictionary(
    input: &[u8],
    pos: &mut usize,
    depth: usize,
) -> Result<Vec<(String, Token)>, CMapError> {
    if depth > MAX_NESTING {
        return Err(CMapError::malformed("dictionaries nested too deeply"));
    }
    *pos += 2; // skip '<<'

    let mut entries = Vec::new();

    loop {
        skip_whitespace_and_comments(input, pos);
        let Some(&b) = input.get(*pos) else {
            return Err(CMapError::malformed("unterminated dictionary"));
        };

        if b == b'>' && input.get(*pos + 1) == Some(&b'>') {
            *pos += 2; // skip '>>'
            return Ok(entries);
        }

        if b != b'/' {
            return Err(CMapError::malformed("expected name key in dictionary"));
        }
        let key = parse_name(input, pos);

        skip_whitespace_and_comments(input, pos);
        match input.get(*pos) {
            None => return Err(CMapError::malformed("unterminated dictionary value")),
            Some(b']' | b')' | b'>' | b'{' | b'}') => {
                return Err(CMapError::malformed(format!(
                    "missing value for dictionary key /{key}"
                )));
            }
            Some(_) => {}
        }
        let value = read_value(input, pos, depth)?;
        entries.push((key, value));
    }
}

/// Parse a `/Name` token. Assumes current byte is `/`.
fn parse_name(input: &[u8], pos: &mut usize) -> String {
    *pos += 1; // skip '/'

    let start = *pos;
    while *pos < input.len() && !is_whitespace(input[*pos]) && !is_delimiter(input[*pos]) {
        *pos += 1;
    }

    // Handle #XX hex escapes in names
    let raw = &input[start..*pos];
    let mut name = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            if let (Ok(hi), Ok(lo)) = (hex_digit(raw[i + 1]), hex_digit(raw[i + 2])) {
                name.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        name.push(raw[i]);
        i += 1;
    }

    String::from_utf8_lossy(&name).into_owned()
}

/// Parse a number (integer or real).
fn parse_number(input: &[u8], pos: &mut usize) -> Result<Token, CMapError> {
    let start = *pos;
    let mut has_dot = false;

    // Sign
    if matches!(input.get(*pos), Some(b'+' | b'-')) {
        *pos += 1;
    }

    while let Some(&b) = input.get(*pos) {
        if b == b'.' && !has_dot {
            has_dot = true;
        } else if !b.is_ascii_digit() {
            break;
        }
        *pos += 1;
    }

    let s = std::str::from_utf8(&input[start..*pos])
        .map_err(|_| CMapError::malformed("invalid number token"))?;

    if has_dot {
        s.parse()
            .map(Token::Real)
            .map_err(|_| CMapError::malformed(format!("invalid real number: {s}")))
    } else {
        s.parse()
            .map(Token::Integer)
            .map_err(|_| CMapError::malformed(format!("invalid integer: {s}")))
    }
}

/// Parse a bare word up to the next whitespace or delimiter.
fn parse_keyword(input: &[u8], pos: &mut usize) -> String {
    let start = *pos;
    while *pos < input.len() && !is_whitespace(input[*pos]) && !is_delimiter(input[*pos]) {
        *pos += 1;
    }
    String::from_utf8_lossy(&input[start..*pos]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(s: &str) -> Token {
        Token::Keyword(s.to_string())
    }

    // ---- Value parsing tests ----

    #[test]
    fn parse_integer_and_real() {
        assert_eq!(
            tokenize(b"42 -7 10.003 .5").unwrap(),
            vec![
                Token::Integer(42),
                Token::Integer(-7),
                Token::Real(10.003),
                Token::Real(0.5),
            ]
        );
    }

    #[test]
    fn parse_name_token() {
        assert_eq!(
            tokenize(b"/CMapName /Adobe-Identity-UCS def").unwrap(),
            vec![
                Token::Name("CMapName".to_string()),
                Token::Name("Adobe-Identity-UCS".to_string()),
                kw("def"),
            ]
        );
    }

    #[test]
    fn parse_name_with_hex_escape() {
        assert_eq!(
            tokenize(b"/A#20B").unwrap(),
            vec![Token::Name("A B".to_string())]
        );
    }

    #[test]
    fn parse_literal_string_with_escapes() {
        assert_eq!(
            tokenize(b"(Adobe) (a\\(b\\)) (\\101) (x(y)z)").unwrap(),
            vec![
                Token::LiteralString(b"Adobe".to_vec()),
                Token::LiteralString(b"a(b)".to_vec()),
                Token::LiteralString(vec![65]),
                Token::LiteralString(b"x(y)z".to_vec()),
            ]
        );
    }

    #[test]
    fn parse_hex_string() {
        assert_eq!(
            tokenize(b"<0041> <d83d de00>").unwrap(),
            vec![
                Token::HexString(vec![0x00, 0x41]),
                Token::HexString(vec![0xD8, 0x3D, 0xDE, 0x00]),
            ]
        );
    }

    #[test]
    fn empty_hex_string() {
        assert_eq!(tokenize(b"<>").unwrap(), vec![Token::HexString(vec![])]);
    }

    #[test]
    fn odd_length_hex_string_is_malformed() {
        let err = tokenize(b"<ABC>").unwrap_err();
        assert!(matches!(err, CMapError::Malformed(_)));
    }

    #[test]
    fn bad_hex_digit_is_malformed() {
        assert!(matches!(tokenize(b"<00G1>"), Err(CMapError::Malformed(_))));
    }

    #[test]
    fn unterminated_hex_string_is_malformed() {
        assert!(matches!(tokenize(b"<0041"), Err(CMapError::Malformed(_))));
    }

    #[test]
    fn parse_array_of_hex_strings() {
        assert_eq!(
            tokenize(b"[<0041> <0042>]").unwrap(),
            vec![Token::Array(vec![
                Token::HexString(vec![0x00, 0x41]),
                Token::HexString(vec![0x00, 0x42]),
            ])]
        );
    }

    #[test]
    fn parse_dictionary() {
        assert_eq!(
            tokenize(b"<< /Registry (Adobe) /Ordering (UCS) /Supplement 0 >>").unwrap(),
            vec![Token::Dictionary(vec![
                ("Registry".to_string(), Token::LiteralString(b"Adobe".to_vec())),
                ("Ordering".to_string(), Token::LiteralString(b"UCS".to_vec())),
                ("Supplement".to_string(), Token::Integer(0)),
            ])]
        );
    }

    #[test]
    fn parse_booleans_and_null() {
        assert_eq!(
            tokenize(b"true false null").unwrap(),
            vec![Token::Boolean(true), Token::Boolean(false), Token::Null]
        );
    }

    // ---- Keyword and structure tests ----

    #[test]
    fn keywords_include_section_markers() {
        assert_eq!(
            tokenize(b"1 begincodespacerange <00> <FF> endcodespacerange").unwrap(),
            vec![
                Token::Integer(1),
                kw("begincodespacerange"),
                Token::HexString(vec![0x00]),
                Token::HexString(vec![0xFF]),
                kw("endcodespacerange"),
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            tokenize(b"%!PS-Adobe-3.0 Resource-CMap\n%%EndComments\n/CIDInit").unwrap(),
            vec![Token::Name("CIDInit".to_string())]
        );
    }

    #[test]
    fn procedure_braces_are_skipped() {
        assert_eq!(
            tokenize(b"{ pop } bind").unwrap(),
            vec![kw("pop"), kw("bind")]
        );
    }

    #[test]
    fn stray_closing_bracket_is_malformed() {
        assert!(matches!(tokenize(b"1 ]"), Err(CMapError::Malformed(_))));
        assert!(matches!(tokenize(b">> def"), Err(CMapError::Malformed(_))));
    }

    #[test]
    fn unterminated_array_is_malformed() {
        assert!(matches!(tokenize(b"[<00>"), Err(CMapError::Malformed(_))));
    }

    #[test]
    fn unterminated_literal_string_is_malformed() {
        assert!(matches!(tokenize(b"(Adobe"), Err(CMapError::Malformed(_))));
    }

    #[test]
    fn deep_nesting_is_malformed() {
        let input = "[".repeat(100) + &"]".repeat(100);
        assert!(matches!(
            tokenize(input.as_bytes()),
            Err(CMapError::Malformed(_))
        ));
    }

    #[test]
    fn empty_input() {
        assert!(tokenize(b"").unwrap().is_empty());
        assert!(tokenize(b"  \n\t % only a comment").unwrap().is_empty());
    }

    #[test]
    fn peek_does_not_consume() {
        let mut lexer = Lexer::new(b"/WMode 1 def");
        assert_eq!(
            lexer.peek_token().unwrap(),
            Some(&Token::Name("WMode".to_string()))
        );
        assert_eq!(
            lexer.next_token().unwrap(),
            Some(Token::Name("WMode".to_string()))
        );
        assert_eq!(lexer.next_token().unwrap(), Some(Token::Integer(1)));
        assert_eq!(lexer.next_token().unwrap(), Some(kw("def")));
        assert_eq!(lexer.next_token().unwrap(), None);
        assert_eq!(lexer.position(), 12);
    }

    #[test]
    fn token_helpers() {
        assert!(kw("def").is_keyword("def"));
        assert!(!Token::Name("def".to_string()).is_keyword("def"));
        assert_eq!(Token::Integer(3).describe(), "integer 3");
    }
}
