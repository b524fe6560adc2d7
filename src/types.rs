//! Positions and lexical units shared by every component.
use std::fmt;

/// A source position (1-based line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}
impl Position {
    /// Makes a new `Position` instance.
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }

    /// Advances this position over `text`.
    pub fn advance(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    pub(crate) fn advanced(mut self, text: &str) -> Self {
        self.advance(text);
        self
    }
}
impl Default for Position {
    fn default() -> Self {
        Position::new(1, 1)
    }
}
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// This trait allows getting the positional range of an item.
pub trait PositionRange {
    /// Returns the start position of this item.
    fn start_position(&self) -> Position;

    /// Returns the end position of this item.
    fn end_position(&self) -> Position;
}

/// Lexeme kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum LexemeKind {
    Ident,
    Number,
    Str,
    Char,
    Punct,
    Comment,
    Whitespace,
}

/// The smallest lexical unit of code-block text and macro replacements.
///
/// Whitespace and comments are lexemes of their own so that a lexeme
/// sequence always renders back to the exact original text.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct Lexeme {
    pub kind: LexemeKind,
    pub text: String,
    pub position: Position,
}
impl Lexeme {
    /// Returns `true` if this lexeme is an identifier with the given text.
    pub fn is_ident(&self, text: &str) -> bool {
        self.kind == LexemeKind::Ident && self.text == text
    }

    /// Returns `true` if this lexeme is a punctuator with the given text.
    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == LexemeKind::Punct && self.text == text
    }

    /// Returns `true` for whitespace and comment lexemes.
    pub fn is_blank(&self) -> bool {
        matches!(self.kind, LexemeKind::Whitespace | LexemeKind::Comment)
    }
}
impl PositionRange for Lexeme {
    fn start_position(&self) -> Position {
        self.position
    }
    fn end_position(&self) -> Position {
        self.position.advanced(&self.text)
    }
}
impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Renders a lexeme sequence back to text.
pub fn render(lexemes: &[Lexeme]) -> String {
    lexemes.iter().map(|l| l.text.as_str()).collect()
}

const PUNCTS3: &[&str] = &["<<=", ">>=", "..."];
const PUNCTS2: &[&str] = &[
    "&&", "||", "==", "!=", "<=", ">=", "<<", ">>", "->", "++", "--", "+=", "-=", "*=", "/=",
    "%=", "&=", "|=", "^=", "##",
];

fn is_ident_start(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphabetic()
}

fn is_ident_cont(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

/// Splits `text` into lexemes, starting at the given position.
///
/// The split is lossless: concatenating the lexeme texts yields `text`
/// unchanged. String, character literal and comment contents are kept
/// opaque so that identifiers inside them never take part in expansion.
pub fn tokenize(text: &str, start: Position) -> Vec<Lexeme> {
    let bytes = text.as_bytes();
    let mut lexemes = Vec::new();
    let mut pos = start;
    let mut i = 0;
    while i < bytes.len() {
        let begin = i;
        let kind = match bytes[i] {
            b if b.is_ascii_whitespace() => {
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                LexemeKind::Whitespace
            }
            b if is_ident_start(b) => {
                while i < bytes.len() && is_ident_cont(bytes[i]) {
                    i += 1;
                }
                LexemeKind::Ident
            }
            b'0'..=b'9' => {
                // pp-number: letters and dots may follow (e.g. `0x1f`, `1.5e3`)
                while i < bytes.len() && (is_ident_cont(bytes[i]) || bytes[i] == b'.') {
                    i += 1;
                }
                LexemeKind::Number
            }
            b'"' => {
                i = scan_quoted(bytes, i, b'"');
                LexemeKind::Str
            }
            b'\'' => {
                i = scan_quoted(bytes, i, b'\'');
                LexemeKind::Char
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                LexemeKind::Comment
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
                LexemeKind::Comment
            }
            _ => {
                i += punct_len(&text[i..]);
                LexemeKind::Punct
            }
        };
        let slice = &text[begin..i];
        lexemes.push(Lexeme {
            kind,
            text: slice.to_owned(),
            position: pos,
        });
        pos.advance(slice);
    }
    lexemes
}

fn scan_quoted(bytes: &[u8], mut i: usize, quote: u8) -> usize {
    i += 1;
    while i < bytes.len() && bytes[i] != quote && bytes[i] != b'\n' {
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            i += 1;
        }
        i += 1;
    }
    if i < bytes.len() && bytes[i] == quote {
        i += 1;
    }
    i
}

fn punct_len(rest: &str) -> usize {
    for p in PUNCTS3 {
        if rest.starts_with(p) {
            return 3;
        }
    }
    for p in PUNCTS2 {
        if rest.starts_with(p) {
            return 2;
        }
    }
    rest.chars().next().map_or(1, char::len_utf8)
}
