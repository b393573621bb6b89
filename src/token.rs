use std::fmt;
use std::sync::Arc;

// Grammar token ids for the keywords the lexer itself needs to know
// about, plus the ones the built-in tables hand out. The downstream
// grammar is free to define further ids in the same space.
pub const KW_SOURCE: u16 = 1;
pub const KW_DESTINATION: u16 = 2;
pub const KW_LOG: u16 = 3;
pub const KW_FILTER: u16 = 4;
pub const KW_PARSER: u16 = 5;
pub const KW_REWRITE: u16 = 6;
pub const KW_TEMPLATE: u16 = 7;
pub const KW_BLOCK: u16 = 8;
pub const KW_OPTIONS: u16 = 9;
pub const KW_INCLUDE: u16 = 10;
pub const KW_VERSION: u16 = 11;
pub const KW_DEFINE: u16 = 12;
pub const KW_FLUSH_LINES: u16 = 13;
pub const KW_LOG_FIFO_SIZE: u16 = 14;

/// Source location of a token, including the include frame it came from.
///
/// `name` is the path of the file or the name of the buffer being lexed,
/// shared with the frame itself.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: Arc<str>,
    pub first_line: u32,
    pub first_column: u32,
    pub last_line: u32,
    pub last_column: u32,
}

impl Location {
    pub(crate) fn start_of(name: Arc<str>) -> Location {
        Location {
            name,
            first_line: 1,
            first_column: 1,
            last_line: 1,
            last_column: 1,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.name, self.first_line, self.first_column)
    }
}

/// The token alphabet produced by the lexer.
///
/// `Token` carries a grammar token id produced by keyword resolution;
/// everything else is a primitive token straight from the scanner.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Token(u16),
    Punct(char),
    DotDot,
    Pragma,
    Eof,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Number(_) => "number",
            TokenKind::Float(_) => "float",
            TokenKind::Str(_) => "string",
            TokenKind::Ident(_) => "identifier",
            TokenKind::Token(_) => "keyword",
            TokenKind::Punct(_) => "punctuation",
            TokenKind::DotDot => "'..'",
            TokenKind::Pragma => "'@'",
            TokenKind::Eof => "end-of-data",
        }
    }

    /// The lexeme of a string or identifier token.
    pub fn lexeme(&self) -> Option<&str> {
        match self {
            TokenKind::Str(s) | TokenKind::Ident(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: Location,
}

impl Token {
    pub fn new(kind: TokenKind, loc: Location) -> Token {
        Token { kind, loc }
    }
}
