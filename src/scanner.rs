use crate::error::{Error, Result};
use crate::include::{IncludeFrame, Position};
use crate::token::TokenKind;

/// Characters that come back as single-character punctuation tokens.
const PUNCT: &str = "{}()[];:,=|*?+-/<>&!$%^~";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanMode {
    Normal,
    /// Balanced-delimiter capture: the whole body between the outer
    /// delimiters comes back as one string token.
    Block { open: char, close: char },
}

struct Cursor<'a> {
    src: &'a str,
    offset: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str, pos: Position) -> Cursor<'a> {
        Cursor {
            src,
            offset: pos.offset,
            line: pos.line,
            column: pos.column,
        }
    }

    fn pos(&self) -> Position {
        Position {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.offset..].chars().next()
    }

    fn peek2(&self) -> Option<char> {
        let mut chars = self.src[self.offset..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn bump_while(&mut self, test: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !test(c) {
                break;
            }
            self.bump();
        }
    }
}

/// Scan one primitive token off the top include frame.
///
/// Whitespace and comments in front of the token land in `pretext`, the
/// token's verbatim characters in `text`; together they reproduce the
/// input. The frame's token location is updated in place.
pub(crate) fn scan(
    frame: &mut IncludeFrame,
    pretext: &mut String,
    text: &mut String,
    mode: ScanMode,
) -> Result<TokenKind> {
    let mut cur = Cursor::new(&frame.source, frame.pos);

    let ws_start = cur.offset;
    loop {
        match cur.peek() {
            Some(c) if c.is_whitespace() => {
                cur.bump();
            }
            Some('#') => {
                cur.bump_while(|c| c != '\n');
            }
            _ => break,
        }
    }
    pretext.push_str(&cur.src[ws_start..cur.offset]);

    frame.loc.first_line = cur.line;
    frame.loc.first_column = cur.column;
    let start = cur.offset;

    let result = match mode {
        ScanMode::Normal => scan_normal(&mut cur),
        ScanMode::Block { open, close } => scan_block(&mut cur, open, close),
    };

    text.push_str(&cur.src[start..cur.offset]);
    frame.loc.last_line = cur.line;
    frame.loc.last_column = cur.column;
    frame.pos = cur.pos();

    result.map_err(|msg| Error::Lexical {
        msg,
        loc: frame.loc.clone(),
    })
}

fn scan_normal(cur: &mut Cursor) -> Result<TokenKind, String> {
    let c = match cur.peek() {
        Some(c) => c,
        None => return Ok(TokenKind::Eof),
    };

    match c {
        '"' => scan_dq_string(cur),
        '\'' => scan_sq_string(cur),
        '@' => {
            cur.bump();
            Ok(TokenKind::Pragma)
        }
        '.' => {
            cur.bump();
            if cur.peek() == Some('.') {
                cur.bump();
                Ok(TokenKind::DotDot)
            } else {
                Ok(TokenKind::Punct('.'))
            }
        }
        '0'..='9' => scan_number(cur),
        c if c == '_' || c.is_ascii_alphabetic() => {
            let start = cur.offset;
            cur.bump_while(|c| c == '_' || c == '-' || c.is_ascii_alphanumeric());
            Ok(TokenKind::Ident(cur.src[start..cur.offset].to_string()))
        }
        c if PUNCT.contains(c) => {
            cur.bump();
            Ok(TokenKind::Punct(c))
        }
        c => Err(format!("unexpected character {:?}", c)),
    }
}

fn scan_dq_string(cur: &mut Cursor) -> Result<TokenKind, String> {
    cur.bump();
    let mut value = String::new();
    loop {
        let c = match cur.bump() {
            Some(c) => c,
            None => return Err("unterminated string literal".to_string()),
        };
        match c {
            '"' => return Ok(TokenKind::Str(value)),
            '\\' => {
                let e = match cur.bump() {
                    Some(e) => e,
                    None => return Err("unterminated string literal".to_string()),
                };
                match e {
                    'a' => value.push(7 as char),
                    'b' => value.push(8 as char),
                    'e' => value.push(27 as char),
                    'f' => value.push(12 as char),
                    'n' => value.push('\n'),
                    'r' => value.push('\r'),
                    't' => value.push('\t'),
                    'v' => value.push(11 as char),
                    'x' => {
                        let hi = cur.bump().and_then(|c| c.to_digit(16));
                        let lo = cur.bump().and_then(|c| c.to_digit(16));
                        match (hi, lo) {
                            (Some(hi), Some(lo)) => value.push((hi * 16 + lo) as u8 as char),
                            _ => return Err("invalid \\x escape in string literal".to_string()),
                        }
                    }
                    e => value.push(e),
                }
            }
            c => value.push(c),
        }
    }
}

fn scan_sq_string(cur: &mut Cursor) -> Result<TokenKind, String> {
    cur.bump();
    let start = cur.offset;
    cur.bump_while(|c| c != '\'');
    if cur.peek().is_none() {
        return Err("unterminated string literal".to_string());
    }
    let value = cur.src[start..cur.offset].to_string();
    cur.bump();
    Ok(TokenKind::Str(value))
}

fn scan_number(cur: &mut Cursor) -> Result<TokenKind, String> {
    let start = cur.offset;

    if cur.peek() == Some('0') && matches!(cur.peek2(), Some('x') | Some('X')) {
        cur.bump();
        cur.bump();
        let digits = cur.offset;
        cur.bump_while(|c| c.is_ascii_hexdigit());
        let text = &cur.src[digits..cur.offset];
        return i64::from_str_radix(text, 16)
            .map(TokenKind::Number)
            .map_err(|_| format!("invalid number '{}'", &cur.src[start..cur.offset]));
    }

    cur.bump_while(|c| c.is_ascii_digit());

    // a lone '.' starts a fraction; '..' is the range operator
    if cur.peek() == Some('.') && matches!(cur.peek2(), Some('0'..='9')) {
        cur.bump();
        cur.bump_while(|c| c.is_ascii_digit());
        let text = &cur.src[start..cur.offset];
        return text
            .parse::<f64>()
            .map(TokenKind::Float)
            .map_err(|_| format!("invalid number '{}'", text));
    }

    let text = &cur.src[start..cur.offset];
    let parsed = if text.len() > 1 && text.starts_with('0') {
        i64::from_str_radix(&text[1..], 8)
    } else {
        text.parse::<i64>()
    };
    parsed
        .map(TokenKind::Number)
        .map_err(|_| format!("invalid number '{}'", text))
}

fn scan_block(cur: &mut Cursor, open: char, close: char) -> Result<TokenKind, String> {
    match cur.peek() {
        Some(c) if c == open => {
            cur.bump();
        }
        Some(c) => return Err(format!("expected {:?} to start a block, found {:?}", open, c)),
        None => return Err(format!("expected {:?} to start a block", open)),
    }

    let body_start = cur.offset;
    let mut depth = 1usize;
    loop {
        let c = match cur.bump() {
            Some(c) => c,
            None => return Err(format!("unterminated block, missing {:?}", close)),
        };
        match c {
            '"' => loop {
                match cur.bump() {
                    Some('"') => break,
                    Some('\\') => {
                        cur.bump();
                    }
                    Some(_) => {}
                    None => return Err("unterminated string literal in block".to_string()),
                }
            },
            '\'' => loop {
                match cur.bump() {
                    Some('\'') => break,
                    Some(_) => {}
                    None => return Err("unterminated string literal in block".to_string()),
                }
            },
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
    }

    let body = &cur.src[body_start..cur.offset - close.len_utf8()];
    Ok(TokenKind::Str(body.to_string()))
}
