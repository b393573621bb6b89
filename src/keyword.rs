use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{format_version, Config};
use crate::context::ContextStack;
use crate::token::{Location, TokenKind};

/// Sentinel keyword name that stops resolution: every identifier lexed
/// under a table starting with it stays a plain identifier.
pub const STOP_KEYWORD: &str = "@STOP@";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordStatus {
    Normal,
    Obsolete,
}

/// One entry of a context keyword table.
#[derive(Debug, Clone)]
pub struct Keyword {
    pub name: &'static str,
    pub token: u16,
    pub req_version: u16,
    pub status: KeywordStatus,
    pub explain: &'static str,
}

impl Keyword {
    pub fn new(name: &'static str, token: u16) -> Keyword {
        Keyword {
            name,
            token,
            req_version: 0,
            status: KeywordStatus::Normal,
            explain: "",
        }
    }

    /// A keyword only valid from `req_version` on; in older configs it
    /// lexes as an identifier (with a warning).
    pub fn since(name: &'static str, token: u16, req_version: u16) -> Keyword {
        Keyword {
            req_version,
            ..Keyword::new(name, token)
        }
    }

    /// An obsoleted keyword; the first use warns with `explain`.
    pub fn obsolete(name: &'static str, token: u16, explain: &'static str) -> Keyword {
        Keyword {
            status: KeywordStatus::Obsolete,
            explain,
            ..Keyword::new(name, token)
        }
    }

    pub fn stop() -> Keyword {
        Keyword::new(STOP_KEYWORD, 0)
    }
}

/// A keyword table shared between context pushes, so status changes
/// (the obsolete warning firing once) stick for the lifetime of the
/// table, not of one context frame.
pub type KeywordTable = Rc<RefCell<Vec<Keyword>>>;

pub fn keyword_table(words: impl IntoIterator<Item = Keyword>) -> KeywordTable {
    Rc::new(RefCell::new(words.into_iter().collect()))
}

/// Positional keyword comparison. In the input, `-` and `_` both match
/// a `_` in the keyword spelling; everything else must be equal.
fn keyword_matches(kw: &str, input: &str) -> bool {
    if kw.len() != input.len() {
        return false;
    }
    kw.bytes().zip(input.bytes()).all(|(k, i)| {
        if i == b'-' || i == b'_' {
            k == b'_'
        } else {
            k == i
        }
    })
}

/// Resolve an identifier against the context stack, walking keyword
/// tables from the innermost context outwards.
pub(crate) fn lookup_keyword(
    contexts: &ContextStack,
    config: &Config,
    input: &str,
    loc: &Location,
) -> TokenKind {
    for frame in contexts.frames_top_down() {
        let table = match &frame.keywords {
            Some(table) => table,
            None => continue,
        };
        for kw in table.borrow_mut().iter_mut() {
            if kw.name == STOP_KEYWORD {
                return TokenKind::Ident(input.to_string());
            }
            if !keyword_matches(kw.name, input) {
                continue;
            }
            if !config.version_allows(kw.req_version) {
                log::warn!(
                    "WARNING: Your configuration uses a newly introduced reserved word as identifier, \
                     please use a different name or enclose it in quotes; \
                     keyword='{}', config-version='{}', version='{}', filename='{}', line='{}:{}'",
                    kw.name,
                    format_version(config.version),
                    format_version(kw.req_version),
                    loc.name,
                    loc.first_line,
                    loc.first_column
                );
                continue;
            }
            if kw.status == KeywordStatus::Obsolete {
                log::warn!(
                    "Your configuration file uses an obsoleted keyword, please update your configuration; \
                     keyword='{}', change='{}'",
                    kw.name,
                    kw.explain
                );
                kw.status = KeywordStatus::Normal;
            }
            return TokenKind::Token(kw.token);
        }
    }
    TokenKind::Ident(input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextType;
    use crate::token::{KW_FLUSH_LINES, KW_SOURCE};
    use std::sync::Arc;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn loc() -> Location {
        Location::start_of(Arc::from("test.conf"))
    }

    fn root_stack(table: KeywordTable) -> ContextStack {
        let mut stack = ContextStack::new();
        stack.push(Some(ContextType::Root), Some(table), "root");
        stack
    }

    #[test]
    fn test_simple_match() {
        let stack = root_stack(keyword_table([Keyword::new("source", KW_SOURCE)]));
        let config = Config::new();
        let kind = lookup_keyword(&stack, &config, "source", &loc());
        assert_eq!(kind, TokenKind::Token(KW_SOURCE));
    }

    #[test]
    fn test_no_match_is_identifier() {
        let stack = root_stack(keyword_table([Keyword::new("source", KW_SOURCE)]));
        let config = Config::new();
        let kind = lookup_keyword(&stack, &config, "sink", &loc());
        assert_eq!(kind, TokenKind::Ident("sink".to_string()));
    }

    #[test]
    fn test_stop_sentinel() {
        let stack = root_stack(keyword_table([
            Keyword::stop(),
            Keyword::new("source", KW_SOURCE),
        ]));
        let config = Config::new();
        let kind = lookup_keyword(&stack, &config, "source", &loc());
        assert_eq!(kind, TokenKind::Ident("source".to_string()));
    }

    #[test]
    fn test_hyphen_underscore_equivalence() {
        let stack = root_stack(keyword_table([Keyword::new("flush_lines", KW_FLUSH_LINES)]));
        let config = Config::new();
        assert_eq!(
            lookup_keyword(&stack, &config, "flush-lines", &loc()),
            TokenKind::Token(KW_FLUSH_LINES)
        );
        assert_eq!(
            lookup_keyword(&stack, &config, "flush_lines", &loc()),
            TokenKind::Token(KW_FLUSH_LINES)
        );
        assert_eq!(
            lookup_keyword(&stack, &config, "flush.lines", &loc()),
            TokenKind::Ident("flush.lines".to_string())
        );
        assert_eq!(
            lookup_keyword(&stack, &config, "flush-line", &loc()),
            TokenKind::Ident("flush-line".to_string())
        );
    }

    #[test]
    fn test_version_gate_suppresses_match() {
        init();
        let stack = root_stack(keyword_table([Keyword::since(
            "flush_lines",
            KW_FLUSH_LINES,
            0x0308,
        )]));
        let mut config = Config::new();
        config.version = 0x0302;
        // too old: lexes as identifier
        assert_eq!(
            lookup_keyword(&stack, &config, "flush-lines", &loc()),
            TokenKind::Ident("flush-lines".to_string())
        );
        config.version = 0x0308;
        assert_eq!(
            lookup_keyword(&stack, &config, "flush-lines", &loc()),
            TokenKind::Token(KW_FLUSH_LINES)
        );
    }

    #[test]
    fn test_obsolete_warns_once() {
        init();
        let table = keyword_table([Keyword::obsolete(
            "flush_timeout",
            KW_FLUSH_LINES,
            "use flush-lines() instead",
        )]);
        let stack = root_stack(table.clone());
        let mut config = Config::new();
        config.version = 0x0308;
        assert_eq!(
            lookup_keyword(&stack, &config, "flush_timeout", &loc()),
            TokenKind::Token(KW_FLUSH_LINES)
        );
        // first use flipped the status back to normal
        assert_eq!(table.borrow()[0].status, KeywordStatus::Normal);
    }

    #[test]
    fn test_outer_context_consulted() {
        let mut stack = ContextStack::new();
        stack.push(
            Some(ContextType::Root),
            Some(keyword_table([Keyword::new("source", KW_SOURCE)])),
            "root",
        );
        stack.push(Some(ContextType::Source), None, "source statement");
        let config = Config::new();
        assert_eq!(
            lookup_keyword(&stack, &config, "source", &loc()),
            TokenKind::Token(KW_SOURCE)
        );
    }
}
