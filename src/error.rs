use std::io;

use crate::token::Location;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while lexing a configuration.
///
/// Warnings (reserved words, obsolete keywords, missing version) do not
/// show up here; they go to the diagnostic log and lexing continues.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Malformed token: unterminated string, bad escape, stray character.
    #[error("{loc}: {msg}")]
    Lexical { msg: String, loc: Location },

    /// The token stream did not have the shape a directive requires.
    #[error("{loc}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: &'static str,
        loc: Location,
    },

    #[error("{loc}: cannot open include file {path:?}: {source}")]
    IncludeOpen {
        path: String,
        loc: Location,
        #[source]
        source: io::Error,
    },

    #[error("{loc}: include loop detected, {path:?} is already being processed")]
    IncludeCycle { path: String, loc: Location },

    #[error("{loc}: includes are nested too deep, {max} levels at most")]
    IncludeDepth { loc: Location, max: usize },

    /// A backtick reference ran into end-of-input before the closing `` ` ``.
    #[error("missing closing '`' character in backtick reference")]
    UnterminatedReference,

    #[error("expansion of {context} block {name:?} failed")]
    BlockExpansion { context: &'static str, name: String },

    /// An argument was passed to a block that its definition does not allow.
    #[error("unknown argument {key:?} ({value:?}) in {context}")]
    UnknownArgument {
        context: String,
        key: String,
        value: String,
    },
}
