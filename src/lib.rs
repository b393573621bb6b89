mod args;
mod block;
mod config;
mod context;
mod error;
mod grammar;
mod include;
mod keyword;
mod lexer;
mod scanner;
mod subst;
mod token;

pub use args::{normalize_key, ArgMap};
pub use block::{BlockGenerator, CfgBlock, TokenBlock};
pub use config::{format_version, parse_version_string, Config, VERSION_CURRENT, VERSION_LEGACY};
pub use context::ContextType;
pub use error::{Error, Result};
pub use grammar::Grammar;
pub use include::MAX_INCLUDE_DEPTH;
pub use keyword::{keyword_table, Keyword, KeywordStatus, KeywordTable, STOP_KEYWORD};
pub use lexer::CfgLexer;
pub use subst::subst_args;
pub use token::*;
