use crate::args::ArgMap;
use crate::error::Result;
use crate::lexer::CfgLexer;

/// The downstream grammar parser, as seen from the lexer.
///
/// The lexer re-enters the grammar for two narrow jobs: parsing a
/// pragma directive after a `@` marker, and parsing the argument list
/// of a block reference. Both run synchronously and call back into the
/// lexer for their tokens; they must leave the context stack balanced.
pub trait Grammar {
    /// Parse one pragma directive. The `@` has already been consumed.
    fn parse_pragma(&self, lexer: &mut CfgLexer) -> Result<()>;

    /// Parse a `(name1(value1) name2(value2) ...)` argument list
    /// following a block reference.
    fn parse_block_ref(&self, lexer: &mut CfgLexer) -> Result<ArgMap>;
}
