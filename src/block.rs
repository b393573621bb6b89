use std::rc::Rc;

use crate::args::ArgMap;
use crate::context::{context_name, ContextType};
use crate::error::{Error, Result};
use crate::lexer::CfgLexer;
use crate::subst::subst_args;
use crate::token::Token;

/// A series of tokens to be injected into the stream the lexer hands
/// out. A block is filled first and drained afterwards; the two phases
/// cannot be intermixed.
#[derive(Debug, Default)]
pub struct TokenBlock {
    pos: usize,
    tokens: Vec<Token>,
}

impl TokenBlock {
    pub fn new() -> TokenBlock {
        TokenBlock::default()
    }

    pub fn append(&mut self, token: Token) {
        assert_eq!(self.pos, 0, "token block already drained");
        self.tokens.push(token);
    }

    pub fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token.clone())
    }
}

/// A callback producing configuration text for a `(context, name)`
/// block reference. User-defined blocks are the common case; plugins
/// can implement this to generate configuration on the fly.
pub trait BlockGenerator {
    fn generate(
        &self,
        lexer: &mut CfgLexer,
        context: Option<ContextType>,
        name: &str,
        args: &mut ArgMap,
    ) -> Result<()>;
}

pub(crate) struct GeneratorEntry {
    pub context: Option<ContextType>,
    pub name: String,
    pub generator: Rc<dyn BlockGenerator>,
}

/// A configuration block defined by the user. Behaves like a macro:
/// referencing it expands its content, with backtick references
/// substituted from the reference's arguments, the block's declared
/// defaults, the lexer globals and the environment.
pub struct CfgBlock {
    content: String,
    arg_defs: ArgMap,
}

impl CfgBlock {
    pub fn new(content: impl Into<String>, arg_defs: ArgMap) -> CfgBlock {
        CfgBlock {
            content: content.into(),
            arg_defs,
        }
    }

    /// Collect arguments not declared in the block definition into the
    /// reserved `__VARARGS__` value, formatted ready for re-parsing.
    /// A user-supplied `__VARARGS__` is overwritten.
    fn fill_varargs(&self, args: &mut ArgMap) {
        let mut varargs = String::new();
        for (key, value) in args.iter() {
            if self.arg_defs.get(key).is_none() {
                varargs.push_str(key);
                varargs.push('(');
                varargs.push_str(value);
                varargs.push_str(") ");
            }
        }
        args.set("__VARARGS__", &varargs);
    }
}

impl BlockGenerator for CfgBlock {
    fn generate(
        &self,
        lexer: &mut CfgLexer,
        context: Option<ContextType>,
        name: &str,
        args: &mut ArgMap,
    ) -> Result<()> {
        let buffer_name = format!("{} block {}", context_name(context), name);
        self.fill_varargs(args);

        let expanded = match subst_args(
            Some(lexer.globals()),
            Some(&self.arg_defs),
            Some(args),
            &self.content,
        ) {
            Ok(expanded) => expanded,
            Err(_) => {
                log::warn!(
                    "Syntax error while resolving backtick references in block, \
                     missing closing '`' character; context='{}', block='{}'",
                    context_name(context),
                    name
                );
                return Err(Error::BlockExpansion {
                    context: context_name(context),
                    name: name.to_string(),
                });
            }
        };

        lexer.include_buffer(&buffer_name, &expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Location, TokenKind};
    use std::sync::Arc;

    fn token(kind: TokenKind) -> Token {
        Token::new(kind, Location::start_of(Arc::from("test")))
    }

    #[test]
    fn test_token_block_fill_then_drain() {
        let mut block = TokenBlock::new();
        block.append(token(TokenKind::Punct('{')));
        block.append(token(TokenKind::Ident("a".to_string())));
        block.append(token(TokenKind::Punct('}')));

        assert_eq!(block.next().unwrap().kind, TokenKind::Punct('{'));
        assert_eq!(block.next().unwrap().kind, TokenKind::Ident("a".to_string()));
        assert_eq!(block.next().unwrap().kind, TokenKind::Punct('}'));
        assert!(block.next().is_none());
    }

    #[test]
    #[should_panic(expected = "token block already drained")]
    fn test_token_block_append_after_drain() {
        let mut block = TokenBlock::new();
        block.append(token(TokenKind::Punct(';')));
        let _ = block.next();
        block.append(token(TokenKind::Punct(';')));
    }

    #[test]
    fn test_fill_varargs() {
        let mut defs = ArgMap::new();
        defs.set("port", "514");
        let block = CfgBlock::new("", defs);

        let mut args = ArgMap::new();
        args.set("port", "6514");
        args.set("host", "h1");
        args.set("proto", "tcp");
        block.fill_varargs(&mut args);

        // declared args stay out; the rest arrive in map order
        assert_eq!(args.get("__VARARGS__"), Some("host(h1) proto(tcp) "));
    }

    #[test]
    fn test_fill_varargs_overwrites_reserved_key() {
        let block = CfgBlock::new("", ArgMap::new());
        let mut args = ArgMap::new();
        args.set("__VARARGS__", "user supplied");
        block.fill_varargs(&mut args);
        assert_eq!(args.get("__VARARGS__"), Some("__varargs__(user supplied) "));
    }
}
