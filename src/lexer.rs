use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::args::ArgMap;
use crate::block::{BlockGenerator, GeneratorEntry, TokenBlock};
use crate::config::{format_version, Config, VERSION_LEGACY};
use crate::context::{context_name, ContextStack, ContextType};
use crate::error::{Error, Result};
use crate::grammar::Grammar;
use crate::include::IncludeStack;
use crate::keyword::{self, KeywordTable};
use crate::scanner::{self, ScanMode};
use crate::subst::subst_args;
use crate::token::{Location, Token, TokenKind, KW_INCLUDE};

/// The configuration lexer.
///
/// Drives the whole preprocessing pipeline: raw scanning over the
/// include stack, keyword resolution against the context stack, token
/// injection, pragma and include interception, user-defined block
/// expansion, and the preprocessed echo of the input.
///
/// One lexer handles one configuration; lexing two configurations
/// concurrently means two lexers.
pub struct CfgLexer {
    grammar: Rc<dyn Grammar>,
    config: Rc<RefCell<Config>>,
    includes: IncludeStack,
    contexts: ContextStack,
    token_blocks: VecDeque<TokenBlock>,
    generators: Vec<GeneratorEntry>,
    globals: ArgMap,
    preprocess_output: String,
    suppress: u32,
    token_text: String,
    token_pretext: String,
}

impl std::fmt::Debug for CfgLexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CfgLexer").finish_non_exhaustive()
    }
}

impl CfgLexer {
    fn empty(grammar: Rc<dyn Grammar>, config: Rc<RefCell<Config>>) -> CfgLexer {
        CfgLexer {
            grammar,
            config,
            includes: IncludeStack::new(),
            contexts: ContextStack::new(),
            token_blocks: VecDeque::new(),
            generators: Vec::new(),
            globals: ArgMap::new(),
            preprocess_output: String::new(),
            suppress: 0,
            token_text: String::new(),
            token_pretext: String::new(),
        }
    }

    /// Lex a configuration file.
    pub fn from_file(
        grammar: Rc<dyn Grammar>,
        config: Rc<RefCell<Config>>,
        path: &str,
    ) -> Result<CfgLexer> {
        let mut lexer = CfgLexer::empty(grammar, config);
        lexer.includes.push_file(path)?;
        Ok(lexer)
    }

    /// Lex an in-memory buffer. Backtick references in the buffer are
    /// expanded against the process environment up front.
    pub fn from_buffer(
        grammar: Rc<dyn Grammar>,
        config: Rc<RefCell<Config>>,
        name: &str,
        content: &str,
    ) -> Result<CfgLexer> {
        let mut lexer = CfgLexer::empty(grammar, config);
        let content = subst_args(None, None, None, content)?;
        lexer.includes.push_buffer(name, &content)?;
        Ok(lexer)
    }

    /// Fetch the next token.
    ///
    /// Pending token blocks are drained first; then the scanner runs
    /// over the top include frame. Pragmas, includes and block
    /// references never reach the caller: they are resolved here and
    /// lexing restarts behind them.
    pub fn next_token(&mut self) -> Result<Token> {
        loop {
            let mut injected = false;
            let mut pending: Option<Token> = None;

            while let Some(block) = self.token_blocks.front_mut() {
                match block.next() {
                    Some(mut token) => {
                        token.loc = self.includes.top_location();
                        injected = true;
                        pending = Some(token);
                        break;
                    }
                    None => {
                        self.token_blocks.pop_front();
                    }
                }
            }

            let token = match pending {
                Some(token) => token,
                None => self.raw_scan()?,
            };

            match token.kind {
                TokenKind::Pragma => {
                    self.preprocess_output.push('@');
                    let grammar = self.grammar.clone();
                    grammar.parse_pragma(self)?;
                    continue;
                }
                TokenKind::Token(id)
                    if id == KW_INCLUDE
                        && self.contexts.current_type() != Some(ContextType::Pragma) =>
                {
                    self.suppress += 1;
                    let included = self.lex_include();
                    self.suppress -= 1;
                    included?;
                    continue;
                }
                TokenKind::Ident(ref name) => {
                    match self.find_generator(self.contexts.current_type(), name) {
                        Some(generator) => {
                            let name = name.clone();
                            self.suppress += 1;
                            let grammar = self.grammar.clone();
                            let parsed = grammar.parse_block_ref(self);
                            self.suppress -= 1;
                            let mut args = parsed?;
                            let context = self.contexts.current_type();
                            generator.generate(self, context, &name, &mut args)?;
                            continue;
                        }
                        None => self.establish_version(),
                    }
                }
                _ => self.establish_version(),
            }

            if !injected && self.suppress == 0 {
                self.preprocess_output.push_str(&self.token_text);
            }
            return Ok(token);
        }
    }

    fn raw_scan(&mut self) -> Result<Token> {
        loop {
            let mode = match self.contexts.current_type() {
                Some(ContextType::BlockContent) => ScanMode::Block {
                    open: '{',
                    close: '}',
                },
                Some(ContextType::BlockArg) => ScanMode::Block {
                    open: '(',
                    close: ')',
                },
                _ => ScanMode::Normal,
            };

            let frame = match self.includes.top_mut() {
                Some(frame) => frame,
                None => {
                    return Ok(Token::new(TokenKind::Eof, self.includes.top_location()));
                }
            };

            self.token_text.clear();
            self.token_pretext.clear();
            let kind = scanner::scan(frame, &mut self.token_pretext, &mut self.token_text, mode)?;
            let loc = frame.loc.clone();
            self.preprocess_output.push_str(&self.token_pretext);

            match kind {
                TokenKind::Eof => {
                    self.includes.pop();
                    if self.includes.depth() == 0 {
                        return Ok(Token::new(TokenKind::Eof, loc));
                    }
                }
                TokenKind::Ident(text) => {
                    let kind =
                        keyword::lookup_keyword(&self.contexts, &self.config.borrow(), &text, &loc);
                    return Ok(Token::new(kind, loc));
                }
                kind => return Ok(Token::new(kind, loc)),
            }
        }
    }

    // `include <file>;` outside a pragma: lex the file name and the
    // terminating ';' with echo suppressed, then switch input to it.
    fn lex_include(&mut self) -> Result<()> {
        let token = self.next_token()?;
        let path = match token.kind {
            TokenKind::Str(path) | TokenKind::Ident(path) => path,
            ref kind => {
                return Err(Error::UnexpectedToken {
                    expected: "file name",
                    found: kind.as_str(),
                    loc: token.loc,
                })
            }
        };

        let token = self.next_token()?;
        if token.kind != TokenKind::Punct(';') {
            return Err(Error::UnexpectedToken {
                expected: "';'",
                found: token.kind.as_str(),
                loc: token.loc,
            });
        }

        self.include_file(&path)
    }

    fn establish_version(&mut self) {
        let mut config = self.config.borrow_mut();
        if config.version == 0 && config.parsed_version != 0 {
            config.version = config.parsed_version;
        } else if config.version == 0
            && config.parsed_version == 0
            && self.contexts.current_type() != Some(ContextType::Pragma)
        {
            log::warn!(
                "WARNING: Configuration file has no version number, assuming {} format. \
                 Please add @version: maj.min to the beginning of the file",
                format_version(VERSION_LEGACY)
            );
            config.version = VERSION_LEGACY;
        }
    }

    fn find_generator(
        &self,
        context: Option<ContextType>,
        name: &str,
    ) -> Option<Rc<dyn BlockGenerator>> {
        self.generators
            .iter()
            .find(|entry| (entry.context.is_none() || entry.context == context) && entry.name == name)
            .map(|entry| entry.generator.clone())
    }

    /// Register a block generator for a `(context, name)` pair. `None`
    /// for the context matches every context. A duplicate registration
    /// is dropped on the spot.
    pub fn register_block_generator(
        &mut self,
        context: Option<ContextType>,
        name: &str,
        generator: Rc<dyn BlockGenerator>,
    ) {
        if self.find_generator(context, name).is_some() {
            log::debug!(
                "Attempted to register the same generator multiple times, ignoring; \
                 context='{}', name='{}'",
                context_name(context),
                name
            );
            return;
        }
        self.generators.push(GeneratorEntry {
            context,
            name: name.to_string(),
            generator,
        });
    }

    /// Append a pre-synthesized token block to the pending queue.
    pub fn inject_token_block(&mut self, block: TokenBlock) {
        self.token_blocks.push_back(block);
    }

    /// Push back the single most recent token.
    pub fn unput(&mut self, token: Token) {
        let mut block = TokenBlock::new();
        block.append(token);
        self.inject_token_block(block);
    }

    pub fn push_context(
        &mut self,
        ctx: Option<ContextType>,
        keywords: Option<KeywordTable>,
        desc: &str,
    ) {
        self.contexts.push(ctx, keywords, desc);
    }

    pub fn pop_context(&mut self) {
        self.contexts.pop();
    }

    pub fn context_type(&self) -> Option<ContextType> {
        self.contexts.current_type()
    }

    pub fn context_description(&self) -> &str {
        self.contexts.current_description()
    }

    pub fn context_depth(&self) -> usize {
        self.contexts.depth()
    }

    /// Switch input to a file; lexing resumes in the current frame once
    /// the file is exhausted.
    pub fn include_file(&mut self, path: &str) -> Result<()> {
        self.includes.push_file(path)
    }

    /// Switch input to an in-memory buffer.
    pub fn include_buffer(&mut self, name: &str, content: &str) -> Result<()> {
        self.includes.push_buffer(name, content)
    }

    pub fn current_location(&self) -> Location {
        self.includes.top_location()
    }

    /// Lexer-global substitution values, the outermost scope of
    /// backtick expansion.
    pub fn globals(&self) -> &ArgMap {
        &self.globals
    }

    pub fn globals_mut(&mut self) -> &mut ArgMap {
        &mut self.globals
    }

    pub fn config(&self) -> Rc<RefCell<Config>> {
        Rc::clone(&self.config)
    }

    /// The preprocessed echo of everything lexed so far.
    pub fn preprocessed(&self) -> &str {
        &self.preprocess_output
    }
}
