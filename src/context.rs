use crate::keyword::KeywordTable;

/// The grammar region the lexer is currently operating in.
///
/// The context influences keyword resolution (each context brings its
/// own keyword table) and error wording. `BlockContent` and `BlockArg`
/// additionally switch the scanner into balanced-delimiter capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextType {
    Root,
    Destination,
    Source,
    Parser,
    Rewrite,
    Filter,
    Log,
    BlockDef,
    BlockRef,
    BlockContent,
    BlockArg,
    Pragma,
    Format,
    TemplateFunc,
    InnerDest,
    InnerSrc,
    ClientProto,
    ServerProto,
}

impl ContextType {
    pub const ALL: [ContextType; 18] = [
        ContextType::Root,
        ContextType::Destination,
        ContextType::Source,
        ContextType::Parser,
        ContextType::Rewrite,
        ContextType::Filter,
        ContextType::Log,
        ContextType::BlockDef,
        ContextType::BlockRef,
        ContextType::BlockContent,
        ContextType::BlockArg,
        ContextType::Pragma,
        ContextType::Format,
        ContextType::TemplateFunc,
        ContextType::InnerDest,
        ContextType::InnerSrc,
        ContextType::ClientProto,
        ContextType::ServerProto,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ContextType::Root => "root",
            ContextType::Destination => "destination",
            ContextType::Source => "source",
            ContextType::Parser => "parser",
            ContextType::Rewrite => "rewrite",
            ContextType::Filter => "filter",
            ContextType::Log => "log",
            ContextType::BlockDef => "block-def",
            ContextType::BlockRef => "block-ref",
            ContextType::BlockContent => "block-content",
            ContextType::BlockArg => "block-arg",
            ContextType::Pragma => "pragma",
            ContextType::Format => "format",
            ContextType::TemplateFunc => "template-func",
            ContextType::InnerDest => "inner-dest",
            ContextType::InnerSrc => "inner-src",
            ContextType::ClientProto => "client-proto",
            ContextType::ServerProto => "server-proto",
        }
    }

    pub fn from_name(name: &str) -> Option<ContextType> {
        ContextType::ALL.iter().copied().find(|c| c.name() == name)
    }
}

/// Context name to print when no context is in effect.
pub(crate) fn context_name(ctx: Option<ContextType>) -> &'static str {
    ctx.map(ContextType::name).unwrap_or("configuration")
}

pub(crate) struct ContextFrame {
    pub ctx: Option<ContextType>,
    pub keywords: Option<KeywordTable>,
    pub desc: String,
}

/// LIFO of lexer contexts, pushed and popped by the grammar at
/// syntactic region boundaries.
pub struct ContextStack {
    frames: Vec<ContextFrame>,
}

impl ContextStack {
    pub fn new() -> ContextStack {
        ContextStack { frames: Vec::new() }
    }

    /// Push a context. Passing `None` for `ctx` inherits the current
    /// type, so the grammar can change the description without changing
    /// the lexing mode.
    pub fn push(&mut self, ctx: Option<ContextType>, keywords: Option<KeywordTable>, desc: &str) {
        let ctx = ctx.or_else(|| self.current_type());
        self.frames.push(ContextFrame {
            ctx,
            keywords,
            desc: desc.to_string(),
        });
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current_type(&self) -> Option<ContextType> {
        self.frames.last().and_then(|f| f.ctx)
    }

    pub fn current_description(&self) -> &str {
        self.frames
            .last()
            .map(|f| f.desc.as_str())
            .unwrap_or("configuration")
    }

    pub(crate) fn frames_top_down(&self) -> impl Iterator<Item = &ContextFrame> {
        self.frames.iter().rev()
    }
}

impl Default for ContextStack {
    fn default() -> Self {
        ContextStack::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_type_roundtrip() {
        for ctx in ContextType::ALL {
            assert_eq!(ContextType::from_name(ctx.name()), Some(ctx));
        }
        assert_eq!(ContextType::from_name("no-such-context"), None);
    }

    #[test]
    fn test_stack_defaults() {
        let stack = ContextStack::new();
        assert_eq!(stack.current_type(), None);
        assert_eq!(stack.current_description(), "configuration");
    }

    #[test]
    fn test_push_inherits_type() {
        let mut stack = ContextStack::new();
        stack.push(Some(ContextType::Source), None, "source statement");
        stack.push(None, None, "driver options");
        assert_eq!(stack.current_type(), Some(ContextType::Source));
        assert_eq!(stack.current_description(), "driver options");
        stack.pop();
        assert_eq!(stack.current_description(), "source statement");
        stack.pop();
        assert_eq!(stack.current_type(), None);
    }
}
