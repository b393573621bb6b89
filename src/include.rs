use std::collections::HashSet;
use std::fs;
use std::io::{Error as IoError, ErrorKind};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::token::Location;

/// Hard bound on include nesting, to stop runaway recursion.
pub const MAX_INCLUDE_DEPTH: usize = 16;

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Position {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl Position {
    fn start() -> Position {
        Position {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

#[derive(Debug)]
pub(crate) enum FrameKind {
    File {
        visited: HashSet<PathBuf>,
    },
    Buffer,
}

/// One level of the lexing input stack: a file or an in-memory buffer,
/// with the scanner position and the location of the last token.
#[derive(Debug)]
pub(crate) struct IncludeFrame {
    pub name: Arc<str>,
    pub kind: FrameKind,
    pub source: String,
    pub pos: Position,
    pub loc: Location,
}

impl IncludeFrame {
    pub fn buffer(name: &str, content: &str) -> IncludeFrame {
        let name: Arc<str> = Arc::from(name);
        IncludeFrame {
            name: name.clone(),
            kind: FrameKind::Buffer,
            source: content.to_string(),
            pos: Position::start(),
            loc: Location::start_of(name),
        }
    }

    fn file(path: PathBuf, source: String) -> IncludeFrame {
        let name: Arc<str> = Arc::from(path.to_string_lossy().as_ref());
        let mut visited = HashSet::new();
        visited.insert(path);
        IncludeFrame {
            name: name.clone(),
            kind: FrameKind::File { visited },
            source,
            pos: Position::start(),
            loc: Location::start_of(name),
        }
    }
}

/// Bounded stack of include frames. The top frame is the one being
/// scanned; EOF pops it and scanning resumes in the frame below.
pub(crate) struct IncludeStack {
    frames: Vec<IncludeFrame>,
    // location handed out once everything has been popped
    last_loc: Location,
}

impl IncludeStack {
    pub fn new() -> IncludeStack {
        IncludeStack {
            frames: Vec::new(),
            last_loc: Location::start_of(Arc::from("<none>")),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn top_mut(&mut self) -> Option<&mut IncludeFrame> {
        self.frames.last_mut()
    }

    /// Location of the last token scanned in the top frame.
    pub fn top_location(&self) -> Location {
        self.frames
            .last()
            .map(|f| f.loc.clone())
            .unwrap_or_else(|| self.last_loc.clone())
    }

    pub fn pop(&mut self) {
        if let Some(frame) = self.frames.pop() {
            self.last_loc = frame.loc;
        }
    }

    fn check_depth(&self) -> Result<()> {
        if self.frames.len() >= MAX_INCLUDE_DEPTH {
            return Err(Error::IncludeDepth {
                loc: self.top_location(),
                max: MAX_INCLUDE_DEPTH,
            });
        }
        Ok(())
    }

    pub fn push_file(&mut self, path: &str) -> Result<()> {
        self.check_depth()?;

        let canonical = fs::canonicalize(path).map_err(|e| Error::IncludeOpen {
            path: path.to_string(),
            loc: self.top_location(),
            source: e,
        })?;

        let already_open = self.frames.iter().any(|f| match &f.kind {
            FrameKind::File { visited } => visited.contains(&canonical),
            FrameKind::Buffer => false,
        });
        if already_open {
            return Err(Error::IncludeCycle {
                path: path.to_string(),
                loc: self.top_location(),
            });
        }

        let data = fs::read(&canonical).map_err(|e| Error::IncludeOpen {
            path: path.to_string(),
            loc: self.top_location(),
            source: e,
        })?;
        let source = String::from_utf8(data).map_err(|_| Error::IncludeOpen {
            path: path.to_string(),
            loc: self.top_location(),
            source: IoError::new(ErrorKind::InvalidData, "utf-8 error"),
        })?;

        log::debug!("including file; filename='{}'", canonical.display());
        self.frames.push(IncludeFrame::file(canonical, source));
        Ok(())
    }

    pub fn push_buffer(&mut self, name: &str, content: &str) -> Result<()> {
        self.check_depth()?;
        self.frames.push(IncludeFrame::buffer(name, content));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn scratch_file(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cfglex-include-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_push_buffer_and_pop() {
        let mut stack = IncludeStack::new();
        stack.push_buffer("main", "source s { };").unwrap();
        assert_eq!(stack.depth(), 1);
        assert_eq!(&*stack.top_location().name, "main");
        stack.pop();
        assert_eq!(stack.depth(), 0);
        // location survives the pop
        assert_eq!(&*stack.top_location().name, "main");
    }

    #[test]
    fn test_depth_overflow() {
        let mut stack = IncludeStack::new();
        for i in 0..MAX_INCLUDE_DEPTH {
            stack.push_buffer(&format!("buf{}", i), "").unwrap();
        }
        let err = stack.push_buffer("one-too-many", "").unwrap_err();
        assert!(matches!(err, Error::IncludeDepth { max, .. } if max == MAX_INCLUDE_DEPTH));
    }

    #[test]
    fn test_missing_file() {
        let mut stack = IncludeStack::new();
        let err = stack.push_file("/no/such/file.conf").unwrap_err();
        assert!(matches!(err, Error::IncludeOpen { .. }));
    }

    #[test]
    fn test_include_cycle() {
        let path = scratch_file("cycle.conf", "options { };\n");
        let path = path.to_str().unwrap();
        let mut stack = IncludeStack::new();
        stack.push_file(path).unwrap();
        let err = stack.push_file(path).unwrap_err();
        assert!(matches!(err, Error::IncludeCycle { .. }));
    }

    #[test]
    fn test_cycle_via_different_spelling() {
        let path = scratch_file("spelled.conf", "");
        let dir = path.parent().unwrap();
        let mut stack = IncludeStack::new();
        stack.push_file(path.to_str().unwrap()).unwrap();
        // same file reached through a dot segment
        let alias = dir.join(Path::new(".")).join("spelled.conf");
        let err = stack.push_file(alias.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::IncludeCycle { .. }));
    }
}
