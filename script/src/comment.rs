use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// `/* ... */`
    Block,
    /// `// ...`
    Line,
}

/// A comment as found by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub kind: CommentKind,
    /// The comment body with its delimiters removed.
    pub text: String,
    /// Byte span of the whole comment, delimiters included.
    pub span: Range<usize>,
}

impl Comment {
    pub fn is_block(&self) -> bool {
        self.kind == CommentKind::Block
    }

    /// Byte offset in the source where `text` begins.
    pub fn text_start(&self) -> usize {
        self.span.start + 2
    }
}
