/// The role of one line inside an example's code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `> code`
    CodeStart,
    /// `...code`
    CodeContinuation,
    /// Anything else: the expected value.
    Expectation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub kind: LineKind,
    /// The line with its marker removed.
    pub text: String,
}

impl TranscriptLine {
    pub fn is_code(&self) -> bool {
        matches!(self.kind, LineKind::CodeStart | LineKind::CodeContinuation)
    }
}

/// Classify a single line. Looks at nothing but the line itself.
///
/// - `>` first: code start, the rest with leading whitespace removed
/// - `...` first: continuation, the rest kept verbatim
/// - otherwise: expectation, the line unchanged (so an empty line is one too)
pub fn classify(line: &str) -> TranscriptLine {
    if let Some(rest) = line.strip_prefix('>') {
        TranscriptLine {
            kind: LineKind::CodeStart,
            text: rest.trim_start().to_string(),
        }
    } else if let Some(rest) = line.strip_prefix("...") {
        TranscriptLine {
            kind: LineKind::CodeContinuation,
            text: rest.to_string(),
        }
    } else {
        TranscriptLine {
            kind: LineKind::Expectation,
            text: line.to_string(),
        }
    }
}
