use crate::classify::{LineKind, TranscriptLine};

/// One example: a description and the classified lines of the code block
/// that followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    /// Plain text of the markdown node before the code block; empty when the
    /// code block came first.
    pub description: String,
    pub lines: Vec<TranscriptLine>,
    /// 1-based source line where the code block starts.
    pub line: usize,
}

impl Example {
    pub fn new(description: impl Into<String>, lines: Vec<TranscriptLine>, line: usize) -> Self {
        Example {
            description: description.into(),
            lines,
            line,
        }
    }

    /// The code under test: every code line, each preceded by a line break,
    /// in order.
    pub fn code(&self) -> String {
        self.lines
            .iter()
            .filter(|line| line.is_code())
            .fold(String::new(), |mut code, line| {
                code.push('\n');
                code.push_str(&line.text);
                code
            })
    }

    /// The expected-value expression. When a block has several expectation
    /// lines the last one wins.
    pub fn expectation(&self) -> Option<&str> {
        self.lines
            .iter()
            .rev()
            .find(|line| line.kind == LineKind::Expectation)
            .map(|line| line.text.as_str())
    }

    /// The lines re-rendered with their markers, as a reader would type them.
    pub fn transcript(&self) -> String {
        self.lines
            .iter()
            .map(|line| match line.kind {
                LineKind::CodeStart => format!("> {}", line.text),
                LineKind::CodeContinuation => format!("...{}", line.text),
                LineKind::Expectation => line.text.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use pretty_assertions::assert_eq;

    fn example(lines: &[&str]) -> Example {
        Example::new("desc", lines.iter().map(|l| classify(l)).collect(), 1)
    }

    #[test]
    fn code_joins_start_and_continuation_lines() {
        let ex = example(&["> map(f,", "...   [1, 2])", "[2, 4]"]);
        assert_eq!(ex.code(), "\nmap(f,\n   [1, 2])");
    }

    #[test]
    fn several_statements_become_one_program() {
        let ex = example(&["> function f(n) { return n }", "> f(1)", "1"]);
        assert_eq!(ex.code(), "\nfunction f(n) { return n }\nf(1)");
    }

    #[test]
    fn last_expectation_line_wins() {
        let ex = example(&["> 1", "first", "> 2", "second"]);
        assert_eq!(ex.expectation(), Some("second"));
        assert_eq!(ex.code(), "\n1\n2");
    }

    #[test]
    fn no_expectation_lines() {
        let ex = example(&["> x = 1"]);
        assert_eq!(ex.expectation(), None);
    }

    #[test]
    fn transcript_round_trips_the_markers() {
        let lines = ["> add(1,", "... 2)", "3"];
        assert_eq!(example(&lines).transcript(), lines.join("\n"));
    }
}
