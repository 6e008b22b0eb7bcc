use std::io::{self, Write};

use crate::runner::EvaluationResult;

const INDENT: &str = "    ";

/// Prefix every line of `text` with `levels` indentation units.
pub fn indent(text: &str, levels: usize) -> String {
    let pad = INDENT.repeat(levels);
    text.split('\n')
        .map(|line| format!("{}{}", pad, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Writes results in TAP form as they arrive.
///
/// ```text
/// 1..2
/// ok adds numbers
/// not ok joins strings
///     expected:
///         'abc'
///     ...
/// ```
pub struct Reporter<W: Write> {
    out: W,
    failures: usize,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Reporter { out, failures: 0 }
    }

    /// The plan line, `1..N`.
    pub fn plan(&mut self, count: usize) -> io::Result<()> {
        writeln!(self.out, "1..{}", count)?;
        self.out.flush()
    }

    /// One result line, plus the indented diagnostic when it failed. Flushed
    /// immediately so results stream.
    pub fn report(&mut self, result: &EvaluationResult) -> io::Result<()> {
        let status = if result.passed() { "ok" } else { "not ok" };
        let description = one_line(&result.description);
        if description.is_empty() {
            writeln!(self.out, "{}", status)?;
        } else {
            writeln!(self.out, "{} {}", status, description)?;
        }

        if let Some(diagnostic) = result.diagnostic() {
            self.failures += 1;
            writeln!(self.out, "{}", indent(&diagnostic, 1))?;
        }
        self.out.flush()
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Flush everything written so far, then give the exit status: 0 when
    /// every example passed, 1 otherwise.
    pub fn finish(mut self) -> io::Result<i32> {
        self.out.flush()?;
        Ok(if self.failures == 0 { 0 } else { 1 })
    }
}

/// Collapse runs of whitespace, line breaks included, into single spaces.
pub fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{Failure, Outcome};
    use pretty_assertions::assert_eq;

    fn result(description: &str, outcome: Outcome) -> EvaluationResult {
        EvaluationResult {
            description: description.to_string(),
            line: 7,
            label: "lib.js".to_string(),
            outcome,
        }
    }

    #[test]
    fn indents_every_line() {
        assert_eq!(indent("a\nb", 1), "    a\n    b");
        assert_eq!(indent("a", 2), "        a");
        assert_eq!(indent("a\n\nb", 1), "    a\n    \n    b");
    }

    #[test]
    fn passing_run() {
        let mut buf = Vec::new();
        let mut reporter = Reporter::new(&mut buf);
        reporter.plan(1).expect("write");
        reporter
            .report(&result("adds\n  two numbers ", Outcome::Pass))
            .expect("write");
        assert_eq!(reporter.finish().expect("flush"), 0);
        assert_eq!(String::from_utf8(buf).expect("utf-8"), "1..1\nok adds two numbers\n");
    }

    #[test]
    fn failures_carry_indented_diagnostics() {
        let mut buf = Vec::new();
        let mut reporter = Reporter::new(&mut buf);
        reporter.plan(2).expect("write");
        reporter.report(&result("first", Outcome::Pass)).expect("write");
        reporter
            .report(&result(
                "second",
                Outcome::Fail(Failure::Mismatch {
                    expected: "3".to_string(),
                    got: "4".to_string(),
                }),
            ))
            .expect("write");
        assert_eq!(reporter.failures(), 1);
        assert_eq!(reporter.finish().expect("flush"), 1);
        assert_eq!(
            String::from_utf8(buf).expect("utf-8"),
            "1..2\nok first\nnot ok second\n    expected:\n        3\n    got:\n        4\n    at lib.js:7\n"
        );
    }

    #[test]
    fn empty_plan_and_blank_description() {
        let mut buf = Vec::new();
        let mut reporter = Reporter::new(&mut buf);
        reporter.plan(0).expect("write");
        reporter.report(&result("", Outcome::Pass)).expect("write");
        assert_eq!(reporter.finish().expect("flush"), 0);
        assert_eq!(String::from_utf8(buf).expect("utf-8"), "1..0\nok\n");
    }
}
