use std::fmt;
use std::io;

use interpreter::{Inspect, Render, RuntimeError, Session};
use script::Program;
use script::parser::Parser;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::example::Example;
use crate::report::indent;

/// How examples share evaluation state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Isolation {
    /// One session for the whole run. The library is loaded again before each
    /// example, but globals an example defines stay visible to later ones.
    #[default]
    Shared,
    /// A new session per example, dropped once the example is done.
    Fresh,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub isolation: Isolation,
    /// Nested call limit inside a session.
    pub max_depth: usize,
    /// Send `print` output to stderr instead of discarding it.
    pub echo_prints: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            isolation: Isolation::Shared,
            max_depth: interpreter::context::DEFAULT_MAX_DEPTH,
            echo_prints: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Why an example failed. Each variant stops the example at that phase.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    LibraryLoad {
        label: String,
        error: RuntimeError,
    },
    CodeEvaluation {
        code: String,
        error: RuntimeError,
    },
    ExpectationEvaluation {
        expectation: String,
        error: RuntimeError,
    },
    /// Both sides evaluated but render differently.
    Mismatch {
        expected: String,
        got: String,
    },
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::LibraryLoad { label, error } => write!(
                f,
                "error while evaluating library code ({})\n{}: {}",
                label,
                error.name(),
                error
            ),
            Failure::CodeEvaluation { code, error } => write!(
                f,
                "error while evaluating test code:\n{}\n{}: {}",
                indent(code.trim_start_matches('\n'), 1),
                error.name(),
                error
            ),
            Failure::ExpectationEvaluation { expectation, error } => write!(
                f,
                "error while evaluating expectation:\n{}\n{}: {}",
                indent(expectation, 1),
                error.name(),
                error
            ),
            Failure::Mismatch { expected, got } => write!(
                f,
                "expected:\n{}\ngot:\n{}",
                indent(expected, 1),
                indent(got, 1)
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Pass,
    Fail(Failure),
}

/// The verdict for one example.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub description: String,
    /// Source line of the example's code block.
    pub line: usize,
    /// Label of the file the example came from.
    pub label: String,
    pub outcome: Outcome,
}

impl EvaluationResult {
    pub fn passed(&self) -> bool {
        matches!(self.outcome, Outcome::Pass)
    }

    /// Human-readable detail for a failure, ending with the example's location.
    pub fn diagnostic(&self) -> Option<String> {
        match &self.outcome {
            Outcome::Pass => None,
            Outcome::Fail(failure) => Some(format!("{}\nat {}:{}", failure, self.label, self.line)),
        }
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Evaluates examples against a library, one at a time, in order.
pub struct Runner {
    /// Parsed once; a syntax error fails every example at the load phase.
    library: Result<Program, RuntimeError>,
    label: String,
    options: RunOptions,
    renderer: Box<dyn Render>,
}

impl Runner {
    pub fn new(library: impl Into<String>, label: impl Into<String>) -> Self {
        let library = Parser::new(library.into(), 0).parse().map_err(|errors| {
            RuntimeError::Syntax(
                errors
                    .first()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "invalid syntax".to_string()),
            )
        });
        Runner {
            library,
            label: label.into(),
            options: RunOptions::default(),
            renderer: Box::new(Inspect),
        }
    }

    /// Use an already parsed library, e.g. the program the examples came from.
    pub fn from_program(library: Program, label: impl Into<String>) -> Self {
        Runner {
            library: Ok(library),
            label: label.into(),
            options: RunOptions::default(),
            renderer: Box::new(Inspect),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the canonical representation used to compare values.
    pub fn with_renderer(mut self, renderer: impl Render + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// A lazy iterator that evaluates one example per `next()`.
    pub fn results<'a>(&'a self, examples: &'a [Example]) -> Results<'a> {
        Results {
            runner: self,
            examples: examples.iter(),
            shared: None,
        }
    }

    pub fn run(&self, examples: &[Example]) -> Vec<EvaluationResult> {
        self.results(examples).collect()
    }

    fn session(&self) -> Session {
        let output: Box<dyn io::Write> = if self.options.echo_prints {
            Box::new(io::stderr())
        } else {
            Box::new(io::sink())
        };
        Session::with_output(output).with_max_depth(self.options.max_depth)
    }

    fn evaluate(&self, session: &mut Session, example: &Example) -> EvaluationResult {
        debug!(line = example.line, description = %example.description, "evaluating example");
        let outcome = match self.check(session, example) {
            Ok(()) => Outcome::Pass,
            Err(failure) => {
                debug!(line = example.line, %failure, "example failed");
                Outcome::Fail(failure)
            }
        };
        EvaluationResult {
            description: example.description.clone(),
            line: example.line,
            label: self.label.clone(),
            outcome,
        }
    }

    fn check(&self, session: &mut Session, example: &Example) -> Result<(), Failure> {
        let library_load = |error| Failure::LibraryLoad {
            label: self.label.clone(),
            error,
        };
        let program = self.library.as_ref().map_err(|e| library_load(e.clone()))?;
        session.load(program).map_err(library_load)?;
        trace!("library loaded");

        let code = example.code();
        let got = session
            .eval(&code)
            .map_err(|error| Failure::CodeEvaluation {
                code: code.clone(),
                error,
            })?;
        trace!("code evaluated");

        let expectation = example.expectation().unwrap_or("");
        let expected = session
            .eval_expression(expectation)
            .map_err(|error| Failure::ExpectationEvaluation {
                expectation: expectation.to_string(),
                error,
            })?;

        let expected = self.renderer.render(&expected);
        let got = self.renderer.render(&got);
        if expected == got {
            Ok(())
        } else {
            Err(Failure::Mismatch { expected, got })
        }
    }
}

/// Evaluate `examples` against `library` with the default options.
pub fn run(examples: &[Example], library: &str, label: &str) -> Vec<EvaluationResult> {
    Runner::new(library, label).run(examples)
}

/// Streaming results of [`Runner::results`].
pub struct Results<'a> {
    runner: &'a Runner,
    examples: std::slice::Iter<'a, Example>,
    /// Created on first use under [`Isolation::Shared`].
    shared: Option<Session>,
}

impl Iterator for Results<'_> {
    type Item = EvaluationResult;

    fn next(&mut self) -> Option<EvaluationResult> {
        let example = self.examples.next()?;
        let result = match self.runner.options.isolation {
            Isolation::Shared => {
                let runner = self.runner;
                let session = self.shared.get_or_insert_with(|| runner.session());
                runner.evaluate(session, example)
            }
            Isolation::Fresh => {
                let mut session = self.runner.session();
                self.runner.evaluate(&mut session, example)
            }
        };
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.examples.size_hint()
    }
}

impl ExactSizeIterator for Results<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use pretty_assertions::assert_eq;

    fn example(description: &str, lines: &[&str]) -> Example {
        Example::new(description, lines.iter().map(|l| classify(l)).collect(), 3)
    }

    fn quiet(library: &str) -> Runner {
        Runner::new(library, "lib.js").with_options(RunOptions {
            echo_prints: false,
            max_depth: 50,
            ..RunOptions::default()
        })
    }

    #[test]
    fn matching_values_pass() {
        let results = quiet("function add(x, y) { return x + y }")
            .run(&[example("adds", &["> add(1, 2)", "3"])]);
        assert_eq!(results[0].outcome, Outcome::Pass);
        assert_eq!(results[0].diagnostic(), None);
    }

    #[test]
    fn mismatch_reports_both_renderings() {
        let results = quiet("").run(&[example("strings", &["> 'a' + 'b'", "'abc'"])]);
        assert_eq!(
            results[0].outcome,
            Outcome::Fail(Failure::Mismatch {
                expected: "'abc'".to_string(),
                got: "'ab'".to_string(),
            })
        );
        assert_eq!(
            results[0].diagnostic().as_deref(),
            Some("expected:\n    'abc'\ngot:\n    'ab'\nat lib.js:3")
        );
    }

    #[test]
    fn code_errors_stop_before_the_expectation() {
        let results = quiet("").run(&[example("boom", &["> missing()", "nope()"])]);
        assert_eq!(
            results[0].diagnostic().as_deref(),
            Some(
                "error while evaluating test code:\n    missing()\nReferenceError: missing is not defined\nat lib.js:3"
            )
        );
    }

    #[test]
    fn expectation_errors() {
        let results = quiet("").run(&[example("bad", &["> 1", "1 +"])]);
        let Outcome::Fail(Failure::ExpectationEvaluation { expectation, error }) = &results[0].outcome else {
            panic!("unexpected outcome {:?}", results[0].outcome);
        };
        assert_eq!(expectation, "1 +");
        assert_eq!(error.name(), "SyntaxError");
    }

    #[test]
    fn missing_expectation_means_undefined() {
        let results = quiet("").run(&[
            example("declaration", &["> var x = 1"]),
            example("value", &["> 1"]),
        ]);
        assert!(results[0].passed());
        assert!(!results[1].passed());
    }

    #[test]
    fn library_errors_fail_every_example() {
        let results = quiet("throw Error('broken')").run(&[
            example("one", &["> 1", "1"]),
            example("two", &["> 2", "2"]),
        ]);
        for result in &results {
            assert_eq!(
                result.diagnostic().as_deref(),
                Some("error while evaluating library code (lib.js)\nError: broken\nat lib.js:3")
            );
        }
    }

    #[test]
    fn library_is_reloaded_before_each_example() {
        let results = quiet("var count = 0").run(&[
            example("bump", &["> count += 1", "1"]),
            example("again", &["> count += 1", "1"]),
        ]);
        assert!(results.iter().all(EvaluationResult::passed));
    }

    #[test]
    fn custom_renderer() {
        let runner = quiet("").with_renderer(|_: &interpreter::RuntimeValue| "same".to_string());
        let results = runner.run(&[example("anything", &["> 1", "2"])]);
        assert!(results[0].passed());
    }

    #[test]
    fn results_are_lazy_and_sized() {
        let runner = quiet("");
        let examples = vec![example("a", &["> 1", "1"]), example("b", &["> 2", "2"])];
        let mut results = runner.results(&examples);
        assert_eq!(results.len(), 2);
        assert_eq!(results.next().map(|r| r.description), Some("a".to_string()));
        assert_eq!(results.len(), 1);
    }
}
