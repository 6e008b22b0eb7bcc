//! Extract REPL-transcript examples from the block comments of a script and
//! check that each one evaluates to the value it claims.

pub mod classify;
pub mod example;
pub mod extract;
pub mod markdown;
pub mod report;
pub mod runner;

pub use classify::{LineKind, TranscriptLine, classify};
pub use example::Example;
pub use extract::{ExtractError, extract_examples};
pub use report::Reporter;
pub use runner::{EvaluationResult, Failure, Isolation, Outcome, RunOptions, Runner, run};
