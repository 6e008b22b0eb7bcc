use script::Program;
use script::comment::Comment;
use script::parser::{ParseError, Parser};
use thiserror::Error;
use tracing::debug;

use crate::example::Example;
use crate::markdown::examples_in_markdown;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The source is not a valid script. Fatal for the whole file.
    #[error("{}", first_message(.0))]
    Parse(Vec<ParseError>),
}

fn first_message(errors: &[ParseError]) -> String {
    match errors {
        [] => "failed to parse source".to_string(),
        [only] => only.message.clone(),
        [first, rest @ ..] => format!("{} (and {} more)", first.message, rest.len()),
    }
}

/// Parse `source` and collect the examples of all its block comments, in
/// source order.
pub fn extract_examples(source: &str, file_id: usize) -> Result<Vec<Example>, ExtractError> {
    let program = Parser::new(source.to_string(), file_id)
        .parse()
        .map_err(ExtractError::Parse)?;
    Ok(examples_in_program(source, &program))
}

/// Examples of an already parsed program. `source` must be the text the
/// program was parsed from.
pub fn examples_in_program(source: &str, program: &Program) -> Vec<Example> {
    let mut examples = Vec::new();
    let mut comments = 0;

    for comment in program.block_comments() {
        comments += 1;
        examples.extend(examples_in_comment(source, comment));
    }

    debug!(
        comments,
        examples = examples.len(),
        "extracted examples from block comments"
    );
    examples
}

/// Examples of a single block comment.
pub fn examples_in_comment(source: &str, comment: &Comment) -> Vec<Example> {
    let first_line = line_of(source, comment.text_start());
    examples_in_markdown(&strip_decoration(&comment.text), first_line)
}

/// 1-based line number of a byte offset.
fn line_of(source: &str, offset: usize) -> usize {
    let offset = offset.min(source.len());
    source.as_bytes()[..offset]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

/// Remove `/** ... */` decoration: the extra `*`s that open the comment, and a
/// leading ` * ` on each following line when every non-blank line has one.
/// The number of lines never changes.
pub fn strip_decoration(text: &str) -> String {
    let mut lines = text.split('\n');
    let first = lines.next().unwrap_or("").trim_start_matches('*');
    let rest: Vec<&str> = lines.collect();

    let decorated = rest.iter().any(|l| !l.trim().is_empty())
        && rest
            .iter()
            .filter(|l| !l.trim().is_empty())
            .all(|l| l.trim_start().starts_with('*'));

    let mut out = String::from(first);
    for line in rest {
        out.push('\n');
        if decorated {
            out.push_str(strip_star(line));
        } else {
            out.push_str(line);
        }
    }
    out
}

fn strip_star(line: &str) -> &str {
    match line.trim_start().strip_prefix('*') {
        Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
        // A blank line in a decorated comment.
        None => "",
    }
}
