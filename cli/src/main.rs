mod config;

use std::io;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::info;

use script::parser::ParseError;
use transcript::extract::{examples_in_program, strip_decoration};
use transcript::report::{indent, one_line};
use transcript::{Example, Isolation, Reporter, Runner, markdown};

use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "transcript",
    version,
    about = "Check the REPL examples in a script's doc comments"
)]
struct Cli {
    /// Script whose block comments hold the examples
    file: Option<PathBuf>,

    /// List the examples instead of running them
    #[arg(long)]
    list: bool,

    /// Print each block comment rendered as HTML
    #[arg(long, conflicts_with = "list")]
    html: bool,

    /// Run every example in a fresh session
    #[arg(long)]
    isolate: bool,

    /// Config file (default: transcript.toml next to FILE)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable colored error output
    #[arg(long)]
    no_color: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(status) => process::exit(status),
        Err(error) => {
            eprintln!("transcript error: {error:#}");
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    init_tracing(cli.verbose)?;

    let Some(path) = cli.file.as_deref() else {
        println!("usage: transcript <file>");
        return Ok(0);
    };

    let source = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read '{}'", path.display()))?;
    let label = path.display().to_string();

    let mut files = SimpleFiles::new();
    let file_id = files.add(label.clone(), source.clone());

    let program = match script::parser::Parser::new(source.clone(), file_id).parse() {
        Ok(program) => program,
        Err(errors) => {
            emit_parse_errors(&files, &errors, cli.no_color)?;
            return Ok(1);
        }
    };

    if cli.html {
        for comment in program.block_comments() {
            print!("{}", markdown::to_html(&strip_decoration(&comment.text)));
        }
        return Ok(0);
    }

    let examples = examples_in_program(&source, &program);
    if cli.list {
        list(&label, &examples);
        return Ok(0);
    }

    let config = Config::load(cli.config.as_deref(), path)?;
    let mut options = config.run_options();
    if cli.isolate {
        options.isolation = Isolation::Fresh;
    }
    info!(file = %label, examples = examples.len(), isolation = ?options.isolation, "running examples");

    let runner = Runner::from_program(program, label).with_options(options);
    let stdout = io::stdout();
    let mut reporter = Reporter::new(stdout.lock());
    reporter.plan(examples.len()).context("cannot write results")?;
    for result in runner.results(&examples) {
        reporter.report(&result).context("cannot write results")?;
    }
    reporter.finish().context("cannot write results")
}

fn list(label: &str, examples: &[Example]) {
    for example in examples {
        println!("{}:{} {}", label, example.line, one_line(&example.description));
        println!("{}", indent(&example.transcript(), 1));
    }
}

fn emit_parse_errors(
    files: &SimpleFiles<String, String>,
    errors: &[ParseError],
    no_color: bool,
) -> anyhow::Result<()> {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    for error in errors {
        term::emit_to_write_style(&mut writer.lock(), &config, files, &error.to_diagnostic())
            .context("cannot write diagnostic")?;
    }
    Ok(())
}

/// Logs go to stderr so stdout carries nothing but results.
fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { "warn" };

    let filter = tracing_subscriber::EnvFilter::try_from_env("TRANSCRIPT_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn arguments_are_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn list_and_html_conflict() {
        assert!(Cli::try_parse_from(["transcript", "--list", "--html", "x.js"]).is_err());
    }

    #[test]
    fn file_is_optional() {
        let cli = Cli::try_parse_from(["transcript"]).expect("parse");
        assert!(cli.file.is_none());
    }
}
