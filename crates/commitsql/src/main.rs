//! commitsql CLI - SQL queries over Git commit history

use clap::{CommandFactory, Parser};
use commitsql::cli::{write_result, write_schema};
use commitsql::{Args, Command, GitRepo, ModuleOptions, SqlEngine};
use std::io::Write;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if let Some(Command::Schema) = args.command {
        write_schema(&mut out, args.format)?;
        return Ok(());
    }

    let Some(query) = args.query else {
        Args::command().print_help()?;
        return Ok(());
    };

    // Fail fast on a bad --repo instead of inside the first query
    let repo = GitRepo::open(&args.repo)?;
    tracing::debug!(repository = repo.path(), "using default repository");

    let options = ModuleOptions::new()
        .with_default_repository(repo.path())
        .with_skip_mailmap(args.skip_mailmap);
    let engine = SqlEngine::new(options)?;

    if args.explain {
        for line in engine.explain(&query)? {
            writeln!(out, "{line}")?;
        }
        return Ok(());
    }

    let result = engine.execute(&query)?;
    write_result(&mut out, &result, args.format, !args.no_header)?;

    Ok(())
}
