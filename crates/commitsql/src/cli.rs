//! Command line interface: arguments and result rendering.

use crate::error::Result;
use crate::sql::QueryResult;
use crate::vtab::{COLUMNS, SCHEMA};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use tabled::builder::Builder;
use tabled::settings::Style;

const AFTER_HELP: &str = r#"EXAMPLES:
  commitsql "SELECT hash, author_name, committer_when FROM commits LIMIT 10"
  commitsql "SELECT author_email, COUNT(*) AS n FROM commits GROUP BY 1 ORDER BY n DESC"
  commitsql "SELECT * FROM commits WHERE committer_when > '2024-01-01T00:00:00Z'"
  commitsql "SELECT hash FROM commits('/path/to/repo', 'v1.0')"
  commitsql schema"#;

/// SQL query engine for Git commit history
#[derive(Parser, Debug)]
#[command(name = "commitsql", version, after_help = AFTER_HELP)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// SQL query to execute
    #[arg(value_name = "QUERY")]
    pub query: Option<String>,

    /// Git repository path (defaults to current directory)
    #[arg(short = 'r', long = "repo", env = "COMMITSQL_REPO", default_value = ".")]
    pub repo: PathBuf,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Omit header row
    #[arg(short = 'H', long = "no-header")]
    pub no_header: bool,

    /// Report raw author/committer identities, ignoring .mailmap
    #[arg(long, env = "COMMITSQL_SKIP_MAILMAP")]
    pub skip_mailmap: bool,

    /// Print SQLite's query plan instead of running the query
    #[arg(long)]
    pub explain: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the schema of the commits table
    Schema,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Jsonl,
    Csv,
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Writes `result` to `out` in the requested format.
pub fn write_result<W: Write>(
    out: &mut W,
    result: &QueryResult,
    format: OutputFormat,
    header: bool,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &result.to_json_array())?;
            writeln!(out)?;
        }
        OutputFormat::Jsonl => {
            for row in result.to_json_array() {
                serde_json::to_writer(&mut *out, &row)?;
                writeln!(out)?;
            }
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(&mut *out);
            if header {
                writer.write_record(&result.columns)?;
            }
            for row in &result.rows {
                writer.write_record(row.iter().map(cell_text))?;
            }
            writer.flush()?;
        }
        OutputFormat::Table => {
            if result.is_empty() {
                writeln!(out, "No results")?;
                return Ok(());
            }
            let mut builder = Builder::default();
            if header {
                builder.push_record(result.columns.iter().cloned());
            }
            for row in &result.rows {
                builder.push_record(row.iter().map(cell_text));
            }
            let mut table = builder.build();
            table.with(Style::psql());
            writeln!(out, "{table}")?;
        }
    }
    Ok(())
}

/// Writes the table DDL followed by one line per column.
pub fn write_schema<W: Write>(out: &mut W, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            serde_json::to_writer_pretty(&mut *out, COLUMNS)?;
            writeln!(out)?;
        }
        OutputFormat::Table | OutputFormat::Csv => {
            writeln!(out, "{SCHEMA}")?;
            writeln!(out)?;
            for col in COLUMNS {
                let kind = if col.hidden { "HIDDEN" } else { col.sql_type };
                writeln!(out, "  {:<16} {:<9} {}", col.name, kind, col.description)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> QueryResult {
        QueryResult {
            columns: vec!["hash".to_string(), "parents".to_string()],
            rows: vec![
                vec![json!("abc"), json!(1)],
                vec![json!("d,ef"), Value::Null],
            ],
        }
    }

    fn render(format: OutputFormat, header: bool) -> String {
        let mut out = Vec::new();
        write_result(&mut out, &sample(), format, header).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_csv_quotes_and_header() {
        assert_eq!(render(OutputFormat::Csv, true), "hash,parents\nabc,1\n\"d,ef\",\n");
        assert_eq!(render(OutputFormat::Csv, false), "abc,1\n\"d,ef\",\n");
    }

    #[test]
    fn test_jsonl_one_object_per_line() {
        let text = render(OutputFormat::Jsonl, true);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["hash"], "abc");
        assert_eq!(first["parents"], 1);
    }

    #[test]
    fn test_table_output() {
        let text = render(OutputFormat::Table, true);
        assert!(text.contains("hash"));
        assert!(text.contains("d,ef"));

        let empty = QueryResult {
            columns: vec!["hash".to_string()],
            rows: vec![],
        };
        let mut out = Vec::new();
        write_result(&mut out, &empty, OutputFormat::Table, true).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No results\n");
    }

    #[test]
    fn test_schema_lists_hidden_columns() {
        let mut out = Vec::new();
        write_schema(&mut out, OutputFormat::Table).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("WITHOUT ROWID"));
        assert!(text.contains("repository"));
        assert!(text.contains("HIDDEN"));
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from([
            "commitsql",
            "--repo",
            "/tmp/x",
            "-f",
            "csv",
            "--skip-mailmap",
            "SELECT 1",
        ]);
        assert_eq!(args.repo, PathBuf::from("/tmp/x"));
        assert_eq!(args.format, OutputFormat::Csv);
        assert!(args.skip_mailmap);
        assert_eq!(args.query.as_deref(), Some("SELECT 1"));

        let args = Args::parse_from(["commitsql", "schema"]);
        assert_eq!(args.command, Some(Command::Schema));
        assert_eq!(args.query, None);
    }
}
