//! sqlweave: compile and run JSON query documents.
//!
//! # Usage
//!
//! ```bash
//! # Show the SQL for a document
//! sqlweave '{"from": "users", "where": {"active": true}}' --dry-run
//!
//! # Read the document from a file and execute it
//! sqlweave query.json --database-url sqlite://app.db
//!
//! # With parameters
//! sqlweave '{"from": "users", "where": ["=", "id", ":id"]}' --bind id=42
//! ```

use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use sqlweave::ast::operators;
use sqlweave::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlweave")]
#[command(version)]
#[command(about = "Compile JSON query documents into dialect-correct SQL", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqlweave '{\"from\": \"users\", \"where\": {\"active\": true}}'
    sqlweave report.json --dialect mysql --dry-run
    sqlweave '{\"type\": \"delete\", \"from\": \"sessions\", \"where\": [\"<\", \"seen\", \":cutoff\"]}' --bind cutoff=2024-01-01")]
struct Cli {
    /// Query document: inline JSON, a file path, or `-` for stdin
    query: Option<String>,

    /// Don't execute, just show the generated SQL
    #[arg(short, long)]
    dry_run: bool,

    /// Dialect for dry runs (postgres, mysql, sqlite)
    #[arg(long)]
    dialect: Option<Dialect>,

    /// Parameter bindings: `name=value`, or a bare value for the next `?`
    #[arg(short, long, value_delimiter = ',')]
    bind: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Database connection URL
    #[arg(long, env = "SQLWEAVE_DATABASE_URL")]
    database_url: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how a document compiles in every dialect
    Explain {
        /// Query document: inline JSON, a file path, or `-` for stdin
        query: String,
    },
    /// Show the operator table
    Operators,
}

fn main() {
    let cli = Cli::parse();
    let config = match WeaveConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    init_logging(&config, cli.verbose);

    let result = match &cli.command {
        Some(Commands::Explain { query }) => explain_query(query),
        Some(Commands::Operators) => {
            show_operators();
            Ok(())
        }
        None => match &cli.query {
            Some(query) => run(query, &cli, &config),
            None => {
                println!("{}", "sqlweave: relational query compiler".cyan().bold());
                println!();
                println!("Usage: sqlweave <QUERY> [OPTIONS]");
                println!();
                println!("Try: sqlweave --help");
                Ok(())
            }
        },
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(config: &WeaveConfig, verbose: bool) {
    let default = if verbose { "sqlweave=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("SQLWEAVE_LOG")
        .ok()
        .or_else(|| config.log.as_deref().and_then(|d| EnvFilter::try_new(d).ok()))
        .unwrap_or_else(|| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_document(source: &str) -> Result<String> {
    let trimmed = source.trim_start();
    if trimmed.starts_with('{') {
        return Ok(source.to_string());
    }
    if source == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(source).with_context(|| format!("cannot read query document '{}'", source))
}

fn run(source: &str, cli: &Cli, config: &WeaveConfig) -> Result<()> {
    let text = read_document(source)?;
    let url = cli.database_url.clone().or_else(|| config.database_url.clone());
    let dialect = cli
        .dialect
        .unwrap_or_else(|| config.effective_dialect(url.as_deref()));

    let mut query = sqlweave::parse(&text, dialect)?;
    apply_bindings(&mut query, &cli.bind)?;

    if cli.verbose {
        println!("{} {}", "Dialect:".dimmed(), dialect.to_string().yellow());
    }

    let url = match url {
        Some(url) if !cli.dry_run => url,
        _ => {
            print_compiled(&query.compile()?);
            if !cli.dry_run {
                println!();
                println!(
                    "{}",
                    "⚠ No database URL. Use --database-url or set SQLWEAVE_DATABASE_URL".yellow()
                );
            }
            return Ok(());
        }
    };

    if cli.verbose {
        println!("{} {}", "Connecting to:".dimmed(), url);
    }
    let connection: Arc<dyn Connection> = Arc::new(SqlxConnection::connect(&url)?);
    query.connect(connection);

    if cli.verbose {
        println!("{} {}", "SQL:".dimmed(), query.sql()?.white());
    }

    match query.kind() {
        StatementKind::Select => {
            let rows = query.all()?;
            format_output(&rows, &cli.format);
        }
        _ => {
            let affected = query.execute()?;
            println!("{} {} rows affected", "✓".green(), affected);
        }
    }
    Ok(())
}

/// `name=value` binds `:name`; a bare value binds the next `?` by position.
fn apply_bindings(query: &mut Query, bindings: &[String]) -> Result<()> {
    let mut position = 0;
    for binding in bindings {
        let (name, raw) = match binding.split_once('=') {
            Some((name, raw)) => (name.trim().to_string(), raw),
            None => {
                position += 1;
                (position.to_string(), binding.as_str())
            }
        };
        if name.is_empty() {
            bail!("binding '{}' has no parameter name", binding);
        }
        query.bind(name, parse_binding(raw));
    }
    Ok(())
}

fn parse_binding(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        Value::Int(n)
    } else if let Ok(f) = raw.parse::<f64>() {
        Value::Float(f)
    } else if raw == "true" {
        Value::Bool(true)
    } else if raw == "false" {
        Value::Bool(false)
    } else if raw.eq_ignore_ascii_case("null") {
        Value::Null
    } else {
        Value::String(raw.to_string())
    }
}

fn print_compiled(compiled: &Compiled) {
    println!("{}", "Generated SQL:".green().bold());
    println!("{}", compiled.sql.white());

    if !compiled.params.is_empty() {
        println!();
        println!("{}", "Parameters:".cyan());
        for (name, value) in compiled.params.iter() {
            println!("  :{} = {}", name, value.to_string().yellow());
        }
    }
}

fn format_output(rows: &[Row], format: &OutputFormat) {
    if rows.is_empty() {
        println!("{}", "(no results)".dimmed());
        return;
    }

    match format {
        OutputFormat::Json => {
            let json: Vec<serde_json::Value> = rows.iter().map(Row::to_json).collect();
            println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        }
        OutputFormat::Table => {
            let columns = rows[0].columns();
            let cells: Vec<Vec<String>> = rows
                .iter()
                .map(|row| row.values().iter().map(cell).collect())
                .collect();

            let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
            for row in &cells {
                for (width, value) in widths.iter_mut().zip(row) {
                    *width = (*width).max(value.chars().count());
                }
            }

            let header: Vec<String> = columns
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:width$}", c, width = *w))
                .collect();
            println!("{}", header.join(" │ ").white().bold());

            let sep: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
            println!("{}", sep.join("─┼─").dimmed());

            for row in &cells {
                let line: Vec<String> = row
                    .iter()
                    .zip(&widths)
                    .map(|(v, w)| format!("{:width$}", v, width = *w))
                    .collect();
                println!("{}", line.join(" │ "));
            }

            println!();
            println!("{} row(s) returned", rows.len().to_string().cyan());
        }
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn explain_query(source: &str) -> Result<()> {
    let text = read_document(source)?;
    println!("{}", "sqlweave Query Explanation".cyan().bold());

    for dialect in Dialect::all() {
        println!();
        println!("{} {}", "Dialect:".dimmed(), dialect.to_string().yellow().bold());
        let query = match sqlweave::parse(&text, dialect) {
            Ok(query) => query,
            Err(e) => {
                println!("  {} {}", "Document Error:".red().bold(), e);
                return Ok(());
            }
        };
        let compiled = match query.compile() {
            Ok(compiled) => compiled,
            Err(e) => {
                println!("  {} {}", "Build Error:".red().bold(), e);
                continue;
            }
        };

        println!("  {} {}", "Kind:".dimmed(), query.kind().to_string().cyan());
        println!("  {} {}", "SQL:".dimmed(), compiled.sql.white());
        let statement = Statement::prepare(&compiled.sql, query.generator());
        if !statement.names().is_empty() {
            println!("  {} {}", "Driver SQL:".dimmed(), statement.sql().white());
            println!("  {}", "Placeholders:".dimmed());
            for (i, name) in statement.names().iter().enumerate() {
                let value = compiled
                    .params
                    .get(name)
                    .map(|v| v.to_string().yellow())
                    .unwrap_or_else(|| "(unbound)".red());
                println!("    {} :{} = {}", i + 1, name, value);
            }
        }
    }
    Ok(())
}

fn show_operators() {
    println!("{}", "sqlweave Operator Reference".cyan().bold());
    println!("{}", "Ranked from tightest to loosest binding.".dimmed());
    println!();

    let generators: Vec<_> = Dialect::all().iter().map(Dialect::generator).collect();

    println!(
        "{:5} {:22} {:15} {:14} {:14} {}",
        "Rank".white().bold(),
        "Operator".white().bold(),
        "Arity".white().bold(),
        "postgres".white().bold(),
        "mysql".white().bold(),
        "sqlite".white().bold()
    );
    println!("{}", "─".repeat(84).dimmed());

    for spec in operators::all() {
        let spellings: Vec<String> = generators
            .iter()
            .map(|g| match g.operator_name(spec.name) {
                Some(name) => name.to_string(),
                None => "-".to_string(),
            })
            .collect();
        println!(
            "{:5} {:22} {:15} {:14} {:14} {}",
            spec.rank.to_string().dimmed(),
            spec.name.cyan().bold(),
            spec.arity.to_string().yellow(),
            spellings[0],
            spellings[1],
            spellings[2]
        );
    }
}
