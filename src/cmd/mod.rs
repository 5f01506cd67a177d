//! Command-line interface and run orchestration.

use crate::graph::{select, to_dot, Expansion, RenderMode, TableFilter};
use crate::metadata::{DatabaseType, MetadataSource, PostgresSource, SchemaSnapshot};
use ahash::AHashSet;
use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dbgraph")]
#[command(version)]
#[command(
    about = "Build a relationship diagram of a relational database",
    long_about = "Build a relationship diagram of a relational database.\n\
        Produces a GraphViz file (.gv); render it with dot to view the actual diagram."
)]
pub struct Cli {
    /// Database engine type (postgres)
    pub database_type: DatabaseType,

    /// Database server host name
    pub host_name: String,

    /// Source database name
    pub database_name: String,

    /// Login name
    pub login_name: String,

    /// Password for the login name (prompted when not provided)
    #[arg(short, long)]
    pub password: Option<String>,

    /// Write output to this file instead of standard output
    #[arg(short = 'f', long = "file")]
    pub output_file: Option<PathBuf>,

    /// Comma separated (no spaces) list of schemas to include.
    /// If not provided, all schemas will be processed.
    #[arg(short, long, value_delimiter = ',')]
    pub schemas: Vec<String>,

    /// Comma separated (no spaces) list of table names ([<schema>.]<table>) to include
    #[arg(short, long, value_delimiter = ',')]
    pub tables: Vec<String>,

    /// Also display first relationships of the selected tables
    #[arg(short = '1', long = "first-relationships")]
    pub first_relationships: bool,

    /// Also display first and second relationships of the selected tables
    #[arg(short = '2', long = "second-relationships")]
    pub second_relationships: bool,

    /// Table names only, no column information
    #[arg(short = 'n', long = "names-only")]
    pub names_only: bool,
}

pub fn run(cli: Cli) -> Result<()> {
    let password = match cli.password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ").context("error reading password")?,
    };

    // Open the sink before touching the database so a bad path fails fast
    let mut sink = match &cli.output_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("error opening file {}", path.display()))?;
            Some((path, file))
        }
        None => None,
    };

    let mut source = match cli.database_type {
        DatabaseType::Postgres => PostgresSource::connect(
            &cli.host_name,
            &cli.database_name,
            &cli.login_name,
            &password,
        )?,
    };

    // Progress lines go to stderr, and only when stdout is not the sink
    let verbose = sink.is_some();
    let snapshot = source.snapshot(|stage| {
        if verbose {
            eprintln!("{stage}");
        }
    })?;

    let filter = TableFilter::new(
        cli.schemas,
        cli.tables,
        Expansion::from_flags(cli.first_relationships, cli.second_relationships),
    );
    let selected = select(&snapshot.tables, &snapshot.foreign_keys, &filter);

    let mode = if cli.names_only {
        RenderMode::NamesOnly
    } else {
        RenderMode::Columns
    };

    if verbose {
        eprintln!("writing database");
    }
    let document = to_dot(&snapshot, &selected, mode);

    match sink.as_mut() {
        Some((path, file)) => {
            file.write_all(document.as_bytes())
                .context("error writing output file")?;

            eprintln!("diagram written to: {}", path.display());
            print_summary(&snapshot, &selected);
        }
        None => print!("{document}"),
    }

    Ok(())
}

fn print_summary(snapshot: &SchemaSnapshot, selected: &AHashSet<String>) {
    let table_count = snapshot
        .tables
        .iter()
        .filter(|t| selected.contains(t.as_str()))
        .count();
    let edge_count = snapshot
        .foreign_keys
        .iter()
        .filter(|fk| selected.contains(&fk.table) && selected.contains(&fk.pk_table))
        .count();

    eprintln!("diagram: {} tables, {} relationships", table_count, edge_count);
}
