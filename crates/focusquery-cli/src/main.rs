//! FocusQuery CLI
//!
//! Command-line interface for:
//! - Running queries against the host application (`query`)
//! - Compiling a filter to its automation script without executing (`compile`)
//! - Inspecting the field registry (`fields`) and query modes (`modes`)

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;

use focusquery_filter::{
    build, normalize, validate, EntityType, FieldKind, Mode, SortDirection, SortKey, FIELDS,
};
use focusquery_pipeline::{OsaExecutor, QueryPipeline, QueryRequest};
use focusquery_script::{emit, EmitSpec};

const MODES: &[Mode] = &[
    Mode::All,
    Mode::Overdue,
    Mode::Upcoming,
    Mode::Today,
    Mode::Flagged,
    Mode::Search,
    Mode::IdLookup,
    Mode::CountOnly,
];

#[derive(Parser)]
#[command(name = "focusquery")]
#[command(
    author,
    version,
    about = "FocusQuery: declarative task queries compiled to host automation scripts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query against the host application.
    Query {
        /// Query mode (all, overdue, upcoming, today, flagged, search,
        /// id_lookup, count_only).
        #[arg(long, default_value = "all")]
        mode: String,
        /// Filter as a JSON object, e.g. '{"flagged": true}'.
        #[arg(long, default_value = "{}")]
        filter: String,
        /// Sort key, `field` or `field:desc`. Repeatable; overrides the
        /// mode's default sort.
        #[arg(long = "sort")]
        sort: Vec<String>,
        /// Field to include per record. Repeatable; default is every
        /// concrete field.
        #[arg(long = "field")]
        fields: Vec<String>,
        /// Keep at most this many records (applied after sorting).
        #[arg(long)]
        limit: Option<usize>,
        /// Host execution timeout in seconds.
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },

    /// Compile a filter to its script without executing it.
    Compile {
        #[arg(long, default_value = "all")]
        mode: String,
        #[arg(long, default_value = "{}")]
        filter: String,
        #[arg(long = "field")]
        fields: Vec<String>,
    },

    /// List the queryable fields and their capabilities.
    Fields,

    /// List the query modes and their default sorts.
    Modes,
}

fn parse_mode(name: &str) -> Result<Mode> {
    MODES
        .iter()
        .copied()
        .find(|m| m.as_str() == name)
        .ok_or_else(|| anyhow!("unknown mode {name:?} (see `focusquery modes`)"))
}

fn parse_filter(raw: &str) -> Result<serde_json::Map<String, serde_json::Value>> {
    let value: serde_json::Value =
        serde_json::from_str(raw).context("filter is not valid JSON")?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(anyhow!("filter must be a JSON object, got {other}")),
    }
}

fn parse_sort(args: &[String]) -> Result<Option<Vec<SortKey>>> {
    if args.is_empty() {
        return Ok(None);
    }
    let mut keys = Vec::with_capacity(args.len());
    for arg in args {
        let key = match arg.split_once(':') {
            None => SortKey::asc(arg),
            Some((field, "asc")) => SortKey::asc(field),
            Some((field, "desc")) => SortKey::desc(field),
            Some((_, dir)) => return Err(anyhow!("sort direction must be asc or desc, got {dir:?}")),
        };
        keys.push(key);
    }
    Ok(Some(keys))
}

fn projection(fields: &[String]) -> Option<Vec<String>> {
    if fields.is_empty() {
        None
    } else {
        Some(fields.to_vec())
    }
}

fn kind_name(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::String => "string",
        FieldKind::Boolean => "boolean",
        FieldKind::Date => "date",
        FieldKind::Enum => "enum",
        FieldKind::StringSet => "string-set",
        FieldKind::Derived => "derived",
    }
}

async fn run_query(
    mode: &str,
    filter: &str,
    sort: &[String],
    fields: &[String],
    limit: Option<usize>,
    timeout: u64,
) -> Result<()> {
    let request = QueryRequest {
        entity: EntityType::Task,
        mode: parse_mode(mode)?,
        filter: parse_filter(filter)?,
        sort: parse_sort(sort)?,
        projection: projection(fields),
        limit,
    };
    let pipeline =
        QueryPipeline::new(OsaExecutor::new()).with_timeout(Duration::from_secs(timeout));
    let response = pipeline.run(&request).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn run_compile(mode: &str, filter: &str, fields: &[String]) -> Result<()> {
    let mode = parse_mode(mode)?;
    let now = Utc::now();
    let canonical = normalize(&parse_filter(filter)?, now)?;
    let tree = build(&canonical, mode, now);
    validate(&tree)?;
    let spec = EmitSpec::new(
        EntityType::Task,
        projection(fields).as_deref(),
        mode == Mode::CountOnly,
    )?;
    let script = emit(&tree, &spec)?;

    let dialect = if script.bridged {
        "omnijs (bridged)".yellow()
    } else {
        "jxa".green()
    };
    eprintln!("{} {}", "dialect:".bold(), dialect);
    println!("{}", script.text);
    Ok(())
}

fn run_fields() {
    println!(
        "{:<16} {:<11} {:<9} {}",
        "FIELD".bold(),
        "KIND".bold(),
        "SORTABLE".bold(),
        "BRIDGE".bold()
    );
    for field in FIELDS {
        let bridge = if field.requires_bridge {
            "required".yellow()
        } else {
            "-".normal()
        };
        println!(
            "{:<16} {:<11} {:<9} {}",
            field.name,
            kind_name(field.kind),
            if field.sortable { "yes" } else { "no" },
            bridge
        );
    }
}

fn run_modes() {
    for mode in MODES {
        let sort = mode
            .default_sort()
            .iter()
            .map(|k| {
                let dir = match k.direction {
                    SortDirection::Ascending => "",
                    SortDirection::Descending => ":desc",
                };
                format!("{}{dir}", k.field)
            })
            .collect::<Vec<_>>()
            .join(", ");
        let sort = if sort.is_empty() {
            "(host order)".to_string()
        } else {
            sort
        };
        println!("{:<12} sort: {sort}", mode.as_str().bold());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Query {
            mode,
            filter,
            sort,
            fields,
            limit,
            timeout,
        } => run_query(&mode, &filter, &sort, &fields, limit, timeout).await,
        Commands::Compile {
            mode,
            filter,
            fields,
        } => run_compile(&mode, &filter, &fields),
        Commands::Fields => {
            run_fields();
            Ok(())
        }
        Commands::Modes => {
            run_modes();
            Ok(())
        }
    }
}
