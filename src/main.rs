//! FBP runtime conformance runner.
//!
//! # Usage
//!
//! Run the whole catalog against a runtime that is already listening:
//! ```bash
//! fbp-conformance --port 3569
//! ```
//!
//! Start the runtime first, then run one category:
//! ```bash
//! fbp-conformance --command "noflo-nodejs --port 3569" --port 3569 --category graph
//! ```
//!
//! List the catalog:
//! ```bash
//! fbp-conformance --list
//! ```
//!
//! The shared secret is read from `FBP_PROTOCOL_SECRET`.
//!
//! # Exit Codes
//!
//! - 0: Every case passed
//! - 1: At least one case failed
//! - 2: Setup error (bad options, runtime failed to start, connect failure)

use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use fbp_conformance::{CaseFilter, Category, ConformanceSuite, TesterOptions};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fbp-conformance")]
#[command(about = "FBP network protocol conformance tester")]
struct Args {
    /// Run a single case (e.g. "graph.adding_an_edge")
    #[arg(long)]
    case: Option<String>,

    /// Run or list one category (runtime, graph, network, component)
    #[arg(long)]
    category: Option<Category>,

    /// List available cases instead of running them
    #[arg(long)]
    list: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Runtime host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Runtime port
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Component collection prefix
    #[arg(long, default_value = "core")]
    collection: String,

    /// Shell command that starts the runtime
    #[arg(long)]
    command: Option<String>,

    /// Label for the runtime under test
    #[arg(long, default_value = "noflo")]
    runtime_type: String,

    /// Protocol version to test against
    #[arg(long, default_value = "0.7")]
    protocol_version: String,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    let mut options = TesterOptions::new()
        .with_host(&args.host)
        .with_port(args.port)
        .with_collection(&args.collection)
        .with_runtime_type(&args.runtime_type)
        .with_protocol_version(&args.protocol_version)
        .with_secret_from_env();
    if let Some(command) = &args.command {
        options = options.with_command(command);
    }

    let suite = ConformanceSuite::new(options);
    let filter = CaseFilter {
        case: args.case.clone(),
        category: args.category,
    };

    if args.list {
        list_cases(&suite, &filter, args.format);
        return ExitCode::SUCCESS;
    }

    let report = match suite.run(&filter).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    match args.format {
        Format::Text => print!("{}", report.render_text()),
        Format::Json => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::from(2);
            }
        },
    }

    if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn init_logging(debug: bool) {
    let default = if debug {
        "fbp_conformance=debug"
    } else {
        "fbp_conformance=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn list_cases(suite: &ConformanceSuite, filter: &CaseFilter, format: Format) {
    let cases: Vec<_> = suite.cases().filter(|case| filter.matches(case)).collect();

    if format == Format::Json {
        let listing: Vec<_> = cases
            .iter()
            .map(|case| {
                serde_json::json!({
                    "name": case.name,
                    "category": case.category,
                    "description": case.description,
                })
            })
            .collect();
        println!("{}", serde_json::Value::Array(listing));
        return;
    }

    println!("Available cases:\n");
    let mut current = None;
    for case in &cases {
        if current != Some(case.category) {
            if current.is_some() {
                println!();
            }
            println!("## {}", case.category);
            current = Some(case.category);
        }
        println!("  {:<40} {}", case.name, case.description);
    }
    println!("\nTotal: {} cases", cases.len());
}
