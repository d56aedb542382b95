use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use log::debug;

use rkql_ast::Rule;
use rkql_backend::KustoBackend;
use rkql_backend::pipeline::{Pipeline, apply_pipelines, parse_pipeline_file, windows_pipeline};

#[derive(Parser)]
#[command(name = "rkql")]
#[command(about = "Translate detection-rule condition trees into KQL queries")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert rule condition trees (JSON) into KQL queries
    ///
    /// The input is a single rule object or an array of rules. Each rule
    /// is converted independently; a failing rule is reported on stderr
    /// and does not abort the rest of the batch.
    Convert {
        /// Path to a JSON rule file (if omitted, reads from stdin)
        path: Option<PathBuf>,

        /// Processing pipeline YAML file(s) to apply (can be specified multiple times)
        #[arg(short = 'p', long = "pipeline")]
        pipelines: Vec<PathBuf>,

        /// Apply the built-in Windows logsource pipeline
        #[arg(long)]
        windows: bool,

        /// Output format name
        #[arg(short, long, default_value = "default")]
        format: String,
    },

    /// List the available output formats
    Formats,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            path,
            pipelines,
            windows,
            format,
        } => cmd_convert(path, pipelines, windows, format),
        Commands::Formats => cmd_formats(),
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_convert(path: Option<PathBuf>, pipeline_paths: Vec<PathBuf>, windows: bool, format: String) {
    let input = read_input(path);
    let rules = parse_rules(&input);
    let pipelines = load_pipelines(&pipeline_paths, windows);
    debug!(
        "converting {} rule(s) through {} pipeline(s)",
        rules.len(),
        pipelines.len()
    );

    let backend = KustoBackend::new();
    let mut failed = 0usize;

    for rule in rules {
        let mut rule = rule;
        apply_pipelines(&pipelines, &mut rule);
        match backend.convert_rule_format(&rule, &format) {
            Ok(query) => println!("{query}"),
            Err(e) => {
                eprintln!("Error converting rule '{}': {e}", rule.title);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        process::exit(1);
    }
}

fn cmd_formats() {
    for format in KustoBackend::new().formats() {
        println!("{format}");
    }
}

// ---------------------------------------------------------------------------
// Input loading
// ---------------------------------------------------------------------------

fn read_input(path: Option<PathBuf>) -> String {
    match path {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading {}: {e}", path.display());
                process::exit(1);
            }
        },
        None => {
            let mut input = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut input) {
                eprintln!("Error reading stdin: {e}");
                process::exit(1);
            }
            input
        }
    }
}

/// Parse the input as one rule object or an array of rules.
fn parse_rules(input: &str) -> Vec<Rule> {
    let value: serde_json::Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error parsing input JSON: {e}");
            process::exit(1);
        }
    };

    let result = if value.is_array() {
        serde_json::from_value::<Vec<Rule>>(value)
    } else {
        serde_json::from_value::<Rule>(value).map(|r| vec![r])
    };

    match result {
        Ok(rules) => rules,
        Err(e) => {
            eprintln!("Error decoding rule(s): {e}");
            process::exit(1);
        }
    }
}

fn load_pipelines(paths: &[PathBuf], windows: bool) -> Vec<Pipeline> {
    let mut pipelines = Vec::new();
    if windows {
        pipelines.push(windows_pipeline());
    }
    for path in paths {
        match parse_pipeline_file(path) {
            Ok(p) => pipelines.push(p),
            Err(e) => {
                eprintln!("Error loading pipeline {}: {e}", path.display());
                process::exit(1);
            }
        }
    }
    pipelines
}
