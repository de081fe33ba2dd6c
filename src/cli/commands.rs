//! CLI definition using clap.
//!
//! Requests come from a config file (`-f`), from one-line descriptors on
//! the command line, or both; command-line values override the file.

use clap::Parser;
use std::path::PathBuf;

use workload::request::{parse_headers, set_header};
use workload::{FilterKind, RequestTemplate, WorkloadConfig};

/// Workload - generate realistic, irregular HTTP traffic
#[derive(Parser, Debug)]
#[command(name = "workload")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "REQUEST format: [weight,][METHOD,]url[,body]\n\
    Example: workload --max 30 --filter EX '2,GET,http://localhost/items/{1..9}'")]
pub struct Cli {
    /// Config file (JSON or YAML)
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Maximum requests per minute
    #[arg(long, value_name = "N")]
    pub max: Option<f64>,

    /// Filter to apply: WD (workdays), WH (working hours), EX (expand); repeat for a chain
    #[arg(long = "filter", value_name = "NAME")]
    pub filters: Vec<FilterKind>,

    /// Header sent with every request, as "Name: value"; repeatable
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Don't print visits
    #[arg(short, long)]
    pub silent: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Request descriptors
    #[arg(value_name = "REQUEST")]
    pub requests: Vec<String>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Whether anything to send was given at all.
    pub fn has_input(&self) -> bool {
        self.file.is_some() || !self.requests.is_empty()
    }

    /// Layer command-line values over `config`.
    pub fn apply_to(&self, config: &mut WorkloadConfig) -> workload::Result<()> {
        if let Some(max) = self.max {
            config.max = max;
        }

        if !self.filters.is_empty() {
            config.filters = Some(self.filters.clone());
            config.filter = None;
        }

        for (name, value) in parse_headers(&self.headers)? {
            set_header(&mut config.headers, &name, &value);
        }

        for line in &self.requests {
            config.requests.push(line.parse::<RequestTemplate>()?);
        }

        Ok(())
    }
}
