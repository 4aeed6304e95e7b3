use anyhow::{Context, Result, bail};
use caregiver_solver::{LogDiagnostics, MergeMode, Policy, generate_schedule};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Builds a minimum caregiver schedule from a JSON array of client records.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Client records file; reads stdin when omitted or "-"
    input: Option<PathBuf>,

    /// JSON policy file, missing fields keep their defaults
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Merge pass to run after search
    #[arg(long, value_enum)]
    merge: Option<MergeArg>,

    /// Explore candidate position counts in parallel
    #[arg(long)]
    parallel: bool,

    /// Stop searching after this many placements
    #[arg(long)]
    max_steps: Option<u64>,

    /// Indent the JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum MergeArg {
    Identity,
    Greedy,
}

impl From<MergeArg> for MergeMode {
    fn from(arg: MergeArg) -> Self {
        match arg {
            MergeArg::Identity => MergeMode::Identity,
            MergeArg::Greedy => MergeMode::Greedy,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let policy = load_policy(&cli)?;
    let records = read_records(cli.input.as_deref())?;

    let schedule = generate_schedule(&records, &policy, &LogDiagnostics);

    let output = if cli.pretty {
        serde_json::to_string_pretty(&schedule)?
    } else {
        serde_json::to_string(&schedule)?
    };
    println!("{}", output);
    Ok(())
}

fn load_policy(cli: &Cli) -> Result<Policy> {
    let mut policy = match &cli.policy {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading policy file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing policy file {}", path.display()))?
        }
        None => Policy::default(),
    };
    if let Some(merge) = cli.merge {
        policy.merge = merge.into();
    }
    if cli.parallel {
        policy.search.parallel = true;
    }
    if cli.max_steps.is_some() {
        policy.search.max_steps = cli.max_steps;
    }
    policy.validate().context("invalid policy")?;
    Ok(policy)
}

fn read_records(input: Option<&Path>) -> Result<Vec<Value>> {
    let raw = match input {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("reading client records from {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading client records from stdin")?;
            buf
        }
    };
    match serde_json::from_str::<Value>(&raw).context("parsing client records")? {
        Value::Array(records) => Ok(records),
        other => bail!("expected a JSON array of client records, got {}", kind(&other)),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
