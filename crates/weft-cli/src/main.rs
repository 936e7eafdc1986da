mod artifacts;
mod config;
mod logging;

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing::info;

use weft_core::{Content, Namespace, SchemaError};
use weft_generate::{
    CompileOptions, CsvSink, GenerationEngine, GenerationError, JsonLinesSink, JsonSink,
    SamplingError, Sampler, Sink, SinkError, compile, compile_content, deliver,
};

use config::{ConfigError, OutputFormat, WeftConfig, load_config};
use logging::{LoggingError, init_logging};

#[derive(Debug, Error)]
enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("load error: {0}")]
    Load(#[from] weft_core::Error),
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("sampling error: {0}")]
    Sampling(#[from] SamplingError),
    #[error("output error: {0}")]
    Sink(#[from] SinkError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Parser, Debug)]
#[command(name = "weft", version, about = "Schema-driven synthetic data generator")]
struct Cli {
    /// Config file (defaults to ./weft.toml when present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Write JSON logs to this file instead of stderr.
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate rows for a namespace directory.
    Generate(GenerateArgs),
    /// Compile a namespace and print its insertion order.
    Validate(ValidateArgs),
    /// Sample a single content document.
    Sample(SampleArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Directory of `<collection>.json` documents.
    namespace: PathBuf,
    /// Only generate (and count) rows of this collection.
    #[arg(long)]
    collection: Option<String>,
    /// Number of rows to generate.
    #[arg(long)]
    size: Option<u64>,
    /// Seed of the random stream.
    #[arg(long, conflicts_with = "random")]
    seed: Option<u64>,
    /// Ignore any configured seed and draw a fresh one.
    #[arg(long, default_value_t = false)]
    random: bool,
    /// Output format.
    #[arg(long, value_enum)]
    to: Option<OutputFormat>,
    /// Output file (json, jsonl) or directory (csv). Defaults to stdout.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Write the generation report as JSON to this path.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Directory of `<collection>.json` documents.
    namespace: PathBuf,
}

#[derive(Args, Debug)]
struct SampleArgs {
    /// A single content document.
    document: PathBuf,
    /// Number of values to print.
    #[arg(long, default_value_t = 1)]
    size: u64,
    /// Seed of the random stream.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Generate(args) => run_generate(args, &config),
        Command::Validate(args) => run_validate(args, &config),
        Command::Sample(args) => run_sample(args, &config),
    }
}

fn run_generate(args: GenerateArgs, config: &WeftConfig) -> Result<(), CliError> {
    let section = &config.generate;
    let mut options = section.options();
    if let Some(size) = args.size {
        options.size = size;
    }
    if args.random {
        options.seed = None;
    } else if args.seed.is_some() {
        options.seed = args.seed;
    }
    options.collection = args.collection;

    let format = args.to.or(section.output).unwrap_or(OutputFormat::Json);
    let out = args.out.or_else(|| section.out.clone());

    let namespace = Namespace::from_dir(&args.namespace)?;
    info!(
        namespace = %args.namespace.display(),
        collections = namespace.len(),
        "namespace loaded"
    );

    let engine = GenerationEngine::new(options);
    let result = engine.run(&namespace)?;

    let mut sink = open_sink(format, out.as_deref())?;
    deliver(&result, &mut sink)?;
    drop(sink);

    if let Some(path) = &args.report {
        artifacts::write_json_atomic(path, &result.report)?;
        info!(path = %path.display(), "report written");
    }
    info!(
        seed = result.report.seed,
        rows = result.report.rows_total,
        format = ?format,
        "output written"
    );
    Ok(())
}

fn open_sink(format: OutputFormat, out: Option<&Path>) -> Result<Box<dyn Sink>, CliError> {
    Ok(match (format, out) {
        (OutputFormat::Json, Some(path)) => Box::new(JsonSink::create(path, true)?),
        (OutputFormat::Json, None) => Box::new(JsonSink::new(io::stdout().lock(), true)),
        (OutputFormat::Jsonl, Some(path)) => Box::new(JsonLinesSink::create(path)?),
        (OutputFormat::Jsonl, None) => Box::new(JsonLinesSink::new(io::stdout().lock())),
        (OutputFormat::Csv, Some(dir)) => Box::new(CsvSink::new(dir)?),
        (OutputFormat::Csv, None) => {
            return Err(CliError::InvalidConfig(
                "csv output needs --out <DIR>".to_string(),
            ));
        }
    })
}

fn run_validate(args: ValidateArgs, config: &WeftConfig) -> Result<(), CliError> {
    let namespace = Namespace::from_dir(&args.namespace)?;
    let compiled = compile(&namespace, &compile_options(config))?;
    let report = compiled.reference_report();
    info!(
        collections = namespace.len(),
        nodes = compiled.node_count(),
        references = report.summary.edges,
        "namespace valid"
    );

    let mut stdout = io::stdout().lock();
    for (position, collection) in compiled.insertion_order().iter().enumerate() {
        writeln!(stdout, "{}. {collection}", position + 1)?;
    }
    Ok(())
}

fn run_sample(args: SampleArgs, config: &WeftConfig) -> Result<(), CliError> {
    let name = args
        .document
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| CliError::InvalidConfig("document path has no file name".to_string()))?;
    let text = std::fs::read_to_string(&args.document)?;
    let document: serde_json::Value = serde_json::from_str(&text)?;
    let content = Content::parse(&document, &name)?;
    let compiled = compile_content(&name, &content, &compile_options(config))?;

    let mut sampler = match args.seed.or(config.generate.seed) {
        Some(seed) => Sampler::new(compiled, seed),
        None => Sampler::with_random_seed(compiled),
    };
    info!(document = %args.document.display(), seed = sampler.seed(), "sampling");

    let mut out = BufWriter::new(io::stdout().lock());
    for _ in 0..args.size {
        let value = sampler.next_value(&name)?.unwrap_or_default();
        serde_json::to_writer(&mut out, &value)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn compile_options(config: &WeftConfig) -> CompileOptions {
    let options = config.generate.options();
    CompileOptions {
        null_rate: options.null_rate,
        max_unique_attempts: options.max_unique_attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_flags() {
        let cli = Cli::try_parse_from([
            "weft",
            "--log-file",
            "logs/weft.log",
            "generate",
            "demos/shop",
            "--size",
            "10",
            "--seed",
            "4",
            "--to",
            "csv",
            "--out",
            "out",
        ])
        .expect("parse");
        assert_eq!(cli.log_file, Some(PathBuf::from("logs/weft.log")));
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.size, Some(10));
        assert_eq!(args.seed, Some(4));
        assert_eq!(args.to, Some(OutputFormat::Csv));
    }

    #[test]
    fn seed_conflicts_with_random() {
        let result =
            Cli::try_parse_from(["weft", "generate", "ns", "--seed", "1", "--random"]);
        assert!(result.is_err());
    }

    #[test]
    fn csv_needs_an_output_directory() {
        assert!(matches!(
            open_sink(OutputFormat::Csv, None),
            Err(CliError::InvalidConfig(_))
        ));
    }
}
